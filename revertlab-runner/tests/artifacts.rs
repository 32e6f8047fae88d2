//! JSON / CSV / Markdown artifacts for backtests and evaluation reports.

use chrono::NaiveDate;
use revertlab_runner::export::{
    export_backtest_json, export_daily_csv, export_report_json, generate_report,
    import_backtest_json, import_report_json, load_artifacts, save_artifacts,
};
use revertlab_runner::{
    evaluate_assets, run_asset_backtest, AssetBacktest, EvaluationConfig, EvaluationRequest,
    PriceLoader,
};

fn synthetic_loader() -> PriceLoader {
    PriceLoader::new().with_synthetic(
        NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2022, 12, 31).unwrap(),
    )
}

fn backtest() -> AssetBacktest {
    run_asset_backtest("510300", &synthetic_loader(), &EvaluationConfig::default(), None).unwrap()
}

#[test]
fn test_save_and_load_artifacts() {
    let temp_dir = tempfile::tempdir().unwrap();
    let result = backtest();

    let run_dir = save_artifacts(&result, temp_dir.path()).unwrap();
    assert!(run_dir.join("manifest.json").exists());
    assert!(run_dir.join("daily.csv").exists());
    assert!(run_dir.join("report.md").exists());
    assert!(run_dir
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("510300_"));

    let loaded = load_artifacts(&run_dir).unwrap();
    assert_eq!(loaded.code, result.code);
    assert_eq!(loaded.run.rows.len(), result.run.rows.len());
    assert_eq!(loaded.final_context().state, result.final_context().state);
    assert_eq!(loaded.dataset_hash, result.dataset_hash);
}

#[test]
fn test_daily_csv_has_one_line_per_day() {
    let result = backtest();
    let csv = export_daily_csv(&result.run.rows).unwrap();
    assert_eq!(csv.lines().count(), result.run.rows.len() + 1);
    let first = csv.lines().nth(1).unwrap();
    assert!(first.contains(",IDLE,"), "day 0 is IDLE: {first}");
}

#[test]
fn test_report_flags_synthetic_data() {
    let result = backtest();
    let md = generate_report(&result);
    assert!(md.contains("# Backtest Report"));
    assert!(md.contains("| Code | 510300 |"));
    assert!(md.contains("SYNTHETIC"));
    assert!(md.contains("## Time in State"));
}

#[test]
fn test_backtest_json_rejects_newer_schema() {
    let mut result = backtest();
    result.schema_version = 99;
    let json = export_backtest_json(&result).unwrap();
    let err = import_backtest_json(&json).unwrap_err();
    assert!(err.to_string().contains("unsupported schema version"));
}

#[test]
fn test_report_json_roundtrip() {
    let request = EvaluationRequest {
        codes: vec!["510300".into(), "161226".into()],
        date: NaiveDate::from_ymd_opt(2022, 12, 30),
        total_amount: Some(50_000.0),
    };
    let report = evaluate_assets(&request, &synthetic_loader(), &EvaluationConfig::default()).unwrap();

    let json = export_report_json(&report).unwrap();
    let back = import_report_json(&json).unwrap();
    assert_eq!(back, report);
}

#[test]
fn test_report_json_without_schema_version_defaults() {
    let json = r#"{
        "date": null,
        "config_hash": "abc",
        "assets": [],
        "portfolio_summary": "",
        "total_amount": null,
        "total_position_amount": null,
        "allocations": []
    }"#;
    let report = import_report_json(json).unwrap();
    assert_eq!(report.schema_version, revertlab_runner::SCHEMA_VERSION);
    assert!(report.failures.is_empty());
}
