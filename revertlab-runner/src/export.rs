//! Reporting and export: JSON, CSV, and Markdown artifacts.
//!
//! - **JSON**: evaluation reports and single-asset backtests, schema versioned
//! - **CSV**: the daily backtest rows for external analysis tools
//! - **Markdown**: human-readable single-asset report
//!
//! Persisted artifacts carry a `schema_version`; newer versions are rejected
//! on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;

use revertlab_core::domain::TradeState;
use revertlab_core::engine::DailyRow;

use crate::batch::EvaluationReport;
use crate::runner::{AssetBacktest, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_report_json(report: &EvaluationReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize EvaluationReport to JSON")
}

pub fn import_report_json(json: &str) -> Result<EvaluationReport> {
    let report: EvaluationReport = import_versioned(json, "EvaluationReport")?;
    check_schema(report.schema_version)?;
    Ok(report)
}

pub fn export_backtest_json(result: &AssetBacktest) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize AssetBacktest to JSON")
}

pub fn import_backtest_json(json: &str) -> Result<AssetBacktest> {
    let result: AssetBacktest = import_versioned(json, "AssetBacktest")?;
    check_schema(result.schema_version)?;
    Ok(result)
}

fn import_versioned<T: DeserializeOwned>(json: &str, what: &str) -> Result<T> {
    serde_json::from_str(json).with_context(|| format!("failed to deserialize {what} from JSON"))
}

fn check_schema(version: u32) -> Result<()> {
    if version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            version,
            SCHEMA_VERSION
        );
    }
    Ok(())
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export daily backtest rows as CSV.
///
/// Columns: date, close, ret1, target, target_eff, state, cap, pos,
/// turnover, cost, strategy_return, nav, drawdown
pub fn export_daily_csv(rows: &[DailyRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "date",
        "close",
        "ret1",
        "target",
        "target_eff",
        "state",
        "cap",
        "pos",
        "turnover",
        "cost",
        "strategy_return",
        "nav",
        "drawdown",
    ])?;

    for r in rows {
        wtr.write_record([
            &r.date.to_string(),
            &format!("{:.6}", r.close),
            &format!("{:.6}", r.ret1),
            &format!("{:.6}", r.target),
            &format!("{:.6}", r.target_eff),
            r.state.as_str(),
            &format!("{:.6}", r.cap),
            &format!("{:.6}", r.pos),
            &format!("{:.6}", r.turnover),
            &format!("{:.8}", r.cost),
            &format!("{:.8}", r.strategy_return),
            &format!("{:.6}", r.nav),
            &format!("{:.6}", r.drawdown),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a single-asset backtest.
///
/// Creates `{code}_{timestamp}/` under `output_dir` containing:
/// - `manifest.json`: the full `AssetBacktest`
/// - `daily.csv`: the daily rows
/// - `report.md`: the Markdown report
///
/// Returns the path to the created directory.
pub fn save_artifacts(result: &AssetBacktest, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}",
        result.code,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("manifest.json"), export_backtest_json(result)?)?;
    std::fs::write(run_dir.join("daily.csv"), export_daily_csv(&result.run.rows)?)?;
    std::fs::write(run_dir.join("report.md"), generate_report(result))?;

    Ok(run_dir)
}

/// Load an `AssetBacktest` from an artifact directory's manifest.json.
pub fn load_artifacts(dir: &Path) -> Result<AssetBacktest> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_backtest_json(&json)
}

// ─── Markdown reports ───────────────────────────────────────────────

pub fn generate_report(result: &AssetBacktest) -> String {
    let mut md = String::with_capacity(2048);

    md.push_str("# Backtest Report\n\n");

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Code | {} |\n", result.code));
    md.push_str(&format!(
        "| Period | {} to {} |\n",
        result.start_date, result.end_date
    ));
    md.push_str(&format!("| Days | {} |\n", result.stats.days));
    md.push_str(&format!("| Asset Cap | {:.2} |\n", result.asset_cap));
    md.push_str(&format!("| Dataset Hash | {} |\n", result.dataset_hash));
    md.push_str(&format!("| Config Hash | {} |\n", result.config_hash));
    if result.is_synthetic() {
        md.push_str("| Data | **SYNTHETIC** |\n");
    }
    md.push('\n');

    if let Some(est) = &result.cap_estimate {
        md.push_str("## Cap Estimate\n\n");
        md.push_str("| Field | Value |\n");
        md.push_str("| --- | --- |\n");
        md.push_str(&format!("| Annualized Vol | {:.2}% |\n", est.ann_vol * 100.0));
        md.push_str(&format!("| Dip Frequency | {:.2}% |\n", est.dip_freq * 100.0));
        md.push_str(&format!("| Frequency Factor | {:.1} |\n", est.freq_factor));
        md.push_str(&format!("| Suggested Cap | {:.2} |\n", est.suggested_cap));
        md.push('\n');
    }

    let s = &result.stats;
    md.push_str("## Performance Summary\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Total Return | {:.2}% |\n", s.total_return * 100.0));
    md.push_str(&format!("| Annualized Return | {:.2}% |\n", s.ann_return * 100.0));
    md.push_str(&format!("| Annualized Vol | {:.2}% |\n", s.ann_vol * 100.0));
    md.push_str(&format!("| Sharpe | {:.3} |\n", s.sharpe));
    md.push_str(&format!("| Max Drawdown | {:.2}% |\n", s.max_drawdown * 100.0));
    md.push_str(&format!("| Avg Position | {:.2}% |\n", s.avg_position * 100.0));
    md.push_str(&format!("| Trade Days | {} |\n", s.trade_days));
    md.push_str(&format!("| Total Cost | {:.4}% |\n", s.total_cost * 100.0));
    md.push('\n');

    md.push_str("## Time in State\n\n");
    md.push_str("| State | Share |\n");
    md.push_str("| --- | ---: |\n");
    for state in TradeState::ALL {
        let share = s.state_fractions.get(&state).copied().unwrap_or(0.0);
        md.push_str(&format!("| {state} | {:.1}% |\n", share * 100.0));
    }
    md.push('\n');

    let ctx = result.final_context();
    md.push_str("## Final Risk Context\n\n");
    md.push_str(&format!("- State: {}\n", ctx.state));
    if let Some(ref_price) = ctx.ref_price {
        md.push_str(&format!("- Reference price: {ref_price:.4}\n"));
    }
    if let Some(start) = ctx.probe_start {
        md.push_str(&format!("- Probe started: {}\n", start.date));
    }
    if let Some(since) = ctx.cooldown_since {
        md.push_str(&format!("- Cooldown since: {}\n", since.date));
    }

    md
}
