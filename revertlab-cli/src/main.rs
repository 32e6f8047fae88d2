//! RevertLab CLI: evaluation, backtest, and data commands.
//!
//! Commands:
//! - `evaluate`: daily signals for a set of funds plus the portfolio summary
//! - `backtest`: full single-asset backtest with saved artifacts
//! - `caps`: volatility/dip-frequency cap suggestions against the policy
//! - `summary`: recent price summary for one fund
//! - `history`: daily closes for one fund within a date range
//! - `import`: validate a CSV export and store it in the Parquet cache

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use revertlab_core::caps::{estimate_asset_cap, resolve_asset_cap, AssetKind};
use revertlab_core::data::{
    price_history, summarize_prices, valid_codes, PriceHistory, PriceSummary, DEFAULT_HISTORY_LIMIT,
};
use revertlab_runner::export::{export_report_json, save_artifacts};
use revertlab_runner::{
    apply_window, evaluate_assets, run_asset_backtest, AssetBacktest, EvaluationConfig,
    EvaluationReport, EvaluationRequest, PriceLoader,
};

#[derive(Parser)]
#[command(name = "revertlab", about = "RevertLab CLI: mean-reversion fund evaluation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where prices come from; shared by every data-reading command.
#[derive(clap::Args)]
struct DataArgs {
    /// Directory of `{code}.csv` exports.
    #[arg(long, default_value = "prices")]
    data_dir: PathBuf,

    /// Parquet cache directory. Defaults to ./data.
    #[arg(long, default_value = "data")]
    cache_dir: PathBuf,

    /// Use synthetic data as fallback (debug only).
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Re-read CSV exports even when cached.
    #[arg(long, default_value_t = false)]
    force: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate funds and print today's signals and portfolio summary.
    Evaluate {
        /// Fund codes (e.g., 510300 161226).
        #[arg(required = true)]
        codes: Vec<String>,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Capital to translate positions into amounts.
        #[arg(long)]
        total_amount: Option<f64>,

        /// Evaluation date label (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<String>,

        /// Write the full report as JSON to this file.
        #[arg(long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        data: DataArgs,
    },
    /// Backtest one fund and save artifacts.
    Backtest {
        code: String,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Asset cap in [0, 1]. Defaults to the policy-resolved cap.
        #[arg(long)]
        asset_cap: Option<f64>,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        #[command(flatten)]
        data: DataArgs,
    },
    /// Suggest per-fund caps from volatility and dip frequency.
    Caps {
        #[arg(required = true)]
        codes: Vec<String>,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        data: DataArgs,
    },
    /// Latest close, short-horizon returns, and drawdown for one fund.
    Summary {
        code: String,

        /// Rows in the summary window (minimum 2).
        #[arg(long, default_value_t = 20)]
        lookback_days: usize,

        #[command(flatten)]
        data: DataArgs,
    },
    /// List daily closes for one fund.
    History {
        code: String,

        /// First date to include (YYYY-MM-DD).
        #[arg(long)]
        start: Option<String>,

        /// Last date to include (YYYY-MM-DD).
        #[arg(long)]
        end: Option<String>,

        /// Keep only the most recent rows in range (0 = all).
        #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: usize,

        /// Print the records as JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,

        #[command(flatten)]
        data: DataArgs,
    },
    /// Validate a CSV export and write it into the Parquet cache.
    Import {
        code: String,

        /// CSV file with `date,close` columns.
        csv: PathBuf,

        /// Parquet cache directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Evaluate {
            codes,
            config,
            total_amount,
            date,
            output,
            data,
        } => run_evaluate(codes, config, total_amount, date, output, &data),
        Commands::Backtest {
            code,
            config,
            asset_cap,
            output_dir,
            data,
        } => run_backtest_cmd(&code, config, asset_cap, &output_dir, &data),
        Commands::Caps { codes, config, data } => run_caps(&codes, config, &data),
        Commands::Summary {
            code,
            lookback_days,
            data,
        } => run_summary(&code, lookback_days, &data),
        Commands::History {
            code,
            start,
            end,
            limit,
            json,
            data,
        } => run_history(&code, start, end, limit, json, &data),
        Commands::Import {
            code,
            csv,
            cache_dir,
        } => run_import(&code, &csv, &cache_dir),
    }
}

fn load_config(path: Option<PathBuf>) -> Result<EvaluationConfig> {
    match path {
        Some(path) => EvaluationConfig::from_file(&path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(EvaluationConfig::default()),
    }
}

fn build_loader(data: &DataArgs, config: &EvaluationConfig) -> PriceLoader {
    let loader = PriceLoader::new()
        .with_cache(&data.cache_dir)
        .with_csv_dir(&data.data_dir)
        .force_refresh(data.force);
    if data.synthetic {
        let start = config
            .data
            .start_date
            .unwrap_or_else(|| chrono::Local::now().date_naive() - chrono::Duration::days(365 * 5));
        loader.with_synthetic(start, chrono::Local::now().date_naive())
    } else {
        loader
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date '{s}'"))
}

fn run_evaluate(
    codes: Vec<String>,
    config_path: Option<PathBuf>,
    total_amount: Option<f64>,
    date: Option<String>,
    output: Option<PathBuf>,
    data: &DataArgs,
) -> Result<()> {
    if let Some(amount) = total_amount {
        if amount.is_nan() || amount < 0.0 {
            bail!("--total-amount must be non-negative, got {amount}");
        }
    }

    let config = load_config(config_path)?;
    let loader = build_loader(data, &config);
    let date = match date {
        Some(s) => parse_date(&s)?,
        None => chrono::Local::now().date_naive(),
    };

    let request = EvaluationRequest {
        codes,
        date: Some(date),
        total_amount,
    };
    let report = evaluate_assets(&request, &loader, &config)?;

    print_evaluation(&report);

    if let Some(path) = output {
        std::fs::write(&path, export_report_json(&report)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Report saved to: {}", path.display());
    }

    Ok(())
}

fn run_backtest_cmd(
    code: &str,
    config_path: Option<PathBuf>,
    asset_cap: Option<f64>,
    output_dir: &Path,
    data: &DataArgs,
) -> Result<()> {
    let config = load_config(config_path)?;
    let loader = build_loader(data, &config);

    let result = run_asset_backtest(code, &loader, &config, asset_cap)?;
    print_backtest(&result);

    let run_dir = save_artifacts(&result, output_dir)?;
    info!(code, dir = %run_dir.display(), "artifacts saved");
    println!("Artifacts saved to: {}", run_dir.display());

    Ok(())
}

fn run_caps(codes: &[String], config_path: Option<PathBuf>, data: &DataArgs) -> Result<()> {
    let codes = valid_codes(codes);
    if codes.is_empty() {
        bail!("no valid fund codes");
    }

    let config = load_config(config_path)?;
    let loader = build_loader(data, &config);
    let policy = config.policy_for(&codes);

    println!(
        "{:<8} {:<9} {:>9} {:>9} {:>7} {:>10} {:>8} {:>8}",
        "Code", "Kind", "Ann Vol", "Dip Freq", "Factor", "Suggested", "Policy", "Final"
    );
    println!("{}", "-".repeat(76));

    for code in &codes {
        let loaded = match loader.load(code) {
            Ok(loaded) => loaded,
            Err(e) => {
                eprintln!("Error for {code}: {e}");
                continue;
            }
        };
        let series = apply_window(&loaded.series, &config);
        let kind = match AssetKind::for_code(code) {
            AssetKind::Etf => "ETF",
            AssetKind::OpenFund => "fund",
        };
        let policy_cap = policy.cap_for(code);

        match estimate_asset_cap(&series.closes(), &config.cap_estimate) {
            Some(est) => println!(
                "{:<8} {:<9} {:>8.2}% {:>8.2}% {:>7.1} {:>10.2} {:>8.2} {:>8.2}",
                code,
                kind,
                est.ann_vol * 100.0,
                est.dip_freq * 100.0,
                est.freq_factor,
                est.suggested_cap,
                policy_cap,
                resolve_asset_cap(code, &policy, est.suggested_cap),
            ),
            None => println!(
                "{:<8} {:<9} {:>9} {:>9} {:>7} {:>10} {:>8.2} {:>8}",
                code,
                kind,
                "-",
                "-",
                "-",
                format!("({} obs)", series.len()),
                policy_cap,
                "-",
            ),
        }
    }

    Ok(())
}

fn run_summary(code: &str, lookback_days: usize, data: &DataArgs) -> Result<()> {
    let config = EvaluationConfig::default();
    let loader = build_loader(data, &config);
    let loaded = loader.load(code)?;

    let Some(summary) = summarize_prices(&loaded.series, lookback_days) else {
        bail!("no price data for '{code}'");
    };
    print_price_summary(&summary);
    if loaded.is_synthetic() {
        println!("WARNING: Summary based on SYNTHETIC data");
    }
    Ok(())
}

fn run_history(
    code: &str,
    start: Option<String>,
    end: Option<String>,
    limit: usize,
    json: bool,
    data: &DataArgs,
) -> Result<()> {
    let start = start.as_deref().map(parse_date).transpose()?;
    let end = end.as_deref().map(parse_date).transpose()?;
    if let (Some(s), Some(e)) = (start, end) {
        if s > e {
            bail!("--start {s} is after --end {e}");
        }
    }

    let config = EvaluationConfig::default();
    let loader = build_loader(data, &config);
    let loaded = loader.load(code)?;
    let history = price_history(&loaded.series, start, end, limit);

    if json {
        println!("{}", serde_json::to_string_pretty(&history)?);
    } else {
        print_history(&history);
    }
    if loaded.is_synthetic() {
        eprintln!("WARNING: History based on SYNTHETIC data");
    }
    Ok(())
}

fn run_import(code: &str, csv: &Path, cache_dir: &Path) -> Result<()> {
    if valid_codes(&[code]).is_empty() {
        bail!("'{code}' is not a valid fund code");
    }
    let loader = PriceLoader::new().with_cache(cache_dir);
    let loaded = loader
        .import_csv(code, csv)
        .with_context(|| format!("failed to import {}", csv.display()))?;

    let series = &loaded.series;
    let (first, last) = match (series.first(), series.last()) {
        (Some(first), Some(last)) => (first.date, last.date),
        _ => bail!("no rows imported for '{code}'"),
    };
    println!(
        "Imported {code}: {} rows, {first} to {last} (hash {})",
        series.len(),
        &loaded.dataset_hash[..12]
    );
    Ok(())
}

// ── Output ──

fn print_evaluation(report: &EvaluationReport) {
    println!();
    match report.date {
        Some(date) => println!("=== Evaluation {date} ==="),
        None => println!("=== Evaluation ==="),
    }
    println!(
        "{:<8} {:<9} {:<5} {:>8} {:>8} {:>8} {:<7}",
        "Code", "State", "Act", "Pos", "Cap", "Target", "Conf"
    );
    println!("{}", "-".repeat(60));
    for asset in &report.assets {
        let s = &asset.signal;
        println!(
            "{:<8} {:<9} {:<5} {:>7.2}% {:>7.2}% {:>7.2}% {:<7}",
            asset.code,
            s.state.to_string(),
            s.action.to_string(),
            s.final_position * 100.0,
            asset.final_cap * 100.0,
            s.metrics.target_position * 100.0,
            s.confidence.to_string(),
        );
    }

    if !report.assets.is_empty() {
        println!();
        for asset in &report.assets {
            println!("{}: {}", asset.code, asset.summary);
        }
    }

    if report.total_amount.is_some() {
        println!();
        println!("--- Allocation ---");
        for a in &report.allocations {
            let amount = a.target_amount.unwrap_or(0.0);
            match a.target_weight {
                Some(w) => println!("{:<8} {:>12.2}  ({:.1}% of invested)", a.code, amount, w * 100.0),
                None => println!("{:<8} {:>12.2}", a.code, amount),
            }
        }
    }

    println!();
    println!("--- Portfolio ---");
    println!("{}", report.portfolio_summary);

    if !report.skipped.is_empty() {
        println!();
        println!("Skipped (history too short): {}", report.skipped.join(", "));
    }
    for failure in &report.failures {
        println!("Error for {}: {}", failure.code, failure.error);
    }
    println!();
}

fn print_backtest(result: &AssetBacktest) {
    let s = &result.stats;
    println!();
    println!("=== Backtest Result ===");
    println!("Code:           {}", result.code);
    println!(
        "Period:         {} to {}",
        result.start_date, result.end_date
    );
    println!("Days:           {}", s.days);
    println!("Asset Cap:      {:.2}", result.asset_cap);
    if let Some(est) = &result.cap_estimate {
        println!(
            "Suggested Cap:  {:.2} (vol {:.2}%, dip freq {:.2}%)",
            est.suggested_cap,
            est.ann_vol * 100.0,
            est.dip_freq * 100.0
        );
    }
    println!();
    println!("--- Performance ---");
    println!("Total Return:   {:.2}%", s.total_return * 100.0);
    println!("Ann. Return:    {:.2}%", s.ann_return * 100.0);
    println!("Ann. Vol:       {:.2}%", s.ann_vol * 100.0);
    println!("Sharpe:         {:.3}", s.sharpe);
    println!("Max Drawdown:   {:.2}%", s.max_drawdown * 100.0);
    println!("Avg Position:   {:.2}%", s.avg_position * 100.0);
    println!("Trade Days:     {}", s.trade_days);
    println!("Total Cost:     {:.4}%", s.total_cost * 100.0);
    println!();
    println!("--- Time in State ---");
    for (state, share) in &s.state_fractions {
        println!("{:<15} {:.1}%", format!("{state}:"), share * 100.0);
    }
    println!("Final State:    {}", result.final_context().state);
    if result.is_synthetic() {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    println!();
}

fn print_history(history: &PriceHistory) {
    println!();
    println!("=== {} ({} rows) ===", history.code, history.count);
    println!("{:<12} {:>10}", "Date", "Close");
    println!("{}", "-".repeat(23));
    for p in &history.records {
        println!("{:<12} {:>10.4}", p.date.to_string(), p.close);
    }
    println!();
}

fn print_price_summary(summary: &PriceSummary) {
    println!();
    println!("=== {} as of {} ===", summary.code, summary.as_of);
    println!("Last Close:     {:.4}", summary.last_close);
    println!("Return 1d:      {:.2}%", summary.return_1d * 100.0);
    println!("Return 5d:      {:.2}%", summary.return_5d * 100.0);
    println!("Return 20d:     {:.2}%", summary.return_20d * 100.0);
    println!(
        "From Peak:      {:.2}% (last {} rows)",
        summary.drawdown_from_peak * 100.0,
        summary.lookback_days.max(2)
    );
    println!();
}
