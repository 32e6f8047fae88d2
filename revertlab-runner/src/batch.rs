//! Batch evaluation across asset codes.
//!
//! Assets are independent, so they fan out over rayon. Each asset yields its
//! own `Result`; a failure is logged and recorded, never propagated. Output
//! order follows the filtered input order.

use std::time::Instant;

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use revertlab_core::data::valid_codes;
use revertlab_core::portfolio::{aggregate_portfolio, Allocation, AssetEvaluation};

use crate::config::EvaluationConfig;
use crate::data_loader::PriceLoader;
use crate::runner::{apply_window, default_schema_version, evaluate_asset, RunError, SCHEMA_VERSION};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub codes: Vec<String>,
    /// Evaluation date label carried into the report.
    pub date: Option<NaiveDate>,
    /// Capital to translate positions into amounts.
    pub total_amount: Option<f64>,
}

/// An asset dropped from the batch by an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetFailure {
    pub code: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub date: Option<NaiveDate>,
    pub config_hash: String,
    pub assets: Vec<AssetEvaluation>,
    pub portfolio_summary: String,
    pub total_amount: Option<f64>,
    pub total_position_amount: Option<f64>,
    pub allocations: Vec<Allocation>,
    /// Codes omitted for lack of history (not failures).
    #[serde(default)]
    pub skipped: Vec<String>,
    #[serde(default)]
    pub failures: Vec<AssetFailure>,
}

/// Evaluate every valid code in `request` and aggregate the portfolio.
///
/// Fails only when filtering leaves no code to evaluate.
pub fn evaluate_assets(
    request: &EvaluationRequest,
    loader: &PriceLoader,
    config: &EvaluationConfig,
) -> Result<EvaluationReport, RunError> {
    let codes = valid_codes(&request.codes);
    if codes.is_empty() {
        return Err(RunError::NoValidCodes);
    }

    let policy = config.policy_for(&codes);
    info!(assets = codes.len(), "evaluating assets");
    let started = Instant::now();

    let results: Vec<(String, Result<AssetEvaluation, RunError>)> = codes
        .par_iter()
        .map(|code| {
            let t0 = Instant::now();
            let result = loader
                .load(code)
                .map_err(RunError::from)
                .and_then(|loaded| evaluate_asset(&apply_window(&loaded.series, config), config, &policy));
            debug!(code = %code, elapsed_ms = t0.elapsed().as_millis() as u64, "asset done");
            (code.clone(), result)
        })
        .collect();

    let mut assets = Vec::new();
    let mut skipped = Vec::new();
    let mut failures = Vec::new();
    for (code, result) in results {
        match result {
            Ok(eval) => assets.push(eval),
            Err(RunError::InsufficientHistory {
                observations,
                required,
                ..
            }) => {
                debug!(code = %code, observations, required, "skipped: history too short");
                skipped.push(code);
            }
            Err(e) => {
                warn!(code = %code, error = %e, "asset evaluation failed");
                failures.push(AssetFailure {
                    code,
                    error: e.to_string(),
                });
            }
        }
    }

    let portfolio = aggregate_portfolio(&assets, request.total_amount);

    info!(
        evaluated = assets.len(),
        skipped = skipped.len(),
        failed = failures.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "evaluation finished"
    );

    Ok(EvaluationReport {
        schema_version: SCHEMA_VERSION,
        date: request.date,
        config_hash: config.config_hash(),
        assets,
        portfolio_summary: portfolio.summary,
        total_amount: portfolio.total_amount,
        total_position_amount: portfolio.total_position_amount,
        allocations: portfolio.allocations,
        skipped,
        failures,
    })
}
