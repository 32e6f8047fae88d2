//! Evaluation configuration loaded from TOML.
//!
//! Every section and field is optional:
//!
//! ```toml
//! [signal]
//! lookback_n = 5
//! th_big = -0.05
//!
//! [risk]
//! hard_stop_dd = 0.10
//! probe_clock = "calendar_days"
//!
//! [cost]
//! fee_bps = 10.0
//!
//! [data]
//! start_date = "2015-01-01"
//!
//! [policy]
//! default_cap = 0.3
//!
//! [policy.assets."510300"]
//! asset_cap = 0.5
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use revertlab_core::caps::{AssetCapPolicy, DEFAULT_ASSET_CAP};
use revertlab_core::params::{
    CapEstimateParams, CostParams, ExportParams, RiskParams, SignalParams, StrategyParams,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// History before this date is ignored.
    pub start_date: Option<NaiveDate>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::from_ymd_opt(2015, 1, 1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetOverride {
    pub asset_cap: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub default_cap: f64,
    pub assets: BTreeMap<String, AssetOverride>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            default_cap: DEFAULT_ASSET_CAP,
            assets: BTreeMap::new(),
        }
    }
}

/// Everything one evaluation needs besides the codes and the data.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub signal: SignalParams,
    pub risk: RiskParams,
    pub cost: CostParams,
    pub cap_estimate: CapEstimateParams,
    pub export: ExportParams,
    pub data: DataConfig,
    pub policy: PolicyConfig,
}

impl EvaluationConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(format!("serialize: {e}")))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));
        let unit = |x: f64| (0.0..=1.0).contains(&x);
        let non_negative = |x: f64| x >= 0.0;

        if self.signal.lookback_n == 0 {
            return invalid("signal.lookback_n must be at least 1".into());
        }
        if self.signal.th_big.is_nan() || self.signal.th_big >= 0.0 {
            return invalid(format!("signal.th_big must be negative, got {}", self.signal.th_big));
        }

        let r = &self.risk;
        if r.hard_stop_dd <= 0.0 || r.hard_stop_dd >= 1.0 || r.hard_stop_dd.is_nan() {
            return invalid(format!("risk.hard_stop_dd must be in (0, 1), got {}", r.hard_stop_dd));
        }
        if !non_negative(r.rebound_y) || !non_negative(r.unfavorable_x) {
            return invalid("risk.rebound_y and risk.unfavorable_x must be non-negative".into());
        }
        for (name, cap) in [
            ("cap_idle", r.cap_idle),
            ("cap_probe", r.cap_probe),
            ("cap_active", r.cap_active),
            ("cap_cooldown", r.cap_cooldown),
        ] {
            if !unit(cap) {
                return invalid(format!("risk.{name} must be in [0, 1], got {cap}"));
            }
        }

        if !non_negative(self.cost.fee_bps) {
            return invalid(format!("cost.fee_bps must be non-negative, got {}", self.cost.fee_bps));
        }

        let c = &self.cap_estimate;
        if c.lookback_n == 0 {
            return invalid("cap_estimate.lookback_n must be at least 1".into());
        }
        if c.target_vol.is_nan() || c.target_vol <= 0.0 {
            return invalid(format!("cap_estimate.target_vol must be positive, got {}", c.target_vol));
        }
        if c.min_history < 2 {
            return invalid("cap_estimate.min_history must be at least 2".into());
        }

        if !non_negative(self.export.rebalance_threshold) {
            return invalid("export.rebalance_threshold must be non-negative".into());
        }

        if !unit(self.policy.default_cap) {
            return invalid(format!(
                "policy.default_cap must be in [0, 1], got {}",
                self.policy.default_cap
            ));
        }
        for (code, o) in &self.policy.assets {
            if !unit(o.asset_cap) {
                return invalid(format!(
                    "policy.assets.{code}.asset_cap must be in [0, 1], got {}",
                    o.asset_cap
                ));
            }
        }
        Ok(())
    }

    pub fn strategy_params(&self) -> StrategyParams {
        StrategyParams {
            signal: self.signal,
            risk: self.risk,
            cost: self.cost,
        }
    }

    /// Dynamic policy for `codes` with configured per-asset overrides applied.
    pub fn policy_for<S: AsRef<str>>(&self, codes: &[S]) -> AssetCapPolicy {
        self.policy.assets.iter().fold(
            AssetCapPolicy::for_codes(codes, self.policy.default_cap),
            |policy, (code, o)| policy.with_override(code, o.asset_cap),
        )
    }

    /// BLAKE3 hex digest of the canonical JSON form.
    pub fn config_hash(&self) -> String {
        // Plain structs of numbers, strings, and maps always serialize.
        let json = serde_json::to_vec(self).unwrap_or_default();
        blake3::hash(&json).to_hex().to_string()
    }
}
