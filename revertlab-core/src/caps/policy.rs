//! Per-asset policy ceilings.
//!
//! The policy cap is a hard upper bound: the volatility-derived suggestion can
//! only tighten it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::codes::is_etf_code;

/// Ceiling applied to codes the policy has no entry for.
pub const DEFAULT_ASSET_CAP: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Etf,
    OpenFund,
}

impl AssetKind {
    pub fn for_code(code: &str) -> Self {
        if is_etf_code(code) {
            AssetKind::Etf
        } else {
            AssetKind::OpenFund
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetPolicy {
    pub name: String,
    pub kind: AssetKind,
    pub asset_cap: f64,
    #[serde(default = "default_risk_level")]
    pub risk_level: String,
    #[serde(default)]
    pub notes: String,
}

fn default_risk_level() -> String {
    "medium".to_string()
}

/// Mapping from asset code to its configured ceiling, plus a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetCapPolicy {
    pub default_cap: f64,
    pub assets: BTreeMap<String, AssetPolicy>,
}

impl Default for AssetCapPolicy {
    fn default() -> Self {
        Self {
            default_cap: DEFAULT_ASSET_CAP,
            assets: BTreeMap::new(),
        }
    }
}

impl AssetCapPolicy {
    /// Dynamic policy: one entry per distinct code at `default_cap`.
    ///
    /// Blank codes are skipped; the first occurrence of a code wins.
    pub fn for_codes<S: AsRef<str>>(codes: &[S], default_cap: f64) -> Self {
        let mut assets = BTreeMap::new();
        for code in codes {
            let code = code.as_ref().trim();
            if code.is_empty() || assets.contains_key(code) {
                continue;
            }
            assets.insert(
                code.to_string(),
                AssetPolicy {
                    name: format!("FUND_{code}"),
                    kind: AssetKind::for_code(code),
                    asset_cap: default_cap,
                    risk_level: default_risk_level(),
                    notes: String::new(),
                },
            );
        }
        Self {
            default_cap,
            assets,
        }
    }

    /// Replace the ceiling for `code`, adding an entry if needed.
    pub fn with_override(mut self, code: &str, asset_cap: f64) -> Self {
        self.assets
            .entry(code.to_string())
            .and_modify(|p| p.asset_cap = asset_cap)
            .or_insert_with(|| AssetPolicy {
                name: format!("FUND_{code}"),
                kind: AssetKind::for_code(code),
                asset_cap,
                risk_level: default_risk_level(),
                notes: "configured override".to_string(),
            });
        self
    }

    /// Configured ceiling for `code`, or the default.
    pub fn cap_for(&self, code: &str) -> f64 {
        self.assets
            .get(code)
            .map_or(self.default_cap, |p| p.asset_cap)
    }
}

/// `min(policy cap, suggested)`.
pub fn resolve_asset_cap(code: &str, policy: &AssetCapPolicy, suggested: f64) -> f64 {
    policy.cap_for(code).min(suggested)
}
