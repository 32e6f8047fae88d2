//! Per-asset exposure ceilings: estimation from history and policy resolution.

pub mod estimate;
pub mod policy;

pub use estimate::{estimate_asset_cap, estimate_asset_caps, freq_factor, CapEstimate};
pub use policy::{resolve_asset_cap, AssetCapPolicy, AssetKind, AssetPolicy, DEFAULT_ASSET_CAP};
