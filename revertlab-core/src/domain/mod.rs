//! Domain types for RevertLab

pub mod price;
pub mod state;

pub use price::{PricePoint, PriceSeries, SeriesError};
pub use state::{DayMark, TradeState};

/// Asset code type alias (numeric fund/ETF identifier, e.g. "510300").
pub type AssetCode = String;
