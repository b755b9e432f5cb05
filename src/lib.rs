//! # Precast Pricing
//!
//! 預鑄構件報價引擎門面：組裝儲存、快取與計算元件。

pub mod engine;
pub mod logging;

pub use engine::{PriceQuote, PricingEngine};

pub use pricing_calc::{Breakdown, Comparison, PublishRequest, Trend};
pub use pricing_core::{PricingConfig, PricingError, Result};
pub use pricing_store::{PieceQuery, PriceStatus, SqliteStore};
