//! # Pricing Core
//!
//! 預鑄構件報價核心資料模型、配置與資料存取介面

pub mod config;
pub mod material;
pub mod period;
pub mod piece;
pub mod ports;
pub mod process;
pub mod versioning;

// Re-export 主要類型
pub use config::PricingConfig;
pub use material::{Material, MaterialPlantPrice, Zone};
pub use period::{Clock, FixedClock, SystemClock};
pub use piece::{FormulaLine, Piece, PiecePrice};
pub use ports::{
    FormulaSource, FormulaWriter, MaterialPriceSource, MaterialPriceWriter, PieceCatalog,
    PiecePriceSource, PiecePriceWriter, ProcessParameterSource, ProcessParameterWriter,
};
pub use process::ProcessParameters;
pub use versioning::{plan_supersede, Supersede, Versioned};

use chrono::NaiveDate;

/// 報價錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("找不到{entity}: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("區域 {zone_id} 缺少製程參數（{month} 及之前皆無設定）")]
    MissingConfiguration { zone_id: String, month: NaiveDate },

    #[error("物料缺少區域價格，無法發布: {}", materials.join(", "))]
    IncompletePricing { materials: Vec<String> },

    #[error("資料衝突: {message}")]
    Conflict {
        message: String,
        /// 已存在的發布價格（供操作人員參考）
        existing: Option<Box<PiecePrice>>,
    },

    #[error("資料驗證失敗: {0}")]
    ValidationError(String),

    #[error("儲存層錯誤: {0}")]
    Storage(String),
}

impl PricingError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
            existing: None,
        }
    }

    /// 是否為衝突錯誤（重複發布）
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

pub type Result<T> = std::result::Result<T, PricingError>;
