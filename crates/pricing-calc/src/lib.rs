//! # Piece Pricing Engine
//!
//! 構件價格計算引擎：配方展開、區域價格查詢、製程參數查詢、
//! 成本拆解、歷史比較與價格發布

pub mod bom_resolver;
pub mod breakdown;
pub mod comparator;
pub mod formula_editor;
pub mod price_setter;
pub mod process_params;
pub mod publisher;
pub mod zone_price;

#[cfg(test)]
pub(crate) mod testing;

// Re-export 主要類型
pub use bom_resolver::{BomEntry, BomResolver, ResolvedBom};
pub use breakdown::{Breakdown, CostBreakdownCalculator, MaterialCostLine, MissingPrice};
pub use comparator::{Comparison, HistoricalComparator, Trend};
pub use formula_editor::FormulaEditor;
pub use price_setter::MaterialPriceSetter;
pub use process_params::{ParameterEditor, ParameterLookup, ProcessParameterLookup};
pub use publisher::{PricePublisher, PublishRequest};
pub use zone_price::ZonePriceLookup;

use serde::{Deserialize, Serialize};

/// 計算警告（不中斷計算）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingWarning {
    pub kind: WarningKind,
    pub message: String,
    pub severity: WarningSeverity,
}

impl PricingWarning {
    pub fn new(kind: WarningKind, message: String, severity: WarningSeverity) -> Self {
        Self {
            kind,
            message,
            severity,
        }
    }

    pub fn info(kind: WarningKind, message: String) -> Self {
        Self::new(kind, message, WarningSeverity::Info)
    }

    pub fn warning(kind: WarningKind, message: String) -> Self {
        Self::new(kind, message, WarningSeverity::Warning)
    }

    pub fn error(kind: WarningKind, message: String) -> Self {
        Self::new(kind, message, WarningSeverity::Error)
    }
}

/// 警告種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// 構件沒有配方
    NoFormula,
    /// 配方中的物料已停用或不存在，已排除
    ExcludedMaterial,
    /// 物料在區域內沒有有效價格
    MissingPrice,
    /// 製程參數使用之前月份
    ParametersFallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningSeverity {
    Info,
    Warning,
    Error,
}
