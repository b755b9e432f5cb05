//! 構件配方維護

use pricing_core::{FormulaLine, FormulaWriter, PieceCatalog, PricingConfig, PricingError};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Arc;

/// 構件配方維護
///
/// 配方整批取代，不做部分更新。
pub struct FormulaEditor {
    catalog: Arc<dyn PieceCatalog>,
    writer: Arc<dyn FormulaWriter>,
    max_waste_factor: Decimal,
}

impl FormulaEditor {
    pub fn new(
        catalog: Arc<dyn PieceCatalog>,
        writer: Arc<dyn FormulaWriter>,
        config: &PricingConfig,
    ) -> Self {
        Self {
            catalog,
            writer,
            max_waste_factor: config.max_waste_factor,
        }
    }

    /// 驗證並取代構件配方
    pub fn replace_formula(
        &self,
        piece_id: &str,
        lines: Vec<FormulaLine>,
    ) -> pricing_core::Result<()> {
        self.catalog
            .piece(piece_id)?
            .filter(|p| p.is_active())
            .ok_or_else(|| PricingError::not_found("構件", piece_id))?;

        self.validate(piece_id, &lines)?;

        for line in &lines {
            self.catalog
                .material(&line.material_id)?
                .filter(|m| m.is_active())
                .ok_or_else(|| PricingError::not_found("物料", line.material_id.as_str()))?;
        }

        self.writer.replace_formula(piece_id, &lines)?;
        tracing::info!("構件 {} 配方已更新，共 {} 項物料", piece_id, lines.len());
        Ok(())
    }

    fn validate(&self, piece_id: &str, lines: &[FormulaLine]) -> pricing_core::Result<()> {
        let mut seen = HashSet::new();

        for line in lines {
            if line.piece_id != piece_id {
                return Err(PricingError::ValidationError(format!(
                    "配方行屬於構件 {}，不是 {}",
                    line.piece_id, piece_id
                )));
            }
            if !seen.insert(line.material_id.as_str()) {
                return Err(PricingError::ValidationError(format!(
                    "物料 {} 在配方中重複",
                    line.material_id
                )));
            }
            if line.quantity_per_unit <= Decimal::ZERO {
                return Err(PricingError::ValidationError(format!(
                    "物料 {} 用量必須大於 0: {}",
                    line.material_id, line.quantity_per_unit
                )));
            }
            if line.waste_factor < Decimal::ZERO || line.waste_factor > self.max_waste_factor {
                return Err(PricingError::ValidationError(format!(
                    "物料 {} 損耗係數超出範圍 [0, {}]: {}",
                    line.material_id, self.max_waste_factor, line.waste_factor
                )));
            }
        }

        Ok(())
    }
}
