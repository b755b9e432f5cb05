//! 配方（BOM）展開

use pricing_core::{FormulaSource, PieceCatalog, PricingError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 展開後的配方行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomEntry {
    pub material_id: String,
    pub material_name: String,
    pub unit: String,
    pub quantity_per_unit: Decimal,
    pub waste_factor: Decimal,
    pub is_optional: bool,
}

impl BomEntry {
    /// 有效用量 = 單位用量 × (1 + 損耗係數)
    pub fn effective_quantity(&self) -> Decimal {
        self.quantity_per_unit * (Decimal::ONE + self.waste_factor)
    }
}

/// 配方展開結果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedBom {
    /// 有效物料的配方行
    pub entries: Vec<BomEntry>,

    /// 因物料停用或不存在而排除的物料ID
    pub excluded_materials: Vec<String>,
}

impl ResolvedBom {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 配方展開器
///
/// 只回傳目錄中有效（未軟刪除）的物料。
pub struct BomResolver {
    catalog: Arc<dyn PieceCatalog>,
    formulas: Arc<dyn FormulaSource>,
}

impl BomResolver {
    pub fn new(catalog: Arc<dyn PieceCatalog>, formulas: Arc<dyn FormulaSource>) -> Self {
        Self { catalog, formulas }
    }

    /// 展開構件配方
    pub fn resolve(&self, piece_id: &str) -> pricing_core::Result<ResolvedBom> {
        let piece = self
            .catalog
            .piece(piece_id)?
            .filter(|p| p.is_active())
            .ok_or_else(|| PricingError::not_found("構件", piece_id))?;

        let lines = self.formulas.formula_lines(&piece.id)?;
        let mut resolved = ResolvedBom::default();

        for line in lines {
            match self.catalog.material(&line.material_id)? {
                Some(material) if material.is_active() => {
                    resolved.entries.push(BomEntry {
                        material_id: material.id,
                        material_name: material.name,
                        unit: material.unit,
                        quantity_per_unit: line.quantity_per_unit,
                        waste_factor: line.waste_factor,
                        is_optional: line.is_optional,
                    });
                }
                _ => {
                    tracing::debug!(
                        "構件 {} 配方物料 {} 已停用或不存在，排除",
                        piece_id,
                        line.material_id
                    );
                    resolved.excluded_materials.push(line.material_id);
                }
            }
        }

        Ok(resolved)
    }
}
