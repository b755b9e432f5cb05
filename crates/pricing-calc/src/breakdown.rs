//! 構件成本拆解計算

use chrono::NaiveDate;
use pricing_core::period::month_start;
use pricing_core::{
    FormulaSource, MaterialPriceSource, PieceCatalog, PricingConfig, PricingError,
    ProcessParameterSource,
};
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::bom_resolver::{BomEntry, BomResolver};
use crate::process_params::ProcessParameterLookup;
use crate::zone_price::ZonePriceLookup;
use crate::{PricingWarning, WarningKind};

/// 物料成本明細
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialCostLine {
    pub material_id: String,
    pub material_name: String,
    pub unit: String,
    pub quantity_per_unit: Decimal,
    pub waste_factor: Decimal,

    /// 有效用量（含損耗）
    pub effective_quantity: Decimal,

    /// 單價（None 表示區域內沒有有效價格）
    pub unit_price: Option<Decimal>,

    /// 使用的價格記錄
    pub price_id: Option<Uuid>,

    /// 成本（缺價時為 0）
    pub cost: Decimal,

    pub is_optional: bool,
}

/// 缺少價格的物料
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingPrice {
    pub material_id: String,
    pub material_name: String,
    pub is_optional: bool,
}

/// 構件每計量單位價格拆解
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    pub piece_id: String,
    pub zone_id: String,
    pub as_of: NaiveDate,

    /// 物料成本明細
    pub lines: Vec<MaterialCostLine>,

    /// 物料成本
    pub materials_cost: Decimal,

    /// 每噸製程成本（能源、管銷、利潤、工程）
    pub process_cost_per_ton: Decimal,

    /// 混凝土人工成本
    pub labor_cost_concrete: Decimal,

    /// 鋼筋人工成本
    pub labor_cost_steel: Decimal,

    /// 合計
    pub total: Decimal,

    /// 缺少價格的物料
    pub missing_prices: Vec<MissingPrice>,

    /// 警告
    pub warnings: Vec<PricingWarning>,

    /// 使用的製程參數月份
    pub parameters_month: NaiveDate,

    /// 製程參數是否為之前月份
    pub parameters_fallback: bool,
}

impl Breakdown {
    /// 各成本項目加總
    pub fn components_sum(&self) -> Decimal {
        self.materials_cost + self.process_cost_per_ton + self.labor_cost_concrete + self.labor_cost_steel
    }

    /// 沒有缺價物料時才可發布
    pub fn is_publishable(&self) -> bool {
        self.missing_prices.is_empty()
    }

    /// 是否有配方
    pub fn has_formula(&self) -> bool {
        !self.warnings.iter().any(|w| w.kind == WarningKind::NoFormula)
    }

    pub fn missing_material_ids(&self) -> Vec<String> {
        self.missing_prices
            .iter()
            .map(|m| m.material_id.clone())
            .collect()
    }

    /// 以顯示精度四捨五入各項目，合計由四捨五入後的項目重新加總
    pub fn rounded(&self, config: &PricingConfig) -> Self {
        let mut rounded = self.clone();
        for line in &mut rounded.lines {
            line.cost = config.round(line.cost);
        }
        rounded.materials_cost = config.round(self.materials_cost);
        rounded.process_cost_per_ton = config.round(self.process_cost_per_ton);
        rounded.labor_cost_concrete = config.round(self.labor_cost_concrete);
        rounded.labor_cost_steel = config.round(self.labor_cost_steel);
        rounded.total = rounded.components_sum();
        rounded
    }
}

/// 構件成本拆解計算器
pub struct CostBreakdownCalculator {
    catalog: Arc<dyn PieceCatalog>,
    bom: BomResolver,
    prices: ZonePriceLookup,
    parameters: ProcessParameterLookup,
}

impl CostBreakdownCalculator {
    pub fn new(
        catalog: Arc<dyn PieceCatalog>,
        formulas: Arc<dyn FormulaSource>,
        prices: Arc<dyn MaterialPriceSource>,
        parameters: Arc<dyn ProcessParameterSource>,
        config: &PricingConfig,
    ) -> Self {
        Self {
            bom: BomResolver::new(catalog.clone(), formulas),
            prices: ZonePriceLookup::new(prices),
            parameters: ProcessParameterLookup::new(catalog.clone(), parameters, config),
            catalog,
        }
    }

    /// 計算構件於指定區域、日期的每計量單位價格
    ///
    /// 個別物料缺價只記錄於 `missing_prices`，不中斷計算；
    /// 沒有配方時回傳合計為 0 的拆解並附 `NoFormula` 警告。
    /// 構件不存在、區域不存在或完全沒有製程參數時回傳錯誤。
    pub fn calculate(
        &self,
        piece_id: &str,
        zone_id: &str,
        as_of: NaiveDate,
    ) -> pricing_core::Result<Breakdown> {
        tracing::info!("開始計算構件價格：構件 {}，區域 {}，日期 {}", piece_id, zone_id, as_of);
        let start_time = std::time::Instant::now();

        // Step 1: 配方展開
        let bom = self.bom.resolve(piece_id)?;
        let piece = self
            .catalog
            .piece(piece_id)?
            .ok_or_else(|| PricingError::not_found("構件", piece_id))?;

        if self.catalog.zone(zone_id)?.is_none() {
            return Err(PricingError::not_found("區域", zone_id));
        }

        let mut warnings = Vec::new();
        for material_id in &bom.excluded_materials {
            warnings.push(PricingWarning::info(
                WarningKind::ExcludedMaterial,
                format!("物料 {} 已停用或不存在，未計入成本", material_id),
            ));
        }

        // 沒有配方：合計為 0，不查詢製程參數
        if bom.is_empty() {
            let message = if bom.excluded_materials.is_empty() {
                format!("構件 {} 沒有定義配方", piece_id)
            } else {
                format!("構件 {} 的配方物料皆已停用", piece_id)
            };
            warnings.push(PricingWarning::warning(WarningKind::NoFormula, message));
            tracing::info!("構件 {} 沒有配方，合計為 0", piece_id);

            return Ok(Breakdown {
                piece_id: piece.id,
                zone_id: zone_id.to_string(),
                as_of,
                lines: Vec::new(),
                materials_cost: Decimal::ZERO,
                process_cost_per_ton: Decimal::ZERO,
                labor_cost_concrete: Decimal::ZERO,
                labor_cost_steel: Decimal::ZERO,
                total: Decimal::ZERO,
                missing_prices: Vec::new(),
                warnings,
                parameters_month: month_start(as_of),
                parameters_fallback: false,
            });
        }

        // Step 2: 製程參數（完全缺少時中斷）
        let lookup = self.parameters.parameters(zone_id, month_start(as_of))?;
        if lookup.is_fallback {
            warnings.push(PricingWarning::warning(
                WarningKind::ParametersFallback,
                format!(
                    "區域 {} 沒有 {} 的製程參數，使用 {} 的參數",
                    zone_id,
                    month_start(as_of).format("%Y-%m"),
                    lookup.parameters.month.format("%Y-%m")
                ),
            ));
        }

        // Step 3: 物料價格（並行查詢）
        tracing::debug!("查詢 {} 項物料價格", bom.entries.len());
        let lines = bom
            .entries
            .par_iter()
            .map(|entry| self.price_line(entry, zone_id, as_of))
            .collect::<pricing_core::Result<Vec<_>>>()?;

        let mut missing_prices = Vec::new();
        for line in lines.iter().filter(|l| l.unit_price.is_none()) {
            warnings.push(PricingWarning::error(
                WarningKind::MissingPrice,
                format!("物料 {} 在區域 {} 沒有有效價格", line.material_id, zone_id),
            ));
            missing_prices.push(MissingPrice {
                material_id: line.material_id.clone(),
                material_name: line.material_name.clone(),
                is_optional: line.is_optional,
            });
        }

        // Step 4: 成本彙總
        let params = &lookup.parameters;
        let materials_cost: Decimal = lines.iter().map(|l| l.cost).sum();
        let process_cost_per_ton = piece.weight_tn_per_unit * params.per_ton_total();
        let labor_cost_concrete =
            piece.volume_m3_per_unit * params.labor_hours_per_m3_concrete * params.hourly_labor_rate;
        let labor_cost_steel = piece.steel_kg_per_unit
            * (params.labor_hours_per_tn_steel / Decimal::ONE_THOUSAND)
            * params.hourly_labor_rate;
        let total = materials_cost + process_cost_per_ton + labor_cost_concrete + labor_cost_steel;

        tracing::info!(
            "構件 {} 價格計算完成：合計 {}，缺價物料 {} 項，耗時 {:?}",
            piece_id,
            total,
            missing_prices.len(),
            start_time.elapsed()
        );

        Ok(Breakdown {
            piece_id: piece.id,
            zone_id: zone_id.to_string(),
            as_of,
            lines,
            materials_cost,
            process_cost_per_ton,
            labor_cost_concrete,
            labor_cost_steel,
            total,
            missing_prices,
            warnings,
            parameters_month: lookup.parameters.month,
            parameters_fallback: lookup.is_fallback,
        })
    }

    /// 單一配方行計價
    fn price_line(
        &self,
        entry: &BomEntry,
        zone_id: &str,
        as_of: NaiveDate,
    ) -> pricing_core::Result<MaterialCostLine> {
        let price = self.prices.current_price(&entry.material_id, zone_id, as_of)?;
        let effective_quantity = entry.effective_quantity();
        let cost = price
            .as_ref()
            .map(|p| effective_quantity * p.price)
            .unwrap_or(Decimal::ZERO);

        Ok(MaterialCostLine {
            material_id: entry.material_id.clone(),
            material_name: entry.material_name.clone(),
            unit: entry.unit.clone(),
            quantity_per_unit: entry.quantity_per_unit,
            waste_factor: entry.waste_factor,
            effective_quantity,
            unit_price: price.as_ref().map(|p| p.price),
            price_id: price.map(|p| p.id),
            cost,
            is_optional: entry.is_optional,
        })
    }
}
