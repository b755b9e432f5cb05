//! 物料區域價格設定（手動維護與批次匯入共用）

use chrono::NaiveDate;
use pricing_core::{
    Clock, MaterialPlantPrice, MaterialPriceWriter, PieceCatalog, PricingError,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

/// 物料區域價格設定
pub struct MaterialPriceSetter {
    catalog: Arc<dyn PieceCatalog>,
    writer: Arc<dyn MaterialPriceWriter>,
    clock: Arc<dyn Clock>,
}

impl MaterialPriceSetter {
    pub fn new(
        catalog: Arc<dyn PieceCatalog>,
        writer: Arc<dyn MaterialPriceWriter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalog,
            writer,
            clock,
        }
    }

    /// 設定物料於區域的新價格
    ///
    /// 現行價格於 `valid_from` 前一天關閉，新價格成為現行價格。
    pub fn set_price(
        &self,
        material_id: &str,
        zone_id: &str,
        price: Decimal,
        valid_from: NaiveDate,
        created_by: &str,
    ) -> pricing_core::Result<Uuid> {
        if price < Decimal::ZERO {
            return Err(PricingError::ValidationError(format!(
                "物料 {} 價格不可為負: {}",
                material_id, price
            )));
        }

        self.catalog
            .material(material_id)?
            .filter(|m| m.is_active())
            .ok_or_else(|| PricingError::not_found("物料", material_id))?;
        self.catalog
            .zone(zone_id)?
            .filter(|z| z.is_active())
            .ok_or_else(|| PricingError::not_found("區域", zone_id))?;

        let record = MaterialPlantPrice::new(
            material_id.to_string(),
            zone_id.to_string(),
            price,
            valid_from,
            self.clock.now(),
        )
        .with_created_by(created_by.to_string());

        self.writer.append_material_price(&record)?;

        tracing::info!(
            "物料 {} 區域 {} 新價格 {}（生效 {}）",
            material_id,
            zone_id,
            price,
            valid_from
        );
        Ok(record.id)
    }
}
