//! 區域物料價格查詢

use chrono::NaiveDate;
use pricing_core::{MaterialPlantPrice, MaterialPriceSource};
use std::sync::Arc;

/// 區域物料價格查詢
pub struct ZonePriceLookup {
    prices: Arc<dyn MaterialPriceSource>,
}

impl ZonePriceLookup {
    pub fn new(prices: Arc<dyn MaterialPriceSource>) -> Self {
        Self { prices }
    }

    /// 查詢指定日期有效的物料價格
    ///
    /// 沒有價格時回傳 `None`（不是 0）。
    pub fn current_price(
        &self,
        material_id: &str,
        zone_id: &str,
        as_of: NaiveDate,
    ) -> pricing_core::Result<Option<MaterialPlantPrice>> {
        let history = self.prices.material_prices(material_id, zone_id)?;
        let candidates = history.iter().filter(|p| p.is_valid_on(as_of)).count();
        if candidates > 1 {
            tracing::warn!(
                "物料 {} 區域 {} 於 {} 有 {} 筆有效價格，取最新生效者",
                material_id,
                zone_id,
                as_of,
                candidates
            );
        }
        Ok(select_current(history, as_of))
    }
}

/// 從價格歷史中選出指定日期有效的價格
///
/// 多筆同時有效時（資料異常）：生效日最晚者優先，其次建立時間最晚，再其次 ID 最大。
pub fn select_current(
    history: Vec<MaterialPlantPrice>,
    as_of: NaiveDate,
) -> Option<MaterialPlantPrice> {
    history
        .into_iter()
        .filter(|p| p.is_valid_on(as_of))
        .max_by(|a, b| {
            a.valid_from
                .cmp(&b.valid_from)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.id.cmp(&b.id))
        })
}
