//! 物料、區域與物料區域價格模型

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 物料（目錄主檔）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// 物料ID
    pub id: String,

    /// 物料代碼
    pub code: String,

    /// 物料名稱
    pub name: String,

    /// 分類（鋼筋、水泥、骨材...）
    pub category: String,

    /// 計量單位（kg、m3、un...）
    pub unit: String,

    /// 最低庫存
    pub min_stock: Decimal,

    /// 最高庫存
    pub max_stock: Option<Decimal>,

    /// 軟刪除時間（None 表示有效）
    pub deleted_at: Option<NaiveDateTime>,
}

impl Material {
    /// 創建新的物料
    pub fn new(id: String, name: String, unit: String) -> Self {
        Self {
            code: id.clone(),
            id,
            name,
            category: String::new(),
            unit,
            min_stock: Decimal::ZERO,
            max_stock: None,
            deleted_at: None,
        }
    }

    /// 建構器模式：設置代碼
    pub fn with_code(mut self, code: String) -> Self {
        self.code = code;
        self
    }

    /// 建構器模式：設置分類
    pub fn with_category(mut self, category: String) -> Self {
        self.category = category;
        self
    }

    /// 建構器模式：設置庫存上下限
    pub fn with_stock_thresholds(mut self, min: Decimal, max: Option<Decimal>) -> Self {
        self.min_stock = min;
        self.max_stock = max;
        self
    }

    /// 建構器模式：標記為已刪除
    pub fn deleted(mut self, at: NaiveDateTime) -> Self {
        self.deleted_at = Some(at);
        self
    }

    /// 是否為有效物料
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// 區域（工廠/生產據點）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    pub code: String,
    pub name: String,
    pub deleted_at: Option<NaiveDateTime>,
}

impl Zone {
    pub fn new(id: String, name: String) -> Self {
        Self {
            code: id.clone(),
            id,
            name,
            deleted_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// 物料區域價格（時態資料）
///
/// 同一 (material_id, zone_id) 任一時間最多只有一筆 `valid_until = None` 的現行價格。
/// 價格變更時關閉現行價格並新增一筆，歷史只增不改。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialPlantPrice {
    /// 價格記錄ID
    pub id: Uuid,

    /// 物料ID
    pub material_id: String,

    /// 區域ID
    pub zone_id: String,

    /// 單價（每計量單位）
    pub price: Decimal,

    /// 生效日期（含）
    pub valid_from: NaiveDate,

    /// 失效日期（含，None 表示現行價格）
    pub valid_until: Option<NaiveDate>,

    /// 是否啟用
    pub is_active: bool,

    /// 建立者
    pub created_by: Option<String>,

    /// 建立時間
    pub created_at: NaiveDateTime,
}

impl MaterialPlantPrice {
    /// 創建新的現行價格記錄
    pub fn new(
        material_id: String,
        zone_id: String,
        price: Decimal,
        valid_from: NaiveDate,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            material_id,
            zone_id,
            price,
            valid_from,
            valid_until: None,
            is_active: true,
            created_by: None,
            created_at,
        }
    }

    /// 建構器模式：設置失效日期
    pub fn with_valid_until(mut self, valid_until: NaiveDate) -> Self {
        self.valid_until = Some(valid_until);
        self
    }

    /// 建構器模式：設置建立者
    pub fn with_created_by(mut self, created_by: String) -> Self {
        self.created_by = Some(created_by);
        self
    }

    /// 建構器模式：停用
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// 是否為現行（未關閉）價格
    pub fn is_open(&self) -> bool {
        self.valid_until.is_none()
    }

    /// 指定日期是否落在有效期間內
    pub fn is_valid_on(&self, date: NaiveDate) -> bool {
        self.is_active
            && self.valid_from <= date
            && self.valid_until.map_or(true, |until| until >= date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_material_active_flag() {
        let material = Material::new("STEEL".to_string(), "鋼筋".to_string(), "kg".to_string());
        assert!(material.is_active());
        assert_eq!(material.code, "STEEL");

        let deleted = material.deleted(ts());
        assert!(!deleted.is_active());
    }

    #[test]
    fn test_price_validity_window() {
        let price = MaterialPlantPrice::new(
            "STEEL".to_string(),
            "Z1".to_string(),
            Decimal::from(2),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            ts(),
        )
        .with_valid_until(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());

        assert!(!price.is_valid_on(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()));
        assert!(price.is_valid_on(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));
        // 失效日期當天仍有效
        assert!(price.is_valid_on(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()));
        assert!(!price.is_valid_on(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()));
        assert!(!price.is_open());
    }

    #[test]
    fn test_inactive_price_never_valid() {
        let price = MaterialPlantPrice::new(
            "STEEL".to_string(),
            "Z1".to_string(),
            Decimal::from(2),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            ts(),
        )
        .inactive();

        assert!(price.is_open());
        assert!(!price.is_valid_on(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()));
    }
}
