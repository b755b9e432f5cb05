//! 構件、配方（BOM）與發布價格模型

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 預鑄構件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Piece {
    /// 構件ID
    pub id: String,

    /// 構件代碼
    pub code: String,

    /// 構件名稱
    pub name: String,

    /// 計量單位（un、ml、m2...）
    pub unit: String,

    /// 每計量單位重量（噸）
    pub weight_tn_per_unit: Decimal,

    /// 每計量單位混凝土體積（m3）
    pub volume_m3_per_unit: Decimal,

    /// 每計量單位鋼筋用量（kg）
    pub steel_kg_per_unit: Decimal,

    /// 軟刪除時間
    pub deleted_at: Option<NaiveDateTime>,
}

impl Piece {
    /// 創建新的構件（技術參數預設為 0）
    pub fn new(id: String, name: String, unit: String) -> Self {
        Self {
            code: id.clone(),
            id,
            name,
            unit,
            weight_tn_per_unit: Decimal::ZERO,
            volume_m3_per_unit: Decimal::ZERO,
            steel_kg_per_unit: Decimal::ZERO,
            deleted_at: None,
        }
    }

    /// 建構器模式：設置技術參數
    pub fn with_technical(
        mut self,
        weight_tn_per_unit: Decimal,
        volume_m3_per_unit: Decimal,
        steel_kg_per_unit: Decimal,
    ) -> Self {
        self.weight_tn_per_unit = weight_tn_per_unit;
        self.volume_m3_per_unit = volume_m3_per_unit;
        self.steel_kg_per_unit = steel_kg_per_unit;
        self
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// 構件配方行（BOM 明細）
///
/// 損耗係數為比例：有效用量 = 單位用量 × (1 + 損耗係數)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaLine {
    /// 構件ID
    pub piece_id: String,

    /// 物料ID
    pub material_id: String,

    /// 每計量單位用量
    pub quantity_per_unit: Decimal,

    /// 損耗係數（0.05 = 5%）
    pub waste_factor: Decimal,

    /// 是否為選用物料
    pub is_optional: bool,

    /// 備註
    pub notes: Option<String>,
}

impl FormulaLine {
    /// 創建新的配方行
    pub fn new(piece_id: String, material_id: String, quantity_per_unit: Decimal) -> Self {
        Self {
            piece_id,
            material_id,
            quantity_per_unit,
            waste_factor: Decimal::ZERO,
            is_optional: false,
            notes: None,
        }
    }

    /// 建構器模式：設置損耗係數
    pub fn with_waste_factor(mut self, waste_factor: Decimal) -> Self {
        self.waste_factor = waste_factor;
        self
    }

    /// 建構器模式：設為選用
    pub fn as_optional(mut self) -> Self {
        self.is_optional = true;
        self
    }

    /// 建構器模式：設置備註
    pub fn with_notes(mut self, notes: String) -> Self {
        self.notes = Some(notes);
        self
    }

    /// 有效用量（含損耗）
    pub fn effective_quantity(&self) -> Decimal {
        self.quantity_per_unit * (Decimal::ONE + self.waste_factor)
    }
}

/// 構件發布價格（時態資料）
///
/// `final_price` 由 `base_price + adjustment` 推導，不獨立儲存。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiecePrice {
    /// 發布價格ID
    pub id: Uuid,

    /// 構件ID
    pub piece_id: String,

    /// 區域ID
    pub zone_id: String,

    /// 計算基準價
    pub base_price: Decimal,

    /// 人工調整
    pub adjustment: Decimal,

    /// 生效日期
    pub effective_date: NaiveDate,

    /// 失效日期（None 表示現行價格）
    pub expiry_date: Option<NaiveDate>,

    /// 建立者
    pub created_by: String,

    /// 建立時間
    pub created_at: NaiveDateTime,
}

impl PiecePrice {
    /// 創建新的現行發布價格
    pub fn new(
        piece_id: String,
        zone_id: String,
        base_price: Decimal,
        effective_date: NaiveDate,
        created_by: String,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            piece_id,
            zone_id,
            base_price,
            adjustment: Decimal::ZERO,
            effective_date,
            expiry_date: None,
            created_by,
            created_at,
        }
    }

    /// 建構器模式：設置調整金額
    pub fn with_adjustment(mut self, adjustment: Decimal) -> Self {
        self.adjustment = adjustment;
        self
    }

    /// 建構器模式：設置失效日期
    pub fn with_expiry_date(mut self, expiry_date: NaiveDate) -> Self {
        self.expiry_date = Some(expiry_date);
        self
    }

    /// 最終價格
    pub fn final_price(&self) -> Decimal {
        self.base_price + self.adjustment
    }

    pub fn is_open(&self) -> bool {
        self.expiry_date.is_none()
    }

    /// 指定日期是否在有效期間內
    pub fn is_valid_on(&self, date: NaiveDate) -> bool {
        self.effective_date <= date && self.expiry_date.map_or(true, |expiry| expiry >= date)
    }
}
