//! 資料存取介面
//!
//! 報價引擎各元件只透過這些 trait 讀寫資料，由呼叫端注入實作
//! （SQLite 儲存層、快取或測試替身）。

use chrono::NaiveDate;

use crate::{
    FormulaLine, Material, MaterialPlantPrice, Piece, PiecePrice, ProcessParameters, Result, Zone,
};

/// 主檔目錄（構件、物料、區域）
pub trait PieceCatalog: Send + Sync {
    fn piece(&self, piece_id: &str) -> Result<Option<Piece>>;

    /// 包含已軟刪除的物料，由呼叫端決定是否排除
    fn material(&self, material_id: &str) -> Result<Option<Material>>;

    fn zone(&self, zone_id: &str) -> Result<Option<Zone>>;
}

/// 構件配方讀取
pub trait FormulaSource: Send + Sync {
    fn formula_lines(&self, piece_id: &str) -> Result<Vec<FormulaLine>>;
}

/// 構件配方寫入
pub trait FormulaWriter: Send + Sync {
    /// 以單一交易刪除舊配方並寫入新配方，讀取端不會看到空配方的中間狀態
    fn replace_formula(&self, piece_id: &str, lines: &[FormulaLine]) -> Result<()>;
}

/// 物料區域價格讀取
pub trait MaterialPriceSource: Send + Sync {
    /// 指定物料、區域的所有價格記錄（含歷史與停用記錄，順序不保證）
    fn material_prices(&self, material_id: &str, zone_id: &str)
        -> Result<Vec<MaterialPlantPrice>>;
}

/// 物料區域價格寫入
pub trait MaterialPriceWriter: Send + Sync {
    /// 原子地關閉現行價格並新增價格
    ///
    /// 同一 (material, zone, valid_from) 已存在時回傳 `Conflict`。
    fn append_material_price(&self, price: &MaterialPlantPrice) -> Result<()>;
}

/// 製程參數讀取
pub trait ProcessParameterSource: Send + Sync {
    /// 月份不晚於 `month` 的最新一筆參數
    fn latest_parameters(&self, zone_id: &str, month: NaiveDate)
        -> Result<Option<ProcessParameters>>;
}

/// 製程參數寫入
pub trait ProcessParameterWriter: Send + Sync {
    /// 依 (zone, month) 新增或覆蓋
    fn save_parameters(&self, params: &ProcessParameters) -> Result<()>;
}

/// 構件發布價格讀取
pub trait PiecePriceSource: Send + Sync {
    /// 指定構件、區域的所有發布價格（依生效日遞減）
    fn piece_prices(&self, piece_id: &str, zone_id: &str) -> Result<Vec<PiecePrice>>;

    /// 生效日不晚於 `on_or_before` 的最新發布價格
    fn latest_piece_price(
        &self,
        piece_id: &str,
        zone_id: &str,
        on_or_before: NaiveDate,
    ) -> Result<Option<PiecePrice>> {
        Ok(self
            .piece_prices(piece_id, zone_id)?
            .into_iter()
            .filter(|p| p.effective_date <= on_or_before)
            .max_by_key(|p| p.effective_date))
    }
}

/// 構件發布價格寫入
pub trait PiecePriceWriter: Send + Sync {
    /// 原子地關閉現行價格並新增發布價格
    ///
    /// 同一 (piece, zone, effective_date) 已存在時回傳 `Conflict`（附上既有價格）。
    fn insert_piece_price(&self, price: &PiecePrice) -> Result<()>;
}
