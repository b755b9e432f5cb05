//! 主檔（區域、物料、構件）

use chrono::NaiveDateTime;
use pricing_core::{Material, Piece, PieceCatalog, PricingError, Zone};
use rusqlite::{params, OptionalExtension, Row};

use crate::db::{decimal_at, optional_decimal_at};
use crate::{SqliteStore, StoreError, StoreResult};

const ZONE_COLUMNS: &str = "id, code, name, deleted_at";
const MATERIAL_COLUMNS: &str =
    "id, code, name, category, unit, min_stock, max_stock, deleted_at";
const PIECE_COLUMNS: &str = "id, code, name, unit, weight_tn_per_unit, volume_m3_per_unit, \
     steel_kg_per_unit, deleted_at";

fn map_zone(row: &Row<'_>) -> rusqlite::Result<Zone> {
    Ok(Zone {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        deleted_at: row.get(3)?,
    })
}

fn map_material(row: &Row<'_>) -> rusqlite::Result<Material> {
    Ok(Material {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        category: row.get(3)?,
        unit: row.get(4)?,
        min_stock: decimal_at(row, 5)?,
        max_stock: optional_decimal_at(row, 6)?,
        deleted_at: row.get(7)?,
    })
}

pub(crate) fn map_piece(row: &Row<'_>) -> rusqlite::Result<Piece> {
    Ok(Piece {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        unit: row.get(3)?,
        weight_tn_per_unit: decimal_at(row, 4)?,
        volume_m3_per_unit: decimal_at(row, 5)?,
        steel_kg_per_unit: decimal_at(row, 6)?,
        deleted_at: row.get(7)?,
    })
}

impl SqliteStore {
    /// 新增或更新區域
    pub fn save_zone(&self, zone: &Zone) -> StoreResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO zone (id, code, name, deleted_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                code = excluded.code, name = excluded.name, deleted_at = excluded.deleted_at",
            params![zone.id, zone.code, zone.name, zone.deleted_at],
        )?;
        Ok(())
    }

    /// 新增或更新物料
    pub fn save_material(&self, material: &Material) -> StoreResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO material (id, code, name, category, unit, min_stock, max_stock, deleted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET
                code = excluded.code, name = excluded.name, category = excluded.category,
                unit = excluded.unit, min_stock = excluded.min_stock,
                max_stock = excluded.max_stock, deleted_at = excluded.deleted_at",
            params![
                material.id,
                material.code,
                material.name,
                material.category,
                material.unit,
                material.min_stock.to_string(),
                material.max_stock.map(|v| v.to_string()),
                material.deleted_at,
            ],
        )?;
        Ok(())
    }

    /// 新增或更新構件
    pub fn save_piece(&self, piece: &Piece) -> StoreResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO piece (id, code, name, unit, weight_tn_per_unit, volume_m3_per_unit,
                                steel_kg_per_unit, deleted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET
                code = excluded.code, name = excluded.name, unit = excluded.unit,
                weight_tn_per_unit = excluded.weight_tn_per_unit,
                volume_m3_per_unit = excluded.volume_m3_per_unit,
                steel_kg_per_unit = excluded.steel_kg_per_unit,
                deleted_at = excluded.deleted_at",
            params![
                piece.id,
                piece.code,
                piece.name,
                piece.unit,
                piece.weight_tn_per_unit.to_string(),
                piece.volume_m3_per_unit.to_string(),
                piece.steel_kg_per_unit.to_string(),
                piece.deleted_at,
            ],
        )?;
        Ok(())
    }

    /// 軟刪除物料（已刪除時不變）
    pub fn soft_delete_material(&self, material_id: &str, at: NaiveDateTime) -> StoreResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE material SET deleted_at = COALESCE(deleted_at, ?2) WHERE id = ?1",
            params![material_id, at],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound {
                entity: "物料",
                id: material_id.to_string(),
            });
        }
        Ok(())
    }

    fn find_zone(&self, zone_id: &str) -> StoreResult<Option<Zone>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM zone WHERE id = ?1", ZONE_COLUMNS);
        Ok(conn.query_row(&sql, params![zone_id], map_zone).optional()?)
    }

    fn find_material(&self, material_id: &str) -> StoreResult<Option<Material>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM material WHERE id = ?1", MATERIAL_COLUMNS);
        Ok(conn
            .query_row(&sql, params![material_id], map_material)
            .optional()?)
    }

    fn find_piece(&self, piece_id: &str) -> StoreResult<Option<Piece>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM piece WHERE id = ?1", PIECE_COLUMNS);
        Ok(conn.query_row(&sql, params![piece_id], map_piece).optional()?)
    }
}

impl PieceCatalog for SqliteStore {
    fn piece(&self, piece_id: &str) -> pricing_core::Result<Option<Piece>> {
        self.find_piece(piece_id).map_err(PricingError::from)
    }

    fn material(&self, material_id: &str) -> pricing_core::Result<Option<Material>> {
        self.find_material(material_id).map_err(PricingError::from)
    }

    fn zone(&self, zone_id: &str) -> pricing_core::Result<Option<Zone>> {
        self.find_zone(zone_id).map_err(PricingError::from)
    }
}
