//! 構件配方（piece_material_formula）

use pricing_core::{FormulaLine, FormulaSource, FormulaWriter, PricingError};
use rusqlite::{params, Row};

use crate::db::decimal_at;
use crate::{SqliteStore, StoreResult};

fn map_line(row: &Row<'_>) -> rusqlite::Result<FormulaLine> {
    Ok(FormulaLine {
        piece_id: row.get(0)?,
        material_id: row.get(1)?,
        quantity_per_unit: decimal_at(row, 2)?,
        waste_factor: decimal_at(row, 3)?,
        is_optional: row.get(4)?,
        notes: row.get(5)?,
    })
}

impl SqliteStore {
    fn load_formula(&self, piece_id: &str) -> StoreResult<Vec<FormulaLine>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT piece_id, material_id, quantity_per_unit, waste_factor, is_optional, notes
             FROM piece_material_formula
             WHERE piece_id = ?1
             ORDER BY position",
        )?;
        let lines = stmt
            .query_map(params![piece_id], map_line)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(lines)
    }

    fn write_formula(&self, piece_id: &str, lines: &[FormulaLine]) -> StoreResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM piece_material_formula WHERE piece_id = ?1",
            params![piece_id],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO piece_material_formula
                    (piece_id, material_id, quantity_per_unit, waste_factor, is_optional, notes, position)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for (position, line) in lines.iter().enumerate() {
                stmt.execute(params![
                    piece_id,
                    line.material_id,
                    line.quantity_per_unit.to_string(),
                    line.waste_factor.to_string(),
                    line.is_optional,
                    line.notes,
                    position as i64,
                ])?;
            }
        }

        tx.commit()?;
        tracing::debug!("構件 {} 配方寫入 {} 筆", piece_id, lines.len());
        Ok(())
    }
}

impl FormulaSource for SqliteStore {
    fn formula_lines(&self, piece_id: &str) -> pricing_core::Result<Vec<FormulaLine>> {
        self.load_formula(piece_id).map_err(PricingError::from)
    }
}

impl FormulaWriter for SqliteStore {
    fn replace_formula(&self, piece_id: &str, lines: &[FormulaLine]) -> pricing_core::Result<()> {
        self.write_formula(piece_id, lines)
            .map_err(PricingError::from)
    }
}
