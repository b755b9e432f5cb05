//! 物料區域價格（material_plant_price）

use chrono::NaiveDate;
use pricing_core::{
    plan_supersede, MaterialPlantPrice, MaterialPriceSource, MaterialPriceWriter, PricingError,
    Supersede,
};
use rusqlite::{params, Connection, Row, TransactionBehavior};

use crate::db::{decimal_at, uuid_at};
use crate::{SqliteStore, StoreError, StoreResult};

const COLUMNS: &str =
    "id, material_id, zone_id, price, valid_from, valid_until, is_active, created_by, created_at";

fn map_price(row: &Row<'_>) -> rusqlite::Result<MaterialPlantPrice> {
    Ok(MaterialPlantPrice {
        id: uuid_at(row, 0)?,
        material_id: row.get(1)?,
        zone_id: row.get(2)?,
        price: decimal_at(row, 3)?,
        valid_from: row.get(4)?,
        valid_until: row.get(5)?,
        is_active: row.get(6)?,
        created_by: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn query_prices(
    conn: &Connection,
    material_id: &str,
    zone_id: &str,
    active_only: bool,
) -> rusqlite::Result<Vec<MaterialPlantPrice>> {
    let sql = format!(
        "SELECT {} FROM material_plant_price
         WHERE material_id = ?1 AND zone_id = ?2 AND (?3 = 0 OR is_active = 1)
         ORDER BY valid_from",
        COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![material_id, zone_id, active_only], map_price)?
        .collect();
    rows
}

fn earliest(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Option<NaiveDate> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

impl SqliteStore {
    fn load_material_prices(
        &self,
        material_id: &str,
        zone_id: &str,
    ) -> StoreResult<Vec<MaterialPlantPrice>> {
        let conn = self.get_conn()?;
        Ok(query_prices(&conn, material_id, zone_id, false)?)
    }

    fn append_price(&self, price: &MaterialPlantPrice) -> StoreResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        // 停用記錄不參與版本接續
        let existing = if price.is_active {
            query_prices(&tx, &price.material_id, &price.zone_id, true)?
        } else {
            Vec::new()
        };

        let (close, new_end) = match plan_supersede(&existing, price.valid_from) {
            Supersede::Duplicate(_) => {
                return Err(StoreError::UniqueConstraintViolation(format!(
                    "物料 {} 區域 {} 於 {} 已有價格",
                    price.material_id, price.zone_id, price.valid_from
                )));
            }
            Supersede::Apply { close, new_end } => (close, new_end),
        };

        if let Some((idx, until)) = close {
            tx.execute(
                "UPDATE material_plant_price SET valid_until = ?2 WHERE id = ?1",
                params![existing[idx].id.to_string(), until],
            )?;
            tracing::debug!(
                "關閉物料價格 {}（valid_until = {}）",
                existing[idx].id,
                until
            );
        }

        tx.execute(
            "INSERT INTO material_plant_price
                (id, material_id, zone_id, price, valid_from, valid_until, is_active, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                price.id.to_string(),
                price.material_id,
                price.zone_id,
                price.price.to_string(),
                price.valid_from,
                earliest(new_end, price.valid_until),
                price.is_active,
                price.created_by,
                price.created_at,
            ],
        )?;

        tx.commit()?;
        Ok(())
    }
}

impl MaterialPriceSource for SqliteStore {
    fn material_prices(
        &self,
        material_id: &str,
        zone_id: &str,
    ) -> pricing_core::Result<Vec<MaterialPlantPrice>> {
        self.load_material_prices(material_id, zone_id)
            .map_err(PricingError::from)
    }
}

impl MaterialPriceWriter for SqliteStore {
    fn append_material_price(&self, price: &MaterialPlantPrice) -> pricing_core::Result<()> {
        self.append_price(price).map_err(PricingError::from)
    }
}
