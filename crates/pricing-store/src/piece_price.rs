//! 構件發布價格（piece_price）

use chrono::NaiveDate;
use pricing_core::{
    plan_supersede, PiecePrice, PiecePriceSource, PiecePriceWriter, PricingError, Supersede,
};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use crate::db::{decimal_at, uuid_at};
use crate::{SqliteStore, StoreError, StoreResult};

const COLUMNS: &str = "id, piece_id, zone_id, base_price, adjustment, effective_date, \
     expiry_date, created_by, created_at";

fn map_piece_price(row: &Row<'_>) -> rusqlite::Result<PiecePrice> {
    Ok(PiecePrice {
        id: uuid_at(row, 0)?,
        piece_id: row.get(1)?,
        zone_id: row.get(2)?,
        base_price: decimal_at(row, 3)?,
        adjustment: decimal_at(row, 4)?,
        effective_date: row.get(5)?,
        expiry_date: row.get(6)?,
        created_by: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn query_piece_prices(
    conn: &Connection,
    piece_id: &str,
    zone_id: &str,
) -> rusqlite::Result<Vec<PiecePrice>> {
    let sql = format!(
        "SELECT {} FROM piece_price
         WHERE piece_id = ?1 AND zone_id = ?2
         ORDER BY effective_date DESC",
        COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![piece_id, zone_id], map_piece_price)?
        .collect();
    rows
}

impl SqliteStore {
    fn load_piece_prices(&self, piece_id: &str, zone_id: &str) -> StoreResult<Vec<PiecePrice>> {
        let conn = self.get_conn()?;
        Ok(query_piece_prices(&conn, piece_id, zone_id)?)
    }

    fn find_latest_piece_price(
        &self,
        piece_id: &str,
        zone_id: &str,
        on_or_before: NaiveDate,
    ) -> StoreResult<Option<PiecePrice>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM piece_price
             WHERE piece_id = ?1 AND zone_id = ?2 AND effective_date <= ?3
             ORDER BY effective_date DESC
             LIMIT 1",
            COLUMNS
        );
        Ok(conn
            .query_row(&sql, params![piece_id, zone_id, on_or_before], map_piece_price)
            .optional()?)
    }

    fn insert_price(&self, price: &PiecePrice) -> StoreResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut existing = query_piece_prices(&tx, &price.piece_id, &price.zone_id)?;

        let (close, new_end) = match plan_supersede(&existing, price.effective_date) {
            Supersede::Duplicate(idx) => {
                let current = existing.swap_remove(idx);
                return Err(StoreError::VersionConflict {
                    message: format!(
                        "構件 {} 區域 {} 於 {} 已有發布價格",
                        price.piece_id, price.zone_id, price.effective_date
                    ),
                    existing: Some(Box::new(current)),
                });
            }
            Supersede::Apply { close, new_end } => (close, new_end),
        };

        if let Some((idx, expiry)) = close {
            tx.execute(
                "UPDATE piece_price SET expiry_date = ?2 WHERE id = ?1",
                params![existing[idx].id.to_string(), expiry],
            )?;
            tracing::debug!("關閉發布價格 {}（expiry = {}）", existing[idx].id, expiry);
        }

        tx.execute(
            "INSERT INTO piece_price
                (id, piece_id, zone_id, base_price, adjustment, effective_date, expiry_date,
                 created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                price.id.to_string(),
                price.piece_id,
                price.zone_id,
                price.base_price.to_string(),
                price.adjustment.to_string(),
                price.effective_date,
                new_end,
                price.created_by,
                price.created_at,
            ],
        )?;

        tx.commit()?;
        Ok(())
    }
}

impl PiecePriceSource for SqliteStore {
    fn piece_prices(&self, piece_id: &str, zone_id: &str) -> pricing_core::Result<Vec<PiecePrice>> {
        self.load_piece_prices(piece_id, zone_id)
            .map_err(PricingError::from)
    }

    fn latest_piece_price(
        &self,
        piece_id: &str,
        zone_id: &str,
        on_or_before: NaiveDate,
    ) -> pricing_core::Result<Option<PiecePrice>> {
        self.find_latest_piece_price(piece_id, zone_id, on_or_before)
            .map_err(PricingError::from)
    }
}

impl PiecePriceWriter for SqliteStore {
    fn insert_piece_price(&self, price: &PiecePrice) -> pricing_core::Result<()> {
        self.insert_price(price).map_err(PricingError::from)
    }
}
