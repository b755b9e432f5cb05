//! 構件清單查詢（依區域價格狀態篩選）
//!
//! 篩選條件以型別化述詞組合，所有值皆為綁定參數。

use chrono::NaiveDate;
use pricing_core::Piece;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Row};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::catalog::map_piece;
use crate::db::optional_decimal_at;
use crate::{SqliteStore, StoreResult};

/// 價格狀態篩選
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriceStatus {
    #[default]
    Any,
    /// 查詢日有有效發布價格
    Priced,
    /// 查詢日沒有有效發布價格
    Unpriced,
}

/// 構件清單查詢條件
#[derive(Debug, Clone)]
pub struct PieceQuery {
    pub zone_id: String,
    pub as_of: NaiveDate,
    pub status: PriceStatus,
    /// 代碼或名稱包含此字串
    pub search: Option<String>,
    pub limit: Option<u32>,
}

impl PieceQuery {
    pub fn new(zone_id: impl Into<String>, as_of: NaiveDate) -> Self {
        Self {
            zone_id: zone_id.into(),
            as_of,
            status: PriceStatus::Any,
            search: None,
            limit: None,
        }
    }

    pub fn with_status(mut self, status: PriceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// 構件清單列
#[derive(Debug, Clone, Serialize)]
pub struct PieceSummary {
    pub piece: Piece,
    /// 查詢日有效的最終價格
    pub current_price: Option<Decimal>,
    pub effective_date: Option<NaiveDate>,
}

/// 單一 WHERE 述詞
enum Predicate {
    Active,
    HasPrice,
    NoPrice,
    Matches(String),
}

impl Predicate {
    fn push(self, clauses: &mut Vec<&'static str>, values: &mut Vec<Value>) {
        match self {
            Predicate::Active => clauses.push("p.deleted_at IS NULL"),
            Predicate::HasPrice => clauses.push("pp.id IS NOT NULL"),
            Predicate::NoPrice => clauses.push("pp.id IS NULL"),
            Predicate::Matches(text) => {
                let pattern = format!("%{}%", escape_like(&text));
                clauses.push("(p.code LIKE ? ESCAPE '\\' OR p.name LIKE ? ESCAPE '\\')");
                values.push(Value::Text(pattern.clone()));
                values.push(Value::Text(pattern));
            }
        }
    }
}

fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn map_summary(row: &Row<'_>) -> rusqlite::Result<PieceSummary> {
    let base = optional_decimal_at(row, 8)?;
    let adjustment = optional_decimal_at(row, 9)?;
    Ok(PieceSummary {
        piece: map_piece(row)?,
        current_price: base.map(|b| b + adjustment.unwrap_or(Decimal::ZERO)),
        effective_date: row.get(10)?,
    })
}

impl SqliteStore {
    /// 列出構件及其查詢日有效的區域價格
    pub fn list_pieces(&self, query: &PieceQuery) -> StoreResult<Vec<PieceSummary>> {
        let as_of = query.as_of.format("%Y-%m-%d").to_string();
        let mut values = vec![
            Value::Text(query.zone_id.clone()),
            Value::Text(as_of.clone()),
            Value::Text(as_of),
        ];

        let mut predicates = vec![Predicate::Active];
        match query.status {
            PriceStatus::Any => {}
            PriceStatus::Priced => predicates.push(Predicate::HasPrice),
            PriceStatus::Unpriced => predicates.push(Predicate::NoPrice),
        }
        if let Some(search) = query.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                predicates.push(Predicate::Matches(search.to_string()));
            }
        }

        let mut clauses = Vec::new();
        for predicate in predicates {
            predicate.push(&mut clauses, &mut values);
        }

        let mut sql = format!(
            "SELECT p.id, p.code, p.name, p.unit, p.weight_tn_per_unit, p.volume_m3_per_unit,
                    p.steel_kg_per_unit, p.deleted_at,
                    pp.base_price, pp.adjustment, pp.effective_date
             FROM piece p
             LEFT JOIN piece_price pp
                ON pp.piece_id = p.id AND pp.zone_id = ?
               AND pp.effective_date <= ?
               AND (pp.expiry_date IS NULL OR pp.expiry_date >= ?)
             WHERE {}
             ORDER BY p.code",
            clauses.join(" AND ")
        );
        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            values.push(Value::Integer(i64::from(limit)));
        }

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), map_summary)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
