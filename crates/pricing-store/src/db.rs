//! SQLite 連線設定與資料表結構

use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 目前資料表結構版本
pub const SCHEMA_VERSION: i64 = 1;

/// 套用統一的連線設定
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 讀取 schema_version（表不存在時回傳 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
}

/// 建立資料表（可重複執行）
///
/// 時態表的唯一索引：
/// - 同一起始日只能有一筆
/// - 同一 (物料, 區域) / (構件, 區域) 最多一筆現行記錄
pub fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    if read_schema_version(conn)? == Some(SCHEMA_VERSION) {
        return Ok(());
    }

    conn.execute_batch(
        r#"
        BEGIN;

        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS zone (
            id TEXT PRIMARY KEY,
            code TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            deleted_at TEXT
        );

        CREATE TABLE IF NOT EXISTS material (
            id TEXT PRIMARY KEY,
            code TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            category TEXT NOT NULL DEFAULT '',
            unit TEXT NOT NULL,
            min_stock TEXT NOT NULL DEFAULT '0',
            max_stock TEXT,
            deleted_at TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_material_active ON material(id) WHERE deleted_at IS NULL;

        CREATE TABLE IF NOT EXISTS piece (
            id TEXT PRIMARY KEY,
            code TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            unit TEXT NOT NULL,
            weight_tn_per_unit TEXT NOT NULL DEFAULT '0',
            volume_m3_per_unit TEXT NOT NULL DEFAULT '0',
            steel_kg_per_unit TEXT NOT NULL DEFAULT '0',
            deleted_at TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_piece_active ON piece(id) WHERE deleted_at IS NULL;

        CREATE TABLE IF NOT EXISTS material_plant_price (
            id TEXT PRIMARY KEY,
            material_id TEXT NOT NULL REFERENCES material(id),
            zone_id TEXT NOT NULL REFERENCES zone(id),
            price TEXT NOT NULL,
            valid_from TEXT NOT NULL,
            valid_until TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_by TEXT,
            created_at TEXT NOT NULL
        );
        CREATE UNIQUE INDEX IF NOT EXISTS ux_material_price_start
            ON material_plant_price(material_id, zone_id, valid_from) WHERE is_active = 1;
        CREATE UNIQUE INDEX IF NOT EXISTS ux_material_price_open
            ON material_plant_price(material_id, zone_id) WHERE valid_until IS NULL AND is_active = 1;

        CREATE TABLE IF NOT EXISTS piece_material_formula (
            piece_id TEXT NOT NULL REFERENCES piece(id),
            material_id TEXT NOT NULL REFERENCES material(id),
            quantity_per_unit TEXT NOT NULL,
            waste_factor TEXT NOT NULL DEFAULT '0',
            is_optional INTEGER NOT NULL DEFAULT 0,
            notes TEXT,
            position INTEGER NOT NULL,
            PRIMARY KEY (piece_id, material_id)
        );

        CREATE TABLE IF NOT EXISTS process_parameters (
            zone_id TEXT NOT NULL REFERENCES zone(id),
            month TEXT NOT NULL,
            curing_energy_per_tn TEXT NOT NULL,
            factory_overhead_per_tn TEXT NOT NULL,
            company_overhead_per_tn TEXT NOT NULL,
            profit_per_tn TEXT NOT NULL,
            engineering_per_tn TEXT NOT NULL,
            hourly_labor_rate TEXT NOT NULL,
            labor_hours_per_tn_steel TEXT NOT NULL,
            labor_hours_per_m3_concrete TEXT NOT NULL,
            PRIMARY KEY (zone_id, month)
        );

        CREATE TABLE IF NOT EXISTS piece_price (
            id TEXT PRIMARY KEY,
            piece_id TEXT NOT NULL REFERENCES piece(id),
            zone_id TEXT NOT NULL REFERENCES zone(id),
            base_price TEXT NOT NULL,
            adjustment TEXT NOT NULL DEFAULT '0',
            effective_date TEXT NOT NULL,
            expiry_date TEXT,
            created_by TEXT NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE (piece_id, zone_id, effective_date)
        );
        CREATE UNIQUE INDEX IF NOT EXISTS ux_piece_price_open
            ON piece_price(piece_id, zone_id) WHERE expiry_date IS NULL;

        INSERT OR IGNORE INTO schema_version (version) VALUES (1);

        COMMIT;
        "#,
    )
}

/// 讀取以 TEXT 儲存的 Decimal 欄位
pub(crate) fn decimal_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let text: String = row.get(idx)?;
    Decimal::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn optional_decimal_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(text) => Decimal::from_str(&text).map(Some).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
        }),
        None => Ok(None),
    }
}

/// 讀取以 TEXT 儲存的 UUID 欄位
pub(crate) fn uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let text: String = row.get(idx)?;
    Uuid::parse_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
