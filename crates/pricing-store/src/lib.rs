//! # Pricing Store
//!
//! 報價引擎的 SQLite 儲存層，實作 `pricing_core::ports` 的所有讀寫介面。
//!
//! 時態寫入（物料價格、構件發布價格）在單一 IMMEDIATE 交易內完成
//! 「關閉現行記錄 + 新增記錄」，並以唯一索引保證同一起始日只有一筆。

pub mod catalog;
pub mod db;
pub mod error;
pub mod formula;
pub mod material_price;
pub mod parameters;
pub mod piece_price;
pub mod piece_query;

pub use error::{StoreError, StoreResult};
pub use piece_query::{PieceQuery, PieceSummary, PriceStatus};

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// SQLite 儲存
///
/// 連線以 `Arc<Mutex<_>>` 共享，clone 後指向同一連線。
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// 開啟（或建立）資料庫檔案並執行 migration
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        tracing::info!("開啟報價資料庫: {}", path.as_ref().display());
        Self::from_connection(conn)
    }

    /// 記憶體資料庫（測試與示範用）
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> StoreResult<Self> {
        db::configure_sqlite_connection(&conn)?;
        db::migrate(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub(crate) fn get_conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::LockError(e.to_string()))
    }
}
