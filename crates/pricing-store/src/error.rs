//! 儲存層錯誤類型

use pricing_core::{PiecePrice, PricingError};
use thiserror::Error;

/// 儲存層錯誤類型
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("記錄未找到: {entity} with id={id}")]
    NotFound { entity: &'static str, id: String },

    #[error("資料庫鎖獲取失敗: {0}")]
    LockError(String),

    #[error("資料庫查詢失敗: {0}")]
    DatabaseQueryError(String),

    #[error("唯一約束違反: {0}")]
    UniqueConstraintViolation(String),

    #[error("外鍵約束違反: {0}")]
    ForeignKeyViolation(String),

    #[error("版本衝突: {message}")]
    VersionConflict {
        message: String,
        existing: Option<Box<PiecePrice>>,
    },

    #[error("欄位值錯誤 (column={column}): {message}")]
    FieldValueError { column: usize, message: String },
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) => {
                if msg.contains("UNIQUE") {
                    StoreError::UniqueConstraintViolation(msg)
                } else if msg.contains("FOREIGN KEY") {
                    StoreError::ForeignKeyViolation(msg)
                } else {
                    StoreError::DatabaseQueryError(msg)
                }
            }
            rusqlite::Error::FromSqlConversionFailure(column, _, cause) => {
                StoreError::FieldValueError {
                    column,
                    message: cause.to_string(),
                }
            }
            _ => StoreError::DatabaseQueryError(err.to_string()),
        }
    }
}

impl From<StoreError> for PricingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => PricingError::NotFound { entity, id },
            StoreError::UniqueConstraintViolation(message) => PricingError::Conflict {
                message,
                existing: None,
            },
            StoreError::VersionConflict { message, existing } => {
                PricingError::Conflict { message, existing }
            }
            StoreError::ForeignKeyViolation(message) => PricingError::ValidationError(message),
            other => PricingError::Storage(other.to_string()),
        }
    }
}

/// Result 類型別名
pub type StoreResult<T> = Result<T, StoreError>;
