//! Python 綁定實現
//!
//! 金額以字串傳遞（避免浮點誤差），日期格式為 `YYYY-MM-DD`，
//! 結構化結果以 JSON 字串回傳。

use chrono::NaiveDate;
use pricing::PricingEngine;
use pricing_calc::PublishRequest;
use pricing_core::{PricingConfig, PricingError};
use pricing_store::{PieceQuery, PriceStatus};
use pyo3::exceptions::{PyLookupError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;
use uuid::Uuid;

pyo3::create_exception!(pricing_engine, ConflictError, pyo3::exceptions::PyException);

fn to_py_err(err: PricingError) -> PyErr {
    match &err {
        PricingError::NotFound { .. } => PyLookupError::new_err(err.to_string()),
        PricingError::Conflict { .. } => ConflictError::new_err(err.to_string()),
        PricingError::MissingConfiguration { .. }
        | PricingError::IncompletePricing { .. }
        | PricingError::ValidationError(_) => PyValueError::new_err(err.to_string()),
        PricingError::Storage(_) => PyRuntimeError::new_err(err.to_string()),
    }
}

fn parse_date(value: &str) -> PyResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| PyValueError::new_err(format!("Invalid date '{}': {}", value, e)))
}

fn parse_decimal(value: &str) -> PyResult<Decimal> {
    Decimal::from_str(value.trim())
        .map_err(|e| PyValueError::new_err(format!("Invalid decimal '{}': {}", value, e)))
}

fn to_json<T: Serialize>(value: &T) -> PyResult<String> {
    serde_json::to_string(value).map_err(|e| PyRuntimeError::new_err(e.to_string()))
}

fn id_string(id: Uuid) -> String {
    id.hyphenated().to_string()
}

/// Python 報價引擎
#[pyclass(name = "PricingEngine")]
pub struct PyPricingEngine {
    inner: PricingEngine,
}

#[pymethods]
impl PyPricingEngine {
    #[new]
    #[pyo3(signature = (db_path, config_json=None))]
    fn new(db_path: &str, config_json: Option<&str>) -> PyResult<Self> {
        let config = match config_json {
            Some(json) => PricingConfig::from_json_str(json).map_err(to_py_err)?,
            None => PricingConfig::new(),
        };
        let inner = PricingEngine::open(db_path, config).map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// 計算構件價格，回傳 `{"breakdown": ..., "comparison": ...}` JSON
    #[pyo3(signature = (piece_id, zone_id, date=None, compare=false))]
    fn calculate(
        &self,
        piece_id: &str,
        zone_id: &str,
        date: Option<&str>,
        compare: bool,
    ) -> PyResult<String> {
        let date = date.map(parse_date).transpose()?;
        let quote = self
            .inner
            .calculate_price(piece_id, zone_id, date, compare)
            .map_err(to_py_err)?;
        to_json(&quote)
    }

    /// 與上次發布價格比較，回傳 comparison JSON
    fn compare(&self, piece_id: &str, zone_id: &str) -> PyResult<String> {
        let quote = self
            .inner
            .calculate_price(piece_id, zone_id, None, true)
            .map_err(to_py_err)?;
        to_json(&quote.comparison)
    }

    /// 發布構件價格，回傳新價格記錄ID
    #[pyo3(signature = (piece_id, zone_id, effective_date, created_by, adjustment="0"))]
    fn publish(
        &self,
        piece_id: &str,
        zone_id: &str,
        effective_date: &str,
        created_by: &str,
        adjustment: &str,
    ) -> PyResult<String> {
        let request = PublishRequest::new(parse_date(effective_date)?, created_by.to_string())
            .with_adjustment(parse_decimal(adjustment)?);
        self.inner
            .publish_price(piece_id, zone_id, &request)
            .map(id_string)
            .map_err(to_py_err)
    }

    /// 設定物料區域價格，回傳新價格記錄ID
    fn set_price(
        &self,
        material_id: &str,
        zone_id: &str,
        price: &str,
        valid_from: &str,
        created_by: &str,
    ) -> PyResult<String> {
        self.inner
            .set_material_price(
                material_id,
                zone_id,
                parse_decimal(price)?,
                parse_date(valid_from)?,
                created_by,
            )
            .map(id_string)
            .map_err(to_py_err)
    }

    /// 發布價格歷史 JSON（依生效日遞減）
    fn price_history(&self, piece_id: &str, zone_id: &str) -> PyResult<String> {
        let history = self
            .inner
            .price_history(piece_id, zone_id)
            .map_err(to_py_err)?;
        to_json(&history)
    }

    /// 列出構件；status 為 "any"、"priced" 或 "unpriced"
    #[pyo3(signature = (zone_id, as_of, status="any", search=None, limit=None))]
    fn list_pieces(
        &self,
        zone_id: &str,
        as_of: &str,
        status: &str,
        search: Option<&str>,
        limit: Option<u32>,
    ) -> PyResult<String> {
        let status = match status {
            "any" => PriceStatus::Any,
            "priced" => PriceStatus::Priced,
            "unpriced" => PriceStatus::Unpriced,
            other => {
                return Err(PyValueError::new_err(format!(
                    "Invalid status: {}, must be 'any', 'priced', or 'unpriced'",
                    other
                )))
            }
        };

        let mut query = PieceQuery::new(zone_id, parse_date(as_of)?).with_status(status);
        if let Some(search) = search {
            query = query.with_search(search);
        }
        if let Some(limit) = limit {
            query = query.with_limit(limit);
        }

        let rows = self.inner.list_pieces(&query).map_err(to_py_err)?;
        to_json(&rows)
    }
}
