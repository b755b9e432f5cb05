//! # Pricing FFI
//!
//! Python 綁定層（PyO3）

use pyo3::prelude::*;

pub mod python;

/// Python 模組註冊
#[pymodule]
fn pricing_engine(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<python::PyPricingEngine>()?;
    m.add("ConflictError", m.py().get_type::<python::ConflictError>())?;
    Ok(())
}
