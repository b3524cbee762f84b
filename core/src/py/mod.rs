// Python-binding: tynne PyO3-innpakninger rundt JSON-laget i `json_api`.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::wrap_pyfunction;

use crate::json_api::{best_average_from_json, curve_series_from_json};

// ──────────────────────────────────────────────────────────────────────────────
// PyO3-FUNKSJONER — JSON STRING INN, JSON STRING UT
// ──────────────────────────────────────────────────────────────────────────────

#[pyfunction]
fn best_averages_json(json_in: &str) -> PyResult<String> {
    best_average_from_json(json_in).map_err(PyValueError::new_err)
}

#[pyfunction]
fn curve_series_json(json_in: &str) -> PyResult<String> {
    curve_series_from_json(json_in).map_err(PyValueError::new_err)
}

#[pyfunction]
fn metrics_text() -> String {
    crate::metrics::gather_text()
}

// ──────────────────────────────────────────────────────────────────────────────
// PyO3-MODUL
// ──────────────────────────────────────────────────────────────────────────────

#[pymodule]
fn powercurve_core(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(best_averages_json, m)?)?;
    m.add_function(wrap_pyfunction!(curve_series_json, m)?)?;
    m.add_function(wrap_pyfunction!(metrics_text, m)?)?;
    m.add("TIME_INTERVALS_IN_SECONDS_OVERALL", crate::durations::TIME_INTERVALS_IN_SECONDS_OVERALL.to_vec())?;
    Ok(())
}
