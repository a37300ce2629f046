// ============ Tolerance Checks ============
// Contract outputs are compared to the oracle by relative error:
//   e(a, b) = 2 (a - b) / (|a| + |b|),  e(0, 0) = 0
// Positive means the contract (a) returned more than expected (b).

use thiserror::Error;

pub fn relative_error(a: f64, b: f64) -> f64 {
    if a == 0.0 && b == 0.0 {
        return 0.0;
    }
    2.0 * (a - b) / (a.abs() + b.abs())
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Error {error} is outside allowed range [{lower}, {upper}]{}", id_suffix(.id))]
pub struct ToleranceError {
    pub error: f64,
    pub lower: f64,
    pub upper: f64,
    pub id: Option<String>,
}

fn id_suffix(id: &Option<String>) -> String {
    id.as_ref()
        .map(|id| format!(" (ERR: {})", id))
        .unwrap_or_default()
}

/// `Ok(error)` when `lower <= e(a, b) <= upper`.
pub fn check_relative_error(
    a: f64,
    b: f64,
    lower: f64,
    upper: f64,
    id: Option<&str>,
) -> Result<f64, ToleranceError> {
    let error = relative_error(a, b);
    if lower <= error && error <= upper {
        return Ok(error);
    }
    Err(ToleranceError {
        error,
        lower,
        upper,
        id: id.map(str::to_string),
    })
}

#[track_caller]
pub fn assert_relative_error(a: f64, b: f64, lower: f64, upper: f64, id: Option<&str>) {
    if let Err(e) = check_relative_error(a, b, lower, upper, id) {
        panic!("{}", e);
    }
}

#[track_caller]
pub fn assert_abs_relative_error(a: f64, b: f64, bound: f64, id: Option<&str>) {
    assert_relative_error(a, b, -bound, bound, id);
}
