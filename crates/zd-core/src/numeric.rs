use crate::{CoreError, CoreResult};

pub type Real = f64;

/// Absolute and relative tolerance for float comparison.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Tolerances {
    pub const fn new(abs: Real, rel: Real) -> Self {
        Self { abs, rel }
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self::new(1e-12, 1e-9)
    }
}

/// `|a - b| <= abs` or `|a - b| <= rel · max(|a|, |b|)`.
pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    diff <= tol.abs || diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(value: Real, what: &'static str) -> CoreResult<Real> {
    match value.is_finite() {
        true => Ok(value),
        false => Err(CoreError::NonFinite { what, value }),
    }
}

/// `+1`, `-1`, or `0` for either signed zero, unlike [`f64::signum`].
pub fn sign(x: Real) -> Real {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// `x` wrapped into `[0, period)`. `period` must be positive.
pub fn wrap_into_period(x: Real, period: Real) -> Real {
    let wrapped = x % period;
    if wrapped < 0.0 { wrapped + period } else { wrapped }
}
