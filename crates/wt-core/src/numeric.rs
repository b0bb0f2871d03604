use crate::{WtError, WtResult};

/// Floating point type used throughout system
pub type Real = f64;

/// Absolute tolerance on the recovery/waste/recycle sum.
pub const DEFAULT_SPLIT_TOLERANCE: Real = 1e-9;

/// Stand-in for "zero" where the downstream solver needs a strictly positive value.
pub const NEGLIGIBLE: Real = 1e-6;

/// Reject NaN and infinities.
pub fn ensure_finite(v: Real, what: &'static str) -> WtResult<Real> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(WtError::NonFinite { what, value: v })
    }
}

/// Check that `v` is a finite value in `[0, 1]`.
pub fn ensure_fraction(v: Real, what: &'static str) -> WtResult<Real> {
    let v = ensure_finite(v, what)?;
    if (0.0..=1.0).contains(&v) {
        Ok(v)
    } else {
        Err(WtError::FractionOutOfRange { what, value: v })
    }
}

/// True when `parts` add up to one within an absolute tolerance.
pub fn sums_to_one(parts: &[Real], abs_tol: Real) -> bool {
    let sum: Real = parts.iter().sum();
    (sum - 1.0).abs() <= abs_tol
}
