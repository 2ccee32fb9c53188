use crate::CoreError;

/// Floating point type used throughout system
pub type Real = f64;

/// Absolute + relative tolerance pair.
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Clamp `v` into `[min, max]`, reporting whether clamping happened.
pub fn clamp_report(v: Real, min: Real, max: Real) -> (Real, bool) {
    let clamped = v.clamp(min, max);
    (clamped, clamped != v)
}

/// Replace a non-finite value by `fallback`.
///
/// Used at the rendering boundary so NaN/Infinity never leave the core.
pub fn finite_or(v: Real, fallback: Real) -> Real {
    if v.is_finite() { v } else { fallback }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn clamp_report_flags_only_changed_values() {
        assert_eq!(clamp_report(0.5, 0.0, 1.0), (0.5, false));
        assert_eq!(clamp_report(1.5, 0.0, 1.0), (1.0, true));
        assert_eq!(clamp_report(-2.0, 0.0, 1.0), (0.0, true));
    }

    #[test]
    fn finite_or_replaces_infinity() {
        assert_eq!(finite_or(Real::INFINITY, 0.0), 0.0);
        assert_eq!(finite_or(Real::NAN, -1.0), -1.0);
        assert_eq!(finite_or(2.5, 0.0), 2.5);
    }
}
