//! Angle conversion and canonical ranges.
//!
//! Two canonical ranges are in use:
//! - signed degrees in `[-180, 180)` (pendulum swing angle)
//! - unsigned degrees in `[0, 360)` (incline orientation)

use crate::numeric::Real;

#[inline]
pub fn deg_to_rad(deg: Real) -> Real {
    deg.to_radians()
}

#[inline]
pub fn rad_to_deg(rad: Real) -> Real {
    rad.to_degrees()
}

/// Wrap degrees into `[0, 360)`.
pub fn wrap_deg_unsigned(deg: Real) -> Real {
    let r = deg.rem_euclid(360.0);
    // rem_euclid rounds tiny negative inputs up to exactly 360.0
    if r >= 360.0 { 0.0 } else { r }
}

/// Wrap degrees into `[-180, 180)`.
pub fn wrap_deg_signed(deg: Real) -> Real {
    let r = wrap_deg_unsigned(deg + 180.0) - 180.0;
    if r >= 180.0 { -180.0 } else { r }
}

/// Angle in degrees of the vector `(x, y)` measured counter-clockwise from +x,
/// wrapped into `[0, 360)`.
pub fn heading_deg(x: Real, y: Real) -> Real {
    wrap_deg_unsigned(rad_to_deg(y.atan2(x)))
}

/// Angle in degrees of the vector `(x, y)` measured from the downward vertical
/// (`-y`), positive toward `+x`, wrapped into `[-180, 180)`.
pub fn swing_deg(x: Real, y: Real) -> Real {
    wrap_deg_signed(rad_to_deg(x.atan2(-y)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned_wrap_examples() {
        assert_eq!(wrap_deg_unsigned(0.0), 0.0);
        assert_eq!(wrap_deg_unsigned(360.0), 0.0);
        assert_eq!(wrap_deg_unsigned(-90.0), 270.0);
        assert_eq!(wrap_deg_unsigned(725.0), 5.0);
        assert_eq!(wrap_deg_unsigned(-1e-20), 0.0);
    }

    #[test]
    fn signed_wrap_examples() {
        assert_eq!(wrap_deg_signed(190.0), -170.0);
        assert_eq!(wrap_deg_signed(-190.0), 170.0);
        assert_eq!(wrap_deg_signed(45.0), 45.0);
        assert_eq!(wrap_deg_signed(180.0), -180.0);
    }

    #[test]
    fn heading_and_swing_quadrants() {
        assert!((heading_deg(0.0, 1.0) - 90.0).abs() < 1e-12);
        assert!((heading_deg(-1.0, 0.0) - 180.0).abs() < 1e-12);
        assert!((heading_deg(0.0, -1.0) - 270.0).abs() < 1e-12);
        // straight down is zero swing
        assert!(swing_deg(0.0, -1.0).abs() < 1e-12);
        assert!((swing_deg(1.0, -1.0) - 45.0).abs() < 1e-12);
        assert!((swing_deg(-1.0, -1.0) + 45.0).abs() < 1e-12);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn unsigned_wrap_stays_in_range(deg in -1.0e6_f64..1.0e6_f64) {
            let w = wrap_deg_unsigned(deg);
            prop_assert!((0.0..360.0).contains(&w));
        }

        #[test]
        fn signed_wrap_stays_in_range(deg in -1.0e6_f64..1.0e6_f64) {
            let w = wrap_deg_signed(deg);
            prop_assert!((-180.0..180.0).contains(&w));
        }

        #[test]
        fn signed_wrap_preserves_direction(deg in -1.0e4_f64..1.0e4_f64) {
            let w = wrap_deg_signed(deg).to_radians();
            let r = deg.to_radians();
            prop_assert!((w.sin() - r.sin()).abs() < 1e-9);
            prop_assert!((w.cos() - r.cos()).abs() < 1e-9);
        }
    }
}
