//! Coordinate mapping from scene space (metres, y up) to pixels (y down).
//!
//! `fit_scene` is a pure function of the scene bounds and the viewport: the
//! same inputs always give the same transform, so it is simply recomputed on
//! resize and on geometry change.

use bl_scenarios::{Bounds, Point};
use serde::{Deserialize, Serialize};

use crate::error::{ViewError, ViewResult};

/// Smallest extent (m) a bounds side is treated as having.
const MIN_EXTENT_M: f64 = 1e-6;
/// Smallest usable drawing area (px) once margins are removed.
const MIN_AREA_PX: f64 = 1.0;

/// Drawing surface size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> ViewResult<Self> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(ViewError::InvalidViewport { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn center(&self) -> (f64, f64) {
        (0.5 * self.width, 0.5 * self.height)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 500.0,
        }
    }
}

/// Uniform scale plus offset: `px = offset_x + scale·x`, `py = offset_y − scale·y`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SceneTransform {
    /// Pixels per metre
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl SceneTransform {
    pub fn to_pixels(&self, p: Point) -> (f64, f64) {
        (self.offset_x + self.scale * p.x, self.offset_y - self.scale * p.y)
    }

    pub fn length_px(&self, metres: f64) -> f64 {
        self.scale * metres
    }
}

/// Fit `bounds` into `viewport` leaving `margin_px` on every side, centred.
///
/// Degenerate input never produces NaN: zero-size bounds are widened to a
/// tiny extent, oversized margins shrink to a 1 px drawing area, and
/// non-finite bounds fall back to a unit scale around the viewport centre.
pub fn fit_scene(bounds: &Bounds, viewport: &Viewport, margin_px: f64) -> SceneTransform {
    let (cx_px, cy_px) = viewport.center();
    let finite = [bounds.min.x, bounds.min.y, bounds.max.x, bounds.max.y]
        .iter()
        .all(|v| v.is_finite());
    if !finite {
        return SceneTransform {
            scale: 1.0,
            offset_x: cx_px,
            offset_y: cy_px,
        };
    }

    let margin = if margin_px.is_finite() {
        margin_px.max(0.0)
    } else {
        0.0
    };
    let avail_w = (viewport.width - 2.0 * margin).max(MIN_AREA_PX);
    let avail_h = (viewport.height - 2.0 * margin).max(MIN_AREA_PX);
    let extent_w = bounds.width().abs().max(MIN_EXTENT_M);
    let extent_h = bounds.height().abs().max(MIN_EXTENT_M);
    let scale = (avail_w / extent_w).min(avail_h / extent_h);

    let center = bounds.center();
    SceneTransform {
        scale,
        offset_x: cx_px - scale * center.x,
        offset_y: cy_px + scale * center.y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(x0: f64, y0: f64, x1: f64, y1: f64) -> Bounds {
        Bounds {
            min: Point::new(x0, y0),
            max: Point::new(x1, y1),
        }
    }

    #[test]
    fn viewport_rejects_bad_sizes() {
        assert!(Viewport::new(0.0, 10.0).is_err());
        assert!(Viewport::new(10.0, -1.0).is_err());
        assert!(Viewport::new(f64::NAN, 10.0).is_err());
        assert!(Viewport::new(800.0, 500.0).is_ok());
    }

    #[test]
    fn wide_scene_is_limited_by_width() {
        let vp = Viewport::new(800.0, 500.0).unwrap();
        let t = fit_scene(&bounds(-4.0, -1.0, 4.0, 1.0), &vp, 0.0);
        assert!((t.scale - 100.0).abs() < 1e-12);
        assert_eq!(t.to_pixels(Point::new(-4.0, 0.0)), (0.0, 250.0));
        assert_eq!(t.to_pixels(Point::new(4.0, 0.0)), (800.0, 250.0));
    }

    #[test]
    fn y_axis_is_flipped() {
        let vp = Viewport::new(100.0, 100.0).unwrap();
        let t = fit_scene(&bounds(-1.0, -1.0, 1.0, 1.0), &vp, 0.0);
        let (_, top) = t.to_pixels(Point::new(0.0, 1.0));
        let (_, bottom) = t.to_pixels(Point::new(0.0, -1.0));
        assert!(top < bottom);
        assert_eq!(top, 0.0);
    }

    #[test]
    fn scene_center_lands_on_viewport_center() {
        let vp = Viewport::new(640.0, 480.0).unwrap();
        let b = bounds(3.0, 7.0, 5.0, 8.0);
        let t = fit_scene(&b, &vp, 20.0);
        let (x, y) = t.to_pixels(b.center());
        assert!((x - 320.0).abs() < 1e-9);
        assert!((y - 240.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_inputs_stay_finite() {
        let vp = Viewport::new(100.0, 50.0).unwrap();
        let point = bounds(1.0, 1.0, 1.0, 1.0);
        let t = fit_scene(&point, &vp, 10.0);
        assert!(t.scale.is_finite() && t.scale > 0.0);

        let t = fit_scene(&bounds(-1.0, -1.0, 1.0, 1.0), &vp, 1e6);
        assert!(t.scale.is_finite() && t.scale > 0.0);

        let t = fit_scene(&bounds(f64::NAN, 0.0, 1.0, 1.0), &vp, 0.0);
        assert_eq!(t.scale, 1.0);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn fitted_bounds_never_clip(
            x0 in -100.0f64..100.0, y0 in -100.0f64..100.0,
            w in 0.01f64..50.0, h in 0.01f64..50.0,
            vw in 50.0f64..4000.0, vh in 50.0f64..4000.0,
            margin in 0.0f64..20.0,
        ) {
            let b = Bounds { min: Point::new(x0, y0), max: Point::new(x0 + w, y0 + h) };
            let vp = Viewport::new(vw, vh).unwrap();
            let t = fit_scene(&b, &vp, margin);
            let eps = 1e-6 * vw.max(vh);
            for corner in [b.min, b.max, Point::new(b.min.x, b.max.y), Point::new(b.max.x, b.min.y)] {
                let (px, py) = t.to_pixels(corner);
                prop_assert!(px >= margin - eps && px <= vw - margin + eps);
                prop_assert!(py >= margin - eps && py <= vh - margin + eps);
            }
        }

        #[test]
        fn fit_touches_one_pair_of_edges(
            w in 0.01f64..50.0, h in 0.01f64..50.0,
            vw in 50.0f64..4000.0, vh in 50.0f64..4000.0,
        ) {
            let b = Bounds { min: Point::new(0.0, 0.0), max: Point::new(w, h) };
            let vp = Viewport::new(vw, vh).unwrap();
            let t = fit_scene(&b, &vp, 0.0);
            let used_w = t.length_px(w);
            let used_h = t.length_px(h);
            let tight_w = (used_w - vw).abs() < 1e-6 * vw;
            let tight_h = (used_h - vh).abs() < 1e-6 * vh;
            prop_assert!(tight_w || tight_h);
        }

        #[test]
        fn fit_is_deterministic(
            w in 0.01f64..50.0, h in 0.01f64..50.0, vw in 50.0f64..4000.0, vh in 50.0f64..4000.0,
        ) {
            let b = Bounds { min: Point::new(-w, -h), max: Point::new(w, h) };
            let vp = Viewport::new(vw, vh).unwrap();
            prop_assert_eq!(fit_scene(&b, &vp, 8.0), fit_scene(&b, &vp, 8.0));
        }
    }
}
