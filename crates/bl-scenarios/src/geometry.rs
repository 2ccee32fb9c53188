//! Scene geometry and pose samples in physical units (metres, y up).

use bl_rigid::Vec2;
use serde::{Deserialize, Serialize};

/// A point in scene space (metres).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn distance(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<Vec2> for Point {
    fn from(v: Vec2) -> Self {
        Point::new(v.x, v.y)
    }
}

impl From<Point> for Vec2 {
    fn from(p: Point) -> Self {
        Vec2::new(p.x, p.y)
    }
}

/// Axis-aligned box in scene space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    /// Square box of half-size `radius` around `center`.
    pub fn centered(center: Point, radius: f64) -> Self {
        Bounds {
            min: Point::new(center.x - radius, center.y - radius),
            max: Point::new(center.x + radius, center.y + radius),
        }
    }

    pub fn padded(mut self, pad: f64) -> Self {
        self.min.x -= pad;
        self.min.y -= pad;
        self.max.x += pad;
        self.max.y += pad;
        self
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point {
        Point::new(
            0.5 * (self.min.x + self.max.x),
            0.5 * (self.min.y + self.max.y),
        )
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// A labelled point, e.g. `"anchor"` or `"bob"`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NamedPoint {
    pub name: String,
    pub at: Point,
}

impl NamedPoint {
    pub fn new(name: impl Into<String>, at: Point) -> Self {
        Self {
            name: name.into(),
            at,
        }
    }
}

/// A labelled angle in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct NamedAngle {
    pub name: &'static str,
    pub degrees: f64,
}

/// Static layout of a scenario: extent, reference length, fixed anchors.
///
/// Recomputed whenever parameters change; the view layer maps it to pixels.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SceneGeometry {
    /// Extent the whole apparatus may occupy at any time.
    pub bounds: Bounds,
    /// Characteristic length (rope, plane, beam, ray) in metres.
    pub reference_length_m: f64,
    pub anchors: Vec<NamedPoint>,
}

/// Moving parts of a scenario at one instant.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PoseSample {
    pub points: Vec<NamedPoint>,
    pub angles: Vec<NamedAngle>,
}

impl PoseSample {
    pub fn point(&self, name: &str) -> Option<Point> {
        self.points.iter().find(|p| p.name == name).map(|p| p.at)
    }

    pub fn angle(&self, name: &str) -> Option<f64> {
        self.angles.iter().find(|a| a.name == name).map(|a| a.degrees)
    }

    pub fn is_finite(&self) -> bool {
        self.points.iter().all(|p| p.at.is_finite())
            && self.angles.iter().all(|a| a.degrees.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pose_lookup_by_name() {
        let pose = PoseSample {
            points: vec![NamedPoint::new("bob", Point::new(0.0, -1.0))],
            angles: vec![NamedAngle {
                name: "swing",
                degrees: 12.0,
            }],
        };
        assert_eq!(pose.point("bob"), Some(Point::new(0.0, -1.0)));
        assert_eq!(pose.angle("swing"), Some(12.0));
        assert!(pose.point("anchor").is_none());
    }
}
