//! Bodies, joints and the handles that address them.

use crate::error::{EngineError, EngineResult};

/// World-space 2D vector (metres, y up).
pub type Vec2 = nalgebra::Vector2<f64>;

/// Handle to a body inside one world. Only meaningful for the world that issued it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub(crate) u32);

impl BodyHandle {
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Handle to a joint inside one world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct JointHandle(pub(crate) u32);

impl JointHandle {
    pub fn index(self) -> u32 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyKind {
    /// Never moves; ignores gravity.
    Static,
    /// Integrated every step.
    Dynamic,
}

/// Description of a body to insert.
#[derive(Clone, Debug)]
pub struct BodyDesc {
    pub kind: BodyKind,
    pub position: Vec2,
    /// Mass (kg), must be positive for dynamic bodies
    pub mass: f64,
    pub label: &'static str,
}

impl BodyDesc {
    pub fn fixed(label: &'static str, position: Vec2) -> Self {
        Self {
            kind: BodyKind::Static,
            position,
            mass: 0.0,
            label,
        }
    }

    pub fn dynamic(label: &'static str, position: Vec2, mass: f64) -> Self {
        Self {
            kind: BodyKind::Dynamic,
            position,
            mass,
            label,
        }
    }

    pub(crate) fn validate(&self) -> EngineResult<()> {
        if !self.position.iter().all(|c| c.is_finite()) {
            return Err(EngineError::InvalidArg {
                what: "body position must be finite",
            });
        }
        if self.kind == BodyKind::Dynamic && !(self.mass.is_finite() && self.mass > 0.0) {
            return Err(EngineError::InvalidArg {
                what: "dynamic body mass must be positive",
            });
        }
        Ok(())
    }
}

/// Kinematic state of a body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyState {
    pub position: Vec2,
    pub velocity: Vec2,
}

impl BodyState {
    pub fn at_rest(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::zeros(),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.position.iter().chain(self.velocity.iter()).all(|c| c.is_finite())
    }
}

/// Constraint attaching one dynamic body to the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Joint {
    /// Rigid rope of fixed `length` from a world-space `anchor`.
    Distance { anchor: Vec2, length: f64 },
    /// Body confined to the line through `origin` along unit `direction`,
    /// with Coulomb friction coefficient `friction` (static = kinetic).
    Track {
        origin: Vec2,
        direction: Vec2,
        friction: f64,
    },
}

impl Joint {
    /// Build a track joint, normalizing `direction`.
    pub fn track(origin: Vec2, direction: Vec2, friction: f64) -> EngineResult<Self> {
        let norm = direction.norm();
        if !(norm.is_finite() && norm > 1e-12) {
            return Err(EngineError::InvalidArg {
                what: "track direction must be non-zero",
            });
        }
        let joint = Joint::Track {
            origin,
            direction: direction / norm,
            friction,
        };
        joint.validate()?;
        Ok(joint)
    }

    pub(crate) fn validate(&self) -> EngineResult<()> {
        match *self {
            Joint::Distance { anchor, length } => {
                if !anchor.iter().all(|c| c.is_finite()) {
                    return Err(EngineError::InvalidArg {
                        what: "rope anchor must be finite",
                    });
                }
                if !(length.is_finite() && length > 0.0) {
                    return Err(EngineError::InvalidArg {
                        what: "rope length must be positive",
                    });
                }
            }
            Joint::Track {
                origin,
                direction,
                friction,
            } => {
                if !origin.iter().all(|c| c.is_finite()) {
                    return Err(EngineError::InvalidArg {
                        what: "track origin must be finite",
                    });
                }
                if !((direction.norm() - 1.0).abs() < 1e-9) {
                    return Err(EngineError::InvalidArg {
                        what: "track direction must be a unit vector",
                    });
                }
                if !(friction.is_finite() && friction >= 0.0) {
                    return Err(EngineError::InvalidArg {
                        what: "friction must be non-negative",
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_normalizes_direction() {
        let joint = Joint::track(Vec2::zeros(), Vec2::new(3.0, 4.0), 0.1).unwrap();
        match joint {
            Joint::Track { direction, .. } => {
                assert!((direction.norm() - 1.0).abs() < 1e-12);
                assert!((direction.x - 0.6).abs() < 1e-12);
            }
            _ => panic!("expected track"),
        }
    }

    #[test]
    fn degenerate_joints_rejected() {
        assert!(Joint::track(Vec2::zeros(), Vec2::zeros(), 0.1).is_err());
        assert!(Joint::track(Vec2::zeros(), Vec2::x(), -0.5).is_err());
        let rope = Joint::Distance {
            anchor: Vec2::zeros(),
            length: 0.0,
        };
        assert!(rope.validate().is_err());
    }

    #[test]
    fn dynamic_body_needs_mass() {
        assert!(BodyDesc::dynamic("bob", Vec2::zeros(), 0.0).validate().is_err());
        assert!(BodyDesc::dynamic("bob", Vec2::zeros(), 1.0).validate().is_ok());
        assert!(BodyDesc::fixed("anchor", Vec2::zeros()).validate().is_ok());
    }
}
