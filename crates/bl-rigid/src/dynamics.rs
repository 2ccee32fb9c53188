//! Constrained point-mass dynamics evaluated by the integrators.
//!
//! Joint reactions are solved in closed form per body (each dynamic body
//! carries at most one joint), then positions are projected back onto the
//! joint manifold after every step to remove drift.

use crate::body::{BodyKind, BodyState, Joint, Vec2};
use crate::error::EngineResult;
use crate::model::TransientModel;

/// Below this along-track speed (m/s) a body counts as resting.
pub(crate) const REST_SPEED: f64 = 1e-6;

/// Rope constraint is skipped when the body sits on its anchor.
const MIN_SEPARATION_SQ: f64 = 1e-18;

/// Per-body properties that do not change during a step.
#[derive(Clone, Debug)]
pub(crate) struct BodyProps {
    pub kind: BodyKind,
    pub mass: f64,
    pub label: &'static str,
    pub joint: Option<Joint>,
}

pub(crate) struct WorldDynamics<'a> {
    pub gravity: Vec2,
    pub bodies: &'a [BodyProps],
}

/// Tangential and normal gravity components relative to a unit track direction.
fn track_components(gravity: Vec2, direction: Vec2) -> (f64, f64) {
    let g_t = gravity.dot(&direction);
    let g_n = (gravity - direction * g_t).norm();
    (g_t, g_n)
}

pub(crate) fn acceleration(gravity: Vec2, props: &BodyProps, state: &BodyState) -> Vec2 {
    if props.kind == BodyKind::Static {
        return Vec2::zeros();
    }
    match props.joint {
        None => gravity,
        Some(Joint::Distance { anchor, .. }) => {
            // |r|^2 = L^2  =>  r.a + v.v = 0, with a = g + lambda * r
            let r = state.position - anchor;
            let rr = r.norm_squared();
            if rr < MIN_SEPARATION_SQ {
                return gravity;
            }
            let lambda = -(r.dot(&gravity) + state.velocity.norm_squared()) / rr;
            gravity + r * lambda
        }
        Some(Joint::Track {
            direction,
            friction,
            ..
        }) => {
            let (g_t, g_n) = track_components(gravity, direction);
            let limit = friction * g_n;
            let v_t = state.velocity.dot(&direction);
            let a_t = if v_t.abs() > REST_SPEED {
                g_t - limit * v_t.signum()
            } else if g_t.abs() > limit {
                g_t - limit * g_t.signum()
            } else {
                0.0
            };
            direction * a_t
        }
    }
}

/// Snap `next` back onto the joint manifold of `props`.
pub(crate) fn project(gravity: Vec2, props: &BodyProps, prev: &BodyState, next: &mut BodyState) {
    if props.kind == BodyKind::Static {
        *next = *prev;
        return;
    }
    match props.joint {
        None => {}
        Some(Joint::Distance { anchor, length }) => {
            let r = next.position - anchor;
            let dist = r.norm();
            if dist * dist < MIN_SEPARATION_SQ {
                return;
            }
            let radial = r / dist;
            next.position = anchor + radial * length;
            next.velocity -= radial * next.velocity.dot(&radial);
        }
        Some(Joint::Track {
            origin,
            direction,
            friction,
        }) => {
            let s = (next.position - origin).dot(&direction);
            next.position = origin + direction * s;

            let (g_t, g_n) = track_components(gravity, direction);
            let holds = g_t.abs() <= friction * g_n;
            let v_prev = prev.velocity.dot(&direction);
            let mut v_t = next.velocity.dot(&direction);
            // kinetic friction must stop the body, not reverse it
            let reversed = v_prev != 0.0 && v_t.signum() != v_prev.signum();
            if holds && (reversed || v_t.abs() <= REST_SPEED) {
                v_t = 0.0;
            }
            next.velocity = direction * v_t;
        }
    }
}

impl TransientModel for WorldDynamics<'_> {
    type State = Vec<BodyState>;

    fn rhs(&mut self, _t: f64, x: &Self::State) -> EngineResult<Self::State> {
        Ok(x.iter()
            .zip(self.bodies)
            .map(|(state, props)| {
                let velocity = if props.kind == BodyKind::Static {
                    Vec2::zeros()
                } else {
                    state.velocity
                };
                BodyState {
                    position: velocity,
                    velocity: acceleration(self.gravity, props, state),
                }
            })
            .collect())
    }

    fn add(&self, a: &Self::State, b: &Self::State) -> Self::State {
        a.iter()
            .zip(b)
            .map(|(a, b)| BodyState {
                position: a.position + b.position,
                velocity: a.velocity + b.velocity,
            })
            .collect()
    }

    fn scale(&self, a: &Self::State, scale: f64) -> Self::State {
        a.iter()
            .map(|a| BodyState {
                position: a.position * scale,
                velocity: a.velocity * scale,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dynamic(joint: Option<Joint>) -> BodyProps {
        BodyProps {
            kind: BodyKind::Dynamic,
            mass: 1.0,
            label: "test",
            joint,
        }
    }

    #[test]
    fn free_body_falls_with_gravity() {
        let g = Vec2::new(0.0, -9.81);
        let a = acceleration(g, &dynamic(None), &BodyState::at_rest(Vec2::zeros()));
        assert_eq!(a, g);
    }

    #[test]
    fn rope_at_rest_below_anchor_has_no_acceleration() {
        let g = Vec2::new(0.0, -9.81);
        let rope = Joint::Distance {
            anchor: Vec2::zeros(),
            length: 1.0,
        };
        let a = acceleration(g, &dynamic(Some(rope)), &BodyState::at_rest(Vec2::new(0.0, -1.0)));
        assert!(a.norm() < 1e-12);
    }

    #[test]
    fn rope_acceleration_is_tangent_at_rest() {
        let g = Vec2::new(0.0, -9.81);
        let rope = Joint::Distance {
            anchor: Vec2::zeros(),
            length: 1.0,
        };
        let p = Vec2::new(1.0, 0.0);
        let a = acceleration(g, &dynamic(Some(rope)), &BodyState::at_rest(p));
        // horizontal rope at rest: full gravity, no radial component
        assert!(a.dot(&p).abs() < 1e-12);
        assert!((a.y + 9.81).abs() < 1e-12);
    }

    #[test]
    fn track_holds_when_friction_dominates() {
        let g = Vec2::new(0.0, -9.81);
        let dir = Vec2::new(1.0, 0.2).normalize();
        let track = Joint::Track {
            origin: Vec2::zeros(),
            direction: dir,
            friction: 0.5,
        };
        let a = acceleration(g, &dynamic(Some(track)), &BodyState::at_rest(Vec2::zeros()));
        assert_eq!(a, Vec2::zeros());
    }

    #[test]
    fn track_slides_with_reduced_acceleration() {
        let g = Vec2::new(0.0, -9.81);
        let theta = 30.0_f64.to_radians();
        let down = Vec2::new(-theta.cos(), -theta.sin());
        let track = Joint::Track {
            origin: Vec2::zeros(),
            direction: down,
            friction: 0.2,
        };
        let a = acceleration(g, &dynamic(Some(track)), &BodyState::at_rest(Vec2::zeros()));
        let expected = 9.81 * (theta.sin() - 0.2 * theta.cos());
        assert!((a.dot(&down) - expected).abs() < 1e-9);
    }

    #[test]
    fn projection_restores_rope_length() {
        let g = Vec2::new(0.0, -9.81);
        let rope = Joint::Distance {
            anchor: Vec2::zeros(),
            length: 2.0,
        };
        let prev = BodyState::at_rest(Vec2::new(0.0, -2.0));
        let mut next = BodyState {
            position: Vec2::new(0.3, -2.1),
            velocity: Vec2::new(1.0, -0.5),
        };
        project(g, &dynamic(Some(rope)), &prev, &mut next);
        assert!((next.position.norm() - 2.0).abs() < 1e-12);
        assert!(next.velocity.dot(&next.position).abs() < 1e-12);
    }
}
