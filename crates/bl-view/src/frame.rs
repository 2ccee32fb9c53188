//! Read-only snapshot handed to rendering once per display frame.

use bl_core::finite_or;
use bl_scenarios::{
    DerivedQuantities, EngineStatus, EventFlags, NamedAngle, Scenario, ScenarioKind,
};
use serde::Serialize;

use crate::mapper::SceneTransform;

/// A named position in viewport pixels (y down).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScenePoint {
    pub name: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Frame {
    /// Increases by one per published frame.
    pub seq: u64,
    pub scenario: ScenarioKind,
    pub running: bool,
    pub status: EngineStatus,
    /// Pixels per metre of the transform used for `positions`.
    pub scale_px_per_m: f64,
    pub positions: Vec<ScenePoint>,
    pub angles: Vec<NamedAngle>,
    pub derived: DerivedQuantities,
    pub events: EventFlags,
}

impl Frame {
    /// Pull the current pose and quantities out of `scenario`.
    ///
    /// Coordinates and angles are passed through `finite_or`, so NaN or
    /// infinity never reaches rendering.
    pub fn capture(seq: u64, scenario: &dyn Scenario, transform: &SceneTransform) -> Self {
        let pose = scenario.sample_pose();
        let positions = pose
            .points
            .into_iter()
            .map(|p| {
                let (x, y) = transform.to_pixels(p.at);
                ScenePoint {
                    name: p.name,
                    x: finite_or(x, 0.0),
                    y: finite_or(y, 0.0),
                }
            })
            .collect();
        let angles = pose
            .angles
            .into_iter()
            .map(|a| NamedAngle {
                degrees: finite_or(a.degrees, 0.0),
                ..a
            })
            .collect();
        Self {
            seq,
            scenario: scenario.kind(),
            running: scenario.run_state().is_running(),
            status: scenario.status(),
            scale_px_per_m: transform.scale,
            positions,
            angles,
            derived: scenario.derived(),
            events: scenario.events(),
        }
    }

    pub fn position(&self, name: &str) -> Option<(f64, f64)> {
        self.positions
            .iter()
            .find(|p| p.name == name)
            .map(|p| (p.x, p.y))
    }

    pub fn angle(&self, name: &str) -> Option<f64> {
        self.angles
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.degrees)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::{Viewport, fit_scene};
    use bl_rigid::DefaultWorldFactory;
    use bl_scenarios::{MountOptions, mount};

    #[test]
    fn pendulum_anchor_maps_inside_viewport() {
        let s = mount(
            ScenarioKind::Pendulum,
            &DefaultWorldFactory,
            MountOptions::default(),
        )
        .unwrap();
        let vp = Viewport::default();
        let t = fit_scene(&s.geometry().bounds, &vp, 10.0);
        let frame = Frame::capture(7, s.as_ref(), &t);
        assert_eq!(frame.seq, 7);
        assert!(!frame.running);
        let (ax, ay) = frame.position("anchor").unwrap();
        assert!((ax - 400.0).abs() < 1e-9 && (ay - 250.0).abs() < 1e-9);
        let (bx, by) = frame.position("bob").unwrap();
        assert!(bx > ax && by > ay, "bob hangs right of and below the anchor");
        assert!((frame.angle("swing").unwrap() - 45.0).abs() < 1e-9);
    }

    #[test]
    fn frame_serializes_to_json() {
        let s = mount(ScenarioKind::Optics, &DefaultWorldFactory, MountOptions::default())
            .unwrap();
        let t = fit_scene(&s.geometry().bounds, &Viewport::default(), 0.0);
        let json = serde_json::to_value(Frame::capture(0, s.as_ref(), &t)).unwrap();
        assert_eq!(json["scenario"], "optics");
        assert_eq!(json["status"]["status"], "ready");
        assert_eq!(json["derived"]["scenario"], "optics");
        assert!(json["positions"].as_array().unwrap().len() >= 3);
    }
}
