//! Frame sampler: the only continuous pull from a scenario.

use bl_scenarios::Scenario;
use tracing::trace;

use crate::frame::Frame;
use crate::mapper::SceneTransform;

/// Receives every published frame.
pub trait FrameSink {
    fn publish(&mut self, frame: &Frame);
}

impl<F> FrameSink for F
where
    F: FnMut(&Frame),
{
    fn publish(&mut self, frame: &Frame) {
        self(frame)
    }
}

/// Captures frames, numbers them and forwards them to an optional sink.
///
/// The latest frame is kept for pull access.
#[derive(Default)]
pub struct FrameSampler {
    seq: u64,
    latest: Option<Frame>,
    sink: Option<Box<dyn FrameSink>>,
}

impl FrameSampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(sink: Box<dyn FrameSink>) -> Self {
        Self {
            sink: Some(sink),
            ..Self::default()
        }
    }

    pub fn set_sink(&mut self, sink: Option<Box<dyn FrameSink>>) {
        self.sink = sink;
    }

    /// Capture and publish one frame.
    pub fn sample(&mut self, scenario: &dyn Scenario, transform: &SceneTransform) -> &Frame {
        let frame = Frame::capture(self.seq, scenario, transform);
        self.seq += 1;
        trace!(seq = frame.seq, scenario = %frame.scenario, "frame published");
        if let Some(sink) = self.sink.as_mut() {
            sink.publish(&frame);
        }
        self.latest.insert(frame)
    }

    pub fn latest(&self) -> Option<&Frame> {
        self.latest.as_ref()
    }

    /// Forget the retained frame; numbering carries on.
    pub fn clear(&mut self) {
        self.latest = None;
    }

    /// Number of frames published so far.
    pub fn published(&self) -> u64 {
        self.seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::{Viewport, fit_scene};
    use bl_rigid::DefaultWorldFactory;
    use bl_scenarios::{MountOptions, ScenarioKind, mount};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn frames_are_numbered_and_forwarded() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = {
            let seen = Rc::clone(&seen);
            move |f: &Frame| seen.borrow_mut().push(f.seq)
        };
        let mut sampler = FrameSampler::with_sink(Box::new(sink));
        let s = mount(ScenarioKind::Lever, &DefaultWorldFactory, MountOptions::default())
            .unwrap();
        let t = fit_scene(&s.geometry().bounds, &Viewport::default(), 0.0);
        for _ in 0..3 {
            sampler.sample(s.as_ref(), &t);
        }
        assert_eq!(*seen.borrow(), vec![0, 1, 2]);
        assert_eq!(sampler.published(), 3);
        assert_eq!(sampler.latest().map(|f| f.seq), Some(2));
    }

    #[test]
    fn clear_drops_latest_but_keeps_numbering() {
        let mut sampler = FrameSampler::new();
        let s = mount(ScenarioKind::Optics, &DefaultWorldFactory, MountOptions::default())
            .unwrap();
        let t = fit_scene(&s.geometry().bounds, &Viewport::default(), 0.0);
        sampler.sample(s.as_ref(), &t);
        sampler.clear();
        assert!(sampler.latest().is_none());
        assert_eq!(sampler.sample(s.as_ref(), &t).seq, 1);
    }
}
