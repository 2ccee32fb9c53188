//! Headless execution: drive a session with a manual scheduler.

use std::str::FromStr;

use bl_rigid::WorldFactory;
use bl_scenarios::{EngineStatus, Field, ParameterEdit};
use bl_view::{Frame, FrameSink, ManualScheduler};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::session::{MountSource, Session, SessionOptions};

/// An edit applied just before the given frame is ticked.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledEdit {
    pub frame: u64,
    pub edit: ParameterEdit,
}

/// Parses `field=value` or `field=value@frame`.
impl FromStr for ScheduledEdit {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || AppError::InvalidInput(format!("expected field=value[@frame], got '{s}'"));
        let (assignment, frame) = match s.split_once('@') {
            Some((a, f)) => (a, f.trim().parse::<u64>().map_err(|_| bad())?),
            None => (s, 0),
        };
        let (name, value) = assignment.split_once('=').ok_or_else(bad)?;
        let field: Field = name.parse()?;
        let value: f64 = value.trim().parse().map_err(|_| bad())?;
        Ok(Self {
            frame,
            edit: ParameterEdit::set(field, value),
        })
    }
}

#[derive(Debug, Clone)]
pub struct HeadlessRun {
    /// Display frames to tick.
    pub frames: u64,
    /// Display refresh rate; each tick advances `1/fps` seconds.
    pub fps: f64,
    pub edits: Vec<ScheduledEdit>,
    /// Start the scenario again when an edit stopped it.
    pub restart_after_edit: bool,
}

impl Default for HeadlessRun {
    fn default() -> Self {
        Self {
            frames: 120,
            fps: 60.0,
            edits: Vec::new(),
            restart_after_edit: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub frames_ticked: u64,
    pub frames_published: u64,
    pub edits_applied: usize,
    pub edits_rejected: usize,
    pub final_status: EngineStatus,
}

/// Mount `source`, start it and tick `run.frames` display frames.
///
/// Every published frame goes to `sink`. Rejected edits are logged and
/// counted, not fatal. A scenario that cannot start is reported through
/// `final_status` after its initial frame.
pub fn run_headless(
    source: impl Into<MountSource>,
    factory: impl WorldFactory + 'static,
    options: SessionOptions,
    run: &HeadlessRun,
    sink: impl FrameSink + 'static,
) -> AppResult<RunSummary> {
    if !(run.fps.is_finite() && run.fps > 0.0) {
        return Err(AppError::InvalidInput(format!(
            "fps must be finite and positive, got {}",
            run.fps
        )));
    }
    let dt = 1.0 / run.fps;
    let scheduler = ManualScheduler::new();
    let mut session = Session::new(factory, scheduler.clone(), options)?;
    session.set_sink(sink)?;
    session.mount(source)?;
    let kind = session.kind()?;
    info!(scenario = %kind, frames = run.frames, fps = run.fps, "headless run started");

    if let Err(e) = session.set_running(true) {
        warn!(error = %e, "scenario did not start");
    }

    let mut edits: Vec<&ScheduledEdit> = run.edits.iter().collect();
    edits.sort_by_key(|e| e.frame);
    let mut pending = edits.into_iter().peekable();
    let mut applied = 0;
    let mut rejected = 0;

    for frame in 0..run.frames {
        while let Some(scheduled) = pending.next_if(|e| e.frame <= frame) {
            match session.on_parameter_edit(&scheduled.edit) {
                Ok(outcome) => {
                    applied += 1;
                    if outcome.stopped && run.restart_after_edit {
                        if let Err(e) = session.set_running(true) {
                            warn!(error = %e, "restart after edit refused");
                        }
                    }
                }
                Err(e) => {
                    rejected += 1;
                    warn!(edit = %scheduled.edit, error = %e, "scheduled edit rejected");
                }
            }
        }
        scheduler.tick(dt);
    }

    let summary = RunSummary {
        frames_ticked: run.frames,
        frames_published: session.frame()?.seq + 1,
        edits_applied: applied,
        edits_rejected: rejected,
        final_status: session.status()?,
    };
    info!(
        scenario = %kind,
        published = summary.frames_published,
        status = ?summary.final_status,
        "headless run finished"
    );
    Ok(summary)
}

/// Collects frames in memory; handy for tests and tools.
#[derive(Clone, Default)]
pub struct FrameLog {
    frames: std::rc::Rc<std::cell::RefCell<Vec<Frame>>>,
}

impl FrameLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> Vec<Frame> {
        self.frames.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.frames.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.borrow().is_empty()
    }

    /// A sink appending to this log.
    pub fn sink(&self) -> impl FnMut(&Frame) + 'static {
        let frames = std::rc::Rc::clone(&self.frames);
        move |frame: &Frame| frames.borrow_mut().push(frame.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduled_edit_parses() {
        let e: ScheduledEdit = "length=3.5@10".parse().unwrap();
        assert_eq!(e.frame, 10);
        assert_eq!(e.edit, ParameterEdit::set(Field::Length, 3.5));

        let e: ScheduledEdit = "release-angle=-30".parse().unwrap();
        assert_eq!(e.frame, 0);
        assert_eq!(e.edit, ParameterEdit::set(Field::ReleaseAngle, -30.0));
    }

    #[test]
    fn scheduled_edit_rejects_garbage() {
        assert!("length".parse::<ScheduledEdit>().is_err());
        assert!("length=abc".parse::<ScheduledEdit>().is_err());
        assert!("length=1@x".parse::<ScheduledEdit>().is_err());
        assert!(matches!(
            "nope=1".parse::<ScheduledEdit>(),
            Err(AppError::Scenario(_))
        ));
    }
}
