//! Run controller: owns the mounted scenario and its frame loop.
//!
//! The scenario lives behind `Rc<RefCell<_>>`. The scheduler callback only
//! holds a `Weak` to it, so once the session is dropped or the scenario is
//! unmounted the callback is inert even if the host keeps ticking. The
//! subscription is cancelled the moment the scenario stops running.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use bl_project::ScenarioDef;
use bl_rigid::WorldFactory;
use bl_scenarios::{
    EditOutcome, EngineStatus, Field, MountOptions, ParameterEdit, RunState, Scenario,
    ScenarioKind, mount,
};
use bl_view::{
    CancelToken, Frame, FrameSampler, FrameScheduler, FrameSink, SceneTransform, Viewport,
    fit_scene,
};
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::lab_service::apply_preset;

/// Pixels kept clear around the fitted scene.
pub const DEFAULT_MARGIN_PX: f64 = 24.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionOptions {
    pub viewport: Viewport,
    pub margin_px: f64,
    pub mount: MountOptions,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            margin_px: DEFAULT_MARGIN_PX,
            mount: MountOptions::default(),
        }
    }
}

/// What to mount: a bare kind with defaults, or a lab preset.
#[derive(Debug, Clone, PartialEq)]
pub enum MountSource {
    Kind(ScenarioKind),
    Preset(ScenarioDef),
}

impl MountSource {
    pub fn kind(&self) -> ScenarioKind {
        match self {
            MountSource::Kind(kind) => *kind,
            MountSource::Preset(def) => def.kind,
        }
    }
}

impl From<ScenarioKind> for MountSource {
    fn from(kind: ScenarioKind) -> Self {
        MountSource::Kind(kind)
    }
}

impl From<ScenarioDef> for MountSource {
    fn from(def: ScenarioDef) -> Self {
        MountSource::Preset(def)
    }
}

struct Mounted {
    scenario: Box<dyn Scenario>,
    preset: Option<ScenarioDef>,
}

struct Inner {
    mounted: Option<Mounted>,
    viewport: Viewport,
    margin_px: f64,
    transform: SceneTransform,
    sampler: FrameSampler,
    subscription: Option<CancelToken>,
}

impl Inner {
    fn scenario(&self) -> AppResult<&dyn Scenario> {
        self.mounted
            .as_ref()
            .map(|m| m.scenario.as_ref())
            .ok_or(AppError::NotMounted)
    }

    fn scenario_mut(&mut self) -> AppResult<&mut Box<dyn Scenario>> {
        self.mounted
            .as_mut()
            .map(|m| &mut m.scenario)
            .ok_or(AppError::NotMounted)
    }

    fn refit(&mut self) {
        if let Some(m) = &self.mounted {
            self.transform = fit_scene(&m.scenario.geometry().bounds, &self.viewport, self.margin_px);
        }
    }

    fn publish(&mut self) {
        if let Some(m) = &self.mounted {
            self.sampler.sample(m.scenario.as_ref(), &self.transform);
        }
    }

    /// Drop the subscription if the scenario is no longer running.
    fn sync_subscription(&mut self) {
        let running = self
            .mounted
            .as_ref()
            .is_some_and(|m| m.scenario.run_state().is_running());
        if !running && self.subscription.take().is_some() {
            debug!("frame loop cancelled");
        }
    }

    fn on_tick(&mut self, elapsed: f64) {
        let Some(m) = self.mounted.as_mut() else {
            self.subscription = None;
            return;
        };
        if let Err(e) = m.scenario.advance(elapsed) {
            warn!(scenario = %m.scenario.kind(), error = %e, "step failed; scenario stopped");
        }
        self.sync_subscription();
        self.publish();
    }
}

/// A mounted scenario plus everything needed to run and render it.
pub struct Session {
    inner: Rc<RefCell<Inner>>,
    scheduler: Box<dyn FrameScheduler>,
    factory: Box<dyn WorldFactory>,
    mount_options: MountOptions,
}

impl Session {
    /// Create an empty session. Nothing is mounted until [`Session::mount`].
    pub fn new(
        factory: impl WorldFactory + 'static,
        scheduler: impl FrameScheduler + 'static,
        options: SessionOptions,
    ) -> AppResult<Self> {
        options.mount.validate()?;
        let viewport = Viewport::new(options.viewport.width, options.viewport.height)?;
        let inner = Inner {
            mounted: None,
            viewport,
            margin_px: options.margin_px,
            transform: SceneTransform {
                scale: 1.0,
                offset_x: 0.0,
                offset_y: 0.0,
            },
            sampler: FrameSampler::new(),
            subscription: None,
        };
        Ok(Self {
            inner: Rc::new(RefCell::new(inner)),
            scheduler: Box::new(scheduler),
            factory: Box::new(factory),
            mount_options: options.mount,
        })
    }

    /// Create a session and mount `source` in one go.
    pub fn mounted(
        source: impl Into<MountSource>,
        factory: impl WorldFactory + 'static,
        scheduler: impl FrameScheduler + 'static,
        options: SessionOptions,
    ) -> AppResult<Self> {
        let mut session = Self::new(factory, scheduler, options)?;
        session.mount(source)?;
        Ok(session)
    }

    fn inner_mut(&self) -> AppResult<std::cell::RefMut<'_, Inner>> {
        self.inner.try_borrow_mut().map_err(|_| AppError::Busy)
    }

    fn inner(&self) -> AppResult<std::cell::Ref<'_, Inner>> {
        self.inner.try_borrow().map_err(|_| AppError::Busy)
    }

    /// Mount a scenario, replacing (and tearing down) any current one.
    pub fn mount(&mut self, source: impl Into<MountSource>) -> AppResult<()> {
        let source = source.into();
        self.unmount()?;

        let mut scenario = mount(source.kind(), self.factory.as_ref(), self.mount_options)?;
        let preset = match source {
            MountSource::Kind(_) => None,
            MountSource::Preset(def) => {
                apply_preset(scenario.as_mut(), &def)?;
                Some(def)
            }
        };

        let mut inner = self.inner_mut()?;
        inner.mounted = Some(Mounted { scenario, preset });
        inner.refit();
        inner.publish();
        Ok(())
    }

    /// Stop the frame loop and drop the scenario. A no-op when nothing is mounted.
    pub fn unmount(&mut self) -> AppResult<()> {
        let mut inner = self.inner_mut()?;
        inner.subscription = None;
        inner.sampler.clear();
        if let Some(m) = inner.mounted.take() {
            info!(scenario = %m.scenario.kind(), "scenario unmounted");
        }
        Ok(())
    }

    pub fn is_mounted(&self) -> bool {
        self.inner().is_ok_and(|i| i.mounted.is_some())
    }

    /// Start or stop the mounted scenario.
    ///
    /// Starting subscribes to the scheduler; stopping cancels the
    /// subscription before returning.
    pub fn set_running(&mut self, running: bool) -> AppResult<()> {
        let mut inner = self.inner_mut()?;
        let result = inner.scenario_mut()?.set_running(running);
        if let Err(e) = &result {
            warn!(error = %e, "start refused");
        }
        let now_running = inner.scenario()?.run_state().is_running();
        if now_running && inner.subscription.is_none() {
            let weak: Weak<RefCell<Inner>> = Rc::downgrade(&self.inner);
            let token = self.scheduler.subscribe(Box::new(move |elapsed| {
                let Some(shared) = weak.upgrade() else {
                    return;
                };
                if let Ok(mut inner) = shared.try_borrow_mut() {
                    inner.on_tick(elapsed);
                }
            }));
            inner.subscription = Some(token);
            debug!("frame loop subscribed");
        }
        inner.sync_subscription();
        inner.publish();
        result.map_err(AppError::from)
    }

    /// Apply one edit. A running scenario is stopped first.
    pub fn on_parameter_edit(&mut self, edit: &ParameterEdit) -> AppResult<EditOutcome> {
        let mut inner = self.inner_mut()?;
        let result = inner.scenario_mut()?.on_parameter_edit(edit);
        if let Err(e) = &result {
            warn!(%edit, error = %e, "edit rejected");
        }
        inner.sync_subscription();
        inner.refit();
        inner.publish();
        Ok(result?)
    }

    /// Shorthand for a numeric `Set` edit.
    pub fn set_field(&mut self, field: Field, value: f64) -> AppResult<EditOutcome> {
        self.on_parameter_edit(&ParameterEdit::set(field, value))
    }

    /// Resize the viewport and refit the scene.
    pub fn resize(&mut self, width: f64, height: f64) -> AppResult<()> {
        let viewport = Viewport::new(width, height)?;
        let mut inner = self.inner_mut()?;
        inner.viewport = viewport;
        inner.refit();
        inner.publish();
        debug!(width, height, "viewport resized");
        Ok(())
    }

    /// Restore the mounted scenario's starting parameters and stop it.
    ///
    /// For a preset mount this is the preset, not the bare defaults.
    pub fn reset(&mut self) -> AppResult<()> {
        let mut inner = self.inner_mut()?;
        let m = inner.mounted.as_mut().ok_or(AppError::NotMounted)?;
        m.scenario.reset()?;
        if let Some(preset) = &m.preset {
            apply_preset(m.scenario.as_mut(), preset)?;
        }
        inner.sync_subscription();
        inner.refit();
        inner.publish();
        Ok(())
    }

    /// Route every published frame to `sink`.
    ///
    /// The sink runs while the session is borrowed; calling back into the
    /// session from it fails with [`AppError::Busy`].
    pub fn set_sink(&mut self, sink: impl FrameSink + 'static) -> AppResult<()> {
        self.inner_mut()?.sampler.set_sink(Some(Box::new(sink)));
        Ok(())
    }

    /// Latest published frame.
    pub fn frame(&self) -> AppResult<Frame> {
        self.inner()?
            .sampler
            .latest()
            .cloned()
            .ok_or(AppError::NotMounted)
    }

    pub fn status(&self) -> AppResult<EngineStatus> {
        Ok(self.inner()?.scenario()?.status())
    }

    pub fn run_state(&self) -> AppResult<RunState> {
        Ok(self.inner()?.scenario()?.run_state())
    }

    pub fn kind(&self) -> AppResult<ScenarioKind> {
        Ok(self.inner()?.scenario()?.kind())
    }

    pub fn values(&self) -> AppResult<Vec<(Field, f64)>> {
        Ok(self.inner()?.scenario()?.values())
    }

    pub fn transform(&self) -> AppResult<SceneTransform> {
        Ok(self.inner()?.transform)
    }

    pub fn viewport(&self) -> AppResult<Viewport> {
        Ok(self.inner()?.viewport)
    }

    /// Whether a frame-loop subscription is currently live.
    pub fn is_subscribed(&self) -> bool {
        self.inner()
            .is_ok_and(|i| i.subscription.as_ref().is_some_and(|t| !t.is_cancelled()))
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.inner.try_borrow_mut() {
            inner.subscription = None;
            inner.sampler.clear();
            if let Some(m) = inner.mounted.take() {
                info!(scenario = %m.scenario.kind(), "scenario unmounted");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bl_rigid::DefaultWorldFactory;
    use bl_view::ManualScheduler;

    fn session(kind: ScenarioKind) -> (Session, ManualScheduler) {
        let sched = ManualScheduler::new();
        let s = Session::mounted(
            kind,
            DefaultWorldFactory,
            sched.clone(),
            SessionOptions::default(),
        )
        .unwrap();
        (s, sched)
    }

    #[test]
    fn mount_publishes_a_frame() {
        let (s, _) = session(ScenarioKind::Lever);
        let frame = s.frame().unwrap();
        assert_eq!(frame.seq, 0);
        assert_eq!(frame.scenario, ScenarioKind::Lever);
        assert!(!frame.running);
    }

    #[test]
    fn start_subscribes_and_stop_cancels() {
        let (mut s, sched) = session(ScenarioKind::Pendulum);
        s.set_running(true).unwrap();
        assert!(s.is_subscribed());
        assert_eq!(sched.subscriber_count(), 1);
        sched.tick(1.0 / 60.0);
        assert!(s.frame().unwrap().running);

        s.set_running(false).unwrap();
        assert!(!s.is_subscribed());
        assert_eq!(sched.tick(1.0 / 60.0), 0);
    }

    #[test]
    fn starting_twice_keeps_one_subscription() {
        let (mut s, sched) = session(ScenarioKind::Circuit);
        s.set_running(true).unwrap();
        s.set_running(true).unwrap();
        assert_eq!(sched.subscriber_count(), 1);
    }

    #[test]
    fn edit_while_running_stops_the_loop() {
        let (mut s, sched) = session(ScenarioKind::InclinedPlane);
        s.set_running(true).unwrap();
        sched.tick(1.0 / 60.0);
        let outcome = s.set_field(Field::Friction, 0.4).unwrap();
        assert!(outcome.stopped);
        assert!(!s.is_subscribed());
        assert_eq!(s.run_state().unwrap(), RunState::Stopped);
    }

    #[test]
    fn rejected_edit_reports_and_keeps_state() {
        let (mut s, _) = session(ScenarioKind::Optics);
        let before = s.values().unwrap();
        let err = s.set_field(Field::Length, 1.0).unwrap_err();
        assert!(matches!(
            err,
            AppError::Scenario(bl_scenarios::ScenarioError::UnsupportedEdit { .. })
        ));
        assert_eq!(s.values().unwrap(), before);
    }

    #[test]
    fn resize_refits_and_republishes() {
        let (mut s, _) = session(ScenarioKind::Pendulum);
        let seq = s.frame().unwrap().seq;
        let before = s.transform().unwrap();
        s.resize(1600.0, 1000.0).unwrap();
        let after = s.transform().unwrap();
        // the margin is fixed in pixels, so the scale grows with the free area
        let expected = (1000.0 - 2.0 * DEFAULT_MARGIN_PX) / (500.0 - 2.0 * DEFAULT_MARGIN_PX);
        assert!((after.scale / before.scale - expected).abs() < 1e-9);
        assert_eq!(s.frame().unwrap().seq, seq + 1);
        assert!(matches!(s.resize(0.0, 10.0), Err(AppError::View(_))));
    }

    #[test]
    fn unmounted_session_reports_not_mounted() {
        let (mut s, sched) = session(ScenarioKind::Pendulum);
        s.set_running(true).unwrap();
        s.unmount().unwrap();
        assert!(!s.is_mounted());
        assert_eq!(sched.tick(1.0 / 60.0), 0);
        assert!(matches!(s.set_running(true), Err(AppError::NotMounted)));
        assert!(matches!(s.status(), Err(AppError::NotMounted)));
        assert!(matches!(s.reset(), Err(AppError::NotMounted)));
        assert!(matches!(s.frame(), Err(AppError::NotMounted)));
    }

    #[test]
    fn remount_after_unmount_continues_numbering() {
        let (mut s, _sched) = session(ScenarioKind::Lever);
        let before = s.frame().unwrap().seq;
        s.unmount().unwrap();
        s.mount(ScenarioKind::Optics).unwrap();
        let after = s.frame().unwrap();
        assert_eq!(after.scenario, ScenarioKind::Optics);
        assert!(after.seq > before);
    }
}
