//! Reactive arrow controller
//!
//! Owns the configuration and one [`RegionTracker`] per side. Tracker
//! callbacks land in shared state; whenever both rects are known and one of
//! them (or a geometry option) changes, the arrow is solved, turned into
//! drawable shapes and handed to the render sink. One rect update, one
//! recompute: there is no batching on top of what the surface delivers.
//!
//! Everything runs on the host's event thread. Shared state sits behind
//! `Rc<RefCell<..>>` and the sink is always called with no state borrow held.

use crate::error::{ArrowError, ResolutionError};
use crate::models::config::{ArrowConfig, ArrowConfigPatch, ChangeSet};
use crate::models::geometry::Rect;
use crate::models::options::ArrowType;
use crate::renderers::path::{DrawableArrow, PathRenderer, RenderStyle};
use crate::solver::{self, Arrow};
use crate::tracker::{MatchPolicy, RegionTracker, Side, Surface};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;

/// Binding state of one side of the arrow
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SideStatus {
    /// No reference configured
    #[default]
    Unbound,
    /// Observing `reference`, no rect received yet
    Bound { reference: String },
    /// Observing `reference`, latest rect known
    Tracking { reference: String, rect: Rect },
}

impl SideStatus {
    pub fn rect(&self) -> Option<Rect> {
        match self {
            SideStatus::Tracking { rect, .. } => Some(*rect),
            _ => None,
        }
    }

    pub fn reference(&self) -> Option<&str> {
        match self {
            SideStatus::Unbound => None,
            SideStatus::Bound { reference } | SideStatus::Tracking { reference, .. } => {
                Some(reference)
            }
        }
    }
}

/// One recompute's output
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArrowFrame {
    pub mode: ArrowType,
    pub source: Rect,
    pub target: Rect,
    pub arrow: Arrow,
    pub drawable: DrawableArrow,
}

/// Receives every frame the controller produces
pub type FrameSink = Box<dyn FnMut(&ArrowFrame)>;

/// Told when a drawn arrow must come off the surface
pub type ClearSink = Box<dyn FnMut()>;

struct ArrowState {
    config: ArrowConfig,
    source: SideStatus,
    target: SideStatus,
    renderer: PathRenderer,
    recomputes: u64,
    drawn: bool,
}

impl ArrowState {
    fn status_mut(&mut self, side: Side) -> &mut SideStatus {
        match side {
            Side::Source => &mut self.source,
            Side::Target => &mut self.target,
        }
    }

    fn status(&self, side: Side) -> &SideStatus {
        match side {
            Side::Source => &self.source,
            Side::Target => &self.target,
        }
    }

    /// Solve and render if both rects are known
    fn solve(&mut self) -> Option<ArrowFrame> {
        let (source, target) = (self.source.rect()?, self.target.rect()?);
        let mode = self.config.mode;
        let arrow = solver::solve(&source, &target, &self.config.options, mode);
        let drawable = self.renderer.render(&arrow);
        self.recomputes += 1;
        self.drawn = true;

        log::debug!(
            "recompute #{} ({}): ({:.1}, {:.1}) -> ({:.1}, {:.1})",
            self.recomputes,
            mode,
            arrow.start.x,
            arrow.start.y,
            arrow.end.x,
            arrow.end.y
        );
        Some(ArrowFrame {
            mode,
            source,
            target,
            arrow,
            drawable,
        })
    }
}

struct Shared {
    state: RefCell<ArrowState>,
    sink: RefCell<Option<FrameSink>>,
    clear: RefCell<Option<ClearSink>>,
}

impl Shared {
    /// A tracker reported a new rect for `side`
    fn accept(&self, side: Side, rect: Rect) {
        let frame = {
            let mut state = self.state.borrow_mut();
            let status = state.status_mut(side);
            let reference = match status {
                SideStatus::Unbound => {
                    log::debug!("ignoring {} rect while unbound", side);
                    return;
                }
                SideStatus::Bound { reference } | SideStatus::Tracking { reference, .. } => {
                    std::mem::take(reference)
                }
            };
            *status = SideStatus::Tracking { reference, rect };
            state.solve()
        };

        if let Some(frame) = frame {
            self.emit(&frame);
        }
    }

    fn emit(&self, frame: &ArrowFrame) {
        match self.sink.try_borrow_mut() {
            Ok(mut sink) => {
                if let Some(sink) = sink.as_mut() {
                    sink(frame);
                }
            }
            Err(_) => log::warn!("dropping frame rendered from inside the render sink"),
        }
    }

    /// Take the arrow down if one is on the surface
    fn clear(&self) {
        let drawn = std::mem::replace(&mut self.state.borrow_mut().drawn, false);
        if !drawn {
            return;
        }
        match self.clear.try_borrow_mut() {
            Ok(mut clear) => {
                if let Some(clear) = clear.as_mut() {
                    clear();
                }
            }
            Err(_) => log::warn!("dropping clear requested from inside the clear sink"),
        }
    }
}

/// Keeps an arrow between two tracked regions up to date
pub struct ArrowController<S: Surface> {
    surface: S,
    policy: MatchPolicy,
    shared: Rc<Shared>,
    source: RegionTracker,
    target: RegionTracker,
}

impl<S: Surface> ArrowController<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            policy: MatchPolicy::default(),
            shared: Rc::new(Shared {
                state: RefCell::new(ArrowState {
                    config: ArrowConfig::default(),
                    source: SideStatus::Unbound,
                    target: SideStatus::Unbound,
                    renderer: PathRenderer::default(),
                    recomputes: 0,
                    drawn: false,
                }),
                sink: RefCell::new(None),
                clear: RefCell::new(None),
            }),
            source: RegionTracker::new(Side::Source),
            target: RegionTracker::new(Side::Target),
        }
    }

    /// How references matching several elements are treated
    pub fn with_match_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Install the sink that receives every recomputed frame
    pub fn on_render(&mut self, sink: impl FnMut(&ArrowFrame) + 'static) {
        *self.shared.sink.borrow_mut() = Some(Box::new(sink));
    }

    /// Install the hook called when the drawn arrow loses one of its sides
    pub fn on_clear(&mut self, clear: impl FnMut() + 'static) {
        *self.shared.clear.borrow_mut() = Some(Box::new(clear));
    }

    pub fn config(&self) -> ArrowConfig {
        self.shared.state.borrow().config.clone()
    }

    pub fn status(&self, side: Side) -> SideStatus {
        self.shared.state.borrow().status(side).clone()
    }

    /// Number of frames produced so far
    pub fn recompute_count(&self) -> u64 {
        self.shared.state.borrow().recomputes
    }

    pub fn style(&self) -> RenderStyle {
        self.shared.state.borrow().renderer.style().clone()
    }

    /// Replace the render style and redraw
    pub fn set_style(&mut self, style: RenderStyle) {
        self.shared.state.borrow_mut().renderer = PathRenderer::new(style);
        self.recompute();
    }

    /// Apply a partial configuration
    ///
    /// Changed references re-bind their side; other changes recompute the
    /// arrow if both rects are known. A side whose reference fails to
    /// resolve is left unbound with its reference cleared, and the error is
    /// returned after both sides have been processed.
    pub fn configure(&mut self, patch: ArrowConfigPatch) -> Result<ChangeSet, ArrowError> {
        let changes = self.shared.state.borrow_mut().config.apply(patch)?;
        if changes.is_empty() {
            return Ok(changes);
        }

        let mut failure = None;
        for side in [Side::Source, Side::Target] {
            if changes.rebinds(side) {
                if let Err(err) = self.rebind(side) {
                    failure.get_or_insert(err);
                }
            }
        }
        if let Some(err) = failure {
            return Err(err.into());
        }

        if changes.affects_geometry() {
            self.recompute();
        }
        Ok(changes)
    }

    /// Resolve the side's configured reference again and start tracking it
    ///
    /// The previous subscription is released before the new one is created.
    /// A drawn arrow is cleared: it stays off until the side reports a rect.
    pub fn rebind(&mut self, side: Side) -> Result<(), ResolutionError> {
        let reference = self.shared.state.borrow().config.reference(side).to_string();
        let tracker = match side {
            Side::Source => &mut self.source,
            Side::Target => &mut self.target,
        };

        *self.shared.state.borrow_mut().status_mut(side) = SideStatus::Unbound;
        tracker.stop();
        self.shared.clear();

        if reference.is_empty() {
            log::debug!("{} cleared", side);
            return Ok(());
        }

        *self.shared.state.borrow_mut().status_mut(side) = SideStatus::Bound {
            reference: reference.clone(),
        };

        let shared = Rc::downgrade(&self.shared);
        let started = tracker.start(&self.surface, &reference, self.policy, move |rect| {
            if let Some(shared) = shared.upgrade() {
                shared.accept(side, rect);
            }
        });

        if let Err(err) = started {
            log::warn!("{} left unbound: {}", err.side(), err);
            let mut state = self.shared.state.borrow_mut();
            *state.status_mut(side) = SideStatus::Unbound;
            match side {
                Side::Source => state.config.source.clear(),
                Side::Target => state.config.target.clear(),
            }
            return Err(err);
        }
        Ok(())
    }

    /// Solve and render now; `false` when a rect is still missing
    pub fn recompute(&self) -> bool {
        let frame = self.shared.state.borrow_mut().solve();
        match frame {
            Some(frame) => {
                self.shared.emit(&frame);
                true
            }
            None => false,
        }
    }

    /// Release both trackers, clear the drawing and drop the sinks
    pub fn dispose(&mut self) {
        {
            let mut state = self.shared.state.borrow_mut();
            state.source = SideStatus::Unbound;
            state.target = SideStatus::Unbound;
        }
        self.source.stop();
        self.target.stop();
        self.shared.clear();
        self.shared.sink.borrow_mut().take();
        self.shared.clear.borrow_mut().take();
    }
}

impl<S: Surface> Drop for ArrowController<S> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::ManualSurface;

    fn controller() -> (ManualSurface, ArrowController<ManualSurface>, Rc<RefCell<Vec<ArrowFrame>>>) {
        let surface = ManualSurface::new();
        let mut controller = ArrowController::new(surface.clone());
        let frames = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&frames);
        controller.on_render(move |frame| sink.borrow_mut().push(frame.clone()));
        (surface, controller, frames)
    }

    fn bind(source: &str, target: &str) -> ArrowConfigPatch {
        ArrowConfigPatch {
            source: Some(source.to_string()),
            target: Some(target.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_nothing_drawn_until_both_rects_known() {
        let (surface, mut controller, frames) = controller();
        let a = surface.add_region("a", Rect::new(0.0, 0.0, 10.0, 10.0));
        surface.add_region("b", Rect::new(100.0, 0.0, 10.0, 10.0));

        controller.configure(bind("a", "")).unwrap();
        assert_eq!(
            controller.status(Side::Source),
            SideStatus::Bound { reference: "a".to_string() }
        );

        surface.flush();
        assert!(matches!(controller.status(Side::Source), SideStatus::Tracking { .. }));
        surface.set_rect(a, Rect::new(5.0, 0.0, 10.0, 10.0));
        assert!(frames.borrow().is_empty());

        controller.configure(bind("a", "b")).unwrap();
        assert!(frames.borrow().is_empty());
        surface.flush();
        assert_eq!(frames.borrow().len(), 1);
    }

    #[test]
    fn test_option_change_recomputes_once() {
        let (surface, mut controller, frames) = controller();
        surface.add_region("a", Rect::new(0.0, 0.0, 10.0, 10.0));
        surface.add_region("b", Rect::new(100.0, 40.0, 10.0, 10.0));
        controller.configure(bind("a", "b")).unwrap();
        surface.flush();
        assert_eq!(frames.borrow().len(), 1);

        controller
            .configure(ArrowConfigPatch {
                mode: Some(ArrowType::Point),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(frames.borrow().len(), 2);
        assert_eq!(frames.borrow()[1].mode, ArrowType::Point);

        // Unchanged value, no recompute
        controller
            .configure(ArrowConfigPatch {
                mode: Some(ArrowType::Point),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(frames.borrow().len(), 2);
        assert_eq!(controller.recompute_count(), 2);
    }

    #[test]
    fn test_failed_target_reports_target_and_stays_unbound() {
        let (surface, mut controller, frames) = controller();
        surface.add_region("a", Rect::default());

        let err = controller.configure(bind("a", "#missing")).unwrap_err();
        assert_eq!(
            err,
            ArrowError::Resolution(ResolutionError::NotFound {
                side: Side::Target,
                reference: "#missing".to_string()
            })
        );
        assert_eq!(controller.status(Side::Target), SideStatus::Unbound);
        assert_eq!(controller.config().target, "");
        assert!(matches!(controller.status(Side::Source), SideStatus::Bound { .. }));

        surface.flush();
        assert!(frames.borrow().is_empty());
    }

    #[test]
    fn test_invalid_options_are_rejected_before_anything_changes() {
        let (surface, mut controller, _frames) = controller();
        let a = surface.add_region("a", Rect::default());

        let result = controller.configure(ArrowConfigPatch {
            source: Some("a".to_string()),
            pad_start: Some(-4.0),
            ..Default::default()
        });
        assert!(matches!(result, Err(ArrowError::Options(_))));
        assert_eq!(controller.status(Side::Source), SideStatus::Unbound);
        assert_eq!(surface.observer_count(a), 0);
    }

    #[test]
    fn test_clearing_reference_unbinds() {
        let (surface, mut controller, _frames) = controller();
        let a = surface.add_region("a", Rect::default());
        controller.configure(bind("a", "")).unwrap();
        assert_eq!(surface.observer_count(a), 1);

        controller
            .configure(ArrowConfigPatch {
                source: Some(String::new()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(surface.observer_count(a), 0);
        assert_eq!(controller.status(Side::Source), SideStatus::Unbound);
    }

    #[test]
    fn test_dispose_releases_everything() {
        let (surface, mut controller, frames) = controller();
        let a = surface.add_region("a", Rect::default());
        let b = surface.add_region("b", Rect::new(50.0, 0.0, 1.0, 1.0));
        controller.configure(bind("a", "b")).unwrap();

        controller.dispose();
        assert_eq!(surface.observer_count(a), 0);
        assert_eq!(surface.observer_count(b), 0);
        surface.flush();
        assert!(frames.borrow().is_empty());
        assert!(!controller.recompute());
    }

    #[test]
    fn test_drop_releases_subscriptions() {
        let (surface, mut controller, _frames) = controller();
        let a = surface.add_region("a", Rect::default());
        controller.configure(bind("a", "")).unwrap();

        drop(controller);
        assert_eq!(surface.observer_count(a), 0);
    }
}
