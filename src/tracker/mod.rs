//! Region tracking
//!
//! A [`RegionTracker`] resolves one reference on a [`Surface`] and keeps a
//! single box observation alive for it. Every subscription carries an id;
//! callbacks from a released subscription are dropped before they reach the
//! owner, so a notification already in flight when `stop` runs is harmless.

pub mod manual;

pub use manual::{ManualSurface, RegionId};

use crate::error::ResolutionError;
use crate::models::geometry::Rect;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Which end of the arrow a tracker feeds
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Source,
    Target,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Source => "source",
            Side::Target => "target",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives every rect reported for an observed element
pub type RectCallback = Box<dyn FnMut(Rect)>;

/// Release handle for one box observation
///
/// Releasing twice is a no-op; dropping the handle releases it.
pub struct ObserverCleanup(Option<Box<dyn FnOnce()>>);

impl ObserverCleanup {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self(Some(Box::new(release)))
    }

    /// A handle with nothing to release
    pub fn noop() -> Self {
        Self(None)
    }

    pub fn release(&mut self) {
        if let Some(release) = self.0.take() {
            release();
        }
    }

    pub fn is_released(&self) -> bool {
        self.0.is_none()
    }
}

impl Drop for ObserverCleanup {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for ObserverCleanup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObserverCleanup")
            .field(&if self.is_released() { "released" } else { "live" })
            .finish()
    }
}

/// Layout surface the arrow connects regions of
///
/// This is the seam to the host: reference resolution and the
/// box-observation primitive.
pub trait Surface {
    type Element;

    /// Every element matching `reference`, in surface order
    ///
    /// `Err` means the reference itself is malformed.
    fn query(&self, reference: &str) -> Result<Vec<Self::Element>, String>;

    /// Start reporting `element`'s rect to `on_change`
    ///
    /// Reports may arrive at any later time, including never. Calling this
    /// for several elements at once must be supported.
    fn observe(&self, element: &Self::Element, on_change: RectCallback) -> ObserverCleanup;
}

/// What to do when a reference matches more than one element
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// Take the first match in surface order
    #[default]
    First,
    /// Reject the reference as ambiguous
    Unique,
}

/// Resolve `reference` to exactly one element under `policy`
pub fn resolve<S: Surface>(
    surface: &S,
    side: Side,
    reference: &str,
    policy: MatchPolicy,
) -> Result<S::Element, ResolutionError> {
    let matches = surface
        .query(reference)
        .map_err(|reason| ResolutionError::InvalidReference {
            side,
            reference: reference.to_string(),
            reason,
        })?;

    let count = matches.len();
    if count > 1 {
        if policy == MatchPolicy::Unique {
            return Err(ResolutionError::Ambiguous {
                side,
                reference: reference.to_string(),
                count,
            });
        }
        log::warn!("{} '{}' matched {} elements, using the first", side, reference, count);
    }

    matches.into_iter().next().ok_or_else(|| ResolutionError::NotFound {
        side,
        reference: reference.to_string(),
    })
}

/// Identity of one observation started by a tracker
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct Subscription {
    id: SubscriptionId,
    reference: String,
    cleanup: ObserverCleanup,
}

/// Owns at most one live observation for one side of the arrow
pub struct RegionTracker {
    side: Side,
    next_id: u64,
    live: Rc<Cell<Option<SubscriptionId>>>,
    subscription: Option<Subscription>,
}

impl RegionTracker {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            next_id: 0,
            live: Rc::new(Cell::new(None)),
            subscription: None,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Id of the live subscription, if any
    pub fn active(&self) -> Option<SubscriptionId> {
        self.subscription.as_ref().map(|sub| sub.id)
    }

    /// Reference the live subscription was resolved from
    pub fn reference(&self) -> Option<&str> {
        self.subscription.as_ref().map(|sub| sub.reference.as_str())
    }

    /// Resolve `reference` and start observing it
    ///
    /// Any previous subscription is released first, before the new one
    /// exists. On error the tracker is left stopped.
    pub fn start<S: Surface>(
        &mut self,
        surface: &S,
        reference: &str,
        policy: MatchPolicy,
        mut on_change: impl FnMut(Rect) + 'static,
    ) -> Result<SubscriptionId, ResolutionError> {
        self.stop();

        let element = resolve(surface, self.side, reference, policy)?;

        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.live.set(Some(id));

        let live = Rc::clone(&self.live);
        let side = self.side;
        let cleanup = surface.observe(
            &element,
            Box::new(move |rect| {
                if live.get() != Some(id) {
                    log::debug!("dropping stale {} rect from subscription {}", side, id);
                    return;
                }
                on_change(rect);
            }),
        );

        log::debug!("{} subscription {} tracking '{}'", self.side, id, reference);
        self.subscription = Some(Subscription {
            id,
            reference: reference.to_string(),
            cleanup,
        });
        Ok(id)
    }

    /// Release the live subscription; a no-op when there is none
    pub fn stop(&mut self) {
        self.live.set(None);
        if let Some(mut subscription) = self.subscription.take() {
            subscription.cleanup.release();
            log::debug!("{} subscription {} released", self.side, subscription.id);
        }
    }
}

impl Drop for RegionTracker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn recorder() -> (Rc<RefCell<Vec<Rect>>>, impl FnMut(Rect) + 'static) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        (seen, move |rect| sink.borrow_mut().push(rect))
    }

    #[test]
    fn test_missing_reference_is_not_found() {
        let surface = ManualSurface::new();
        let mut tracker = RegionTracker::new(Side::Target);
        let (_, on_change) = recorder();

        let err = tracker
            .start(&surface, "#nope", MatchPolicy::First, on_change)
            .unwrap_err();
        assert_eq!(
            err,
            ResolutionError::NotFound {
                side: Side::Target,
                reference: "#nope".to_string()
            }
        );
        assert!(err.to_string().starts_with("target is not a valid element"));
        assert_eq!(tracker.active(), None);
    }

    #[test]
    fn test_ambiguous_reference_under_each_policy() {
        let surface = ManualSurface::new();
        let first = surface.add_region(".node", Rect::new(0.0, 0.0, 10.0, 10.0));
        surface.add_region(".node", Rect::new(50.0, 0.0, 10.0, 10.0));

        let mut tracker = RegionTracker::new(Side::Source);
        let (_, on_change) = recorder();
        let err = tracker
            .start(&surface, ".node", MatchPolicy::Unique, on_change)
            .unwrap_err();
        assert!(matches!(err, ResolutionError::Ambiguous { count: 2, .. }));

        let (seen, on_change) = recorder();
        tracker
            .start(&surface, ".node", MatchPolicy::First, on_change)
            .unwrap();
        surface.flush();
        assert_eq!(*seen.borrow(), vec![surface.rect(first).unwrap()]);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let surface = ManualSurface::new();
        let region = surface.add_region("a", Rect::default());
        let mut tracker = RegionTracker::new(Side::Source);

        tracker.stop();
        let (_, on_change) = recorder();
        tracker.start(&surface, "a", MatchPolicy::First, on_change).unwrap();
        assert_eq!(surface.observer_count(region), 1);

        tracker.stop();
        tracker.stop();
        assert_eq!(surface.observer_count(region), 0);
        assert_eq!(tracker.reference(), None);
    }

    #[test]
    fn test_restart_releases_previous_subscription() {
        let surface = ManualSurface::new();
        let a = surface.add_region("a", Rect::default());
        let b = surface.add_region("b", Rect::default());
        let mut tracker = RegionTracker::new(Side::Source);

        let (_, on_change) = recorder();
        let first = tracker.start(&surface, "a", MatchPolicy::First, on_change).unwrap();
        let (_, on_change) = recorder();
        let second = tracker.start(&surface, "b", MatchPolicy::First, on_change).unwrap();

        assert_ne!(first, second);
        assert_eq!(surface.observer_count(a), 0);
        assert_eq!(surface.observer_count(b), 1);
        assert_eq!(tracker.reference(), Some("b"));
    }

    #[test]
    fn test_cleanup_release_runs_once() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let mut cleanup = ObserverCleanup::new(move || counter.set(counter.get() + 1));

        cleanup.release();
        cleanup.release();
        drop(cleanup);
        assert_eq!(calls.get(), 1);
    }
}
