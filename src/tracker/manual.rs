//! Host-driven surface
//!
//! For embedders without a layout engine of their own (native windows,
//! terminals, tests): the host names regions and pushes their rects.
//! Like a real observer, a new observation receives its first rect later,
//! on the next `flush`, never from inside `observe`.

use super::{ObserverCleanup, RectCallback, Surface};
use crate::models::geometry::Rect;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Handle to a region registered on a [`ManualSurface`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RegionId(u64);

struct Observer {
    key: u64,
    callback: Rc<RefCell<RectCallback>>,
    pending: bool,
}

struct Region {
    id: RegionId,
    name: String,
    rect: Rect,
    observers: Vec<Observer>,
}

#[derive(Default)]
struct Regions {
    regions: Vec<Region>,
    next_region: u64,
    next_observer: u64,
}

impl Regions {
    fn get_mut(&mut self, id: RegionId) -> Option<&mut Region> {
        self.regions.iter_mut().find(|region| region.id == id)
    }
}

type Delivery = (Rc<RefCell<RectCallback>>, Rect);

/// Surface whose regions and rects are pushed by the host
///
/// Clones share the same regions.
#[derive(Clone, Default)]
pub struct ManualSurface {
    inner: Rc<RefCell<Regions>>,
}

impl ManualSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a region; several regions may share a name
    pub fn add_region(&self, name: &str, rect: Rect) -> RegionId {
        let mut inner = self.inner.borrow_mut();
        inner.next_region += 1;
        let id = RegionId(inner.next_region);
        inner.regions.push(Region {
            id,
            name: name.to_string(),
            rect,
            observers: Vec::new(),
        });
        id
    }

    /// Forget a region; its observers receive nothing further
    pub fn remove_region(&self, id: RegionId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.regions.len();
        inner.regions.retain(|region| region.id != id);
        inner.regions.len() != before
    }

    pub fn rect(&self, id: RegionId) -> Option<Rect> {
        let inner = self.inner.borrow();
        inner.regions.iter().find(|region| region.id == id).map(|region| region.rect)
    }

    pub fn observer_count(&self, id: RegionId) -> usize {
        let inner = self.inner.borrow();
        inner
            .regions
            .iter()
            .find(|region| region.id == id)
            .map_or(0, |region| region.observers.len())
    }

    /// Move or resize a region and notify everyone observing it
    pub fn set_rect(&self, id: RegionId, rect: Rect) {
        let deliveries: Vec<Delivery> = {
            let mut inner = self.inner.borrow_mut();
            let Some(region) = inner.get_mut(id) else {
                log::warn!("set_rect on unknown region {:?}", id);
                return;
            };
            region.rect = rect;
            region
                .observers
                .iter_mut()
                .map(|observer| {
                    observer.pending = false;
                    (Rc::clone(&observer.callback), rect)
                })
                .collect()
        };
        deliver(deliveries);
    }

    /// Send the current rect to observers that have not had one yet
    ///
    /// Returns the number of callbacks invoked.
    pub fn flush(&self) -> usize {
        let deliveries: Vec<Delivery> = {
            let mut inner = self.inner.borrow_mut();
            let mut out = Vec::new();
            for region in inner.regions.iter_mut() {
                let rect = region.rect;
                for observer in region.observers.iter_mut().filter(|o| o.pending) {
                    observer.pending = false;
                    out.push((Rc::clone(&observer.callback), rect));
                }
            }
            out
        };
        let count = deliveries.len();
        deliver(deliveries);
        count
    }
}

/// Run callbacks with no borrow of the region table held
fn deliver(deliveries: Vec<Delivery>) {
    for (callback, rect) in deliveries {
        match callback.try_borrow_mut() {
            Ok(mut callback) => callback(rect),
            Err(_) => log::warn!("skipping re-entrant rect delivery"),
        }
    }
}

fn unobserve(regions: &Weak<RefCell<Regions>>, id: RegionId, key: u64) {
    let Some(regions) = regions.upgrade() else {
        return;
    };
    let mut inner = regions.borrow_mut();
    if let Some(region) = inner.get_mut(id) {
        region.observers.retain(|observer| observer.key != key);
    }
}

impl Surface for ManualSurface {
    type Element = RegionId;

    fn query(&self, reference: &str) -> Result<Vec<RegionId>, String> {
        if reference.trim().is_empty() {
            return Err("empty reference".to_string());
        }
        let inner = self.inner.borrow();
        Ok(inner
            .regions
            .iter()
            .filter(|region| region.name == reference)
            .map(|region| region.id)
            .collect())
    }

    fn observe(&self, element: &RegionId, on_change: RectCallback) -> ObserverCleanup {
        let id = *element;
        let mut inner = self.inner.borrow_mut();
        inner.next_observer += 1;
        let key = inner.next_observer;

        let Some(region) = inner.get_mut(id) else {
            log::warn!("observe on unknown region {:?}", id);
            return ObserverCleanup::noop();
        };
        region.observers.push(Observer {
            key,
            callback: Rc::new(RefCell::new(on_change)),
            pending: true,
        });

        let regions = Rc::downgrade(&self.inner);
        ObserverCleanup::new(move || unobserve(&regions, id, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counting(count: &Rc<Cell<usize>>) -> RectCallback {
        let count = Rc::clone(count);
        Box::new(move |_| count.set(count.get() + 1))
    }

    #[test]
    fn test_first_rect_waits_for_flush() {
        let surface = ManualSurface::new();
        let region = surface.add_region("a", Rect::new(1.0, 2.0, 3.0, 4.0));
        let count = Rc::new(Cell::new(0));

        let _cleanup = surface.observe(&region, counting(&count));
        assert_eq!(count.get(), 0);

        assert_eq!(surface.flush(), 1);
        assert_eq!(surface.flush(), 0);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_set_rect_notifies_every_observer() {
        let surface = ManualSurface::new();
        let region = surface.add_region("a", Rect::default());
        let count = Rc::new(Cell::new(0));

        let _one = surface.observe(&region, counting(&count));
        let _two = surface.observe(&region, counting(&count));
        surface.set_rect(region, Rect::new(5.0, 5.0, 1.0, 1.0));

        assert_eq!(count.get(), 2);
        assert_eq!(surface.flush(), 0);
    }

    #[test]
    fn test_cleanup_stops_notifications() {
        let surface = ManualSurface::new();
        let region = surface.add_region("a", Rect::default());
        let count = Rc::new(Cell::new(0));

        let mut cleanup = surface.observe(&region, counting(&count));
        cleanup.release();
        surface.set_rect(region, Rect::new(5.0, 5.0, 1.0, 1.0));

        assert_eq!(count.get(), 0);
        assert_eq!(surface.observer_count(region), 0);
    }

    #[test]
    fn test_query_matches_names_in_order() {
        let surface = ManualSurface::new();
        let a = surface.add_region("node", Rect::default());
        surface.add_region("other", Rect::default());
        let c = surface.add_region("node", Rect::default());

        assert_eq!(surface.query("node"), Ok(vec![a, c]));
        assert_eq!(surface.query("missing"), Ok(vec![]));
        assert!(surface.query("  ").is_err());
    }

    #[test]
    fn test_removed_region_goes_quiet() {
        let surface = ManualSurface::new();
        let region = surface.add_region("a", Rect::default());
        let count = Rc::new(Cell::new(0));
        let _cleanup = surface.observe(&region, counting(&count));

        assert!(surface.remove_region(region));
        surface.set_rect(region, Rect::new(1.0, 1.0, 1.0, 1.0));
        assert_eq!(surface.flush(), 0);
        assert_eq!(count.get(), 0);
    }
}
