// Shared helpers for integration tests

#![allow(dead_code)]

use perfect_arrow::controller::{ArrowController, ArrowFrame};
use perfect_arrow::models::Rect;
use perfect_arrow::tracker::{ObserverCleanup, RectCallback, Surface};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

pub const EPS: f64 = 1e-9;

/// Surface whose notifications can still arrive after cleanup
///
/// Models a box observer that had already queued a callback when the
/// subscription was released.
#[derive(Clone, Default)]
pub struct LaggySurface {
    elements: Rc<RefCell<Vec<String>>>,
    observers: Rc<RefCell<Vec<LaggyObserver>>>,
}

struct LaggyObserver {
    element: usize,
    released: Rc<Cell<bool>>,
    callback: Rc<RefCell<RectCallback>>,
}

impl LaggySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, name: &str) -> usize {
        let mut elements = self.elements.borrow_mut();
        elements.push(name.to_string());
        elements.len() - 1
    }

    fn callbacks(&self, element: usize, include_released: bool) -> Vec<Rc<RefCell<RectCallback>>> {
        self.observers
            .borrow()
            .iter()
            .filter(|o| o.element == element && (include_released || !o.released.get()))
            .map(|o| Rc::clone(&o.callback))
            .collect()
    }

    /// Report `rect` to live observers of `element`
    pub fn report(&self, element: usize, rect: Rect) {
        for callback in self.callbacks(element, false) {
            (callback.borrow_mut())(rect);
        }
    }

    /// Report `rect` to every observer ever registered for `element`
    pub fn report_in_flight(&self, element: usize, rect: Rect) {
        for callback in self.callbacks(element, true) {
            (callback.borrow_mut())(rect);
        }
    }

    pub fn live_observers(&self, element: usize) -> usize {
        self.observers
            .borrow()
            .iter()
            .filter(|o| o.element == element && !o.released.get())
            .count()
    }
}

impl Surface for LaggySurface {
    type Element = usize;

    fn query(&self, reference: &str) -> Result<Vec<usize>, String> {
        Ok(self
            .elements
            .borrow()
            .iter()
            .enumerate()
            .filter(|(_, name)| name.as_str() == reference)
            .map(|(i, _)| i)
            .collect())
    }

    fn observe(&self, element: &usize, on_change: RectCallback) -> ObserverCleanup {
        let released = Rc::new(Cell::new(false));
        self.observers.borrow_mut().push(LaggyObserver {
            element: *element,
            released: Rc::clone(&released),
            callback: Rc::new(RefCell::new(on_change)),
        });
        ObserverCleanup::new(move || released.set(true))
    }
}

/// Install a sink that collects every frame
pub fn collect_frames<S: Surface>(controller: &mut ArrowController<S>) -> Rc<RefCell<Vec<ArrowFrame>>> {
    let frames = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&frames);
    controller.on_render(move |frame| sink.borrow_mut().push(frame.clone()));
    frames
}

/// Install a clear hook and count how often it fires
pub fn count_clears<S: Surface>(controller: &mut ArrowController<S>) -> Rc<Cell<usize>> {
    let clears = Rc::new(Cell::new(0));
    let counter = Rc::clone(&clears);
    controller.on_clear(move || counter.set(counter.get() + 1));
    clears
}
