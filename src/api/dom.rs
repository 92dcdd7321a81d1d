//! Browser surface
//!
//! Resolves CSS selectors against the document and reports element boxes
//! relative to the host element. Size changes come from a `ResizeObserver`.
//! Moves come from an `IntersectionObserver` whose root margin is shrunk to
//! the element's own box, so any shift changes its intersection ratio and
//! the observer is rebuilt around the new position. Scrolling and window
//! resizes are caught by window listeners.

use crate::models::geometry::{Point, Rect};
use crate::tracker::{ObserverCleanup, RectCallback, Surface};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit,
    ResizeObserver, Window,
};

/// Smallest threshold used when the element starts outside its own margin box
const MIN_THRESHOLD: f64 = 1e-7;

pub struct DomSurface {
    document: Document,
    origin: Option<Element>,
}

impl DomSurface {
    /// `origin` is the element whose top-left corner maps to (0, 0)
    pub fn new(origin: Option<Element>) -> Result<Self, JsValue> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| JsValue::from_str("no document available"))?;
        Ok(Self { document, origin })
    }
}

/// Current box of `element` in `origin`'s coordinate space
pub fn measure(element: &Element, origin: Option<&Element>) -> Rect {
    let bounds = element.get_bounding_client_rect();
    let rect = Rect::new(bounds.x(), bounds.y(), bounds.width(), bounds.height());
    match origin {
        Some(origin) => {
            let offset = origin.get_bounding_client_rect();
            rect.relative_to(Point::new(offset.x(), offset.y()))
        }
        None => rect,
    }
}

fn listen(window: &Window, closure: &Closure<dyn FnMut()>) {
    let callback = closure.as_ref().unchecked_ref();
    if let Err(e) = window.add_event_listener_with_callback("resize", callback) {
        log::warn!("could not listen for window resize: {:?}", e);
    }
    if let Err(e) = window.add_event_listener_with_callback_and_bool("scroll", callback, true) {
        log::warn!("could not listen for scroll: {:?}", e);
    }
}

fn unlisten(window: &Window, closure: &Closure<dyn FnMut()>) {
    let callback = closure.as_ref().unchecked_ref();
    if let Err(e) = window.remove_event_listener_with_callback("resize", callback) {
        log::warn!("could not stop listening for window resize: {:?}", e);
    }
    if let Err(e) = window.remove_event_listener_with_callback_and_bool("scroll", callback, true) {
        log::warn!("could not stop listening for scroll: {:?}", e);
    }
}

/// Reports an element whenever it moves without resizing
struct MoveWatch {
    element: Element,
    root: Option<Element>,
    report: Rc<dyn Fn()>,
    observer: RefCell<Option<IntersectionObserver>>,
    callback: RefCell<Option<Closure<dyn FnMut(js_sys::Array)>>>,
    threshold: Cell<f64>,
    settled: Cell<bool>,
}

impl MoveWatch {
    fn start(element: &Element, report: Rc<dyn Fn()>) -> Rc<Self> {
        let root = element
            .owner_document()
            .and_then(|document| document.document_element());
        let watch = Rc::new(Self {
            element: element.clone(),
            root,
            report,
            observer: RefCell::new(None),
            callback: RefCell::new(None),
            threshold: Cell::new(1.0),
            settled: Cell::new(false),
        });

        let weak = Rc::downgrade(&watch);
        let callback = Closure::<dyn FnMut(js_sys::Array)>::new(move |entries: js_sys::Array| {
            let ratio = entries
                .get(0)
                .dyn_into::<IntersectionObserverEntry>()
                .ok()
                .map(|entry| entry.intersection_ratio());
            if let (Some(watch), Some(ratio)) = (weak.upgrade(), ratio) {
                watch.on_intersection(ratio);
            }
        });
        *watch.callback.borrow_mut() = Some(callback);
        watch.refresh(1.0);
        watch
    }

    /// Observe the element against a root margin equal to its current box
    fn refresh(&self, threshold: f64) {
        self.disconnect();
        self.threshold.set(threshold);
        self.settled.set(false);

        let Some(root) = &self.root else {
            return;
        };
        let bounds = self.element.get_bounding_client_rect();
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            return;
        }

        let top = bounds.y().floor();
        let left = bounds.x().floor();
        let right = (f64::from(root.client_width()) - (bounds.x() + bounds.width())).floor();
        let bottom = (f64::from(root.client_height()) - (bounds.y() + bounds.height())).floor();
        let margin = format!("{}px {}px {}px {}px", -top, -right, -bottom, -left);

        let callback = self.callback.borrow();
        let Some(callback) = callback.as_ref() else {
            return;
        };
        let options = IntersectionObserverInit::new();
        options.set_root_margin(&margin);
        options.set_threshold(&JsValue::from_f64(threshold));

        match IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &options) {
            Ok(observer) => {
                observer.observe(&self.element);
                *self.observer.borrow_mut() = Some(observer);
            }
            Err(e) => log::warn!("IntersectionObserver unavailable, moves go unnoticed: {:?}", e),
        }
    }

    fn on_intersection(&self, ratio: f64) {
        let first = !self.settled.replace(true);
        if ratio == self.threshold.get() {
            return;
        }
        if first {
            // Partly outside the viewport: watch for changes from this ratio
            self.refresh(if ratio > 0.0 { ratio } else { MIN_THRESHOLD });
        } else {
            (self.report)();
            self.refresh(1.0);
        }
    }

    fn disconnect(&self) {
        if let Some(observer) = self.observer.borrow_mut().take() {
            observer.disconnect();
        }
    }

    fn stop(&self) {
        self.disconnect();
        self.callback.borrow_mut().take();
    }
}

impl Surface for DomSurface {
    type Element = Element;

    fn query(&self, reference: &str) -> Result<Vec<Element>, String> {
        let nodes = self
            .document
            .query_selector_all(reference)
            .map_err(|e| format!("{:?}", e))?;

        Ok((0..nodes.length())
            .filter_map(|i| nodes.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect())
    }

    fn observe(&self, element: &Element, on_change: RectCallback) -> ObserverCleanup {
        let on_change = Rc::new(RefCell::new(on_change));
        let report: Rc<dyn Fn()> = {
            let element = element.clone();
            let origin = self.origin.clone();
            Rc::new(move || {
                let rect = measure(&element, origin.as_ref());
                if let Ok(mut on_change) = on_change.try_borrow_mut() {
                    on_change(rect);
                }
            })
        };

        let on_resize = {
            let report = Rc::clone(&report);
            Closure::<dyn FnMut()>::new(move || report())
        };
        let on_move = {
            let report = Rc::clone(&report);
            Closure::<dyn FnMut()>::new(move || report())
        };

        // ResizeObserver delivers the initial box on its own
        let observer = match ResizeObserver::new(on_resize.as_ref().unchecked_ref()) {
            Ok(observer) => {
                observer.observe(element);
                Some(observer)
            }
            Err(e) => {
                log::warn!("ResizeObserver unavailable, reporting once: {:?}", e);
                report();
                None
            }
        };

        let window = web_sys::window();
        if let Some(window) = &window {
            listen(window, &on_move);
        }
        let moves = MoveWatch::start(element, Rc::clone(&report));

        ObserverCleanup::new(move || {
            if let Some(observer) = observer {
                observer.disconnect();
            }
            moves.stop();
            if let Some(window) = window {
                unlisten(&window, &on_move);
            }
            drop(on_resize);
        })
    }
}
