//! `<perfect-arrow>` element backing object
//!
//! The JavaScript custom element owns one `PerfectArrow` and forwards its
//! attribute changes and disconnect to it. Drawing happens in Rust: each
//! frame is serialized to SVG and written into the host's shadow root (or
//! the host itself when it has none).

use super::dom::DomSurface;
use super::helpers::{deserialize_or_default, js_error, serialize};
use crate::controller::{ArrowController, ArrowFrame, SideStatus};
use crate::models::config::{ArrowConfigPatch, ArrowField};
use crate::renderers::path::RenderStyle;
use crate::renderers::svg::SvgRenderer;
use crate::tracker::{MatchPolicy, Side};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use web_sys::Element;

const ATTRIBUTES: [ArrowField; 11] = [
    ArrowField::Mode,
    ArrowField::Source,
    ArrowField::Target,
    ArrowField::Bow,
    ArrowField::Stretch,
    ArrowField::StretchMin,
    ArrowField::StretchMax,
    ArrowField::PadStart,
    ArrowField::PadEnd,
    ArrowField::Flip,
    ArrowField::Straights,
];

#[derive(Serialize)]
struct Status {
    source: SideStatus,
    target: SideStatus,
}

fn paint(host: &Element, markup: &str) {
    match host.shadow_root() {
        Some(root) => root.set_inner_html(markup),
        None => host.set_inner_html(markup),
    }
}

fn paint_frame(host: &Element, frame: &ArrowFrame, style: &RenderStyle) {
    let bounds = host.get_bounding_client_rect();
    let (width, height) = if bounds.width() > 0.0 && bounds.height() > 0.0 {
        (bounds.width(), bounds.height())
    } else {
        // Unsized host: grow the canvas to fit the arrow
        let extent = frame.drawable.bounds();
        (extent.right(), extent.bottom())
    };
    let markup = SvgRenderer::render(&frame.drawable, width, height, style);
    paint(host, &markup);
}

fn paint_empty(host: &Element, style: &RenderStyle) {
    let bounds = host.get_bounding_client_rect();
    paint(host, &SvgRenderer::render_empty(bounds.width(), bounds.height(), style));
}

#[wasm_bindgen]
pub struct PerfectArrow {
    host: Element,
    controller: ArrowController<DomSurface>,
}

#[wasm_bindgen]
impl PerfectArrow {
    /// Attach to `host`; rects are measured relative to it
    #[wasm_bindgen(constructor)]
    pub fn new(host: Element, unique_references: Option<bool>) -> Result<PerfectArrow, JsValue> {
        let surface = DomSurface::new(Some(host.clone()))?;
        let policy = if unique_references.unwrap_or(false) {
            MatchPolicy::Unique
        } else {
            MatchPolicy::First
        };

        let mut arrow = PerfectArrow {
            host,
            controller: ArrowController::new(surface).with_match_policy(policy),
        };
        arrow.install_sink(RenderStyle::default());
        Ok(arrow)
    }

    /// Attribute names the element should observe
    #[wasm_bindgen(js_name = observedAttributes)]
    pub fn observed_attributes() -> js_sys::Array {
        ATTRIBUTES
            .iter()
            .map(|field| JsValue::from_str(field.attribute()))
            .collect()
    }

    /// Apply a partial `{ type, source, target, bow, ... }` object
    ///
    /// Returns the names of the fields that changed.
    pub fn configure(&mut self, options: JsValue) -> Result<JsValue, JsValue> {
        let patch: ArrowConfigPatch = deserialize_or_default(options, "Invalid arrow options")?;
        let changes = self.controller.configure(patch).map_err(js_error)?;
        serialize(&changes, "Failed to serialize changed fields")
    }

    /// Forward `attributeChangedCallback`; `value` is `null` on removal
    #[wasm_bindgen(js_name = attributeChanged)]
    pub fn attribute_changed(&mut self, name: &str, value: Option<String>) -> Result<JsValue, JsValue> {
        let patch = ArrowConfigPatch::from_attribute(name, value.as_deref()).map_err(js_error)?;
        let changes = self.controller.configure(patch).map_err(js_error)?;
        serialize(&changes, "Failed to serialize changed fields")
    }

    /// Replace stroke, fill and marker sizes
    #[wasm_bindgen(js_name = setStyle)]
    pub fn set_style(&mut self, style: JsValue) -> Result<(), JsValue> {
        let style: RenderStyle = deserialize_or_default(style, "Invalid render style")?;
        self.install_sink(style.clone());
        self.controller.set_style(style);
        Ok(())
    }

    /// Current configuration as a plain object
    pub fn config(&self) -> Result<JsValue, JsValue> {
        serialize(&self.controller.config(), "Failed to serialize config")
    }

    /// Binding state of both sides
    pub fn status(&self) -> Result<JsValue, JsValue> {
        serialize(
            &Status {
                source: self.controller.status(Side::Source),
                target: self.controller.status(Side::Target),
            },
            "Failed to serialize status",
        )
    }

    /// Redraw from the last known rects; `false` if either is missing
    pub fn redraw(&self) -> bool {
        self.controller.recompute()
    }

    /// Re-resolve both references, e.g. after the document changed
    pub fn rebind(&mut self) -> Result<(), JsValue> {
        self.controller.rebind(Side::Source).map_err(js_error)?;
        self.controller.rebind(Side::Target).map_err(js_error)?;
        Ok(())
    }

    /// Stop tracking and clear the drawing; call from `disconnectedCallback`
    pub fn dispose(&mut self) {
        let style = self.controller.style();
        self.controller.dispose();
        paint_empty(&self.host, &style);
    }
}

impl PerfectArrow {
    fn install_sink(&mut self, style: RenderStyle) {
        let host = self.host.clone();
        let frame_style = style.clone();
        self.controller
            .on_render(move |frame| paint_frame(&host, frame, &frame_style));

        let host = self.host.clone();
        self.controller.on_clear(move || paint_empty(&host, &style));
    }
}
