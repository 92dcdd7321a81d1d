//! Pure solver entry points for JavaScript
//!
//! Each returns the 9-value descriptor `[sx, sy, cx, cy, ex, ey, ae, as, ac]`.

use super::helpers::{deserialize_or_default, js_error};
use crate::models::geometry::{Point, Rect};
use crate::models::options::{ArrowOptions, ArrowType};
use crate::solver;
use wasm_bindgen::prelude::*;

fn options_from_js(options: JsValue) -> Result<ArrowOptions, JsValue> {
    let options: ArrowOptions = deserialize_or_default(options, "Invalid arrow options")?;
    options.validate().map_err(js_error)?;
    Ok(options)
}

/// Curve between two points
#[wasm_bindgen(js_name = getArrow)]
pub fn get_arrow(x0: f64, y0: f64, x1: f64, y1: f64, options: JsValue) -> Result<Vec<f64>, JsValue> {
    let options = options_from_js(options)?;
    let arrow = solver::get_arrow(Point::new(x0, y0), Point::new(x1, y1), &options);
    Ok(arrow.to_array().to_vec())
}

/// Curve between the facing edges of two boxes
#[wasm_bindgen(js_name = getBoxToBoxArrow)]
#[allow(clippy::too_many_arguments)]
pub fn get_box_to_box_arrow(
    x0: f64,
    y0: f64,
    w0: f64,
    h0: f64,
    x1: f64,
    y1: f64,
    w1: f64,
    h1: f64,
    options: JsValue,
) -> Result<Vec<f64>, JsValue> {
    let options = options_from_js(options)?;
    let arrow = solver::get_box_to_box_arrow(
        &Rect::new(x0, y0, w0, h0),
        &Rect::new(x1, y1, w1, h1),
        &options,
    );
    Ok(arrow.to_array().to_vec())
}

/// Solve between two rects with the named arrow type
#[wasm_bindgen(js_name = solveArrow)]
pub fn solve_arrow(source: &Rect, target: &Rect, options: JsValue, mode: &str) -> Result<Vec<f64>, JsValue> {
    let options = options_from_js(options)?;
    let mode: ArrowType = mode.parse().map_err(js_error)?;
    Ok(solver::solve(source, target, &options, mode).to_array().to_vec())
}
