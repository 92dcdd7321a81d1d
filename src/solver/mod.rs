//! Arrow geometry solver
//!
//! Pure functions from two rects and an option set to an [`Arrow`]
//! descriptor. Same inputs, same output: nothing here reads or keeps state.

pub mod boxes;
pub mod curve;

pub use boxes::get_box_to_box_arrow;
pub use curve::{effective_bow, get_arrow};

use crate::models::geometry::{Point, Rect};
use crate::models::options::{ArrowOptions, ArrowType};
use serde::{Deserialize, Serialize};

/// Solved arrow: padded endpoints, quadratic control point and the three
/// angles used to orient arrowheads
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Arrow {
    /// Padded start point
    pub start: Point,

    /// Quadratic control point
    pub control: Point,

    /// Padded end point
    pub end: Point,

    /// Direction for an arrowhead at the end (radians)
    pub end_angle: f64,

    /// Direction for an arrowhead at the start, pointing away from the curve
    pub start_angle: f64,

    /// Direction of the curve at its midpoint
    pub center_angle: f64,
}

impl Arrow {
    /// `[sx, sy, cx, cy, ex, ey, ae, as, ac]`
    pub fn to_array(&self) -> [f64; 9] {
        [
            self.start.x,
            self.start.y,
            self.control.x,
            self.control.y,
            self.end.x,
            self.end.y,
            self.end_angle,
            self.start_angle,
            self.center_angle,
        ]
    }

    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}

/// Solve the arrow between two tracked rects
pub fn solve(source: &Rect, target: &Rect, options: &ArrowOptions, mode: ArrowType) -> Arrow {
    match mode {
        ArrowType::Point => get_arrow(source.center(), target.center(), options),
        ArrowType::Box => get_box_to_box_arrow(source, target, options),
    }
}
