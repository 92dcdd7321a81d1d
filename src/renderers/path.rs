//! Drawable arrow geometry
//!
//! Turns a solved [`Arrow`] into the shapes a drawing surface needs: the
//! quadratic curve, a triangular arrowhead at the end and a dot at the start.
//! Nothing here knows about any markup dialect.

use crate::models::geometry::{Point, Rect};
use crate::solver::Arrow;
use serde::{Deserialize, Serialize};

/// Stroke/fill and marker sizes for a rendered arrow
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderStyle {
    pub stroke: String,
    pub fill: String,
    pub stroke_width: f64,

    /// Distance from the base of the arrowhead to its tip
    pub head_length: f64,

    /// Half the width of the arrowhead base
    pub head_half_width: f64,

    /// Radius of the dot drawn at the start; `0` omits it
    pub dot_radius: f64,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            stroke: "#000".to_string(),
            fill: "#000".to_string(),
            stroke_width: 3.0,
            head_length: 12.0,
            head_half_width: 6.0,
            dot_radius: 4.0,
        }
    }
}

/// Quadratic Bézier segment
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct QuadCurve {
    pub start: Point,
    pub control: Point,
    pub end: Point,
}

impl QuadCurve {
    /// `M sx,sy Q cx,cy ex,ey` path data
    pub fn path_data(&self) -> String {
        format!(
            "M{},{} Q{},{} {},{}",
            fmt_num(self.start.x),
            fmt_num(self.start.y),
            fmt_num(self.control.x),
            fmt_num(self.control.y),
            fmt_num(self.end.x),
            fmt_num(self.end.y)
        )
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    pub center: Point,
    pub radius: f64,
}

/// Everything needed to draw one arrow
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DrawableArrow {
    pub curve: QuadCurve,

    /// Arrowhead triangle: upper base corner, tip, lower base corner
    pub head: [Point; 3],

    pub start_dot: Option<Circle>,
}

impl DrawableArrow {
    /// Smallest rect containing the control polygon, head and dot
    pub fn bounds(&self) -> Rect {
        let mut points = vec![self.curve.start, self.curve.control, self.curve.end];
        points.extend_from_slice(&self.head);

        let mut min = Point::new(f64::INFINITY, f64::INFINITY);
        let mut max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in points {
            min = Point::new(min.x.min(p.x), min.y.min(p.y));
            max = Point::new(max.x.max(p.x), max.y.max(p.y));
        }
        if let Some(dot) = self.start_dot {
            min = Point::new(min.x.min(dot.center.x - dot.radius), min.y.min(dot.center.y - dot.radius));
            max = Point::new(max.x.max(dot.center.x + dot.radius), max.y.max(dot.center.y + dot.radius));
        }

        Rect::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }
}

/// Stateless arrow-to-shapes conversion
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PathRenderer {
    style: RenderStyle,
}

impl PathRenderer {
    pub fn new(style: RenderStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &RenderStyle {
        &self.style
    }

    pub fn render(&self, arrow: &Arrow) -> DrawableArrow {
        let curve = QuadCurve {
            start: arrow.start,
            control: arrow.control,
            end: arrow.end,
        };

        // Head template points along +x with its base on the end point
        let template = [
            Point::new(0.0, -self.style.head_half_width),
            Point::new(self.style.head_length, 0.0),
            Point::new(0.0, self.style.head_half_width),
        ];
        let head = template.map(|p| {
            Point::new(p.x + arrow.end.x, p.y + arrow.end.y).rotate_around(arrow.end, arrow.end_angle)
        });

        let start_dot = (self.style.dot_radius > 0.0).then_some(Circle {
            center: arrow.start,
            radius: self.style.dot_radius,
        });

        DrawableArrow {
            curve,
            head,
            start_dot,
        }
    }
}

/// Compact number formatting for markup: at most three decimals, no `-0`
pub fn fmt_num(value: f64) -> String {
    let mut text = format!("{:.3}", value);
    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed);
    }
    if text == "-0" {
        text = "0".to_string();
    }
    text
}
