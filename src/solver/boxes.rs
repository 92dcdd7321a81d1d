//! Box-to-box anchoring
//!
//! Picks one anchor on the perimeter of each rect so the connector between
//! them is the shortest one that does not cross either box, then hands the
//! two anchors to the point-to-point curve.

use super::curve::{get_arrow, straight_arrow, MIN_DISTANCE};
use super::Arrow;
use crate::models::geometry::{Point, Rect};
use crate::models::options::ArrowOptions;

/// A perimeter point and the outward normal of the edge it sits on
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Anchor {
    pub point: Point,
    pub normal: Point,
}

impl Anchor {
    fn new(x: f64, y: f64, nx: f64, ny: f64) -> Self {
        Self {
            point: Point::new(x, y),
            normal: Point::new(nx, ny),
        }
    }

    /// Push the anchor `distance` units away from its box
    pub fn padded(&self, distance: f64) -> Point {
        Point::new(
            self.point.x + self.normal.x * distance,
            self.point.y + self.normal.y * distance,
        )
    }

    /// Distance from this anchor to `other` along the outward normal
    fn gap_to(&self, other: &Anchor) -> f64 {
        let along = (other.point.x - self.point.x) * self.normal.x
            + (other.point.y - self.point.y) * self.normal.y;
        along.max(0.0)
    }

    fn transposed(self) -> Self {
        Self {
            point: Point::new(self.point.y, self.point.x),
            normal: Point::new(self.normal.y, self.normal.x),
        }
    }
}

/// How two intervals on one axis relate
#[derive(Clone, Copy, Debug, PartialEq)]
enum Span {
    /// The second interval starts after the first ends
    Before(f64),
    /// The second interval ends before the first starts
    After(f64),
    /// Shared range `lo..=hi`
    Overlap(f64, f64),
}

impl Span {
    fn between(a_lo: f64, a_hi: f64, b_lo: f64, b_hi: f64) -> Self {
        if a_hi < b_lo {
            Span::Before(b_lo - a_hi)
        } else if b_hi < a_lo {
            Span::After(a_lo - b_hi)
        } else {
            Span::Overlap(a_lo.max(b_lo), a_hi.min(b_hi))
        }
    }

    fn gap(&self) -> Option<f64> {
        match self {
            Span::Before(gap) | Span::After(gap) => Some(*gap),
            Span::Overlap(..) => None,
        }
    }
}

fn transposed(rect: &Rect) -> Rect {
    Rect::new(rect.y, rect.x, rect.height, rect.width)
}

/// Anchors on the vertical edges that face each other across the x axis
fn across_x(a: &Rect, b: &Rect, b_is_right: bool, cross: Span) -> (Anchor, Anchor) {
    let (a_y, b_y) = match cross {
        Span::Overlap(lo, hi) => {
            let mid = (lo + hi) / 2.0;
            (mid, mid)
        }
        // Diagonal: take the nearest corners
        Span::Before(_) => (a.bottom(), b.y),
        Span::After(_) => (a.y, b.bottom()),
    };

    if b_is_right {
        (Anchor::new(a.right(), a_y, 1.0, 0.0), Anchor::new(b.x, b_y, -1.0, 0.0))
    } else {
        (Anchor::new(a.x, a_y, -1.0, 0.0), Anchor::new(b.right(), b_y, 1.0, 0.0))
    }
}

/// Facing anchors for two rects, or `None` when they overlap on both axes
pub fn facing_anchors(a: &Rect, b: &Rect) -> Option<(Anchor, Anchor)> {
    let x = Span::between(a.x, a.right(), b.x, b.right());
    let y = Span::between(a.y, a.bottom(), b.y, b.bottom());

    let horizontal = match (x.gap(), y.gap()) {
        (None, None) => return None,
        (Some(_), None) => true,
        (None, Some(_)) => false,
        (Some(gap_x), Some(gap_y)) => gap_x >= gap_y,
    };

    if horizontal {
        Some(across_x(a, b, matches!(x, Span::Before(_)), y))
    } else {
        let (start, end) = across_x(
            &transposed(a),
            &transposed(b),
            matches!(y, Span::Before(_)),
            x,
        );
        Some((start.transposed(), end.transposed()))
    }
}

/// Solve an arrow between the facing edges of two rects
///
/// Padding moves each anchor out along its edge normal, clamped to the gap
/// between the facing edges so the padded ends never cross. Boxes that
/// overlap on both axes have no facing edges and fall back to
/// centre-to-centre.
pub fn get_box_to_box_arrow(source: &Rect, target: &Rect, options: &ArrowOptions) -> Arrow {
    match facing_anchors(source, target) {
        Some((start, end)) => {
            let gap = start.gap_to(&end);
            let pad_end = options.pad_end.min(gap);
            let pad_start = options.pad_start.min(gap - pad_end);
            let (from, to) = (start.padded(pad_start), end.padded(pad_end));

            if from.distance_to(to) < MIN_DISTANCE {
                // Pads used up the whole gap; keep the head facing the target
                let angle = start.normal.y.atan2(start.normal.x);
                return straight_arrow(from, to, angle, 0.0, 0.0);
            }

            let unpadded = ArrowOptions {
                pad_start: 0.0,
                pad_end: 0.0,
                ..*options
            };
            get_arrow(from, to, &unpadded)
        }
        None => {
            log::debug!("boxes overlap, anchoring arrow on centres");
            get_arrow(source.center(), target.center(), options)
        }
    }
}
