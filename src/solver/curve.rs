//! Point-to-point curve
//!
//! The shared bow/stretch/flip/straights machinery. Box mode picks its
//! anchors and then runs through here as well.

use super::Arrow;
use crate::models::geometry::Point;
use crate::models::options::ArrowOptions;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};

/// Angular distance from a multiple of 45° still treated as straight
pub const STRAIGHT_TOLERANCE: f64 = PI / 360.0;

pub(super) const MIN_DISTANCE: f64 = 1e-9;

/// Progress of `distance` through the stretch range, clamped to `0..=1`
pub fn stretch_progress(distance: f64, options: &ArrowOptions) -> f64 {
    let (min, max) = (options.stretch_min, options.stretch_max);
    if max > min {
        ((distance - min) / (max - min)).clamp(0.0, 1.0)
    } else if distance >= max {
        1.0
    } else {
        0.0
    }
}

/// Signed bow after the stretch effect and `flip`
///
/// The full bow applies up to `stretch_min`; towards `stretch_max` it is
/// scaled down linearly to `1 - stretch` (never below zero).
pub fn effective_bow(distance: f64, options: &ArrowOptions) -> f64 {
    let factor = (1.0 - options.stretch * stretch_progress(distance, options)).max(0.0);
    let bow = options.bow * factor;
    if options.flip {
        -bow
    } else {
        bow
    }
}

/// Is `angle` within tolerance of 0°, 45°, 90°, ...
pub fn is_near_straight(angle: f64) -> bool {
    let offset = angle.rem_euclid(FRAC_PI_4);
    offset < STRAIGHT_TOLERANCE || FRAC_PI_4 - offset < STRAIGHT_TOLERANCE
}

/// Which of the eight 45° sectors `angle` falls in
fn sector(angle: f64) -> u8 {
    ((angle.rem_euclid(TAU) / FRAC_PI_4).floor() as u8) % 8
}

/// Pads clamped to `distance`, the end pad taking precedence
///
/// The end pad never depends on `pad_start`, so the drawn end stays put
/// however far the start is pulled back.
pub fn clamp_pads(distance: f64, options: &ArrowOptions) -> (f64, f64) {
    let pad_end = options.pad_end.min(distance);
    let pad_start = options.pad_start.min(distance - pad_end);
    (pad_start, pad_end)
}

fn reversed(angle: f64) -> f64 {
    let flipped = angle + PI;
    if flipped > PI {
        flipped - TAU
    } else {
        flipped
    }
}

/// Solve a curved arrow from `start` to `end`
pub fn get_arrow(start: Point, end: Point, options: &ArrowOptions) -> Arrow {
    let distance = start.distance_to(end);
    let angle = start.angle_to(end);
    let bow = effective_bow(distance, options);
    let (pad_start, pad_end) = clamp_pads(distance, options);

    if distance < MIN_DISTANCE || bow == 0.0 || (options.straights && is_near_straight(angle)) {
        return straight_arrow(start, end, angle, pad_start, pad_end);
    }

    // Alternate the bend by sector so neighbouring arrows curve apart
    let rotation = if sector(angle) % 2 == 0 { 1.0 } else { -1.0 };

    let mid = start.lerp(end, 0.5);
    let control = mid.project(angle + PI + rotation * FRAC_PI_2, bow * distance);

    let padded_start = start.project(start.angle_to(control), pad_start);
    let padded_end = end.project(end.angle_to(control), pad_end);

    let start_angle = control.angle_to(start);
    let end_angle = control.angle_to(end);

    // Re-derive the control point for the padded endpoints
    let padded_mid = padded_start.lerp(padded_end, 0.5);
    let bend_mid = mid.lerp(control, 0.5);
    let padded_control = padded_mid.project(mid.angle_to(control), padded_mid.distance_to(bend_mid));

    Arrow {
        start: padded_start,
        control: padded_control,
        end: padded_end,
        end_angle,
        start_angle,
        center_angle: padded_start.angle_to(padded_end),
    }
}

/// Straight segment along `angle`, pads already clamped
pub(super) fn straight_arrow(start: Point, end: Point, angle: f64, pad_start: f64, pad_end: f64) -> Arrow {
    let padded_start = start.project(angle, pad_start);
    let padded_end = end.project(angle + PI, pad_end);

    Arrow {
        start: padded_start,
        control: padded_start.lerp(padded_end, 0.5),
        end: padded_end,
        end_angle: angle,
        start_angle: reversed(angle),
        center_angle: angle,
    }
}
