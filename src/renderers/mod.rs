//! Renderers module for Perfect Arrow
//!
//! Converts solved arrows into drawable shapes and SVG markup.

pub mod path;
pub mod svg;

// Re-export commonly used types
pub use path::{fmt_num, Circle, DrawableArrow, PathRenderer, QuadCurve, RenderStyle};
pub use svg::SvgRenderer;
