//! Models module for Perfect Arrow
//!
//! Geometry primitives, arrow options and the element configuration.

pub mod config;
pub mod geometry;
pub mod options;

// Re-export commonly used types
pub use config::{ArrowConfig, ArrowConfigPatch, ArrowField, ChangeSet};
pub use geometry::{Point, Rect};
pub use options::{ArrowOptions, ArrowType};
