//! Perfect Arrow WASM Module
//!
//! Draws a curved arrow between two elements and keeps it attached while
//! they move or resize. The geometry solver, region tracking and rendering
//! are plain Rust; `api` binds them to the browser.

pub mod api;
pub mod controller;
pub mod error;
pub mod models;
pub mod renderers;
pub mod solver;
pub mod tracker;

// Re-export commonly used types
pub use controller::{ArrowController, ArrowFrame, SideStatus};
pub use error::{ArrowError, OptionsError, ResolutionError};
pub use models::*;
pub use solver::Arrow;
pub use tracker::{MatchPolicy, Side, Surface};

use wasm_bindgen::prelude::*;

// This is like the `main` function, but for WASM modules.
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    #[cfg(feature = "console_log")]
    console_log::init_with_level(log::Level::Debug).expect("failed to initialize logger");

    log::info!("Perfect Arrow WASM module initialized");
}
