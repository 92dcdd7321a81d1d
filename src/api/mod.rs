//! Perfect Arrow WASM API
//!
//! The JavaScript-facing layer. Everything here is a thin shell around the
//! framework-agnostic core in `controller`, `solver` and `renderers`.
//!
//! # Module Structure
//!
//! - `helpers`: serialization and error conversion at the JS boundary
//! - `dom`: `Surface` implementation backed by the document
//! - `element`: `PerfectArrow`, the object behind a `<perfect-arrow>` element
//! - `solve`: stateless `getArrow` / `getBoxToBoxArrow` / `solveArrow`

pub mod dom;
pub mod element;
pub mod helpers;
pub mod solve;

pub use dom::DomSurface;
pub use element::PerfectArrow;
pub use solve::{get_arrow, get_box_to_box_arrow, solve_arrow};
