//! # What is this?
//!
//! Microgfx is a minimalist graphics API abstraction aimed at size-constrained
//! realtime demos. It narrows a native graphics API down to the handful of
//! operations a demo actually needs: resource creation, data upload, draw and
//! compute dispatch, and off-screen frame buffers.
//!
//! The layer keeps a complete shadow of the pipeline state it manages and
//! elides every redundant native call, so callers can re-submit their full
//! state every frame and still get a minimal command stream.
//!
//! Resources are referenced through strongly typed generational handles that
//! index bounded tables, so a stale or foreign handle is caught instead of
//! silently addressing somebody else's resource.
//!
//! ## Backends
//!
//! The public seam is the [`GraphicLayer`](gfx/backends/trait.GraphicLayer.html)
//! trait. Two implementations ship with the crate: an OpenGL 4.x backend built
//! on a caller-supplied loader, and a headless backend that allocates handles
//! but touches no native API, for tests and machines without a GPU.

#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;

#[macro_use]
pub mod utils;

pub mod errors;
pub mod gfx;

pub mod prelude {
    pub use crate::errors::Result;
    pub use crate::gfx::prelude::*;
}
