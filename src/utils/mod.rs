//! Commonly used utilities.

#[macro_use]
pub mod handle;
pub mod arena;

pub mod prelude {
    pub use super::arena::HandleArena;
    pub use super::handle::{Handle, HandleIndex, HandleLike};
}
