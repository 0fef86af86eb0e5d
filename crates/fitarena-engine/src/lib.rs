//! FitArena Engine - challenge lifecycle and first-to-goal resolution
//!
//! The engine owns every mutation of a challenge's progress, window, status
//! and winner fields. Claim settlement lives in `fitarena-settlement` and
//! shares this crate's challenge store and per-challenge locks.

pub mod locks;
pub mod resolution;
pub mod store;
pub mod window;

pub use locks::*;
pub use resolution::*;
pub use store::*;
pub use window::*;
