//! FitArena Activity - provider interface and progress aggregation
//!
//! Two halves: the [`ActivityProvider`] trait is the engine's read-only
//! view onto an external exercise-tracking service, and the aggregation
//! functions turn a participant's raw activity list into a typed progress
//! value for a challenge kind (pure functions, no I/O).

pub mod aggregate;
pub mod provider;

pub use aggregate::*;
pub use provider::*;
