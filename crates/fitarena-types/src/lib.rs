//! FitArena Types - Canonical domain types for the arena challenge engine
//!
//! This crate contains all foundational types for FitArena with zero
//! dependencies on other fitarena crates. It defines the complete type
//! system for:
//!
//! - Identity types (ChallengeId, ReceiptId, canonicalized AccountId)
//! - Activity records and kind canonicalization
//! - The challenge record and its status state machine
//! - Engine configuration with environment overrides
//! - The error taxonomy shared by every engine operation
//!
//! # Domain Invariants
//!
//! 1. A challenge only moves forward through its state machine
//! 2. A winner, when set, is one of the two participants
//! 3. Claim flags never revert once set
//! 4. A derived challenge window never shrinks after first observation

pub mod activity;
pub mod challenge;
pub mod config;
pub mod error;
pub mod identity;

pub use activity::*;
pub use challenge::*;
pub use config::*;
pub use error::*;
pub use identity::*;

/// Version of the FitArena types schema
pub const TYPES_VERSION: &str = "0.1.0";
