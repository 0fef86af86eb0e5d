//! FitArena Settlement - converting outcomes into on-ledger payouts
//!
//! A claim turns a resolved or drawn challenge into a token mint, exactly
//! once per eligible participant. Eligibility checks, payout computation
//! and the terminal `claimed` transition all run under the same
//! per-challenge lock the resolution engine uses.

pub mod claims;
pub mod ledger;

pub use claims::*;
pub use ledger::*;
