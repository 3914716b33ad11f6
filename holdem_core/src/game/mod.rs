//! The betting-round state machine and its supporting records.
//!
//! Layering, from the bottom up:
//!
//! - [`entities`]: games, participants, hands, and the append-only action
//!   log, mirroring the persisted schema.
//! - [`turn_order`]: circular next-eligible-seat resolution.
//! - [`round_completion`]: the single canonical round-completion policy.
//! - [`lifecycle`]: dealing hands, advancing rounds, settlement seam.
//! - [`engine`]: validation and monetary effects of one action, executed
//!   inside one ledger transaction.

pub mod engine;
pub mod entities;
pub mod errors;
pub mod lifecycle;
pub mod round_completion;
pub mod turn_order;

pub use engine::BettingEngine;
pub use entities::{
    Action, ActionKind, Chips, Game, GameId, Hand, HandId, HandSnapshot, NewAction, Participant,
    ParticipantId, Round,
};
pub use errors::EngineError;
pub use lifecycle::{NoSettlement, Settlement};
