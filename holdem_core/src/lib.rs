//! # Holdem Core
//!
//! A turn-based betting game engine for poker-style tables. A fixed set
//! of seated participants acts sequentially (fold/check/call/bet/raise)
//! against a shared pot across ordered betting rounds, with every action
//! validated, recorded, and committed atomically.
//!
//! ## Core Modules
//!
//! - [`game`]: the betting-round state machine: turn-order resolution,
//!   round-completion evaluation, the betting engine, and the hand
//!   lifecycle manager.
//! - [`db`]: the ledger accessor contract with PostgreSQL and in-memory
//!   implementations, plus pool management.
//! - [`session`]: per-game actors that serialize action processing and
//!   broadcast state snapshots.

pub mod db;
pub use db::{Database, DatabaseConfig, Ledger, LedgerError, LedgerTx, MemoryLedger, PgLedger};

pub mod game;
pub use game::{
    Action, ActionKind, BettingEngine, Chips, EngineError, Game, GameId, Hand, HandId,
    HandSnapshot, NoSettlement, Participant, ParticipantId, Round, Settlement,
};

pub mod session;
pub use session::{GameManager, GameUpdate};
