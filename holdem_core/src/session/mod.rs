//! Per-game session actors.
//!
//! Each game runs in its own tokio task with an mpsc message inbox, so
//! all commands for one game are processed strictly in sequence. The
//! [`GameManager`] spawns actors, routes actions by game id, and fans
//! out post-action snapshots over a broadcast channel.

pub mod actor;
pub mod manager;
pub mod messages;

pub use actor::{GameActor, GameHandle};
pub use manager::{GameManager, SeatConfig};
pub use messages::{GameMessage, GameUpdate};
