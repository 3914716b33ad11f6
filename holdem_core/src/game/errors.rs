//! Error taxonomy for the betting engine.

use thiserror::Error;

use super::entities::{Chips, GameId, HandId, ParticipantId};
use crate::db::ledger::LedgerError;

/// Errors that can occur while validating or applying a participant action.
///
/// Every variant except `Ledger` is a domain error with a human-readable
/// message fit for returning to the acting client. `Ledger` wraps
/// infrastructure failures and must be surfaced as an opaque failure.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("game {0} does not exist")]
    GameNotFound(GameId),
    #[error("hand {0} does not exist")]
    HandNotFound(HandId),
    #[error("participant {0} does not exist")]
    ParticipantNotFound(ParticipantId),
    #[error("hand or participant does not belong to game {0}")]
    GameMismatch(GameId),
    #[error("participant {0} is no longer in the game")]
    InactiveParticipant(ParticipantId),
    #[error("the hand is already at showdown")]
    HandOver,
    #[error("a {0} requires a wager amount")]
    MissingAmount(super::entities::ActionKind),
    #[error("a {0} requires a positive amount, got {1}")]
    InvalidAmount(super::entities::ActionKind, Chips),
    #[error("{0} is not an accepted action")]
    UnsupportedAction(super::entities::ActionKind),
    #[error("minimum raise is {min}")]
    RaiseTooSmall { min: Chips },
    #[error("cannot bet while {standing} is already standing; raise instead")]
    BetNotAllowed { standing: Chips },
    #[error("cannot check with {outstanding} outstanding")]
    CheckNotAllowed { outstanding: Chips },
    #[error("not enough chips: need {needed}, have {available}")]
    InsufficientChips { needed: Chips, available: Chips },
    #[error("need at least 3 participants to start a hand")]
    NotEnoughParticipants,
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl EngineError {
    /// True for domain errors whose message may be shown to the caller
    /// verbatim. Ledger failures get a generic message instead.
    #[must_use]
    pub const fn is_rule_violation(&self) -> bool {
        !matches!(self, Self::Ledger(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn rule_violations_are_user_facing() {
        assert!(EngineError::RaiseTooSmall { min: 40 }.is_rule_violation());
        assert!(EngineError::HandNotFound(Uuid::new_v4()).is_rule_violation());
        assert!(!EngineError::Ledger(LedgerError::Unavailable).is_rule_violation());
    }

    #[test]
    fn messages_carry_the_relevant_amounts() {
        let msg = EngineError::RaiseTooSmall { min: 40 }.to_string();
        assert!(msg.contains("40"));
        let msg = EngineError::InsufficientChips {
            needed: 100,
            available: 30,
        }
        .to_string();
        assert!(msg.contains("100"));
        assert!(msg.contains("30"));
    }
}
