//! Core records of a betting session: games, participants, hands, and the
//! append-only action ledger.
//!
//! These mirror the persisted schema one-to-one. Seat order is defined by
//! participant creation order within a game (ties broken by id), not by a
//! dedicated column.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Type alias for chip amounts. Stacks, pots, and wagers are whole chips;
/// every value is non-negative by invariant.
pub type Chips = i64;

pub type GameId = Uuid;
pub type ParticipantId = Uuid;
pub type HandId = Uuid;
pub type ActionId = Uuid;

/// A betting phase within a hand. The order is total and forward-only;
/// `Showdown` is terminal.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Round {
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
}

impl Round {
    /// The round that follows this one. Terminal self-loop at `Showdown`.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Preflop => Self::Flop,
            Self::Flop => Self::Turn,
            Self::Turn => Self::River,
            Self::River | Self::Showdown => Self::Showdown,
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Showdown)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Preflop => "preflop",
            Self::Flop => "flop",
            Self::Turn => "turn",
            Self::River => "river",
            Self::Showdown => "showdown",
        }
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Round {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "preflop" => Ok(Self::Preflop),
            "flop" => Ok(Self::Flop),
            "turn" => Ok(Self::Turn),
            "river" => Ok(Self::River),
            "showdown" => Ok(Self::Showdown),
            other => Err(format!("unknown round: {other}")),
        }
    }
}

/// The kind of action a participant can take.
///
/// `AllIn` exists in the schema for forward compatibility but is not
/// produced by the betting engine.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    Fold,
    Check,
    Call,
    Bet,
    Raise,
    AllIn,
}

impl ActionKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fold => "fold",
            Self::Check => "check",
            Self::Call => "call",
            Self::Bet => "bet",
            Self::Raise => "raise",
            Self::AllIn => "all-in",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fold" => Ok(Self::Fold),
            "check" => Ok(Self::Check),
            "call" => Ok(Self::Call),
            "bet" => Ok(Self::Bet),
            "raise" => Ok(Self::Raise),
            "all-in" => Ok(Self::AllIn),
            other => Err(format!("unknown action kind: {other}")),
        }
    }
}

/// A multi-hand betting session.
///
/// `level` is escalated by the session clock, never by the betting engine;
/// `end_time` is set only by an explicit close.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Game {
    pub id: GameId,
    /// Seconds between blind-level escalations.
    pub blind_interval_secs: i64,
    pub level: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

/// A seat in a game.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub game_id: GameId,
    pub name: String,
    /// Chip stack, never negative. Chips leaving a stack always land in
    /// the hand's pot.
    pub stack: Chips,
    pub is_connected: bool,
    /// Still in the game (not busted or removed). Folding does not clear
    /// this flag; it only removes the participant from the current hand.
    pub is_active: bool,
    /// Last action taken this hand, `None` until the first action. Not
    /// reset on round change so a fold stays visible for the whole hand.
    pub last_action: Option<ActionKind>,
    /// Amount wagered by the last action (or the posted blind).
    pub action_amount: Chips,
    /// Doubles as seat order: seating is ascending creation order.
    pub created_at: DateTime<Utc>,
}

impl Participant {
    /// Still in the game: not busted and not removed.
    #[must_use]
    pub const fn still_in_game(&self) -> bool {
        self.is_active
    }

    /// Still in the current hand: has not folded.
    #[must_use]
    pub fn still_in_hand(&self) -> bool {
        self.last_action != Some(ActionKind::Fold)
    }

    /// Eligible to act: both predicates hold.
    #[must_use]
    pub fn is_eligible(&self) -> bool {
        self.still_in_game() && self.still_in_hand()
    }
}

/// One deal-to-showdown cycle.
///
/// Dealer, small blind, and big blind are pairwise-distinct participants;
/// the storage layer enforces this with a CHECK constraint.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Hand {
    pub id: HandId,
    pub game_id: GameId,
    pub level: i32,
    pub dealer_id: ParticipantId,
    pub small_blind_id: ParticipantId,
    pub big_blind_id: ParticipantId,
    pub pot: Chips,
    pub small_blind_amount: Chips,
    pub big_blind_amount: Chips,
    pub last_call_amount: Chips,
    /// Highest wager total standing in the current round.
    pub current_max_bet: Chips,
    /// Size of the last raise increment; seeds the minimum-raise rule.
    pub last_raise_amount: Chips,
    pub current_round: Round,
    /// Transition guard: set when the round just changed, cleared on the
    /// next advance pass so completion is not re-evaluated twice for one
    /// action.
    pub round_just_advanced: bool,
    /// Participant whose turn it is; `None` once the hand is over.
    pub current_turn_id: Option<ParticipantId>,
    pub created_at: DateTime<Utc>,
}

impl Hand {
    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.current_round.is_terminal()
    }

    /// Smallest legal raise total under the current betting state.
    #[must_use]
    pub const fn min_raise(&self) -> Chips {
        if self.current_max_bet > 0 {
            self.current_max_bet + self.last_raise_amount
        } else {
            self.current_max_bet + self.big_blind_amount
        }
    }
}

/// An immutable ledger entry: one participant action within a hand.
/// Append-only; rows are never updated and only cascade-delete with the
/// parent hand.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Action {
    pub id: ActionId,
    pub hand_id: HandId,
    pub participant_id: ParticipantId,
    pub round: Round,
    /// Per-hand order number: strictly increasing, gapless, starting at 1.
    pub action_order: i64,
    pub kind: ActionKind,
    pub amount: Option<Chips>,
    pub created_at: DateTime<Utc>,
}

/// Fields of a new action record; the ledger assigns id and timestamp.
#[derive(Clone, Debug)]
pub struct NewAction {
    pub hand_id: HandId,
    pub participant_id: ParticipantId,
    pub round: Round,
    pub action_order: i64,
    pub kind: ActionKind,
    pub amount: Option<Chips>,
}

/// The state handed to the transport layer for broadcast after each
/// processed action.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct HandSnapshot {
    pub hand: Hand,
    pub participants: Vec<Participant>,
}
