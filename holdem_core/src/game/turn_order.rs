//! Turn-order resolution over a seating list.
//!
//! Seating is the ledger's participant ordering for the game (ascending
//! creation order). The same resolver drives dealer rotation, blind
//! posting, and turn progression.

use super::entities::{Participant, ParticipantId};

/// Find the next eligible participant, scanning circularly from the slot
/// after `from`.
///
/// Skips anyone who has left the game or folded this hand. Returns `None`
/// after one full circle with no match, which means at most one eligible
/// participant remains and the hand is effectively over. Also returns
/// `None` if `from` is not in the seating list.
#[must_use]
pub fn next_eligible(seating: &[Participant], from: ParticipantId) -> Option<&Participant> {
    let start = seating.iter().position(|p| p.id == from)?;
    let n = seating.len();
    (1..=n)
        .map(|offset| &seating[(start + offset) % n])
        .find(|p| p.id != from && p.is_eligible())
}
