//! The betting engine: validates one participant action, applies its
//! monetary effects, records it, and drives round/turn progression.
//!
//! Every call to [`BettingEngine::apply_action`] runs inside one ledger
//! transaction. Either the whole sequence commits or none of it does;
//! a rejected action leaves no trace.

use super::entities::{
    ActionKind, Chips, GameId, Hand, HandId, HandSnapshot, NewAction, Participant, ParticipantId,
};
use super::errors::EngineError;
use super::{lifecycle, round_completion};
use crate::db::ledger::{Ledger, LedgerTx};

pub struct BettingEngine<L: Ledger> {
    ledger: L,
}

impl<L: Ledger> BettingEngine<L> {
    pub fn new(ledger: L) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Apply one action to a hand.
    ///
    /// Validates the request, mutates pot and stack, appends the action
    /// record, and advances round/turn state, all within one transaction.
    /// Returns the post-action snapshot for broadcast.
    pub async fn apply_action(
        &self,
        game_id: GameId,
        hand_id: HandId,
        participant_id: ParticipantId,
        kind: ActionKind,
        amount: Option<Chips>,
    ) -> Result<HandSnapshot, EngineError> {
        let mut tx = self.ledger.begin().await?;
        match apply_in_tx(&mut tx, game_id, hand_id, participant_id, kind, amount).await {
            Ok(snapshot) => {
                tx.commit().await?;
                log::info!(
                    "hand {hand_id}: {kind} by {participant_id} accepted, pot {}",
                    snapshot.hand.pot
                );
                Ok(snapshot)
            }
            Err(err) => {
                tx.rollback().await?;
                log::debug!("hand {hand_id}: {kind} by {participant_id} rejected: {err}");
                Err(err)
            }
        }
    }
}

async fn apply_in_tx<T: LedgerTx>(
    tx: &mut T,
    game_id: GameId,
    hand_id: HandId,
    participant_id: ParticipantId,
    kind: ActionKind,
    amount: Option<Chips>,
) -> Result<HandSnapshot, EngineError> {
    let mut hand = tx
        .hand(hand_id)
        .await?
        .ok_or(EngineError::HandNotFound(hand_id))?;
    let mut participant = tx
        .participant(participant_id)
        .await?
        .ok_or(EngineError::ParticipantNotFound(participant_id))?;

    if hand.game_id != game_id || participant.game_id != game_id {
        return Err(EngineError::GameMismatch(game_id));
    }
    if !participant.still_in_game() {
        return Err(EngineError::InactiveParticipant(participant_id));
    }
    if hand.is_over() {
        return Err(EngineError::HandOver);
    }

    let wagered = tx
        .wagered_in_round(hand.id, participant.id, hand.current_round)
        .await?
        + round_completion::blind_baseline(&hand, participant.id);

    let recorded = match kind {
        ActionKind::Fold => None,
        ActionKind::Check => {
            if wagered != hand.current_max_bet {
                return Err(EngineError::CheckNotAllowed {
                    outstanding: hand.current_max_bet - wagered,
                });
            }
            Some(0)
        }
        ActionKind::Call => {
            let owed = (hand.current_max_bet - wagered).max(0);
            wager(&mut hand, &mut participant, owed)?;
            hand.last_call_amount = owed;
            Some(owed)
        }
        ActionKind::Bet => {
            let total = positive_amount(kind, amount)?;
            if hand.current_max_bet > 0 {
                return Err(EngineError::BetNotAllowed {
                    standing: hand.current_max_bet,
                });
            }
            wager(&mut hand, &mut participant, total)?;
            hand.current_max_bet = total;
            hand.last_raise_amount = total;
            Some(total)
        }
        ActionKind::Raise => {
            let total = positive_amount(kind, amount)?;
            let min = hand.min_raise();
            if total < min {
                return Err(EngineError::RaiseTooSmall { min });
            }
            wager(&mut hand, &mut participant, total)?;
            hand.last_raise_amount = total - hand.current_max_bet;
            hand.current_max_bet = total;
            Some(total)
        }
        ActionKind::AllIn => return Err(EngineError::UnsupportedAction(kind)),
    };

    participant.last_action = Some(kind);
    participant.action_amount = recorded.unwrap_or(0);
    tx.update_participant(&participant).await?;

    let order = tx.last_action_order(hand.id).await?.unwrap_or(0) + 1;
    tx.append_action(NewAction {
        hand_id: hand.id,
        participant_id: participant.id,
        round: hand.current_round,
        action_order: order,
        kind,
        amount: recorded,
    })
    .await?;

    let seating = tx.participants(game_id).await?;
    lifecycle::advance(tx, &mut hand, &seating, participant.id).await?;
    tx.update_hand(&hand).await?;

    Ok(HandSnapshot {
        hand,
        participants: seating,
    })
}

/// A bet or raise must name a wager, and the wager must be positive:
/// zero is a disguised check and a negative amount would drain the pot.
fn positive_amount(kind: ActionKind, amount: Option<Chips>) -> Result<Chips, EngineError> {
    let total = amount.ok_or(EngineError::MissingAmount(kind))?;
    if total <= 0 {
        return Err(EngineError::InvalidAmount(kind, total));
    }
    Ok(total)
}

/// Move chips from a stack into the pot, guarding the stack floor.
fn wager(hand: &mut Hand, participant: &mut Participant, total: Chips) -> Result<(), EngineError> {
    if participant.stack < total {
        return Err(EngineError::InsufficientChips {
            needed: total,
            available: participant.stack,
        });
    }
    participant.stack -= total;
    hand.pot += total;
    Ok(())
}
