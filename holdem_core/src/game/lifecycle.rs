//! Hand lifecycle: dealing a new hand, advancing the round machine, and
//! the settlement extension point.
//!
//! Nothing outside this module changes `current_round`.

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::entities::{Chips, Game, Hand, HandSnapshot, Participant, ParticipantId, Round};
use super::errors::EngineError;
use super::{round_completion, turn_order};
use crate::db::ledger::LedgerTx;

/// Hook invoked by the session actor when a hand reaches showdown.
///
/// Pot distribution and hand-strength evaluation live behind this seam;
/// the default implementation does nothing and leaves the pot as
/// recorded.
#[async_trait]
pub trait Settlement: Send + Sync + 'static {
    async fn settle(&self, snapshot: &HandSnapshot) -> Result<(), EngineError>;
}

/// The default settlement: leave the pot untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoSettlement;

#[async_trait]
impl Settlement for NoSettlement {
    async fn settle(&self, _snapshot: &HandSnapshot) -> Result<(), EngineError> {
        Ok(())
    }
}

/// Deal a new hand for `game` inside the given transaction.
///
/// Seats participants in creation order: dealer at seat 0, small blind at
/// seat 1, big blind at seat 2, first to act after the big blind. The big
/// blind is twice `small_blind_wager`. Blind posts are deducted
/// immediately and seed the pot and the preflop wager baseline, but are
/// not recorded in the action log.
pub async fn start_hand<T: LedgerTx>(
    tx: &mut T,
    game: &Game,
    small_blind_wager: Chips,
) -> Result<(Hand, Vec<Participant>), EngineError> {
    let mut seats: Vec<Participant> = tx
        .participants(game.id)
        .await?
        .into_iter()
        .filter(Participant::still_in_game)
        .collect();
    if seats.len() < 3 {
        return Err(EngineError::NotEnoughParticipants);
    }

    let big_blind_wager = small_blind_wager * 2;

    // Fresh hand: everyone starts unacted.
    for seat in &mut seats {
        seat.last_action = None;
        seat.action_amount = 0;
    }
    post_blind(&mut seats[1], small_blind_wager)?;
    post_blind(&mut seats[2], big_blind_wager)?;

    let first_to_act = turn_order::next_eligible(&seats, seats[2].id)
        .map(|p| p.id)
        .ok_or(EngineError::NotEnoughParticipants)?;

    let hand = Hand {
        id: Uuid::new_v4(),
        game_id: game.id,
        level: game.level,
        dealer_id: seats[0].id,
        small_blind_id: seats[1].id,
        big_blind_id: seats[2].id,
        pot: small_blind_wager + big_blind_wager,
        small_blind_amount: small_blind_wager,
        big_blind_amount: big_blind_wager,
        last_call_amount: big_blind_wager,
        current_max_bet: big_blind_wager,
        last_raise_amount: big_blind_wager,
        current_round: Round::Preflop,
        round_just_advanced: false,
        current_turn_id: Some(first_to_act),
        created_at: Utc::now(),
    };

    for seat in &seats {
        tx.update_participant(seat).await?;
    }
    tx.create_hand(&hand).await?;

    log::info!(
        "hand {} dealt in game {} at level {} with {} seats",
        hand.id,
        game.id,
        game.level,
        seats.len()
    );
    Ok((hand, seats))
}

fn post_blind(seat: &mut Participant, wager: Chips) -> Result<(), EngineError> {
    if seat.stack < wager {
        return Err(EngineError::InsufficientChips {
            needed: wager,
            available: seat.stack,
        });
    }
    seat.stack -= wager;
    seat.action_amount = wager;
    Ok(())
}

/// Advance the round machine after one processed action by `actor_id`.
///
/// Runs exactly once per action:
/// - the just-advanced guard suppresses one completion evaluation so a
///   round change cannot cascade off a single action;
/// - a complete round with more than one eligible participant moves to
///   the next round, zeroes the standing bet, and hands the turn to the
///   first eligible seat after the dealer;
/// - a fold-out (at most one eligible participant) jumps straight to
///   showdown.
pub async fn advance<T: LedgerTx>(
    tx: &mut T,
    hand: &mut Hand,
    seating: &[Participant],
    actor_id: ParticipantId,
) -> Result<(), EngineError> {
    if hand.round_just_advanced {
        hand.round_just_advanced = false;
        hand.current_turn_id = turn_order::next_eligible(seating, actor_id).map(|p| p.id);
        return Ok(());
    }

    let eligible: Vec<&Participant> = seating.iter().filter(|p| p.is_eligible()).collect();
    let actions = tx.actions_in_round(hand.id, hand.current_round).await?;

    if !round_completion::is_round_complete(hand, &eligible, &actions) {
        hand.current_turn_id = turn_order::next_eligible(seating, actor_id).map(|p| p.id);
        return Ok(());
    }

    if eligible.len() <= 1 || hand.current_round.next().is_terminal() {
        log::debug!("hand {} over after {}", hand.id, hand.current_round);
        hand.current_round = Round::Showdown;
        hand.current_turn_id = None;
        hand.round_just_advanced = false;
        return Ok(());
    }

    hand.current_round = hand.current_round.next();
    hand.current_max_bet = 0;
    hand.last_raise_amount = 0;
    hand.round_just_advanced = true;
    hand.current_turn_id = turn_order::next_eligible(seating, hand.dealer_id).map(|p| p.id);
    log::debug!("hand {} advanced to {}", hand.id, hand.current_round);
    Ok(())
}
