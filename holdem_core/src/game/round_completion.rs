//! Round-completion evaluation.
//!
//! A single canonical policy: the round is complete when every eligible
//! participant has acted this round and has matched the standing maximum
//! bet. If at most one eligible participant remains, the round (and the
//! hand) is over immediately, before any bet-equality check.

use super::entities::{Action, Chips, Hand, Participant, ParticipantId, Round};

/// The wager a blind poster has already committed to the preflop round
/// without it appearing in the action ledger. Blind posts seed the round's
/// wager baseline but do not count as having acted.
#[must_use]
pub fn blind_baseline(hand: &Hand, participant_id: ParticipantId) -> Chips {
    if hand.current_round != Round::Preflop {
        return 0;
    }
    if participant_id == hand.small_blind_id {
        hand.small_blind_amount
    } else if participant_id == hand.big_blind_id {
        hand.big_blind_amount
    } else {
        0
    }
}

/// Total amount a participant has wagered in the current round: the sum of
/// their recorded action amounts plus any posted-blind baseline.
#[must_use]
pub fn wagered_this_round(
    hand: &Hand,
    participant_id: ParticipantId,
    actions_this_round: &[Action],
) -> Chips {
    let recorded: Chips = actions_this_round
        .iter()
        .filter(|a| a.participant_id == participant_id)
        .filter_map(|a| a.amount)
        .sum();
    recorded + blind_baseline(hand, participant_id)
}

/// Decide whether the current betting round is finished.
///
/// `eligible` must already be filtered to participants that are still in
/// the game and have not folded; `actions_this_round` are the hand's
/// actions recorded for `hand.current_round`.
#[must_use]
pub fn is_round_complete(
    hand: &Hand,
    eligible: &[&Participant],
    actions_this_round: &[Action],
) -> bool {
    // Fold-out: with one seat left there is nothing to equalize.
    if eligible.len() <= 1 {
        return true;
    }

    eligible.iter().all(|p| {
        let acted = actions_this_round
            .iter()
            .any(|a| a.participant_id == p.id);
        acted && wagered_this_round(hand, p.id, actions_this_round) == hand.current_max_bet
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::ActionKind;
    use chrono::Utc;
    use uuid::Uuid;

    fn participant(name: &str) -> Participant {
        Participant {
            id: Uuid::new_v4(),
            game_id: Uuid::nil(),
            name: name.to_string(),
            stack: 1000,
            is_connected: true,
            is_active: true,
            last_action: None,
            action_amount: 0,
            created_at: Utc::now(),
        }
    }

    fn hand_with(round: Round, max_bet: Chips, sb: ParticipantId, bb: ParticipantId) -> Hand {
        Hand {
            id: Uuid::new_v4(),
            game_id: Uuid::nil(),
            level: 1,
            dealer_id: Uuid::new_v4(),
            small_blind_id: sb,
            big_blind_id: bb,
            pot: 0,
            small_blind_amount: 10,
            big_blind_amount: 20,
            last_call_amount: 0,
            current_max_bet: max_bet,
            last_raise_amount: 0,
            current_round: round,
            round_just_advanced: false,
            current_turn_id: None,
            created_at: Utc::now(),
        }
    }

    fn action(hand: &Hand, p: &Participant, kind: ActionKind, amount: Chips) -> Action {
        Action {
            id: Uuid::new_v4(),
            hand_id: hand.id,
            participant_id: p.id,
            round: hand.current_round,
            action_order: 1,
            kind,
            amount: Some(amount),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn single_eligible_participant_short_circuits() {
        let alone = participant("a");
        let hand = hand_with(Round::Flop, 500, Uuid::new_v4(), Uuid::new_v4());
        // No actions at all this round, and a standing bet: still over.
        assert!(is_round_complete(&hand, &[&alone], &[]));
        assert!(is_round_complete(&hand, &[], &[]));
    }

    #[test]
    fn incomplete_until_everyone_has_acted() {
        let a = participant("a");
        let b = participant("b");
        let hand = hand_with(Round::Flop, 0, Uuid::new_v4(), Uuid::new_v4());
        let acts = vec![action(&hand, &a, ActionKind::Check, 0)];
        assert!(!is_round_complete(&hand, &[&a, &b], &acts));
    }

    #[test]
    fn complete_when_all_checked_through_a_zero_bet() {
        let a = participant("a");
        let b = participant("b");
        let hand = hand_with(Round::Flop, 0, Uuid::new_v4(), Uuid::new_v4());
        let acts = vec![
            action(&hand, &a, ActionKind::Check, 0),
            action(&hand, &b, ActionKind::Check, 0),
        ];
        assert!(is_round_complete(&hand, &[&a, &b], &acts));
    }

    #[test]
    fn incomplete_while_a_wager_is_unmatched() {
        let a = participant("a");
        let b = participant("b");
        let mut hand = hand_with(Round::Flop, 0, Uuid::new_v4(), Uuid::new_v4());
        hand.current_max_bet = 50;
        let acts = vec![
            action(&hand, &a, ActionKind::Bet, 50),
            action(&hand, &b, ActionKind::Call, 30),
        ];
        assert!(!is_round_complete(&hand, &[&a, &b], &acts));
    }

    #[test]
    fn blind_posts_count_toward_the_wager_baseline_but_not_as_acting() {
        let sb = participant("sb");
        let bb = participant("bb");
        let utg = participant("utg");
        let mut hand = hand_with(Round::Preflop, 20, sb.id, bb.id);
        hand.last_raise_amount = 20;

        // UTG called 20, SB called the missing 10, BB has only its post:
        // amounts are all equal but the big blind has not acted yet.
        let acts = vec![
            action(&hand, &utg, ActionKind::Call, 20),
            action(&hand, &sb, ActionKind::Call, 10),
        ];
        assert_eq!(wagered_this_round(&hand, sb.id, &acts), 20);
        assert_eq!(wagered_this_round(&hand, bb.id, &acts), 20);
        assert!(!is_round_complete(&hand, &[&sb, &bb, &utg], &acts));

        // The big blind's zero-amount check closes the round.
        let mut acts = acts;
        acts.push(action(&hand, &bb, ActionKind::Check, 0));
        assert!(is_round_complete(&hand, &[&sb, &bb, &utg], &acts));
    }

    #[test]
    fn baseline_applies_only_preflop() {
        let sb = participant("sb");
        let hand = hand_with(Round::Flop, 0, sb.id, Uuid::new_v4());
        assert_eq!(blind_baseline(&hand, sb.id), 0);
    }
}
