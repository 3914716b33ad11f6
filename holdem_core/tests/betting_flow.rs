//! End-to-end betting scenarios against the in-memory ledger.

use chrono::{Duration, Utc};
use holdem_core::db::{Ledger, LedgerTx, MemoryLedger};
use holdem_core::game::lifecycle;
use holdem_core::{ActionKind, BettingEngine, Chips, EngineError, Game, HandSnapshot, Round};

async fn table(stacks: &[Chips]) -> (BettingEngine<MemoryLedger>, Game, HandSnapshot) {
    let ledger = MemoryLedger::new();
    let mut tx = ledger.begin().await.unwrap();
    let game = tx.create_game(600, Utc::now()).await.unwrap();
    let base = Utc::now();
    for (i, stack) in stacks.iter().enumerate() {
        tx.create_participant(
            game.id,
            &format!("p{i}"),
            *stack,
            true,
            base + Duration::microseconds(i as i64),
        )
        .await
        .unwrap();
    }
    let (hand, participants) = lifecycle::start_hand(&mut tx, &game, 10).await.unwrap();
    tx.commit().await.unwrap();
    (
        BettingEngine::new(ledger),
        game,
        HandSnapshot { hand, participants },
    )
}

fn total_chips(snapshot: &HandSnapshot) -> Chips {
    snapshot.hand.pot + snapshot.participants.iter().map(|p| p.stack).sum::<Chips>()
}

fn assert_turn_is_eligible(snapshot: &HandSnapshot) {
    if let Some(turn_id) = snapshot.hand.current_turn_id {
        let holder = snapshot
            .participants
            .iter()
            .find(|p| p.id == turn_id)
            .expect("turn holder is seated");
        assert!(holder.is_eligible(), "turn holder must be eligible");
    } else {
        assert!(snapshot.hand.is_over());
    }
}

#[tokio::test]
async fn four_player_preflop_walkthrough() {
    let (engine, game, start) = table(&[1000, 1000, 1000, 1000]).await;
    let seats = &start.participants;
    let hand_id = start.hand.id;

    // Deal: pot 30 (blinds 10 + 20), action on the seat after the big
    // blind.
    assert_eq!(start.hand.pot, 30);
    assert_eq!(start.hand.current_max_bet, 20);
    assert_eq!(start.hand.dealer_id, seats[0].id);
    assert_eq!(start.hand.small_blind_id, seats[1].id);
    assert_eq!(start.hand.big_blind_id, seats[2].id);
    assert_eq!(start.hand.current_turn_id, Some(seats[3].id));

    // P3 calls the full 20.
    let snap = engine
        .apply_action(game.id, hand_id, seats[3].id, ActionKind::Call, None)
        .await
        .unwrap();
    assert_eq!(snap.hand.pot, 50);
    assert_turn_is_eligible(&snap);
    assert_eq!(snap.hand.current_turn_id, Some(seats[0].id));

    // Dealer calls 20.
    let snap = engine
        .apply_action(game.id, hand_id, seats[0].id, ActionKind::Call, None)
        .await
        .unwrap();
    assert_eq!(snap.hand.pot, 70);
    assert_eq!(snap.hand.current_turn_id, Some(seats[1].id));

    // Small blind owes only the missing 10.
    let snap = engine
        .apply_action(game.id, hand_id, seats[1].id, ActionKind::Call, None)
        .await
        .unwrap();
    assert_eq!(snap.hand.pot, 80);
    assert_eq!(snap.hand.last_call_amount, 10);
    assert_eq!(snap.hand.current_turn_id, Some(seats[2].id));

    // Big blind is already matched; the check closes the round.
    let snap = engine
        .apply_action(game.id, hand_id, seats[2].id, ActionKind::Check, None)
        .await
        .unwrap();
    assert_eq!(snap.hand.current_round, Round::Flop);
    assert_eq!(snap.hand.pot, 80);
    assert_eq!(snap.hand.current_max_bet, 0);
    assert_eq!(snap.hand.last_raise_amount, 0);
    assert!(snap.hand.round_just_advanced);
    // First eligible seat after the dealer opens the flop.
    assert_eq!(snap.hand.current_turn_id, Some(seats[1].id));

    assert_eq!(total_chips(&snap), 4000);
}

#[tokio::test]
async fn checked_down_hand_reaches_showdown_and_locks() {
    let (engine, game, start) = table(&[1000, 1000, 1000, 1000]).await;
    let seats = &start.participants;
    let hand_id = start.hand.id;

    // Everyone flat-calls preflop, big blind checks.
    for id in [seats[3].id, seats[0].id, seats[1].id] {
        engine
            .apply_action(game.id, hand_id, id, ActionKind::Call, None)
            .await
            .unwrap();
    }
    let mut snap = engine
        .apply_action(game.id, hand_id, seats[2].id, ActionKind::Check, None)
        .await
        .unwrap();
    assert_eq!(snap.hand.current_round, Round::Flop);

    // Flop, turn, and river check through in seat order from the small
    // blind.
    for expected_round in [Round::Turn, Round::River, Round::Showdown] {
        for id in [seats[1].id, seats[2].id, seats[3].id, seats[0].id] {
            snap = engine
                .apply_action(game.id, hand_id, id, ActionKind::Check, None)
                .await
                .unwrap();
            assert_turn_is_eligible(&snap);
        }
        assert_eq!(snap.hand.current_round, expected_round);
    }

    assert!(snap.hand.is_over());
    assert_eq!(snap.hand.current_turn_id, None);
    assert_eq!(snap.hand.pot, 80);
    assert_eq!(total_chips(&snap), 4000);

    // A finished hand accepts nothing further.
    let err = engine
        .apply_action(game.id, hand_id, seats[1].id, ActionKind::Check, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::HandOver));
}

#[tokio::test]
async fn minimum_raise_accepted_then_undersized_raise_rejected() {
    let (engine, game, start) = table(&[1000, 1000, 1000, 1000]).await;
    let seats = &start.participants;
    let hand_id = start.hand.id;

    // Big blind 20, last raise 20: minimum raise total is 40, so 50 is
    // legal.
    let snap = engine
        .apply_action(game.id, hand_id, seats[3].id, ActionKind::Raise, Some(50))
        .await
        .unwrap();
    assert_eq!(snap.hand.current_max_bet, 50);
    assert_eq!(snap.hand.last_raise_amount, 30);
    assert_eq!(snap.hand.pot, 80);

    // Next raise must reach at least 50 + 30 = 80.
    let before = engine.ledger().hand(hand_id).await.unwrap().unwrap();
    let err = engine
        .apply_action(game.id, hand_id, seats[0].id, ActionKind::Raise, Some(60))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::RaiseTooSmall { min: 80 }));

    // Rejection left nothing behind.
    let after = engine.ledger().hand(hand_id).await.unwrap().unwrap();
    assert_eq!(before, after);
    let seats_after = engine.ledger().participants(game.id).await.unwrap();
    assert_eq!(
        seats_after.iter().map(|p| p.stack).collect::<Vec<_>>(),
        snap.participants.iter().map(|p| p.stack).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn three_folds_end_the_hand_immediately() {
    let (engine, game, start) = table(&[1000, 1000, 1000, 1000]).await;
    let seats = &start.participants;
    let hand_id = start.hand.id;

    let snap = engine
        .apply_action(game.id, hand_id, seats[3].id, ActionKind::Fold, None)
        .await
        .unwrap();
    assert_eq!(snap.hand.current_round, Round::Preflop);
    assert_turn_is_eligible(&snap);

    let snap = engine
        .apply_action(game.id, hand_id, seats[0].id, ActionKind::Fold, None)
        .await
        .unwrap();
    assert_eq!(snap.hand.current_round, Round::Preflop);

    // Third fold leaves only the big blind: straight to showdown, no
    // equality check, pot untouched.
    let snap = engine
        .apply_action(game.id, hand_id, seats[1].id, ActionKind::Fold, None)
        .await
        .unwrap();
    assert_eq!(snap.hand.current_round, Round::Showdown);
    assert_eq!(snap.hand.current_turn_id, None);
    assert_eq!(snap.hand.pot, 30);
    assert_eq!(total_chips(&snap), 4000);
}

#[tokio::test]
async fn bet_and_raise_reopen_a_postflop_round() {
    let (engine, game, start) = table(&[1000, 1000, 1000, 1000]).await;
    let seats = &start.participants;
    let hand_id = start.hand.id;

    for id in [seats[3].id, seats[0].id, seats[1].id] {
        engine
            .apply_action(game.id, hand_id, id, ActionKind::Call, None)
            .await
            .unwrap();
    }
    engine
        .apply_action(game.id, hand_id, seats[2].id, ActionKind::Check, None)
        .await
        .unwrap();

    // Flop: small blind opens with a bet.
    let snap = engine
        .apply_action(game.id, hand_id, seats[1].id, ActionKind::Bet, Some(30))
        .await
        .unwrap();
    assert_eq!(snap.hand.current_max_bet, 30);
    assert_eq!(snap.hand.last_raise_amount, 30);
    assert_eq!(snap.hand.pot, 110);

    // A second bet is not allowed, only a raise.
    let err = engine
        .apply_action(game.id, hand_id, seats[2].id, ActionKind::Bet, Some(60))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::BetNotAllowed { standing: 30 }));

    let snap = engine
        .apply_action(game.id, hand_id, seats[2].id, ActionKind::Raise, Some(60))
        .await
        .unwrap();
    assert_eq!(snap.hand.current_max_bet, 60);
    assert_eq!(snap.hand.last_raise_amount, 30);
    assert_eq!(snap.hand.pot, 170);
    assert_eq!(total_chips(&snap), 4000);
}

#[tokio::test]
async fn action_order_is_gapless_across_rounds() {
    let (engine, game, start) = table(&[1000, 1000, 1000, 1000]).await;
    let seats = &start.participants;
    let hand_id = start.hand.id;

    for id in [seats[3].id, seats[0].id, seats[1].id] {
        engine
            .apply_action(game.id, hand_id, id, ActionKind::Call, None)
            .await
            .unwrap();
    }
    engine
        .apply_action(game.id, hand_id, seats[2].id, ActionKind::Check, None)
        .await
        .unwrap();
    for id in [seats[1].id, seats[2].id] {
        engine
            .apply_action(game.id, hand_id, id, ActionKind::Check, None)
            .await
            .unwrap();
    }

    let mut tx = engine.ledger().begin().await.unwrap();
    let mut orders = Vec::new();
    for round in [Round::Preflop, Round::Flop] {
        for action in tx.actions_in_round(hand_id, round).await.unwrap() {
            orders.push(action.action_order);
        }
    }
    tx.rollback().await.unwrap();

    assert_eq!(orders, (1..=6).collect::<Vec<i64>>());
}

#[tokio::test]
async fn folded_participants_are_skipped_for_the_rest_of_the_hand() {
    let (engine, game, start) = table(&[1000, 1000, 1000, 1000]).await;
    let seats = &start.participants;
    let hand_id = start.hand.id;

    engine
        .apply_action(game.id, hand_id, seats[3].id, ActionKind::Fold, None)
        .await
        .unwrap();
    for id in [seats[0].id, seats[1].id] {
        engine
            .apply_action(game.id, hand_id, id, ActionKind::Call, None)
            .await
            .unwrap();
    }
    let snap = engine
        .apply_action(game.id, hand_id, seats[2].id, ActionKind::Check, None)
        .await
        .unwrap();
    assert_eq!(snap.hand.current_round, Round::Flop);

    // Flop order: P1, P2, then straight to P0, never back to the folded
    // P3.
    let snap = engine
        .apply_action(game.id, hand_id, seats[1].id, ActionKind::Check, None)
        .await
        .unwrap();
    assert_eq!(snap.hand.current_turn_id, Some(seats[2].id));
    let snap = engine
        .apply_action(game.id, hand_id, seats[2].id, ActionKind::Check, None)
        .await
        .unwrap();
    assert_eq!(snap.hand.current_turn_id, Some(seats[0].id));

    let folded = snap.participants.iter().find(|p| p.id == seats[3].id).unwrap();
    assert_eq!(folded.last_action, Some(ActionKind::Fold));
    assert!(folded.still_in_game());
    assert!(!folded.is_eligible());
}
