//! In-memory ledger with real transaction semantics.
//!
//! A transaction clones the whole store and works on the copy; `commit`
//! swaps the copy back in, `rollback` simply drops it. That gives tests
//! the same all-or-nothing guarantees as the PostgreSQL ledger without a
//! database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::ledger::{Ledger, LedgerError, LedgerResult, LedgerTx};
use crate::game::entities::{
    Action, Chips, Game, GameId, Hand, HandId, NewAction, Participant, ParticipantId, Round,
};

#[derive(Clone, Debug, Default)]
struct Store {
    games: HashMap<GameId, Game>,
    participants: Vec<Participant>,
    hands: HashMap<HandId, Hand>,
    actions: Vec<Action>,
}

impl Store {
    fn participants_of(&self, game_id: GameId) -> Vec<Participant> {
        let mut seats: Vec<Participant> = self
            .participants
            .iter()
            .filter(|p| p.game_id == game_id)
            .cloned()
            .collect();
        seats.sort_by_key(|p| (p.created_at, p.id));
        seats
    }
}

/// Shared in-memory ledger.
#[derive(Clone, Default)]
pub struct MemoryLedger {
    store: Arc<Mutex<Store>>,
}

impl MemoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> LedgerResult<std::sync::MutexGuard<'_, Store>> {
        self.store.lock().map_err(|_| LedgerError::Unavailable)
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    type Tx = MemoryLedgerTx;

    async fn begin(&self) -> LedgerResult<Self::Tx> {
        let snapshot = self.locked()?.clone();
        Ok(MemoryLedgerTx {
            snapshot,
            shared: Arc::clone(&self.store),
        })
    }

    async fn game(&self, id: GameId) -> LedgerResult<Option<Game>> {
        Ok(self.locked()?.games.get(&id).cloned())
    }

    async fn hand(&self, id: HandId) -> LedgerResult<Option<Hand>> {
        Ok(self.locked()?.hands.get(&id).cloned())
    }

    async fn participants(&self, game_id: GameId) -> LedgerResult<Vec<Participant>> {
        Ok(self.locked()?.participants_of(game_id))
    }
}

/// One open transaction over a store snapshot.
pub struct MemoryLedgerTx {
    snapshot: Store,
    shared: Arc<Mutex<Store>>,
}

#[async_trait]
impl LedgerTx for MemoryLedgerTx {
    async fn create_game(
        &mut self,
        blind_interval_secs: i64,
        start_time: DateTime<Utc>,
    ) -> LedgerResult<Game> {
        let game = Game {
            id: Uuid::new_v4(),
            blind_interval_secs,
            level: 1,
            start_time,
            end_time: None,
        };
        self.snapshot.games.insert(game.id, game.clone());
        Ok(game)
    }

    async fn set_game_level(&mut self, id: GameId, level: i32) -> LedgerResult<()> {
        if let Some(game) = self.snapshot.games.get_mut(&id) {
            game.level = level;
        }
        Ok(())
    }

    async fn end_game(&mut self, id: GameId, end_time: DateTime<Utc>) -> LedgerResult<()> {
        if let Some(game) = self.snapshot.games.get_mut(&id) {
            game.end_time = Some(end_time);
        }
        Ok(())
    }

    async fn create_participant(
        &mut self,
        game_id: GameId,
        name: &str,
        stack: Chips,
        is_connected: bool,
        created_at: DateTime<Utc>,
    ) -> LedgerResult<Participant> {
        let participant = Participant {
            id: Uuid::new_v4(),
            game_id,
            name: name.to_string(),
            stack,
            is_connected,
            is_active: true,
            last_action: None,
            action_amount: 0,
            created_at,
        };
        self.snapshot.participants.push(participant.clone());
        Ok(participant)
    }

    async fn participant(&mut self, id: ParticipantId) -> LedgerResult<Option<Participant>> {
        Ok(self
            .snapshot
            .participants
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn participants(&mut self, game_id: GameId) -> LedgerResult<Vec<Participant>> {
        Ok(self.snapshot.participants_of(game_id))
    }

    async fn update_participant(&mut self, participant: &Participant) -> LedgerResult<()> {
        if let Some(stored) = self
            .snapshot
            .participants
            .iter_mut()
            .find(|p| p.id == participant.id)
        {
            stored.stack = participant.stack;
            stored.is_connected = participant.is_connected;
            stored.is_active = participant.is_active;
            stored.last_action = participant.last_action;
            stored.action_amount = participant.action_amount;
        }
        Ok(())
    }

    async fn create_hand(&mut self, hand: &Hand) -> LedgerResult<()> {
        self.snapshot.hands.insert(hand.id, hand.clone());
        Ok(())
    }

    async fn hand(&mut self, id: HandId) -> LedgerResult<Option<Hand>> {
        Ok(self.snapshot.hands.get(&id).cloned())
    }

    async fn update_hand(&mut self, hand: &Hand) -> LedgerResult<()> {
        self.snapshot.hands.insert(hand.id, hand.clone());
        Ok(())
    }

    async fn append_action(&mut self, action: NewAction) -> LedgerResult<Action> {
        let action = Action {
            id: Uuid::new_v4(),
            hand_id: action.hand_id,
            participant_id: action.participant_id,
            round: action.round,
            action_order: action.action_order,
            kind: action.kind,
            amount: action.amount,
            created_at: Utc::now(),
        };
        self.snapshot.actions.push(action.clone());
        Ok(action)
    }

    async fn last_action_order(&mut self, hand_id: HandId) -> LedgerResult<Option<i64>> {
        Ok(self
            .snapshot
            .actions
            .iter()
            .filter(|a| a.hand_id == hand_id)
            .map(|a| a.action_order)
            .max())
    }

    async fn actions_in_round(
        &mut self,
        hand_id: HandId,
        round: Round,
    ) -> LedgerResult<Vec<Action>> {
        let mut actions: Vec<Action> = self
            .snapshot
            .actions
            .iter()
            .filter(|a| a.hand_id == hand_id && a.round == round)
            .cloned()
            .collect();
        actions.sort_by_key(|a| a.action_order);
        Ok(actions)
    }

    async fn wagered_in_round(
        &mut self,
        hand_id: HandId,
        participant_id: ParticipantId,
        round: Round,
    ) -> LedgerResult<Chips> {
        Ok(self
            .snapshot
            .actions
            .iter()
            .filter(|a| {
                a.hand_id == hand_id && a.participant_id == participant_id && a.round == round
            })
            .filter_map(|a| a.amount)
            .sum())
    }

    async fn commit(self) -> LedgerResult<()> {
        let mut store = self.shared.lock().map_err(|_| LedgerError::Unavailable)?;
        *store = self.snapshot;
        Ok(())
    }

    async fn rollback(self) -> LedgerResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn commit_makes_writes_visible() {
        let ledger = MemoryLedger::new();
        let mut tx = ledger.begin().await.unwrap();
        let game = tx.create_game(600, Utc::now()).await.unwrap();
        tx.commit().await.unwrap();

        let found = ledger.game(game.id).await.unwrap();
        assert_eq!(found, Some(game));
    }

    #[tokio::test]
    async fn rollback_discards_everything() {
        let ledger = MemoryLedger::new();
        let mut tx = ledger.begin().await.unwrap();
        let game = tx.create_game(600, Utc::now()).await.unwrap();
        tx.create_participant(game.id, "alice", 1000, true, Utc::now())
            .await
            .unwrap();
        tx.rollback().await.unwrap();

        assert!(ledger.game(game.id).await.unwrap().is_none());
        assert!(ledger.participants(game.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn transaction_reads_see_its_own_writes() {
        let ledger = MemoryLedger::new();
        let mut tx = ledger.begin().await.unwrap();
        let game = tx.create_game(600, Utc::now()).await.unwrap();
        let alice = tx
            .create_participant(game.id, "alice", 1000, true, Utc::now())
            .await
            .unwrap();

        let found = tx.participant(alice.id).await.unwrap();
        assert_eq!(found, Some(alice));
        // Not yet visible outside the transaction.
        assert!(ledger.participants(game.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn seating_is_creation_order() {
        let ledger = MemoryLedger::new();
        let mut tx = ledger.begin().await.unwrap();
        let game = tx.create_game(600, Utc::now()).await.unwrap();
        let base = Utc::now();
        for (i, name) in ["a", "b", "c"].iter().enumerate() {
            tx.create_participant(
                game.id,
                name,
                1000,
                true,
                base + chrono::Duration::microseconds(i as i64),
            )
            .await
            .unwrap();
        }
        tx.commit().await.unwrap();

        let seats = ledger.participants(game.id).await.unwrap();
        let names: Vec<&str> = seats.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }
}
