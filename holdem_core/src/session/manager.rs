//! Game manager for spawning and routing to game actors.

use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast, oneshot};

use super::actor::{GameActor, GameHandle};
use super::messages::{GameMessage, GameUpdate};
use crate::db::ledger::{Ledger, LedgerError, LedgerTx};
use crate::game::entities::{ActionKind, Chips, Game, GameId, HandId, HandSnapshot, ParticipantId};
use crate::game::errors::EngineError;
use crate::game::lifecycle::{self, NoSettlement};

/// A participant to seat when a game is created.
#[derive(Clone, Debug)]
pub struct SeatConfig {
    pub name: String,
    pub stack: Chips,
}

const UPDATE_CHANNEL_CAPACITY: usize = 256;

/// Owns the set of running game actors and the update broadcast channel.
pub struct GameManager<L: Ledger + Clone> {
    ledger: L,
    seats: Vec<SeatConfig>,
    games: Arc<RwLock<HashMap<GameId, GameHandle>>>,
    updates: broadcast::Sender<GameUpdate>,
}

impl<L: Ledger + Clone> GameManager<L> {
    pub fn new(ledger: L, seats: Vec<SeatConfig>) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            ledger,
            seats,
            games: Arc::new(RwLock::new(HashMap::new())),
            updates,
        }
    }

    /// Subscribe to post-action state snapshots for every game.
    pub fn subscribe(&self) -> broadcast::Receiver<GameUpdate> {
        self.updates.subscribe()
    }

    /// Number of running game actors.
    pub async fn active_games(&self) -> usize {
        self.games.read().await.len()
    }

    /// Create a game with the configured seats, deal its first hand, and
    /// spawn its actor. The whole setup commits as one transaction.
    pub async fn start_game(
        &self,
        blind_interval_secs: i64,
        small_blind: Chips,
    ) -> Result<(Game, HandSnapshot), EngineError> {
        let mut tx = self.ledger.begin().await?;
        let result = Self::create_in_tx(&mut tx, &self.seats, blind_interval_secs, small_blind)
            .await;
        let (game, snapshot) = match result {
            Ok(created) => {
                tx.commit().await?;
                created
            }
            Err(err) => {
                tx.rollback().await?;
                return Err(err);
            }
        };

        let (actor, handle) = GameActor::new(
            game.clone(),
            self.ledger.clone(),
            NoSettlement,
            self.updates.clone(),
        );
        tokio::spawn(actor.run());
        self.games.write().await.insert(game.id, handle);

        let _ = self.updates.send(GameUpdate::new(game.id, &snapshot));
        log::info!(
            "game {} started with {} seats, hand {}",
            game.id,
            snapshot.participants.len(),
            snapshot.hand.id
        );
        Ok((game, snapshot))
    }

    async fn create_in_tx(
        tx: &mut L::Tx,
        seats: &[SeatConfig],
        blind_interval_secs: i64,
        small_blind: Chips,
    ) -> Result<(Game, HandSnapshot), EngineError> {
        let game = tx.create_game(blind_interval_secs, Utc::now()).await?;
        let base = Utc::now();
        for (i, seat) in seats.iter().enumerate() {
            // Stagger timestamps so seat order is deterministic.
            tx.create_participant(
                game.id,
                &seat.name,
                seat.stack,
                true,
                base + Duration::microseconds(i as i64),
            )
            .await?;
        }
        let (hand, participants) = lifecycle::start_hand(tx, &game, small_blind).await?;
        Ok((game, HandSnapshot { hand, participants }))
    }

    /// Route an action to the game's actor and wait for the outcome.
    pub async fn submit_action(
        &self,
        game_id: GameId,
        hand_id: HandId,
        participant_id: ParticipantId,
        kind: ActionKind,
        amount: Option<Chips>,
    ) -> Result<HandSnapshot, EngineError> {
        let handle = self
            .games
            .read()
            .await
            .get(&game_id)
            .cloned()
            .ok_or(EngineError::GameNotFound(game_id))?;

        let (response, receiver) = oneshot::channel();
        handle
            .send(GameMessage::TakeAction {
                hand_id,
                participant_id,
                kind,
                amount,
                response,
            })
            .await?;
        receiver
            .await
            .map_err(|_| EngineError::Ledger(LedgerError::Unavailable))?
    }

    /// End a game: persist `end_time` and stop its actor.
    pub async fn close_game(&self, game_id: GameId) -> Result<(), EngineError> {
        let handle = self
            .games
            .read()
            .await
            .get(&game_id)
            .cloned()
            .ok_or(EngineError::GameNotFound(game_id))?;

        let (response, receiver) = oneshot::channel();
        handle.send(GameMessage::Close { response }).await?;
        receiver
            .await
            .map_err(|_| EngineError::Ledger(LedgerError::Unavailable))??;

        self.games.write().await.remove(&game_id);
        Ok(())
    }
}
