//! Game actor with async message handling.
//!
//! One actor task per game. The mpsc inbox serializes every command for
//! that game, so two actions for the same hand can never interleave;
//! different games proceed fully in parallel.

use chrono::Utc;
use tokio::{
    sync::{broadcast, mpsc},
    time::{Duration, interval},
};

use super::messages::{GameMessage, GameUpdate};
use crate::db::ledger::{Ledger, LedgerTx};
use crate::game::engine::BettingEngine;
use crate::game::entities::{Game, GameId};
use crate::game::errors::EngineError;
use crate::game::lifecycle::Settlement;

/// Game actor handle for sending messages.
#[derive(Clone)]
pub struct GameHandle {
    sender: mpsc::Sender<GameMessage>,
    game_id: GameId,
}

impl GameHandle {
    pub fn new(sender: mpsc::Sender<GameMessage>, game_id: GameId) -> Self {
        Self { sender, game_id }
    }

    pub fn game_id(&self) -> GameId {
        self.game_id
    }

    /// Send a message to the game actor. Fails once the actor has
    /// stopped.
    pub async fn send(&self, message: GameMessage) -> Result<(), EngineError> {
        self.sender
            .send(message)
            .await
            .map_err(|_| EngineError::GameNotFound(self.game_id))
    }
}

/// Actor managing a single game.
pub struct GameActor<L: Ledger, S: Settlement> {
    game: Game,
    engine: BettingEngine<L>,
    settlement: S,
    inbox: mpsc::Receiver<GameMessage>,
    updates: broadcast::Sender<GameUpdate>,
    is_closed: bool,
}

impl<L: Ledger, S: Settlement> GameActor<L, S> {
    /// Create a new game actor and a handle for sending messages to it.
    pub fn new(
        game: Game,
        ledger: L,
        settlement: S,
        updates: broadcast::Sender<GameUpdate>,
    ) -> (Self, GameHandle) {
        let (sender, inbox) = mpsc::channel(100);
        let handle = GameHandle::new(sender, game.id);
        let actor = Self {
            game,
            engine: BettingEngine::new(ledger),
            settlement,
            inbox,
            updates,
            is_closed: false,
        };
        (actor, handle)
    }

    /// Run the game actor event loop.
    pub async fn run(mut self) {
        log::info!("game {} actor starting", self.game.id);

        let mut tick_interval = interval(Duration::from_secs(1));

        loop {
            tokio::select! {
                message = self.inbox.recv() => {
                    let Some(message) = message else { break };
                    self.handle_message(message).await;
                    if self.is_closed {
                        break;
                    }
                }

                _ = tick_interval.tick() => {
                    if let Err(err) = self.tick().await {
                        log::error!("game {}: tick failed: {err}", self.game.id);
                    }
                }
            }
        }

        log::info!("game {} actor stopped", self.game.id);
    }

    async fn handle_message(&mut self, message: GameMessage) {
        match message {
            GameMessage::TakeAction {
                hand_id,
                participant_id,
                kind,
                amount,
                response,
            } => {
                let result = self
                    .engine
                    .apply_action(self.game.id, hand_id, participant_id, kind, amount)
                    .await;
                if let Ok(snapshot) = &result {
                    if snapshot.hand.is_over() {
                        if let Err(err) = self.settlement.settle(snapshot).await {
                            log::error!("game {}: settlement failed: {err}", self.game.id);
                        }
                    }
                    // Fire-and-forget: a lagging observer never blocks
                    // action processing.
                    let _ = self
                        .updates
                        .send(GameUpdate::new(self.game.id, snapshot));
                }
                let _ = response.send(result);
            }

            GameMessage::Close { response } => {
                let result = self.close().await;
                self.is_closed = result.is_ok();
                let _ = response.send(result);
            }
        }
    }

    /// Escalate the blind level when the interval clock says so. The
    /// betting engine itself never touches `level`.
    async fn tick(&mut self) -> Result<(), EngineError> {
        if self.game.blind_interval_secs <= 0 {
            return Ok(());
        }
        let elapsed = (Utc::now() - self.game.start_time).num_seconds().max(0);
        let due = i32::try_from(elapsed / self.game.blind_interval_secs)
            .unwrap_or(i32::MAX - 1)
            + 1;
        if due <= self.game.level {
            return Ok(());
        }

        let mut tx = self.engine.ledger().begin().await?;
        tx.set_game_level(self.game.id, due).await?;
        tx.commit().await?;
        log::info!("game {}: blind level {} -> {due}", self.game.id, self.game.level);
        self.game.level = due;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), EngineError> {
        let mut tx = self.engine.ledger().begin().await?;
        tx.end_game(self.game.id, Utc::now()).await?;
        tx.commit().await?;
        log::info!("game {} closed", self.game.id);
        Ok(())
    }
}
