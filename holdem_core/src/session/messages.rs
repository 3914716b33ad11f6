//! Game actor message types.

use tokio::sync::oneshot;

use crate::game::entities::{
    ActionKind, Chips, GameId, HandId, HandSnapshot, ParticipantId,
};
use crate::game::errors::EngineError;

/// Messages that can be sent to a [`super::GameActor`].
#[derive(Debug)]
pub enum GameMessage {
    /// Apply one participant action to a hand of this game.
    TakeAction {
        hand_id: HandId,
        participant_id: ParticipantId,
        kind: ActionKind,
        amount: Option<Chips>,
        response: oneshot::Sender<Result<HandSnapshot, EngineError>>,
    },

    /// End the game and stop the actor.
    Close {
        response: oneshot::Sender<Result<(), EngineError>>,
    },
}

/// State snapshot broadcast to every connected observer after a
/// successfully processed action.
#[derive(Clone, Debug, serde::Serialize)]
pub struct GameUpdate {
    pub game_id: GameId,
    pub hand: crate::game::entities::Hand,
    pub participants: Vec<crate::game::entities::Participant>,
}

impl GameUpdate {
    pub fn new(game_id: GameId, snapshot: &HandSnapshot) -> Self {
        Self {
            game_id,
            hand: snapshot.hand.clone(),
            participants: snapshot.participants.clone(),
        }
    }
}
