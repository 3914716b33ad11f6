//! Ledger accessor: the durable read/write contract for games,
//! participants, hands, and the append-only action log.
//!
//! The contract is trait-based so the betting engine can run against
//! PostgreSQL in production and against the in-memory ledger in tests.
//! All writes happen through a [`LedgerTx`]: one transaction per processed
//! action, committed or rolled back as a whole.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use thiserror::Error;
use uuid::Uuid;

use crate::game::entities::{
    Action, ActionKind, Chips, Game, GameId, Hand, HandId, NewAction, Participant, ParticipantId,
    Round,
};

/// Errors from the storage boundary. These are infrastructure failures,
/// never domain-rule violations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("storage unavailable")]
    Unavailable,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Pool-level ledger handle: plain reads plus transaction creation.
#[async_trait]
pub trait Ledger: Send + Sync + 'static {
    type Tx: LedgerTx;

    /// Open a transaction covering one unit of work.
    async fn begin(&self) -> LedgerResult<Self::Tx>;

    async fn game(&self, id: GameId) -> LedgerResult<Option<Game>>;
    async fn hand(&self, id: HandId) -> LedgerResult<Option<Hand>>;
    /// Participants of a game in seat order (ascending creation order,
    /// ties broken by id).
    async fn participants(&self, game_id: GameId) -> LedgerResult<Vec<Participant>>;
}

/// A ledger transaction. Reads see the transaction's own writes; nothing
/// is durable until `commit`.
#[async_trait]
pub trait LedgerTx: Send {
    async fn create_game(
        &mut self,
        blind_interval_secs: i64,
        start_time: DateTime<Utc>,
    ) -> LedgerResult<Game>;
    async fn set_game_level(&mut self, id: GameId, level: i32) -> LedgerResult<()>;
    async fn end_game(&mut self, id: GameId, end_time: DateTime<Utc>) -> LedgerResult<()>;

    async fn create_participant(
        &mut self,
        game_id: GameId,
        name: &str,
        stack: Chips,
        is_connected: bool,
        created_at: DateTime<Utc>,
    ) -> LedgerResult<Participant>;
    async fn participant(&mut self, id: ParticipantId) -> LedgerResult<Option<Participant>>;
    async fn participants(&mut self, game_id: GameId) -> LedgerResult<Vec<Participant>>;
    /// Persist the mutable fields of a participant record.
    async fn update_participant(&mut self, participant: &Participant) -> LedgerResult<()>;

    async fn create_hand(&mut self, hand: &Hand) -> LedgerResult<()>;
    async fn hand(&mut self, id: HandId) -> LedgerResult<Option<Hand>>;
    /// Persist the mutable fields of a hand record.
    async fn update_hand(&mut self, hand: &Hand) -> LedgerResult<()>;

    async fn append_action(&mut self, action: NewAction) -> LedgerResult<Action>;
    async fn last_action_order(&mut self, hand_id: HandId) -> LedgerResult<Option<i64>>;
    async fn actions_in_round(&mut self, hand_id: HandId, round: Round)
    -> LedgerResult<Vec<Action>>;
    /// Sum of recorded wager amounts for one participant in one round.
    async fn wagered_in_round(
        &mut self,
        hand_id: HandId,
        participant_id: ParticipantId,
        round: Round,
    ) -> LedgerResult<Chips>;

    async fn commit(self) -> LedgerResult<()>;
    async fn rollback(self) -> LedgerResult<()>;
}

/// PostgreSQL ledger backed by a sqlx pool.
#[derive(Clone)]
pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Ledger for PgLedger {
    type Tx = PgLedgerTx;

    async fn begin(&self) -> LedgerResult<Self::Tx> {
        let tx = self.pool.begin().await?;
        Ok(PgLedgerTx { tx })
    }

    async fn game(&self, id: GameId) -> LedgerResult<Option<Game>> {
        let row = sqlx::query("SELECT * FROM games WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| map_game(&r)).transpose()
    }

    async fn hand(&self, id: HandId) -> LedgerResult<Option<Hand>> {
        let row = sqlx::query("SELECT * FROM hands WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| map_hand(&r)).transpose()
    }

    async fn participants(&self, game_id: GameId) -> LedgerResult<Vec<Participant>> {
        let rows = sqlx::query(
            "SELECT * FROM participants WHERE game_id = $1 ORDER BY created_at, id",
        )
        .bind(game_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(map_participant).collect()
    }
}

/// One open PostgreSQL transaction.
pub struct PgLedgerTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerTx for PgLedgerTx {
    async fn create_game(
        &mut self,
        blind_interval_secs: i64,
        start_time: DateTime<Utc>,
    ) -> LedgerResult<Game> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO games (id, blind_interval_secs, level, start_time) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(blind_interval_secs)
        .bind(1i32)
        .bind(start_time)
        .execute(&mut *self.tx)
        .await?;
        Ok(Game {
            id,
            blind_interval_secs,
            level: 1,
            start_time,
            end_time: None,
        })
    }

    async fn set_game_level(&mut self, id: GameId, level: i32) -> LedgerResult<()> {
        sqlx::query("UPDATE games SET level = $2 WHERE id = $1")
            .bind(id)
            .bind(level)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn end_game(&mut self, id: GameId, end_time: DateTime<Utc>) -> LedgerResult<()> {
        sqlx::query("UPDATE games SET end_time = $2 WHERE id = $1")
            .bind(id)
            .bind(end_time)
            .execute(&mut *self.tx)
            .await?;
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
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO participants \
             (id, game_id, name, stack, is_connected, is_active, last_action, action_amount, created_at) \
             VALUES ($1, $2, $3, $4, $5, TRUE, NULL, 0, $6)",
        )
        .bind(id)
        .bind(game_id)
        .bind(name)
        .bind(stack)
        .bind(is_connected)
        .bind(created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(Participant {
            id,
            game_id,
            name: name.to_string(),
            stack,
            is_connected,
            is_active: true,
            last_action: None,
            action_amount: 0,
            created_at,
        })
    }

    async fn participant(&mut self, id: ParticipantId) -> LedgerResult<Option<Participant>> {
        let row = sqlx::query("SELECT * FROM participants WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(map_participant).transpose()
    }

    async fn participants(&mut self, game_id: GameId) -> LedgerResult<Vec<Participant>> {
        let rows = sqlx::query(
            "SELECT * FROM participants WHERE game_id = $1 ORDER BY created_at, id",
        )
        .bind(game_id)
        .fetch_all(&mut *self.tx)
        .await?;
        rows.iter().map(map_participant).collect()
    }

    async fn update_participant(&mut self, participant: &Participant) -> LedgerResult<()> {
        sqlx::query(
            "UPDATE participants SET stack = $2, is_connected = $3, is_active = $4, \
             last_action = $5, action_amount = $6 WHERE id = $1",
        )
        .bind(participant.id)
        .bind(participant.stack)
        .bind(participant.is_connected)
        .bind(participant.is_active)
        .bind(participant.last_action.map(ActionKind::as_str))
        .bind(participant.action_amount)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn create_hand(&mut self, hand: &Hand) -> LedgerResult<()> {
        sqlx::query(
            "INSERT INTO hands \
             (id, game_id, level, dealer_id, small_blind_id, big_blind_id, pot, \
              small_blind_amount, big_blind_amount, last_call_amount, current_max_bet, \
              last_raise_amount, current_round, round_just_advanced, current_turn_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
        )
        .bind(hand.id)
        .bind(hand.game_id)
        .bind(hand.level)
        .bind(hand.dealer_id)
        .bind(hand.small_blind_id)
        .bind(hand.big_blind_id)
        .bind(hand.pot)
        .bind(hand.small_blind_amount)
        .bind(hand.big_blind_amount)
        .bind(hand.last_call_amount)
        .bind(hand.current_max_bet)
        .bind(hand.last_raise_amount)
        .bind(hand.current_round.as_str())
        .bind(hand.round_just_advanced)
        .bind(hand.current_turn_id)
        .bind(hand.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn hand(&mut self, id: HandId) -> LedgerResult<Option<Hand>> {
        let row = sqlx::query("SELECT * FROM hands WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(|r| map_hand(r)).transpose()
    }

    async fn update_hand(&mut self, hand: &Hand) -> LedgerResult<()> {
        sqlx::query(
            "UPDATE hands SET pot = $2, last_call_amount = $3, current_max_bet = $4, \
             last_raise_amount = $5, current_round = $6, round_just_advanced = $7, \
             current_turn_id = $8 WHERE id = $1",
        )
        .bind(hand.id)
        .bind(hand.pot)
        .bind(hand.last_call_amount)
        .bind(hand.current_max_bet)
        .bind(hand.last_raise_amount)
        .bind(hand.current_round.as_str())
        .bind(hand.round_just_advanced)
        .bind(hand.current_turn_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn append_action(&mut self, action: NewAction) -> LedgerResult<Action> {
        let id = Uuid::new_v4();
        let created_at = Utc::now();
        sqlx::query(
            "INSERT INTO actions \
             (id, hand_id, participant_id, round, action_order, kind, amount, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(id)
        .bind(action.hand_id)
        .bind(action.participant_id)
        .bind(action.round.as_str())
        .bind(action.action_order)
        .bind(action.kind.as_str())
        .bind(action.amount)
        .bind(created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(Action {
            id,
            hand_id: action.hand_id,
            participant_id: action.participant_id,
            round: action.round,
            action_order: action.action_order,
            kind: action.kind,
            amount: action.amount,
            created_at,
        })
    }

    async fn last_action_order(&mut self, hand_id: HandId) -> LedgerResult<Option<i64>> {
        let row = sqlx::query("SELECT MAX(action_order) AS last_order FROM actions WHERE hand_id = $1")
            .bind(hand_id)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(row.get("last_order"))
    }

    async fn actions_in_round(
        &mut self,
        hand_id: HandId,
        round: Round,
    ) -> LedgerResult<Vec<Action>> {
        let rows = sqlx::query(
            "SELECT * FROM actions WHERE hand_id = $1 AND round = $2 ORDER BY action_order",
        )
        .bind(hand_id)
        .bind(round.as_str())
        .fetch_all(&mut *self.tx)
        .await?;
        rows.iter().map(map_action).collect()
    }

    async fn wagered_in_round(
        &mut self,
        hand_id: HandId,
        participant_id: ParticipantId,
        round: Round,
    ) -> LedgerResult<Chips> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(amount), 0)::BIGINT AS total FROM actions \
             WHERE hand_id = $1 AND participant_id = $2 AND round = $3",
        )
        .bind(hand_id)
        .bind(participant_id)
        .bind(round.as_str())
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row.get("total"))
    }

    async fn commit(self) -> LedgerResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> LedgerResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

fn map_game(row: &PgRow) -> LedgerResult<Game> {
    Ok(Game {
        id: row.get("id"),
        blind_interval_secs: row.get("blind_interval_secs"),
        level: row.get("level"),
        start_time: row.get("start_time"),
        end_time: row.get("end_time"),
    })
}

fn map_participant(row: &PgRow) -> LedgerResult<Participant> {
    let last_action: Option<String> = row.get("last_action");
    let last_action = last_action
        .map(|s| s.parse::<ActionKind>().map_err(LedgerError::Corrupt))
        .transpose()?;
    Ok(Participant {
        id: row.get("id"),
        game_id: row.get("game_id"),
        name: row.get("name"),
        stack: row.get("stack"),
        is_connected: row.get("is_connected"),
        is_active: row.get("is_active"),
        last_action,
        action_amount: row.get("action_amount"),
        created_at: row.get("created_at"),
    })
}

fn map_hand(row: &PgRow) -> LedgerResult<Hand> {
    let round: String = row.get("current_round");
    Ok(Hand {
        id: row.get("id"),
        game_id: row.get("game_id"),
        level: row.get("level"),
        dealer_id: row.get("dealer_id"),
        small_blind_id: row.get("small_blind_id"),
        big_blind_id: row.get("big_blind_id"),
        pot: row.get("pot"),
        small_blind_amount: row.get("small_blind_amount"),
        big_blind_amount: row.get("big_blind_amount"),
        last_call_amount: row.get("last_call_amount"),
        current_max_bet: row.get("current_max_bet"),
        last_raise_amount: row.get("last_raise_amount"),
        current_round: round.parse().map_err(LedgerError::Corrupt)?,
        round_just_advanced: row.get("round_just_advanced"),
        current_turn_id: row.get("current_turn_id"),
        created_at: row.get("created_at"),
    })
}

fn map_action(row: &PgRow) -> LedgerResult<Action> {
    let round: String = row.get("round");
    let kind: String = row.get("kind");
    Ok(Action {
        id: row.get("id"),
        hand_id: row.get("hand_id"),
        participant_id: row.get("participant_id"),
        round: round.parse().map_err(LedgerError::Corrupt)?,
        action_order: row.get("action_order"),
        kind: kind.parse().map_err(LedgerError::Corrupt)?,
        amount: row.get("amount"),
        created_at: row.get("created_at"),
    })
}
