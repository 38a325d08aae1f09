//! PostgreSQL-backed `ScoreLedger` implementation using Diesel ORM.
//!
//! The cached per-player score is never incremented in place. Every update
//! recomputes the sum over the player's ledger entries and upserts the
//! cache row, which makes the cache self-healing after any missed write.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::ports::{ScoreLedger, ScorePersistenceError};
use crate::domain::UserId;

use super::diesel_capture_repository::recompute_user_score;
use super::pool::{DbPool, PoolError};
use super::schema::user_scores;

/// Diesel-backed implementation of the `ScoreLedger` port.
#[derive(Clone)]
pub struct DieselScoreLedger {
    pool: DbPool,
}

impl DieselScoreLedger {
    /// Create a new ledger with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ScorePersistenceError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            ScorePersistenceError::connection(message)
        }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> ScorePersistenceError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, info) => {
            debug!(message = info.message(), "score query lost its connection");
            ScorePersistenceError::connection("database connection error")
        }
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "score query failed");
            ScorePersistenceError::query("database error")
        }
        other => {
            debug!(error = %other, "score query failed");
            ScorePersistenceError::query("database error")
        }
    }
}

#[async_trait]
impl ScoreLedger for DieselScoreLedger {
    async fn update_score_for_user(&self, user_id: UserId) -> Result<i64, ScorePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let user_uuid = *user_id.as_uuid();

        conn.transaction(|conn| {
            async move { recompute_user_score(conn, user_uuid).await }.scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn get_current_score_for_user(
        &self,
        user_id: UserId,
    ) -> Result<i64, ScorePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let score: Option<i64> = user_scores::table
            .filter(user_scores::user_id.eq(user_id.as_uuid()))
            .select(user_scores::current_score)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        // Players with no ledger entries simply have no cache row yet.
        Ok(score.unwrap_or(0))
    }
}
