//! PostgreSQL-backed `ScoreboardQuery` implementation using Diesel ORM.
//!
//! Standings come from two straightforward queries (players with their
//! cached scores, and grouped capture counts) merged in memory. Ranking is
//! the domain's job; this adapter only produces the unranked snapshot.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{ScoreboardQuery, ScoreboardQueryError};
use crate::domain::PlayerStanding;

use super::pool::{DbPool, PoolError};
use super::schema::{capture_events, leaderboard_members, leaderboards, user_scores, users};

/// Diesel-backed implementation of the `ScoreboardQuery` port.
#[derive(Clone)]
pub struct DieselScoreboardQuery {
    pool: DbPool,
}

impl DieselScoreboardQuery {
    /// Create a new query adapter with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ScoreboardQueryError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            ScoreboardQueryError::connection(message)
        }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> ScoreboardQueryError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, info) => {
            debug!(message = info.message(), "scoreboard query lost its connection");
            ScoreboardQueryError::connection("database connection error")
        }
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "scoreboard query failed");
            ScoreboardQueryError::query("database error")
        }
        other => {
            debug!(error = %other, "scoreboard query failed");
            ScoreboardQueryError::query("database error")
        }
    }
}

/// Merge player rows and grouped capture counts into standings.
fn merge_standings(
    players: Vec<(Uuid, String, String, Option<i64>)>,
    capture_counts: HashMap<Uuid, i64>,
) -> Vec<PlayerStanding> {
    players
        .into_iter()
        .map(|(user_id, username, display_name, score)| PlayerStanding {
            user_id,
            username,
            display_name,
            current_score: score.unwrap_or(0),
            capture_count: capture_counts.get(&user_id).copied().unwrap_or(0),
        })
        .collect()
}

#[async_trait]
impl ScoreboardQuery for DieselScoreboardQuery {
    async fn load_global_standings(
        &self,
    ) -> Result<Vec<PlayerStanding>, ScoreboardQueryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let players: Vec<(Uuid, String, String, Option<i64>)> = users::table
            .left_join(user_scores::table)
            .filter(users::is_superuser.eq(false))
            .select((
                users::id,
                users::username,
                users::display_name,
                user_scores::current_score.nullable(),
            ))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let counts: Vec<(Uuid, i64)> = capture_events::table
            .group_by(capture_events::user_id)
            .select((capture_events::user_id, count_star()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(merge_standings(players, counts.into_iter().collect()))
    }

    async fn load_leaderboard_standings(
        &self,
        leaderboard_id: Uuid,
    ) -> Result<Option<Vec<PlayerStanding>>, ScoreboardQueryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let exists: Option<Uuid> = leaderboards::table
            .filter(leaderboards::id.eq(leaderboard_id))
            .select(leaderboards::id)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        if exists.is_none() {
            return Ok(None);
        }

        let member_ids: Vec<Uuid> = leaderboard_members::table
            .filter(leaderboard_members::leaderboard_id.eq(leaderboard_id))
            .select(leaderboard_members::user_id)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let players: Vec<(Uuid, String, String, Option<i64>)> = users::table
            .left_join(user_scores::table)
            .filter(users::is_superuser.eq(false))
            .filter(users::id.eq_any(&member_ids))
            .select((
                users::id,
                users::username,
                users::display_name,
                user_scores::current_score.nullable(),
            ))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let counts: Vec<(Uuid, i64)> = capture_events::table
            .filter(capture_events::user_id.eq_any(&member_ids))
            .group_by(capture_events::user_id)
            .select((capture_events::user_id, count_star()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(Some(merge_standings(players, counts.into_iter().collect())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn merge_defaults_missing_scores_and_counts_to_zero() {
        let id = Uuid::new_v4();
        let standings = merge_standings(
            vec![(id, "idle".to_owned(), "Idle".to_owned(), None)],
            HashMap::new(),
        );
        assert_eq!(standings[0].current_score, 0);
        assert_eq!(standings[0].capture_count, 0);
    }

    #[rstest]
    fn merge_attaches_counts_by_player() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let counts: HashMap<Uuid, i64> = [(a, 3)].into_iter().collect();
        let standings = merge_standings(
            vec![
                (a, "busy".to_owned(), "Busy".to_owned(), Some(45)),
                (b, "new".to_owned(), "New".to_owned(), Some(10)),
            ],
            counts,
        );
        assert_eq!(standings[0].capture_count, 3);
        assert_eq!(standings[1].capture_count, 0);
    }

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let err = map_pool_error(PoolError::checkout("pool exhausted"));
        assert!(matches!(err, ScoreboardQueryError::Connection { .. }));
    }
}
