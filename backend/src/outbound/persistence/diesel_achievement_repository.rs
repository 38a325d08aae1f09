//! PostgreSQL-backed `AchievementHooks` implementation using Diesel ORM.
//!
//! Two award paths live here. The first-capture bonus fires when a location
//! is captured by anyone for the very first time; the `first_capture_events`
//! unique constraint on `location_id` decides the winner under concurrency,
//! just like the capture pipeline's own constraint. Basic achievements are
//! idempotent per player and achievement the same way.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::ports::{AchievementAward, AchievementError, AchievementHooks};
use crate::domain::{Location, UserId};

use super::diesel_capture_repository::recompute_user_score;
use super::models::{BasicAchievementRow, NewBasicAchievementEventRow, NewFirstCaptureEventRow,
    NewScoreRecordRow};
use super::pool::{DbPool, PoolError};
use super::schema::{basic_achievement_events, basic_achievements, capture_events,
    first_capture_events, score_records};

/// Diesel-backed implementation of the `AchievementHooks` port.
#[derive(Clone)]
pub struct DieselAchievementRepository {
    pool: DbPool,
}

impl DieselAchievementRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> AchievementError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            AchievementError::connection(message)
        }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> AchievementError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, info) => {
            debug!(message = info.message(), "achievement query lost its connection");
            AchievementError::connection("database connection error")
        }
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "achievement query failed");
            AchievementError::query("database error")
        }
        other => {
            debug!(error = %other, "achievement query failed");
            AchievementError::query("database error")
        }
    }
}

#[async_trait]
impl AchievementHooks for DieselAchievementRepository {
    async fn on_location_captured(
        &self,
        user_id: UserId,
        location: &Location,
    ) -> Result<(), AchievementError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let user_uuid = *user_id.as_uuid();
        let location_uuid = *location.id.as_uuid();
        let bonus = location.difficulty.points();

        let awarded = conn
            .transaction(|conn| {
                async move {
                    // The hook fires after the capture commits, so the
                    // winning capture event is visible here.
                    let capture_event_id: Option<Uuid> = capture_events::table
                        .filter(capture_events::location_id.eq(location_uuid))
                        .filter(capture_events::user_id.eq(user_uuid))
                        .select(capture_events::id)
                        .first(conn)
                        .await
                        .optional()?;
                    let Some(capture_event_id) = capture_event_id else {
                        return Ok(false);
                    };

                    let event_id = Uuid::new_v4();
                    let inserted = diesel::insert_into(first_capture_events::table)
                        .values(&NewFirstCaptureEventRow {
                            id: event_id,
                            location_id: location_uuid,
                            user_id: user_uuid,
                            capture_event_id,
                        })
                        .on_conflict(first_capture_events::location_id)
                        .do_nothing()
                        .execute(conn)
                        .await?;
                    if inserted == 0 {
                        // Someone else was first.
                        return Ok(false);
                    }

                    diesel::insert_into(score_records::table)
                        .values(&NewScoreRecordRow::for_first_capture(
                            user_uuid, event_id, bonus,
                        ))
                        .execute(conn)
                        .await?;
                    recompute_user_score(conn, user_uuid).await?;
                    Ok(true)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        if awarded {
            info!(
                location = %location.display_name,
                user_id = %user_id,
                bonus,
                "awarded first-capture bonus"
            );
        }
        Ok(())
    }

    async fn award_basic_achievement(
        &self,
        user_id: UserId,
        achievement_id: Uuid,
    ) -> Result<AchievementAward, AchievementError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let achievement: Option<BasicAchievementRow> = basic_achievements::table
            .filter(basic_achievements::id.eq(achievement_id))
            .select(BasicAchievementRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        let Some(achievement) = achievement else {
            return Ok(AchievementAward::UnknownAchievement);
        };

        let user_uuid = *user_id.as_uuid();
        let points = achievement.difficulty;

        let created = conn
            .transaction(|conn| {
                async move {
                    let event_id = Uuid::new_v4();
                    let inserted = diesel::insert_into(basic_achievement_events::table)
                        .values(&NewBasicAchievementEventRow {
                            id: event_id,
                            achievement_id,
                            user_id: user_uuid,
                        })
                        .on_conflict((
                            basic_achievement_events::achievement_id,
                            basic_achievement_events::user_id,
                        ))
                        .do_nothing()
                        .execute(conn)
                        .await?;
                    if inserted == 0 {
                        return Ok(false);
                    }

                    diesel::insert_into(score_records::table)
                        .values(&NewScoreRecordRow::for_basic_achievement(
                            user_uuid, event_id, points,
                        ))
                        .execute(conn)
                        .await?;
                    recompute_user_score(conn, user_uuid).await?;
                    Ok(true)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        if created {
            info!(
                achievement = %achievement.display_name,
                user_id = %user_id,
                points,
                "awarded basic achievement"
            );
            Ok(AchievementAward::Awarded { points })
        } else {
            Ok(AchievementAward::AlreadyAwarded)
        }
    }
}
