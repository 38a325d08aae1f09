//! PostgreSQL-backed `CaptureRepository` implementation using Diesel ORM.
//!
//! The scoring step is one transaction: insert the capture event, append
//! its ledger entry, recompute the player's total from the full ledger and
//! upsert the cached score. The capture event insert uses
//! `ON CONFLICT DO NOTHING` against the `(location_id, user_id)` unique
//! constraint; zero affected rows means another tap already holds the
//! capture, and the transaction ends without writing anything else.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{CapturePersistenceError, CaptureRepository};
use crate::domain::{
    CaptureCreation, Hexpansion, HexpansionId, HexpansionSerial, Location, LocationDifficulty,
    LocationId, NewRawCaptureEvent, RawCaptureEventId, UserId,
};

use super::models::{
    HexpansionRow, LocationRow, NewCaptureEventRow, NewCaptureLogRow, NewRawCaptureEventRow,
    NewScoreRecordRow, NewUserScoreRow,
};
use super::pool::{DbPool, PoolError};
use super::schema::{capture_events, capture_logs, hexpansions, locations, raw_capture_events,
    score_records, user_scores};

/// Diesel-backed implementation of the `CaptureRepository` port.
#[derive(Clone)]
pub struct DieselCaptureRepository {
    pool: DbPool,
}

impl DieselCaptureRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> CapturePersistenceError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            CapturePersistenceError::connection(message)
        }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> CapturePersistenceError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, info) => {
            debug!(message = info.message(), "capture query lost its connection");
            CapturePersistenceError::connection("database connection error")
        }
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "capture query failed");
            CapturePersistenceError::query("database error")
        }
        other => {
            debug!(error = %other, "capture query failed");
            CapturePersistenceError::query("database error")
        }
    }
}

fn row_to_hexpansion(row: HexpansionRow) -> Hexpansion {
    Hexpansion {
        id: HexpansionId::from_uuid(row.id),
        human_identifier: row.human_identifier,
        serial_number: HexpansionSerial::from_uuid(row.serial_number),
    }
}

fn row_to_location(row: LocationRow) -> Result<Location, CapturePersistenceError> {
    let difficulty = LocationDifficulty::from_points(row.difficulty).ok_or_else(|| {
        CapturePersistenceError::query(format!(
            "corrupted difficulty {} in database",
            row.difficulty
        ))
    })?;
    Ok(Location {
        id: LocationId::from_uuid(row.id),
        display_name: row.display_name,
        difficulty,
        hexpansion_id: row.hexpansion_id.map(HexpansionId::from_uuid),
    })
}

#[async_trait]
impl CaptureRepository for DieselCaptureRepository {
    async fn find_hexpansion(
        &self,
        serial: HexpansionSerial,
    ) -> Result<Option<Hexpansion>, CapturePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<HexpansionRow> = hexpansions::table
            .filter(hexpansions::serial_number.eq(serial.as_uuid()))
            .select(HexpansionRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(row_to_hexpansion))
    }

    async fn record_raw_event(
        &self,
        event: NewRawCaptureEvent,
    ) -> Result<RawCaptureEventId, CapturePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let id = Uuid::new_v4();
        let row = NewRawCaptureEventRow {
            id,
            badge_id: *event.badge_id.as_uuid(),
            user_id: *event.user_id.as_uuid(),
            hexpansion_id: *event.hexpansion_id.as_uuid(),
            rand: &event.submission.rand,
            hmac: &event.submission.proof,
            app_rev: &event.submission.app_rev,
            fw_rev: &event.submission.fw_rev,
        };

        diesel::insert_into(raw_capture_events::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(RawCaptureEventId(id))
    }

    async fn resolve_location(
        &self,
        hexpansion_id: HexpansionId,
    ) -> Result<Option<Location>, CapturePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<LocationRow> = locations::table
            .filter(locations::hexpansion_id.eq(hexpansion_id.as_uuid()))
            .select(LocationRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_location).transpose()
    }

    async fn record_capture_log(
        &self,
        raw_event_id: RawCaptureEventId,
        location_id: LocationId,
        user_id: UserId,
    ) -> Result<(), CapturePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = NewCaptureLogRow {
            id: Uuid::new_v4(),
            raw_capture_event_id: raw_event_id.0,
            location_id: *location_id.as_uuid(),
            user_id: *user_id.as_uuid(),
        };

        diesel::insert_into(capture_logs::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn create_capture_if_new(
        &self,
        raw_event_id: RawCaptureEventId,
        location_id: LocationId,
        user_id: UserId,
        points: i32,
    ) -> Result<CaptureCreation, CapturePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let capture_event_id = Uuid::new_v4();
        let user_uuid = *user_id.as_uuid();
        let event_row = NewCaptureEventRow {
            id: capture_event_id,
            raw_capture_event_id: raw_event_id.0,
            location_id: *location_id.as_uuid(),
            user_id: user_uuid,
        };

        conn.transaction(|conn| {
            async move {
                let inserted = diesel::insert_into(capture_events::table)
                    .values(&event_row)
                    .on_conflict((capture_events::location_id, capture_events::user_id))
                    .do_nothing()
                    .execute(conn)
                    .await?;
                if inserted == 0 {
                    // A concurrent tap already holds this capture.
                    return Ok(CaptureCreation::AlreadyCaptured);
                }

                diesel::insert_into(score_records::table)
                    .values(&NewScoreRecordRow::for_capture(
                        user_uuid,
                        capture_event_id,
                        points,
                    ))
                    .execute(conn)
                    .await?;

                let new_total = recompute_user_score(conn, user_uuid).await?;
                Ok(CaptureCreation::Created { new_total })
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }
}

/// Recompute a player's total from the full ledger and upsert the cache,
/// inside the caller's transaction.
pub(crate) async fn recompute_user_score(
    conn: &mut diesel_async::AsyncPgConnection,
    user_id: Uuid,
) -> Result<i64, diesel::result::Error> {
    let total: Option<i64> = score_records::table
        .filter(score_records::user_id.eq(user_id))
        .select(diesel::dsl::sum(score_records::score))
        .first(conn)
        .await?;
    let total = total.unwrap_or(0);

    diesel::insert_into(user_scores::table)
        .values(&NewUserScoreRow {
            user_id,
            current_score: total,
        })
        .on_conflict(user_scores::user_id)
        .do_update()
        .set((
            user_scores::current_score.eq(excluded(user_scores::current_score)),
            user_scores::updated_at.eq(diesel::dsl::now),
        ))
        .execute(conn)
        .await?;

    Ok(total)
}
