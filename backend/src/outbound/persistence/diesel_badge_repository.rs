//! PostgreSQL-backed `BadgeRepository` implementation using Diesel ORM.
//!
//! Conditional secret binding happens at the SQL level: the `UPDATE` only
//! matches rows whose stored secret is still the empty-string sentinel, so
//! two concurrent first contacts cannot both rebind a badge. Player
//! provisioning runs the user and badge inserts in one transaction; a
//! username collision rolls the whole thing back and surfaces as
//! `UsernameTaken` for the caller to retry.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{BadgePersistenceError, BadgeRepository};
use crate::domain::{Badge, BadgeId, BadgeSecret, DisplayName, MacAddress, User, UserId, Username};

use super::models::{BadgeRow, NewBadgeRow, NewUserRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::{badges, users};

/// Unique constraint guarding account names; collisions here mean "retry
/// with a fresh username", not "storage is broken".
const USERNAME_CONSTRAINT: &str = "users_username_key";

/// Diesel-backed implementation of the `BadgeRepository` port.
#[derive(Clone)]
pub struct DieselBadgeRepository {
    pool: DbPool,
}

impl DieselBadgeRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> BadgePersistenceError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            BadgePersistenceError::connection(message)
        }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> BadgePersistenceError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)
            if info.constraint_name() == Some(USERNAME_CONSTRAINT) =>
        {
            BadgePersistenceError::UsernameTaken
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, info) => {
            debug!(message = info.message(), "badge query lost its connection");
            BadgePersistenceError::connection("database connection error")
        }
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "badge query failed");
            BadgePersistenceError::query("database error")
        }
        other => {
            debug!(error = %other, "badge query failed");
            BadgePersistenceError::query("database error")
        }
    }
}

fn row_to_badge(row: BadgeRow) -> Result<Badge, BadgePersistenceError> {
    let mac_address = MacAddress::new(row.mac_address)
        .map_err(|err| BadgePersistenceError::query(format!("corrupted MAC in database: {err}")))?;
    let secret = if row.secret.is_empty() {
        None
    } else {
        Some(BadgeSecret::new(row.secret).map_err(|err| {
            BadgePersistenceError::query(format!("corrupted secret in database: {err}"))
        })?)
    };
    Ok(Badge {
        id: BadgeId::from_uuid(row.id),
        mac_address,
        user_id: UserId::from_uuid(row.user_id),
        secret,
        is_enabled: row.is_enabled,
    })
}

fn row_to_user(row: UserRow) -> Result<User, BadgePersistenceError> {
    let username = Username::new(row.username).map_err(|err| {
        BadgePersistenceError::query(format!("corrupted username in database: {err}"))
    })?;
    let display_name = DisplayName::new(row.display_name).map_err(|err| {
        BadgePersistenceError::query(format!("corrupted display name in database: {err}"))
    })?;
    Ok(User {
        id: UserId::from_uuid(row.id),
        username,
        display_name,
        is_superuser: row.is_superuser,
    })
}

#[async_trait]
impl BadgeRepository for DieselBadgeRepository {
    async fn find_by_mac(
        &self,
        mac_address: &MacAddress,
    ) -> Result<Option<(Badge, User)>, BadgePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let result: Option<(BadgeRow, UserRow)> = badges::table
            .inner_join(users::table)
            .filter(badges::mac_address.eq(mac_address.as_str()))
            .select((BadgeRow::as_select(), UserRow::as_select()))
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        result
            .map(|(badge_row, user_row)| Ok((row_to_badge(badge_row)?, row_to_user(user_row)?)))
            .transpose()
    }

    async fn bind_secret(
        &self,
        badge_id: BadgeId,
        secret: &BadgeSecret,
    ) -> Result<(), BadgePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let updated = diesel::update(badges::table)
            .filter(badges::id.eq(badge_id.as_uuid()))
            .filter(badges::secret.eq(""))
            .set(badges::secret.eq(secret.as_str()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        if updated == 0 {
            // A concurrent first contact won the bind; the caller's secret
            // no longer matches and the next request will be rejected.
            debug!(badge_id = %badge_id, "secret bind matched no blank badge");
        }
        Ok(())
    }

    async fn create_badge_and_user(
        &self,
        mac_address: &MacAddress,
        secret: &BadgeSecret,
        user: &User,
    ) -> Result<Badge, BadgePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let badge_id = Uuid::new_v4();
        let new_user = NewUserRow {
            id: *user.id.as_uuid(),
            username: user.username.as_str(),
            display_name: user.display_name.as_str(),
            is_superuser: user.is_superuser,
        };
        let new_badge = NewBadgeRow {
            id: badge_id,
            mac_address: mac_address.as_str(),
            user_id: *user.id.as_uuid(),
            secret: secret.as_str(),
            is_enabled: true,
        };

        conn.transaction(|conn| {
            async move {
                diesel::insert_into(users::table)
                    .values(&new_user)
                    .execute(conn)
                    .await?;
                diesel::insert_into(badges::table)
                    .values(&new_badge)
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)?;

        Ok(Badge {
            id: BadgeId::from_uuid(badge_id),
            mac_address: mac_address.clone(),
            user_id: user.id,
            secret: Some(secret.clone()),
            is_enabled: true,
        })
    }
}
