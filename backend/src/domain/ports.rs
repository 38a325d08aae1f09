//! Domain ports defining the edges of the hexagon.
//!
//! Ports describe how the domain expects to interact with driven adapters
//! (the database and the scoreboard cache). Each trait exposes strongly
//! typed errors so adapters map their failures into predictable variants.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::badge::{Badge, BadgeId, BadgeSecret, MacAddress};
use super::capture::{CaptureCreation, NewRawCaptureEvent, RawCaptureEventId};
use super::hexpansion::{Hexpansion, HexpansionId, HexpansionSerial};
use super::location::{Location, LocationId};
use super::scoreboard::{PlayerStanding, ScoreboardRow, ScoreboardScope};
use super::user::{User, UserId};

/// Persistence errors raised by [`BadgeRepository`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BadgePersistenceError {
    /// Repository connection could not be established.
    #[error("badge repository connection failed: {message}")]
    Connection {
        /// Adapter-provided detail.
        message: String,
    },
    /// Query or mutation failed during execution.
    #[error("badge repository query failed: {message}")]
    Query {
        /// Adapter-provided detail.
        message: String,
    },
    /// The generated username collided with an existing account.
    ///
    /// Callers retry provisioning with a fresh draw.
    #[error("username already taken")]
    UsernameTaken,
}

impl BadgePersistenceError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Persistence errors raised by [`CaptureRepository`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapturePersistenceError {
    /// Repository connection could not be established.
    #[error("capture repository connection failed: {message}")]
    Connection {
        /// Adapter-provided detail.
        message: String,
    },
    /// Query or mutation failed during execution.
    #[error("capture repository query failed: {message}")]
    Query {
        /// Adapter-provided detail.
        message: String,
    },
}

impl CapturePersistenceError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Persistence errors raised by [`ScoreLedger`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScorePersistenceError {
    /// Repository connection could not be established.
    #[error("score ledger connection failed: {message}")]
    Connection {
        /// Adapter-provided detail.
        message: String,
    },
    /// Query or mutation failed during execution.
    #[error("score ledger query failed: {message}")]
    Query {
        /// Adapter-provided detail.
        message: String,
    },
}

impl ScorePersistenceError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Errors raised by [`AchievementHooks`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AchievementError {
    /// Repository connection could not be established.
    #[error("achievement store connection failed: {message}")]
    Connection {
        /// Adapter-provided detail.
        message: String,
    },
    /// Query or mutation failed during execution.
    #[error("achievement store query failed: {message}")]
    Query {
        /// Adapter-provided detail.
        message: String,
    },
}

impl AchievementError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Errors raised by [`ScoreboardQuery`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreboardQueryError {
    /// Repository connection could not be established.
    #[error("scoreboard query connection failed: {message}")]
    Connection {
        /// Adapter-provided detail.
        message: String,
    },
    /// Query failed during execution.
    #[error("scoreboard query failed: {message}")]
    Query {
        /// Adapter-provided detail.
        message: String,
    },
}

impl ScoreboardQueryError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Errors raised by [`ScoreboardCache`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreboardCacheError {
    /// Cache backend is unavailable.
    #[error("scoreboard cache backend failure: {message}")]
    Backend {
        /// Adapter-provided detail.
        message: String,
    },
}

impl ScoreboardCacheError {
    /// Helper for backend-level failures.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

/// Result of awarding a basic achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AchievementAward {
    /// A new award and ledger entry were created.
    Awarded {
        /// Points the award was worth.
        points: i32,
    },
    /// The player already holds this achievement; nothing was written.
    AlreadyAwarded,
    /// No achievement exists with the given identifier.
    UnknownAchievement,
}

/// Persistence port for badges and their owning players.
#[async_trait]
pub trait BadgeRepository: Send + Sync {
    /// Fetch a badge and its owner by MAC address.
    async fn find_by_mac(
        &self,
        mac_address: &MacAddress,
    ) -> Result<Option<(Badge, User)>, BadgePersistenceError>;

    /// Bind a secret to a badge whose stored secret is blank.
    ///
    /// Adapters must leave a non-blank stored secret untouched; the bind is
    /// conditional at the storage layer, not just in the caller.
    async fn bind_secret(
        &self,
        badge_id: BadgeId,
        secret: &BadgeSecret,
    ) -> Result<(), BadgePersistenceError>;

    /// Atomically create a new player and their first badge.
    ///
    /// Returns [`BadgePersistenceError::UsernameTaken`] when the generated
    /// username collides so the caller can retry with a fresh draw.
    async fn create_badge_and_user(
        &self,
        mac_address: &MacAddress,
        secret: &BadgeSecret,
        user: &User,
    ) -> Result<Badge, BadgePersistenceError>;
}

/// Persistence port for the capture pipeline.
#[async_trait]
pub trait CaptureRepository: Send + Sync {
    /// Look up a hexpansion by chip serial number.
    async fn find_hexpansion(
        &self,
        serial: HexpansionSerial,
    ) -> Result<Option<Hexpansion>, CapturePersistenceError>;

    /// Persist the immutable forensic record of a tap.
    async fn record_raw_event(
        &self,
        event: NewRawCaptureEvent,
    ) -> Result<RawCaptureEventId, CapturePersistenceError>;

    /// Resolve a hexpansion to its installed location, if any.
    async fn resolve_location(
        &self,
        hexpansion_id: HexpansionId,
    ) -> Result<Option<Location>, CapturePersistenceError>;

    /// Record that a raw event mapped to a known location.
    ///
    /// Duplicates are expected and allowed; this is traffic logging, not
    /// scoring.
    async fn record_capture_log(
        &self,
        raw_event_id: RawCaptureEventId,
        location_id: LocationId,
        user_id: UserId,
    ) -> Result<(), CapturePersistenceError>;

    /// Atomically create the capture event, its ledger entry, and the
    /// recomputed user score, or report that the pair already exists.
    ///
    /// The `(user, location)` uniqueness constraint is the race backstop:
    /// losing a concurrent insert race must surface as
    /// [`CaptureCreation::AlreadyCaptured`], never as an error.
    async fn create_capture_if_new(
        &self,
        raw_event_id: RawCaptureEventId,
        location_id: LocationId,
        user_id: UserId,
        points: i32,
    ) -> Result<CaptureCreation, CapturePersistenceError>;
}

/// Persistence port for the score ledger and its denormalised cache.
#[async_trait]
pub trait ScoreLedger: Send + Sync {
    /// Recompute and store the player's current score from the full ledger.
    ///
    /// Returns the freshly computed total.
    async fn update_score_for_user(&self, user_id: UserId) -> Result<i64, ScorePersistenceError>;

    /// Read the cached current score, defaulting to 0 for players with no
    /// score row.
    async fn get_current_score_for_user(
        &self,
        user_id: UserId,
    ) -> Result<i64, ScorePersistenceError>;
}

/// Outbound port to the achievement-awarding collaborator.
///
/// Calls after a capture are best effort: failures are logged and never
/// roll back the capture itself.
#[async_trait]
pub trait AchievementHooks: Send + Sync {
    /// Notify that `user_id` has captured `location` for the first time.
    async fn on_location_captured(
        &self,
        user_id: UserId,
        location: &Location,
    ) -> Result<(), AchievementError>;

    /// Award a basic achievement, creating its ledger entry and recomputing
    /// the player's score. Idempotent per (user, achievement).
    async fn award_basic_achievement(
        &self,
        user_id: UserId,
        achievement_id: Uuid,
    ) -> Result<AchievementAward, AchievementError>;
}

/// Read port for scoreboard snapshots.
#[async_trait]
pub trait ScoreboardQuery: Send + Sync {
    /// Load the standings of all non-administrator players.
    async fn load_global_standings(&self)
        -> Result<Vec<PlayerStanding>, ScoreboardQueryError>;

    /// Load the standings of one leaderboard's members.
    ///
    /// `None` when the leaderboard does not exist.
    async fn load_leaderboard_standings(
        &self,
        leaderboard_id: Uuid,
    ) -> Result<Option<Vec<PlayerStanding>>, ScoreboardQueryError>;
}

/// Cache port for ranked scoreboard snapshots, keyed by scope.
#[async_trait]
pub trait ScoreboardCache: Send + Sync {
    /// Read a cached ranked snapshot.
    async fn get(
        &self,
        scope: &ScoreboardScope,
    ) -> Result<Option<Vec<ScoreboardRow>>, ScoreboardCacheError>;

    /// Store a ranked snapshot for the scope.
    async fn put(
        &self,
        scope: &ScoreboardScope,
        rows: Vec<ScoreboardRow>,
    ) -> Result<(), ScoreboardCacheError>;

    /// Explicitly invalidate the scope's snapshot.
    async fn bust(&self, scope: &ScoreboardScope) -> Result<(), ScoreboardCacheError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn error_helpers_carry_messages() {
        assert_eq!(
            BadgePersistenceError::connection("refused"),
            BadgePersistenceError::Connection {
                message: "refused".to_owned()
            }
        );
        assert_eq!(
            CapturePersistenceError::query("boom"),
            CapturePersistenceError::Query {
                message: "boom".to_owned()
            }
        );
        assert_eq!(
            ScoreboardCacheError::backend("down"),
            ScoreboardCacheError::Backend {
                message: "down".to_owned()
            }
        );
    }

    #[rstest]
    fn username_taken_is_distinct_from_query_failures() {
        assert_ne!(
            BadgePersistenceError::UsernameTaken,
            BadgePersistenceError::query("username already taken")
        );
    }
}
