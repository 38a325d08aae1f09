//! Domain layer: the hexagon's core.
//!
//! Everything here is transport and storage agnostic. Inbound adapters call
//! the services; outbound adapters implement the [`ports`] traits.

pub mod badge;
pub mod badge_auth;
pub mod capture;
pub mod capture_service;
pub mod crypto;
pub mod error;
pub mod hexpansion;
pub mod location;
pub mod otp;
pub mod ports;
pub mod score;
pub mod scoreboard;
pub mod scoreboard_service;
pub mod user;
pub mod usernames;

pub use badge::{Badge, BadgeId, BadgeSecret, BadgeValidationError, MacAddress};
pub use badge_auth::{BadgeAuthService, BadgeCredentials};
pub use capture::{
    CaptureCreation, CaptureFailure, CaptureSubmission, CaptureSuccess, NewRawCaptureEvent,
    RawCaptureEventId,
};
pub use capture_service::{CaptureAttemptOutcome, CaptureConfig, CaptureService};
pub use crypto::RootKey;
pub use error::{Error, ErrorCode};
pub use hexpansion::{Hexpansion, HexpansionId, HexpansionSerial};
pub use location::{Location, LocationDifficulty, LocationId};
pub use otp::BadgeTotp;
pub use ports::{
    AchievementAward, AchievementError, AchievementHooks, BadgePersistenceError, BadgeRepository,
    CapturePersistenceError, CaptureRepository, ScoreLedger, ScorePersistenceError,
    ScoreboardCache, ScoreboardCacheError, ScoreboardQuery, ScoreboardQueryError,
};
pub use score::{grade_for_score, ScoreRecord, ScoreSource};
pub use scoreboard::{PlayerStanding, ScoreboardRow, ScoreboardScope};
pub use scoreboard_service::{ScoreboardPage, ScoreboardService, SCOREBOARD_PAGE_SIZE};
pub use user::{DisplayName, User, UserId, UserValidationError, Username};
