//! Capture attempt types.
//!
//! A tap progresses through three persisted layers: the raw forensic event
//! (always), the capture log (once a location resolves), and the scoring
//! capture event (at most once per player and location). The types here are
//! the tagged results the pipeline hands back; failed captures are values,
//! not errors.

use uuid::Uuid;

use super::badge::BadgeId;
use super::hexpansion::HexpansionId;
use super::location::LocationDifficulty;
use super::user::UserId;

/// The submitted contents of one tap, exactly as received.
///
/// Persisted unconditionally as the forensic trail, before any validation
/// beyond wire-format checks.
#[derive(Debug, Clone)]
pub struct CaptureSubmission {
    /// 32-byte nonce generated by the badge for this tap.
    pub rand: [u8; 32],
    /// Claimed chip response, 64 lowercase hex characters.
    pub proof: String,
    /// Badge app revision string.
    pub app_rev: String,
    /// Badge firmware revision string.
    pub fw_rev: String,
}

/// Identifier of a persisted raw capture event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawCaptureEventId(pub Uuid);

/// A successfully processed tap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSuccess {
    /// Whether this player had already captured the location.
    pub repeat: bool,
    /// Name of the captured location.
    pub location_name: String,
    /// Difficulty tier of the location.
    pub difficulty: LocationDifficulty,
}

/// Why a tap did not score.
///
/// The messages are part of the badge API contract and are shown on the
/// badge screen verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CaptureFailure {
    /// The submitted serial does not correspond to an installed hexpansion.
    #[error("Hexpansion not installed")]
    HexpansionNotInstalled,
    /// The cryptographic proof did not verify.
    #[error("Invalid HMAC - Contact Support")]
    InvalidProof,
}

/// Outcome of the transactional capture-creation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureCreation {
    /// A new capture event and ledger entry were created.
    Created {
        /// The player's recomputed total score.
        new_total: i64,
    },
    /// The player had already captured this location; nothing was written.
    AlreadyCaptured,
}

/// New raw capture event, ready for persistence.
#[derive(Debug, Clone)]
pub struct NewRawCaptureEvent {
    /// Badge that tapped.
    pub badge_id: BadgeId,
    /// Player owning the badge at tap time.
    pub user_id: UserId,
    /// Hexpansion that was tapped.
    pub hexpansion_id: HexpansionId,
    /// Submitted tap payload.
    pub submission: CaptureSubmission,
}
