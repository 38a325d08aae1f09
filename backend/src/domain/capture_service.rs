//! The capture pipeline.
//!
//! Every tap flows through the same sequence: persist the forensic record,
//! resolve the tapped hexpansion to an installed location, verify the chip
//! proof, log the visit, then attempt the at-most-once scoring capture.
//! Rejections along the way are player-visible outcomes, not errors; only
//! infrastructure failures escape as [`Error`].

use std::sync::Arc;

use tracing::{error, info, warn};

use super::badge::Badge;
use super::capture::{
    CaptureCreation, CaptureFailure, CaptureSubmission, CaptureSuccess, NewRawCaptureEvent,
};
use super::crypto::{compute_badge_response, verify_badge_response, RootKey};
use super::error::Error;
use super::hexpansion::HexpansionSerial;
use super::ports::{
    AchievementHooks, CapturePersistenceError, CaptureRepository, ScoreboardCache,
};
use super::scoreboard::ScoreboardScope;
use super::user::User;

/// Key slot holding the diversified key on production chips.
const PRODUCTION_KEY_SLOT: u8 = 0;

/// Proof-verification policy and key material for the pipeline.
#[derive(Clone)]
pub struct CaptureConfig {
    /// Root key the per-chip keys are diversified from.
    pub root_key: RootKey,
    /// When `false`, proof mismatches are logged but taps still score.
    /// Deployments run advisory until the whole badge fleet carries
    /// provisioned secure elements.
    pub validate_proof: bool,
}

/// Player-facing outcome of one tap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureAttemptOutcome {
    /// The tap scored, or repeated an earlier capture.
    Success(CaptureSuccess),
    /// The tap was rejected with a player-visible reason.
    Rejected(CaptureFailure),
}

/// Application service implementing the capture pipeline.
pub struct CaptureService {
    captures: Arc<dyn CaptureRepository>,
    achievements: Arc<dyn AchievementHooks>,
    cache: Arc<dyn ScoreboardCache>,
    config: CaptureConfig,
}

impl CaptureService {
    /// Build the service over its ports.
    pub fn new(
        captures: Arc<dyn CaptureRepository>,
        achievements: Arc<dyn AchievementHooks>,
        cache: Arc<dyn ScoreboardCache>,
        config: CaptureConfig,
    ) -> Self {
        Self {
            captures,
            achievements,
            cache,
            config,
        }
    }

    /// Process one authenticated tap end to end.
    pub async fn record_attempted_capture(
        &self,
        badge: &Badge,
        user: &User,
        serial: HexpansionSerial,
        submission: CaptureSubmission,
    ) -> Result<CaptureAttemptOutcome, Error> {
        let Some(hexpansion) = self
            .captures
            .find_hexpansion(serial)
            .await
            .map_err(map_capture_error)?
        else {
            // Nothing to attach a forensic record to; the serial has never
            // been registered.
            warn!(serial = %serial, "tap against unregistered hexpansion serial");
            return Ok(CaptureAttemptOutcome::Rejected(
                CaptureFailure::HexpansionNotInstalled,
            ));
        };

        let proof_ok = self.verify_proof(badge, serial, &submission);

        let raw_event_id = self
            .captures
            .record_raw_event(NewRawCaptureEvent {
                badge_id: badge.id,
                user_id: user.id,
                hexpansion_id: hexpansion.id,
                submission,
            })
            .await
            .map_err(map_capture_error)?;

        let Some(location) = self
            .captures
            .resolve_location(hexpansion.id)
            .await
            .map_err(map_capture_error)?
        else {
            warn!(
                hexpansion = %hexpansion.human_identifier,
                "tap against hexpansion with no installed location"
            );
            return Ok(CaptureAttemptOutcome::Rejected(
                CaptureFailure::HexpansionNotInstalled,
            ));
        };

        if !proof_ok {
            if self.config.validate_proof {
                warn!(
                    location = %location.display_name,
                    user = %user.username,
                    "rejected capture with invalid chip proof"
                );
                return Ok(CaptureAttemptOutcome::Rejected(CaptureFailure::InvalidProof));
            }
            // Advisory mode: record the mismatch and carry on scoring.
            warn!(
                location = %location.display_name,
                user = %user.username,
                "chip proof mismatch (advisory mode, capture allowed)"
            );
        }

        self.captures
            .record_capture_log(raw_event_id, location.id, user.id)
            .await
            .map_err(map_capture_error)?;

        let creation = self
            .captures
            .create_capture_if_new(raw_event_id, location.id, user.id, location.difficulty.points())
            .await
            .map_err(map_capture_error)?;

        let repeat = match creation {
            CaptureCreation::Created { new_total } => {
                info!(
                    location = %location.display_name,
                    user = %user.username,
                    new_total,
                    "new capture"
                );
                // Best effort: the capture stands even if the follow-up
                // bookkeeping fails.
                if let Err(err) = self
                    .achievements
                    .on_location_captured(user.id, &location)
                    .await
                {
                    error!(error = %err, "achievement hook failed after capture");
                }
                if let Err(err) = self.cache.bust(&ScoreboardScope::Global).await {
                    error!(error = %err, "failed to bust global scoreboard cache");
                }
                false
            }
            CaptureCreation::AlreadyCaptured => true,
        };

        Ok(CaptureAttemptOutcome::Success(CaptureSuccess {
            repeat,
            location_name: location.display_name,
            difficulty: location.difficulty,
        }))
    }

    fn verify_proof(
        &self,
        badge: &Badge,
        serial: HexpansionSerial,
        submission: &CaptureSubmission,
    ) -> bool {
        let expected = compute_badge_response(
            &serial.chip_bytes(),
            &submission.rand,
            badge.mac_address.as_str(),
            &self.config.root_key,
            PRODUCTION_KEY_SLOT,
        );
        verify_badge_response(&expected, &submission.proof)
    }
}

fn map_capture_error(err: CapturePersistenceError) -> Error {
    match err {
        CapturePersistenceError::Connection { message } => Error::service_unavailable(message),
        CapturePersistenceError::Query { message } => Error::internal(message),
    }
}
