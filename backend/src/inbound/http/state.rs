//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they depend
//! only on domain services and ports, and stay testable without I/O.

use std::sync::Arc;

use crate::domain::ports::ScoreLedger;
use crate::domain::{BadgeAuthService, CaptureService, ScoreboardService};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Badge credential checking and provisioning.
    pub badge_auth: Arc<BadgeAuthService>,
    /// The capture pipeline.
    pub captures: Arc<CaptureService>,
    /// Ranked scoreboard reads.
    pub scoreboards: Arc<ScoreboardService>,
    /// Current-score reads for the player endpoint.
    pub scores: Arc<dyn ScoreLedger>,
    /// Server-side component of the badge OTP secret.
    pub otp_secret: Arc<str>,
}
