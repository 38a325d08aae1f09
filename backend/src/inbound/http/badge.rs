//! Badge-facing account endpoints.
//!
//! ```text
//! POST /api/badge/player {"mac_address":"AA-...","badge_secret":"ab..."}
//! POST /api/badge/otp    {"mac_address":"AA-...","badge_secret":"ab..."}
//! ```
//!
//! Both endpoints authenticate with badge credentials. An unknown badge is
//! provisioned a brand new player on the spot, so `player` answers 201 in
//! that case and 200 otherwise.

use actix_web::{post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::ports::ScorePersistenceError;
use crate::domain::score::grade_for_score;
use crate::domain::{BadgeSecret, BadgeTotp, Error, MacAddress};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::ApiResult;

/// Credentials submitted by a badge with every API call.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct BadgeAuthRequest {
    /// Badge hardware address, e.g. `12-34-56-78-90-AB`.
    pub mac_address: String,
    /// Shared secret: 64 lowercase hex characters.
    pub badge_secret: String,
}

pub(crate) fn parse_credentials(
    request: &BadgeAuthRequest,
) -> Result<(MacAddress, BadgeSecret), Error> {
    let mac = MacAddress::new(request.mac_address.as_str())
        .map_err(|err| Error::invalid_request(err.to_string()))?;
    let secret = BadgeSecret::new(request.badge_secret.as_str())
        .map_err(|err| Error::invalid_request(err.to_string()))?;
    Ok((mac, secret))
}

/// Player info returned to the badge.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PlayerResponse {
    /// Stable player identifier.
    pub user_id: Uuid,
    /// Unique account name.
    pub username: String,
    /// Scoreboard display name.
    pub display_name: String,
    /// Current score.
    pub current_score: i64,
    /// Grade label for the current score.
    pub grade: String,
}

/// One-time password for logging the player into the web UI.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct OtpResponse {
    /// Account name the code logs in.
    pub username: String,
    /// Six-digit TOTP code.
    pub otp: String,
}

fn map_score_error(err: ScorePersistenceError) -> Error {
    match err {
        ScorePersistenceError::Connection { message } => Error::service_unavailable(message),
        ScorePersistenceError::Query { message } => Error::internal(message),
    }
}

/// Identify (or provision) the player owning a badge.
#[utoipa::path(
    post,
    path = "/api/badge/player",
    request_body = BadgeAuthRequest,
    responses(
        (status = 200, description = "Existing player", body = PlayerResponse),
        (status = 201, description = "Player provisioned for an unknown badge", body = PlayerResponse),
        (status = 400, description = "Malformed credentials", body = Error),
        (status = 401, description = "Credentials rejected", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["badge"],
    operation_id = "badgePlayer"
)]
#[post("/badge/player")]
pub async fn player(
    state: web::Data<HttpState>,
    payload: web::Json<BadgeAuthRequest>,
) -> ApiResult<HttpResponse> {
    let (mac, secret) = parse_credentials(&payload)?;
    let credentials = state.badge_auth.check_badge_credentials(&mac, &secret).await?;

    let user = credentials.user();
    let current_score = state
        .scores
        .get_current_score_for_user(user.id)
        .await
        .map_err(map_score_error)?;
    let body = PlayerResponse {
        user_id: *user.id.as_uuid(),
        username: user.username.to_string(),
        display_name: user.display_name.to_string(),
        current_score,
        grade: grade_for_score(current_score).to_owned(),
    };

    let response = if credentials.is_provisioned() {
        HttpResponse::Created().json(body)
    } else {
        HttpResponse::Ok().json(body)
    };
    Ok(response)
}

/// Issue a short-lived login code for the badge's player.
#[utoipa::path(
    post,
    path = "/api/badge/otp",
    request_body = BadgeAuthRequest,
    responses(
        (status = 200, description = "Current OTP code", body = OtpResponse),
        (status = 400, description = "Malformed credentials", body = Error),
        (status = 401, description = "Credentials rejected", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["badge"],
    operation_id = "badgeOtp"
)]
#[post("/badge/otp")]
pub async fn otp(
    state: web::Data<HttpState>,
    payload: web::Json<BadgeAuthRequest>,
) -> ApiResult<web::Json<OtpResponse>> {
    let (mac, secret) = parse_credentials(&payload)?;
    let credentials = state.badge_auth.check_badge_credentials(&mac, &secret).await?;

    let totp = BadgeTotp::new(
        credentials.badge().mac_address.as_str(),
        state.otp_secret.as_ref(),
    );
    Ok(web::Json(OtpResponse {
        username: credentials.user().username.to_string(),
        otp: totp.now(),
    }))
}
