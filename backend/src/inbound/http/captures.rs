//! Capture submission endpoint.
//!
//! ```text
//! POST /api/badge/capture
//! {
//!   "mac_address": "DC-54-75-D8-6E-88",
//!   "badge_secret": "ab...64 hex...",
//!   "capture": {"sn": 20926969496463122926, "rand": "...64 hex...", "hmac": "...64 hex..."},
//!   "app_rev": "1.2.0",
//!   "fw_rev": "2.0.1"
//! }
//! ```
//!
//! Player-visible rejections (unknown hexpansion, bad proof) answer 400
//! with `{"result":"fail","message":...}`; successful and repeated taps
//! answer 200 with `{"result":"success",...}`. Credential failures use the
//! shared error envelope like every other endpoint.

use actix_web::{post, web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::domain::{
    CaptureAttemptOutcome, CaptureSubmission, Error, HexpansionSerial,
};
use crate::inbound::http::badge::{parse_credentials, BadgeAuthRequest};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::ApiResult;

/// The cryptographic material of one tap.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CapturePayload {
    /// Chip serial number as a decimal integer.
    #[schema(value_type = u64)]
    pub sn: u128,
    /// 32-byte tap nonce, hex encoded.
    pub rand: String,
    /// Claimed chip response, 64 lowercase hex characters.
    pub hmac: String,
}

/// Full capture submission body.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CaptureRequest {
    /// Badge hardware address.
    pub mac_address: String,
    /// Badge shared secret.
    pub badge_secret: String,
    /// Tap material.
    pub capture: CapturePayload,
    /// Badge app revision string.
    pub app_rev: String,
    /// Badge firmware revision string.
    pub fw_rev: String,
}

/// Successful (or repeated) capture response.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CaptureSuccessResponse {
    /// Always `"success"`.
    pub result: String,
    /// Whether the player had already captured this location.
    pub repeat: bool,
    /// Name of the captured location.
    pub location_name: String,
    /// Difficulty label, e.g. `"Hard"`.
    pub difficulty: String,
}

/// Player-visible rejection response.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CaptureFailResponse {
    /// Always `"fail"`.
    pub result: String,
    /// Why the tap did not score.
    pub message: String,
}

fn parse_rand(rand: &str) -> Result<[u8; 32], Error> {
    let bytes = hex::decode(rand).map_err(|_| {
        Error::invalid_request("The rand value does not appear to be in the correct format.")
    })?;
    bytes.try_into().map_err(|_| {
        Error::invalid_request("The rand value does not appear to be in the correct format.")
    })
}

fn validate_hmac(hmac: &str) -> Result<(), Error> {
    let well_formed = hmac.len() == 64
        && hmac
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
    if well_formed {
        Ok(())
    } else {
        Err(Error::invalid_request(
            "The HMAC does not appear to be in the correct format.",
        ))
    }
}

/// Record a capture attempt.
#[utoipa::path(
    post,
    path = "/api/badge/capture",
    request_body = CaptureRequest,
    responses(
        (status = 200, description = "Tap scored or repeated", body = CaptureSuccessResponse),
        (status = 400, description = "Malformed request or rejected tap"),
        (status = 401, description = "Credentials rejected", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["badge"],
    operation_id = "badgeCapture"
)]
#[post("/badge/capture")]
pub async fn capture(
    state: web::Data<HttpState>,
    payload: web::Json<CaptureRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    let auth = BadgeAuthRequest {
        mac_address: payload.mac_address,
        badge_secret: payload.badge_secret,
    };
    let (mac, secret) = parse_credentials(&auth)?;
    let rand = parse_rand(&payload.capture.rand)?;
    validate_hmac(&payload.capture.hmac)?;

    let credentials = state.badge_auth.check_badge_credentials(&mac, &secret).await?;

    let submission = CaptureSubmission {
        rand,
        proof: payload.capture.hmac,
        app_rev: payload.app_rev,
        fw_rev: payload.fw_rev,
    };
    let outcome = state
        .captures
        .record_attempted_capture(
            credentials.badge(),
            credentials.user(),
            HexpansionSerial::from_u128(payload.capture.sn),
            submission,
        )
        .await?;

    let response = match outcome {
        CaptureAttemptOutcome::Success(success) => {
            HttpResponse::Ok().json(CaptureSuccessResponse {
                result: "success".to_owned(),
                repeat: success.repeat,
                location_name: success.location_name,
                difficulty: success.difficulty.label().to_owned(),
            })
        }
        CaptureAttemptOutcome::Rejected(failure) => {
            HttpResponse::BadRequest().json(CaptureFailResponse {
                result: "fail".to_owned(),
                message: failure.to_string(),
            })
        }
    };
    Ok(response)
}
