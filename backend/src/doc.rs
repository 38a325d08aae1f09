//! OpenAPI documentation configuration.
//!
//! Defines the [`ApiDoc`] struct that generates the OpenAPI specification
//! for the REST API: badge authentication, capture submission, scoreboard
//! pages, and health probes. The generated document backs Swagger UI in
//! debug builds.

use utoipa::OpenApi;

use crate::domain::{Error, ErrorCode, ScoreboardRow};
use crate::inbound::http::badge::{BadgeAuthRequest, OtpResponse, PlayerResponse};
use crate::inbound::http::captures::{
    CaptureFailResponse, CapturePayload, CaptureRequest, CaptureSuccessResponse,
};
use crate::inbound::http::scoreboards::ScoreboardResponse;

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "GCHQ.NET backend API",
        description = "Badge-facing HTTP interface for player provisioning, \
                       hexpansion captures, scoreboards, and health probes.",
        license(name = "MIT")
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::badge::player,
        crate::inbound::http::badge::otp,
        crate::inbound::http::captures::capture,
        crate::inbound::http::scoreboards::global_scoreboard,
        crate::inbound::http::scoreboards::leaderboard_scoreboard,
        crate::inbound::http::health::readiness,
        crate::inbound::http::health::liveness,
    ),
    components(schemas(
        BadgeAuthRequest,
        PlayerResponse,
        OtpResponse,
        CaptureRequest,
        CapturePayload,
        CaptureSuccessResponse,
        CaptureFailResponse,
        ScoreboardResponse,
        ScoreboardRow,
        Error,
        ErrorCode
    )),
    tags(
        (name = "badge", description = "Badge authentication, OTP issuance and capture submission"),
        (name = "scoreboard", description = "Ranked player standings"),
        (name = "health", description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;
