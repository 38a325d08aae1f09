//! Scoreboard read endpoints.
//!
//! ```text
//! GET /api/scoreboard?search=badger&page=2
//! GET /api/scoreboard/{leaderboard_id}
//! ```
//!
//! Both serve pages of 50 ranked rows. The `search` filter narrows the rows
//! without recomputing anyone's rank.

use actix_web::{get, web};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Error, ScoreboardPage, ScoreboardRow};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::ApiResult;

/// Query parameters accepted by both scoreboard endpoints.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ScoreboardQueryParams {
    /// Case-insensitive substring filter on display names.
    pub search: Option<String>,
    /// 1-based page number; defaults to the first page.
    pub page: Option<u32>,
}

/// One page of ranked scoreboard rows.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ScoreboardResponse {
    /// 1-based page number served.
    pub page: u32,
    /// Total rows matching the filter across all pages.
    pub total: usize,
    /// Rows for this page, in presentation order.
    pub rows: Vec<ScoreboardRow>,
}

impl From<ScoreboardPage> for ScoreboardResponse {
    fn from(page: ScoreboardPage) -> Self {
        Self {
            page: page.page,
            total: page.total,
            rows: page.rows,
        }
    }
}

/// The global scoreboard.
#[utoipa::path(
    get,
    path = "/api/scoreboard",
    params(ScoreboardQueryParams),
    responses(
        (status = 200, description = "Ranked scoreboard page", body = ScoreboardResponse),
        (status = 400, description = "Invalid page number", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["scoreboard"],
    operation_id = "globalScoreboard"
)]
#[get("/scoreboard")]
pub async fn global_scoreboard(
    state: web::Data<HttpState>,
    query: web::Query<ScoreboardQueryParams>,
) -> ApiResult<web::Json<ScoreboardResponse>> {
    let page = state
        .scoreboards
        .global(query.search.as_deref(), query.page.unwrap_or(1))
        .await?;
    Ok(web::Json(page.into()))
}

/// One private leaderboard's scoreboard.
#[utoipa::path(
    get,
    path = "/api/scoreboard/{leaderboard_id}",
    params(
        ("leaderboard_id" = Uuid, Path, description = "Leaderboard identifier"),
        ScoreboardQueryParams,
    ),
    responses(
        (status = 200, description = "Ranked scoreboard page", body = ScoreboardResponse),
        (status = 400, description = "Invalid page number", body = Error),
        (status = 404, description = "No such leaderboard", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["scoreboard"],
    operation_id = "leaderboardScoreboard"
)]
#[get("/scoreboard/{leaderboard_id}")]
pub async fn leaderboard_scoreboard(
    state: web::Data<HttpState>,
    path: web::Path<Uuid>,
    query: web::Query<ScoreboardQueryParams>,
) -> ApiResult<web::Json<ScoreboardResponse>> {
    let page = state
        .scoreboards
        .leaderboard(
            path.into_inner(),
            query.search.as_deref(),
            query.page.unwrap_or(1),
        )
        .await?;
    Ok(web::Json(page.into()))
}
