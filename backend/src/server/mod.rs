//! Server construction and application wiring.

mod config;

pub use config::{ServerArgs, ServerConfig};

use std::sync::Arc;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

#[cfg(debug_assertions)]
use crate::doc::ApiDoc;
use crate::domain::ports::ScoreboardCache;
use crate::domain::{BadgeAuthService, CaptureConfig, CaptureService, ScoreboardService};
use crate::inbound::http::badge::{otp, player};
use crate::inbound::http::captures::capture;
use crate::inbound::http::health::{HealthState, liveness, readiness};
use crate::inbound::http::scoreboards::{global_scoreboard, leaderboard_scoreboard};
use crate::inbound::http::state::HttpState;
use crate::outbound::cache::InMemoryScoreboardCache;
use crate::outbound::persistence::{
    DieselAchievementRepository, DieselBadgeRepository, DieselCaptureRepository, DieselScoreLedger,
    DieselScoreboardQuery,
};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

/// Wire the database-backed adapters and domain services into handler state.
fn build_http_state(config: &ServerConfig) -> HttpState {
    let pool = config.db_pool.clone();
    let cache: Arc<dyn ScoreboardCache> =
        Arc::new(InMemoryScoreboardCache::new(config.scoreboard_ttl));

    let badge_auth = Arc::new(BadgeAuthService::new(Arc::new(DieselBadgeRepository::new(
        pool.clone(),
    ))));
    let captures = Arc::new(CaptureService::new(
        Arc::new(DieselCaptureRepository::new(pool.clone())),
        Arc::new(DieselAchievementRepository::new(pool.clone())),
        cache.clone(),
        CaptureConfig {
            root_key: config.root_key.clone(),
            validate_proof: config.validate_proof,
        },
    ));
    let scoreboards = Arc::new(ScoreboardService::new(
        Arc::new(DieselScoreboardQuery::new(pool.clone())),
        cache,
    ));
    let scores = Arc::new(DieselScoreLedger::new(pool));

    HttpState {
        badge_auth,
        captures,
        scoreboards,
        scores,
        otp_secret: config.otp_secret.clone(),
    }
}

fn build_app(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let api = web::scope("/api")
        .service(player)
        .service(otp)
        .service(capture)
        .service(global_scoreboard)
        .service(leaderboard_scoreboard);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .service(api)
        .service(readiness)
        .service(liveness);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    #[cfg(not(debug_assertions))]
    let app = app;

    app
}

/// Construct an Actix HTTP server using the provided health state and
/// configuration.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let http_state = web::Data::new(build_http_state(&config));
    let server_health_state = health_state.clone();

    let server = HttpServer::new(move || {
        build_app(server_health_state.clone(), http_state.clone())
    })
    .bind(config.bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
