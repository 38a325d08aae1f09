//! Integration guardrails for the badge-facing HTTP surface.
//!
//! These tests run the real Actix handlers against in-memory ports, driving
//! the full journey a badge takes: provision a player, capture a location
//! with a genuine chip proof, then read the score back. They only touch the
//! crate's public API, so anything they compile against is available to
//! downstream embedders too.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::http::header::ContentType;
use actix_web::{test as actix_test, web, App};
use async_trait::async_trait;
use rstest::rstest;
use serde_json::Value;
use uuid::Uuid;

use gchqnet_backend::domain::crypto::compute_badge_response;
use gchqnet_backend::domain::ports::{
    AchievementAward, AchievementError, AchievementHooks, BadgePersistenceError, BadgeRepository,
    CapturePersistenceError, CaptureRepository, ScoreLedger, ScorePersistenceError,
    ScoreboardQuery, ScoreboardQueryError,
};
use gchqnet_backend::domain::{
    Badge, BadgeAuthService, BadgeId, BadgeSecret, CaptureConfig, CaptureCreation, CaptureService,
    Hexpansion, HexpansionId, HexpansionSerial, Location, LocationDifficulty, LocationId,
    MacAddress, NewRawCaptureEvent, PlayerStanding, RawCaptureEventId, RootKey, ScoreboardService,
    User, UserId,
};
use gchqnet_backend::inbound::http::badge::player;
use gchqnet_backend::inbound::http::captures::capture;
use gchqnet_backend::inbound::http::health::{liveness, readiness, HealthState};
use gchqnet_backend::inbound::http::scoreboards::global_scoreboard;
use gchqnet_backend::inbound::http::HttpState;
use gchqnet_backend::outbound::cache::InMemoryScoreboardCache;

const MAC: &str = "DC-54-75-D8-6E-88";
const SERIAL: u128 = 0x0123_5dc2_512d_b761_ee;

fn root_key() -> RootKey {
    RootKey::from_hex(&"88".repeat(32)).expect("valid root key")
}

// ---------------------------------------------------------------------------
// In-memory ports
// ---------------------------------------------------------------------------

type ScoreMap = Arc<Mutex<HashMap<Uuid, i64>>>;

#[derive(Default)]
struct MemoryBadges {
    badges: Mutex<HashMap<String, (Badge, User)>>,
}

#[async_trait]
impl BadgeRepository for MemoryBadges {
    async fn find_by_mac(
        &self,
        mac_address: &MacAddress,
    ) -> Result<Option<(Badge, User)>, BadgePersistenceError> {
        Ok(self
            .badges
            .lock()
            .expect("lock")
            .get(mac_address.as_str())
            .cloned())
    }

    async fn bind_secret(
        &self,
        badge_id: BadgeId,
        secret: &BadgeSecret,
    ) -> Result<(), BadgePersistenceError> {
        let mut badges = self.badges.lock().expect("lock");
        for (badge, _) in badges.values_mut() {
            if badge.id == badge_id && badge.secret.is_none() {
                badge.secret = Some(secret.clone());
            }
        }
        Ok(())
    }

    async fn create_badge_and_user(
        &self,
        mac_address: &MacAddress,
        secret: &BadgeSecret,
        user: &User,
    ) -> Result<Badge, BadgePersistenceError> {
        let mut badges = self.badges.lock().expect("lock");
        if badges
            .values()
            .any(|(_, existing)| existing.username == user.username)
        {
            return Err(BadgePersistenceError::UsernameTaken);
        }
        let badge = Badge {
            id: BadgeId::random(),
            mac_address: mac_address.clone(),
            user_id: user.id,
            secret: Some(secret.clone()),
            is_enabled: true,
        };
        badges.insert(
            mac_address.as_str().to_owned(),
            (badge.clone(), user.clone()),
        );
        Ok(badge)
    }
}

#[derive(Default)]
struct MemoryCaptures {
    hexpansions: Mutex<Vec<Hexpansion>>,
    locations: Mutex<Vec<Location>>,
    captured: Mutex<HashSet<(Uuid, Uuid)>>,
    scores: ScoreMap,
}

#[async_trait]
impl CaptureRepository for MemoryCaptures {
    async fn find_hexpansion(
        &self,
        serial: HexpansionSerial,
    ) -> Result<Option<Hexpansion>, CapturePersistenceError> {
        Ok(self
            .hexpansions
            .lock()
            .expect("lock")
            .iter()
            .find(|h| h.serial_number == serial)
            .cloned())
    }

    async fn record_raw_event(
        &self,
        _event: NewRawCaptureEvent,
    ) -> Result<RawCaptureEventId, CapturePersistenceError> {
        Ok(RawCaptureEventId(Uuid::new_v4()))
    }

    async fn resolve_location(
        &self,
        hexpansion_id: HexpansionId,
    ) -> Result<Option<Location>, CapturePersistenceError> {
        Ok(self
            .locations
            .lock()
            .expect("lock")
            .iter()
            .find(|l| l.hexpansion_id == Some(hexpansion_id))
            .cloned())
    }

    async fn record_capture_log(
        &self,
        _raw_event_id: RawCaptureEventId,
        _location_id: LocationId,
        _user_id: UserId,
    ) -> Result<(), CapturePersistenceError> {
        Ok(())
    }

    async fn create_capture_if_new(
        &self,
        _raw_event_id: RawCaptureEventId,
        location_id: LocationId,
        user_id: UserId,
        points: i32,
    ) -> Result<CaptureCreation, CapturePersistenceError> {
        let key = (*user_id.as_uuid(), *location_id.as_uuid());
        if !self.captured.lock().expect("lock").insert(key) {
            return Ok(CaptureCreation::AlreadyCaptured);
        }
        let mut scores = self.scores.lock().expect("lock");
        let total = scores.entry(key.0).or_insert(0);
        *total += i64::from(points);
        Ok(CaptureCreation::Created { new_total: *total })
    }
}

struct NoAchievements;

#[async_trait]
impl AchievementHooks for NoAchievements {
    async fn on_location_captured(
        &self,
        _user_id: UserId,
        _location: &Location,
    ) -> Result<(), AchievementError> {
        Ok(())
    }

    async fn award_basic_achievement(
        &self,
        _user_id: UserId,
        _achievement_id: Uuid,
    ) -> Result<AchievementAward, AchievementError> {
        Ok(AchievementAward::AlreadyAwarded)
    }
}

struct MemoryLedger {
    scores: ScoreMap,
}

#[async_trait]
impl ScoreLedger for MemoryLedger {
    async fn update_score_for_user(&self, user_id: UserId) -> Result<i64, ScorePersistenceError> {
        self.get_current_score_for_user(user_id).await
    }

    async fn get_current_score_for_user(
        &self,
        user_id: UserId,
    ) -> Result<i64, ScorePersistenceError> {
        Ok(self
            .scores
            .lock()
            .expect("lock")
            .get(user_id.as_uuid())
            .copied()
            .unwrap_or(0))
    }
}

#[derive(Default)]
struct MemoryScoreboards {
    standings: Mutex<Vec<PlayerStanding>>,
}

#[async_trait]
impl ScoreboardQuery for MemoryScoreboards {
    async fn load_global_standings(&self) -> Result<Vec<PlayerStanding>, ScoreboardQueryError> {
        Ok(self.standings.lock().expect("lock").clone())
    }

    async fn load_leaderboard_standings(
        &self,
        _leaderboard_id: Uuid,
    ) -> Result<Option<Vec<PlayerStanding>>, ScoreboardQueryError> {
        Ok(None)
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

struct Deployment {
    captures: Arc<MemoryCaptures>,
    boards: Arc<MemoryScoreboards>,
    state: HttpState,
}

impl Deployment {
    fn new() -> Self {
        let scores: ScoreMap = Arc::default();
        let badges = Arc::new(MemoryBadges::default());
        let captures = Arc::new(MemoryCaptures {
            scores: Arc::clone(&scores),
            ..MemoryCaptures::default()
        });
        let boards = Arc::new(MemoryScoreboards::default());
        let cache = Arc::new(InMemoryScoreboardCache::new(Duration::from_secs(30)));

        let state = HttpState {
            badge_auth: Arc::new(BadgeAuthService::new(
                Arc::clone(&badges) as Arc<dyn BadgeRepository>
            )),
            captures: Arc::new(CaptureService::new(
                Arc::clone(&captures) as Arc<dyn CaptureRepository>,
                Arc::new(NoAchievements),
                Arc::clone(&cache) as _,
                CaptureConfig {
                    root_key: root_key(),
                    validate_proof: true,
                },
            )),
            scoreboards: Arc::new(ScoreboardService::new(
                Arc::clone(&boards) as Arc<dyn ScoreboardQuery>,
                cache,
            )),
            scores: Arc::new(MemoryLedger { scores }),
            otp_secret: Arc::from("integration-otp-secret"),
        };

        Self {
            captures,
            boards,
            state,
        }
    }

    fn install_location(&self, serial: u128, name: &str, points: i32) {
        let hexpansion = Hexpansion {
            id: HexpansionId::random(),
            human_identifier: format!("HX{serial:04}"),
            serial_number: HexpansionSerial::from_u128(serial),
        };
        let location = Location {
            id: LocationId::random(),
            display_name: name.to_owned(),
            difficulty: LocationDifficulty::from_points(points).expect("valid points"),
            hexpansion_id: Some(hexpansion.id),
        };
        self.captures
            .hexpansions
            .lock()
            .expect("lock")
            .push(hexpansion);
        self.captures.locations.lock().expect("lock").push(location);
    }
}

async fn api_app(
    deployment: &Deployment,
) -> impl actix_web::dev::Service<
    actix_http::Request,
    Response = actix_web::dev::ServiceResponse,
    Error = actix_web::Error,
> {
    actix_test::init_service(
        App::new()
            .app_data(web::Data::new(deployment.state.clone()))
            .service(
                web::scope("/api")
                    .service(player)
                    .service(capture)
                    .service(global_scoreboard),
            ),
    )
    .await
}

fn proof_for(rand: &[u8; 32]) -> String {
    let serial = HexpansionSerial::from_u128(SERIAL);
    hex::encode(compute_badge_response(
        &serial.chip_bytes(),
        rand,
        MAC,
        &root_key(),
        0,
    ))
}

// The serial exceeds u64::MAX, which serde_json's Value cannot hold, so the
// body is assembled as raw JSON.
fn capture_body(secret: &str, rand_hex: &str, hmac: &str) -> String {
    format!(
        concat!(
            r#"{{"mac_address":"{mac}","badge_secret":"{secret}","#,
            r#""capture":{{"sn":{sn},"rand":"{rand}","hmac":"{hmac}"}},"#,
            r#""app_rev":"1.2.0","fw_rev":"2.0.1"}}"#
        ),
        mac = MAC,
        secret = secret,
        sn = SERIAL,
        rand = rand_hex,
        hmac = hmac,
    )
}

// ---------------------------------------------------------------------------
// Journeys
// ---------------------------------------------------------------------------

#[rstest]
#[tokio::test]
async fn badge_journey_provisions_captures_and_scores() {
    let deployment = Deployment::new();
    deployment.install_location(SERIAL, "Null Sector", 20);
    let app = api_app(&deployment).await;
    let secret = "c".repeat(64);

    // An unknown badge provisions a fresh player.
    let request = actix_test::TestRequest::post()
        .uri("/api/badge/player")
        .set_json(serde_json::json!({ "mac_address": MAC, "badge_secret": secret }))
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), actix_web::http::StatusCode::CREATED);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["current_score"], 0);
    let username = body["username"].as_str().expect("username").to_owned();

    // A genuine chip proof scores the location.
    let rand = [0x4e; 32];
    let request = actix_test::TestRequest::post()
        .uri("/api/badge/capture")
        .insert_header(ContentType::json())
        .set_payload(capture_body(&secret, &hex::encode(rand), &proof_for(&rand)))
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), actix_web::http::StatusCode::OK);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["result"], "success");
    assert_eq!(body["repeat"], false);
    assert_eq!(body["location_name"], "Null Sector");
    assert_eq!(body["difficulty"], "Hard");

    // A second tap of the same hexpansion is a repeat, not a new score.
    let request = actix_test::TestRequest::post()
        .uri("/api/badge/capture")
        .insert_header(ContentType::json())
        .set_payload(capture_body(&secret, &hex::encode(rand), &proof_for(&rand)))
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["repeat"], true);

    // The player endpoint reflects the single capture's points.
    let request = actix_test::TestRequest::post()
        .uri("/api/badge/player")
        .set_json(serde_json::json!({ "mac_address": MAC, "badge_secret": secret }))
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), actix_web::http::StatusCode::OK);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["username"], username.as_str());
    assert_eq!(body["current_score"], 20);
    assert_eq!(body["grade"], "Warming up");
}

#[rstest]
#[tokio::test]
async fn forged_proof_is_rejected_without_scoring() {
    let deployment = Deployment::new();
    deployment.install_location(SERIAL, "Null Sector", 20);
    let app = api_app(&deployment).await;
    let secret = "c".repeat(64);

    let request = actix_test::TestRequest::post()
        .uri("/api/badge/capture")
        .insert_header(ContentType::json())
        .set_payload(capture_body(&secret, &"4e".repeat(32), &"ab".repeat(32)))
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), actix_web::http::StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["result"], "fail");
    assert_eq!(body["message"], "Invalid HMAC - Contact Support");

    // The rejected tap never reached the scoring step.
    assert!(deployment.captures.captured.lock().expect("lock").is_empty());
}

#[rstest]
#[tokio::test]
async fn scoreboard_ranks_over_the_queried_standings() {
    let deployment = Deployment::new();
    deployment
        .boards
        .standings
        .lock()
        .expect("lock")
        .extend([
            PlayerStanding {
                user_id: Uuid::new_v4(),
                username: "alice".to_owned(),
                display_name: "Alice".to_owned(),
                current_score: 50,
                capture_count: 3,
            },
            PlayerStanding {
                user_id: Uuid::new_v4(),
                username: "bob".to_owned(),
                display_name: "Bob".to_owned(),
                current_score: 30,
                capture_count: 2,
            },
        ]);
    let app = api_app(&deployment).await;

    let request = actix_test::TestRequest::get()
        .uri("/api/scoreboard")
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), actix_web::http::StatusCode::OK);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["rows"][0]["display_name"], "Alice");
    assert_eq!(body["rows"][0]["rank"], 1);
    assert_eq!(body["rows"][1]["rank"], 2);
}

#[rstest]
#[tokio::test]
async fn probes_track_readiness_separately_from_liveness() {
    let health = web::Data::new(HealthState::new());
    let app = actix_test::init_service(
        App::new()
            .app_data(health.clone())
            .service(liveness)
            .service(readiness),
    )
    .await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get().uri("/healthz").to_request(),
    )
    .await;
    assert_eq!(response.status(), actix_web::http::StatusCode::OK);

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get().uri("/readyz").to_request(),
    )
    .await;
    assert_eq!(
        response.status(),
        actix_web::http::StatusCode::SERVICE_UNAVAILABLE
    );

    health.mark_ready();
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get().uri("/readyz").to_request(),
    )
    .await;
    assert_eq!(response.status(), actix_web::http::StatusCode::OK);
}
