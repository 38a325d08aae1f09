//! In-memory fakes wiring a full [`HttpState`] for handler tests.
//!
//! The fakes honour the same contracts as the Diesel adapters (conditional
//! binds, at-most-once captures, username collisions) so handler tests
//! exercise realistic end-to-end flows over the wire format.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::ports::{
    AchievementAward, AchievementError, AchievementHooks, BadgePersistenceError, BadgeRepository,
    CapturePersistenceError, CaptureRepository, ScoreLedger, ScorePersistenceError,
    ScoreboardQuery, ScoreboardQueryError,
};
use crate::domain::{
    Badge, BadgeAuthService, BadgeId, BadgeSecret, CaptureConfig, CaptureCreation, CaptureService,
    DisplayName, Hexpansion, HexpansionId, HexpansionSerial, Location, LocationDifficulty,
    LocationId, MacAddress, NewRawCaptureEvent, PlayerStanding, RawCaptureEventId, RootKey,
    ScoreboardService, User, UserId, Username,
};
use crate::inbound::http::state::HttpState;
use crate::outbound::cache::InMemoryScoreboardCache;

type ScoreMap = Arc<Mutex<HashMap<Uuid, i64>>>;

/// Root key every test fixture diversifies from.
pub(crate) fn test_root_key() -> RootKey {
    RootKey::from_hex(&"88".repeat(32)).expect("valid root key")
}

#[derive(Default)]
struct FakeBadgeRepository {
    badges: Mutex<HashMap<String, (Badge, User)>>,
}

#[async_trait]
impl BadgeRepository for FakeBadgeRepository {
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
struct FakeCaptureRepository {
    hexpansions: Mutex<Vec<Hexpansion>>,
    locations: Mutex<Vec<Location>>,
    captured: Mutex<HashSet<(Uuid, Uuid)>>,
    scores: ScoreMap,
}

#[async_trait]
impl CaptureRepository for FakeCaptureRepository {
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

struct FakeAchievements;

#[async_trait]
impl AchievementHooks for FakeAchievements {
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

struct FakeScoreLedger {
    scores: ScoreMap,
}

#[async_trait]
impl ScoreLedger for FakeScoreLedger {
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
struct FakeScoreboardQuery {
    standings: Mutex<Vec<PlayerStanding>>,
    leaderboards: Mutex<HashMap<Uuid, Vec<PlayerStanding>>>,
}

#[async_trait]
impl ScoreboardQuery for FakeScoreboardQuery {
    async fn load_global_standings(
        &self,
    ) -> Result<Vec<PlayerStanding>, ScoreboardQueryError> {
        Ok(self.standings.lock().expect("lock").clone())
    }

    async fn load_leaderboard_standings(
        &self,
        leaderboard_id: Uuid,
    ) -> Result<Option<Vec<PlayerStanding>>, ScoreboardQueryError> {
        Ok(self
            .leaderboards
            .lock()
            .expect("lock")
            .get(&leaderboard_id)
            .cloned())
    }
}

/// One in-memory deployment's worth of fakes.
pub(crate) struct TestWorld {
    badges: Arc<FakeBadgeRepository>,
    captures: Arc<FakeCaptureRepository>,
    boards: Arc<FakeScoreboardQuery>,
    scores: ScoreMap,
    next_player: Mutex<u32>,
}

impl TestWorld {
    pub(crate) fn new() -> Self {
        let scores: ScoreMap = Arc::default();
        Self {
            badges: Arc::new(FakeBadgeRepository::default()),
            captures: Arc::new(FakeCaptureRepository {
                scores: Arc::clone(&scores),
                ..FakeCaptureRepository::default()
            }),
            boards: Arc::new(FakeScoreboardQuery::default()),
            scores,
            next_player: Mutex::new(0),
        }
    }

    /// Register a badge with a known secret and a fresh owning player.
    pub(crate) fn register_badge(&self, mac: &str, secret: &str) -> (Badge, User) {
        let mut counter = self.next_player.lock().expect("lock");
        *counter += 1;
        let user = User {
            id: UserId::random(),
            username: Username::new(format!("player-{counter}")).expect("valid username"),
            display_name: DisplayName::new(format!("Player {counter}")).expect("valid name"),
            is_superuser: false,
        };
        let badge = Badge {
            id: BadgeId::random(),
            mac_address: MacAddress::new(mac).expect("valid MAC"),
            user_id: user.id,
            secret: Some(BadgeSecret::new(secret).expect("valid secret")),
            is_enabled: true,
        };
        self.badges
            .badges
            .lock()
            .expect("lock")
            .insert(mac.to_owned(), (badge.clone(), user.clone()));
        (badge, user)
    }

    /// Install a hexpansion and its location.
    pub(crate) fn install_location(&self, serial: u128, name: &str, points: i32) {
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
        self.captures.hexpansions.lock().expect("lock").push(hexpansion);
        self.captures.locations.lock().expect("lock").push(location);
    }

    /// Fix a player's current score directly.
    pub(crate) fn set_score(&self, user_id: UserId, score: i64) {
        self.scores
            .lock()
            .expect("lock")
            .insert(*user_id.as_uuid(), score);
    }

    /// Add a global standing row.
    pub(crate) fn add_standing(&self, name: &str, score: i64, captures: i64) {
        self.boards.standings.lock().expect("lock").push(PlayerStanding {
            user_id: Uuid::new_v4(),
            username: name.to_lowercase(),
            display_name: name.to_owned(),
            current_score: score,
            capture_count: captures,
        });
    }

    /// Create a leaderboard with the given member standings.
    pub(crate) fn add_leaderboard(&self, members: &[(&str, i64, i64)]) -> Uuid {
        let id = Uuid::new_v4();
        let standings = members
            .iter()
            .map(|(name, score, captures)| PlayerStanding {
                user_id: Uuid::new_v4(),
                username: name.to_lowercase(),
                display_name: (*name).to_owned(),
                current_score: *score,
                capture_count: *captures,
            })
            .collect();
        self.boards
            .leaderboards
            .lock()
            .expect("lock")
            .insert(id, standings);
        id
    }
}

/// Wire the fakes into a ready-to-serve [`HttpState`].
pub(crate) fn test_state(world: &TestWorld) -> HttpState {
    let cache = Arc::new(InMemoryScoreboardCache::new(Duration::from_secs(30)));
    HttpState {
        badge_auth: Arc::new(BadgeAuthService::new(
            Arc::clone(&world.badges) as Arc<dyn BadgeRepository>
        )),
        captures: Arc::new(CaptureService::new(
            Arc::clone(&world.captures) as Arc<dyn CaptureRepository>,
            Arc::new(FakeAchievements),
            Arc::clone(&cache) as _,
            CaptureConfig {
                root_key: test_root_key(),
                validate_proof: true,
            },
        )),
        scoreboards: Arc::new(ScoreboardService::new(
            Arc::clone(&world.boards) as Arc<dyn ScoreboardQuery>,
            cache,
        )),
        scores: Arc::new(FakeScoreLedger {
            scores: Arc::clone(&world.scores),
        }),
        otp_secret: Arc::from("test-otp-secret"),
    }
}
