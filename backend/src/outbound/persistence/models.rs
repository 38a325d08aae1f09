//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{
    badges, basic_achievement_events, basic_achievements, capture_events, capture_logs,
    first_capture_events, hexpansions, locations, raw_capture_events, score_records, user_scores,
    users,
};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub is_superuser: bool,
    #[expect(dead_code, reason = "schema field read for completeness")]
    pub created_at: DateTime<Utc>,
    #[expect(dead_code, reason = "schema field read for completeness")]
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for provisioning new players.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub username: &'a str,
    pub display_name: &'a str,
    pub is_superuser: bool,
}

/// Row struct for reading from the badges table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = badges)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BadgeRow {
    pub id: Uuid,
    pub mac_address: String,
    pub user_id: Uuid,
    pub secret: String,
    pub is_enabled: bool,
    #[expect(dead_code, reason = "schema field read for completeness")]
    pub created_at: DateTime<Utc>,
    #[expect(dead_code, reason = "schema field read for completeness")]
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for registering new badges.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = badges)]
pub(crate) struct NewBadgeRow<'a> {
    pub id: Uuid,
    pub mac_address: &'a str,
    pub user_id: Uuid,
    pub secret: &'a str,
    pub is_enabled: bool,
}

/// Row struct for reading from the hexpansions table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = hexpansions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct HexpansionRow {
    pub id: Uuid,
    pub human_identifier: String,
    pub serial_number: Uuid,
}

/// Row struct for reading from the locations table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = locations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct LocationRow {
    pub id: Uuid,
    pub display_name: String,
    pub difficulty: i32,
    pub hexpansion_id: Option<Uuid>,
}

/// Insertable struct for the forensic tap record.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = raw_capture_events)]
pub(crate) struct NewRawCaptureEventRow<'a> {
    pub id: Uuid,
    pub badge_id: Uuid,
    pub user_id: Uuid,
    pub hexpansion_id: Uuid,
    pub rand: &'a [u8],
    pub hmac: &'a str,
    pub app_rev: &'a str,
    pub fw_rev: &'a str,
}

/// Insertable struct for the traffic log.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = capture_logs)]
pub(crate) struct NewCaptureLogRow {
    pub id: Uuid,
    pub raw_capture_event_id: Uuid,
    pub location_id: Uuid,
    pub user_id: Uuid,
}

/// Insertable struct for the scoring capture event.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = capture_events)]
pub(crate) struct NewCaptureEventRow {
    pub id: Uuid,
    pub raw_capture_event_id: Uuid,
    pub location_id: Uuid,
    pub user_id: Uuid,
}

/// Insertable struct for score ledger entries.
///
/// Exactly one link column must be set; the check constraint rejects
/// anything else.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = score_records)]
pub(crate) struct NewScoreRecordRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub capture_event_id: Option<Uuid>,
    pub basic_achievement_event_id: Option<Uuid>,
    pub first_capture_event_id: Option<Uuid>,
    pub location_group_id: Option<Uuid>,
    pub score: i32,
}

impl NewScoreRecordRow {
    /// Ledger entry linked to a capture event.
    pub(crate) fn for_capture(user_id: Uuid, capture_event_id: Uuid, score: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            capture_event_id: Some(capture_event_id),
            basic_achievement_event_id: None,
            first_capture_event_id: None,
            location_group_id: None,
            score,
        }
    }

    /// Ledger entry linked to a basic achievement award.
    pub(crate) fn for_basic_achievement(user_id: Uuid, event_id: Uuid, score: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            capture_event_id: None,
            basic_achievement_event_id: Some(event_id),
            first_capture_event_id: None,
            location_group_id: None,
            score,
        }
    }

    /// Ledger entry linked to a first-capture bonus.
    pub(crate) fn for_first_capture(user_id: Uuid, event_id: Uuid, score: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            capture_event_id: None,
            basic_achievement_event_id: None,
            first_capture_event_id: Some(event_id),
            location_group_id: None,
            score,
        }
    }
}

/// Insertable struct for the per-player score cache.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_scores)]
pub(crate) struct NewUserScoreRow {
    pub user_id: Uuid,
    pub current_score: i64,
}

/// Row struct for reading achievement catalogue entries.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = basic_achievements)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BasicAchievementRow {
    pub id: Uuid,
    pub display_name: String,
    pub difficulty: i32,
}

/// Insertable struct for achievement awards.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = basic_achievement_events)]
pub(crate) struct NewBasicAchievementEventRow {
    pub id: Uuid,
    pub achievement_id: Uuid,
    pub user_id: Uuid,
}

/// Insertable struct for first-capture bonus events.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = first_capture_events)]
pub(crate) struct NewFirstCaptureEventRow {
    pub id: Uuid,
    pub location_id: Uuid,
    pub user_id: Uuid,
    pub capture_event_id: Uuid,
}
