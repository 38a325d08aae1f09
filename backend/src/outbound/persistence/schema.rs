//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. They are
//! used by Diesel for compile-time query validation and type-safe SQL
//! generation; `diesel print-schema` can regenerate them from a live
//! database after a migration changes.

diesel::table! {
    /// Player accounts.
    ///
    /// `username` is unique; `display_name` is what scoreboards show.
    /// Superusers are excluded from every scoreboard.
    users (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Unique account name (max 150 characters).
        #[max_length = 150]
        username -> Varchar,
        /// Scoreboard display name (max 30 characters).
        #[max_length = 30]
        display_name -> Varchar,
        /// Administrators never appear on scoreboards.
        is_superuser -> Bool,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Physical badges, one row per device.
    ///
    /// `secret` is the empty string until the badge first authenticates;
    /// the conditional bind relies on that sentinel at the SQL level.
    badges (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// IEEE 802 hardware address, unique across badges.
        #[max_length = 17]
        mac_address -> Varchar,
        /// Owning player.
        user_id -> Uuid,
        /// Shared secret (64 hex chars) or empty when blank.
        #[max_length = 64]
        secret -> Varchar,
        /// Disabled badges cannot authenticate.
        is_enabled -> Bool,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Hexpansion devices installed at capturable locations.
    hexpansions (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Identifier printed on the device for humans.
        #[max_length = 32]
        human_identifier -> Varchar,
        /// 128-bit chip serial, stored as a UUID, unique across devices.
        serial_number -> Uuid,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Capturable locations.
    locations (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Name shown to players who have captured the location.
        #[max_length = 150]
        display_name -> Varchar,
        /// Difficulty tier stored as its point value.
        difficulty -> Int4,
        /// Installed hexpansion; at most one location per hexpansion.
        hexpansion_id -> Nullable<Uuid>,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Immutable forensic record of every authenticated tap.
    raw_capture_events (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Badge that tapped.
        badge_id -> Uuid,
        /// Player owning the badge at tap time.
        user_id -> Uuid,
        /// Hexpansion that was tapped.
        hexpansion_id -> Uuid,
        /// 32-byte nonce submitted with the tap.
        rand -> Bytea,
        /// Claimed chip response, as submitted.
        #[max_length = 64]
        hmac -> Varchar,
        /// Badge app revision string.
        #[max_length = 32]
        app_rev -> Varchar,
        /// Badge firmware revision string.
        #[max_length = 32]
        fw_rev -> Varchar,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Traffic log: one row per tap that resolved to a location.
    ///
    /// Duplicates per player and location are expected.
    capture_logs (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Raw event this log entry stems from.
        raw_capture_event_id -> Uuid,
        /// Location that was tapped.
        location_id -> Uuid,
        /// Player that tapped.
        user_id -> Uuid,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Scoring captures: at most one per player and location.
    ///
    /// The `(location_id, user_id)` unique constraint is the concurrency
    /// backstop for the whole pipeline.
    capture_events (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Raw event that won the race.
        raw_capture_event_id -> Uuid,
        /// Captured location.
        location_id -> Uuid,
        /// Capturing player.
        user_id -> Uuid,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only score ledger.
    ///
    /// A check constraint (`ensure_linked_event`) requires exactly one of
    /// the four link columns to be non-null.
    score_records (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Player the points belong to.
        user_id -> Uuid,
        /// Linked capture event, when the points came from a capture.
        capture_event_id -> Nullable<Uuid>,
        /// Linked basic achievement event.
        basic_achievement_event_id -> Nullable<Uuid>,
        /// Linked first-capture bonus event.
        first_capture_event_id -> Nullable<Uuid>,
        /// Linked location-group completion, managed by a collaborator.
        location_group_id -> Nullable<Uuid>,
        /// Point value of this entry.
        score -> Int4,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Denormalised per-player score cache, recomputed from the ledger.
    user_scores (user_id) {
        /// Player this cache row belongs to.
        user_id -> Uuid,
        /// Sum over the player's ledger entries.
        current_score -> Int8,
        /// Last recompute timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Private leaderboards.
    leaderboards (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Name shown at the top of the leaderboard page.
        #[max_length = 150]
        display_name -> Varchar,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Leaderboard membership join table.
    leaderboard_members (leaderboard_id, user_id) {
        /// Leaderboard the player belongs to.
        leaderboard_id -> Uuid,
        /// Member player.
        user_id -> Uuid,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Catalogue of built-in achievements.
    basic_achievements (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Achievement name shown to players.
        #[max_length = 150]
        display_name -> Varchar,
        /// Difficulty tier stored as its point value.
        difficulty -> Int4,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Awards of built-in achievements: at most one per player and
    /// achievement.
    basic_achievement_events (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Awarded achievement.
        achievement_id -> Uuid,
        /// Awarded player.
        user_id -> Uuid,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// First-ever capture bonus: at most one per location.
    first_capture_events (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Location that was captured first.
        location_id -> Uuid,
        /// Player who got there first.
        user_id -> Uuid,
        /// The winning capture event.
        capture_event_id -> Uuid,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::joinable!(badges -> users (user_id));
diesel::joinable!(locations -> hexpansions (hexpansion_id));
diesel::joinable!(raw_capture_events -> badges (badge_id));
diesel::joinable!(raw_capture_events -> users (user_id));
diesel::joinable!(raw_capture_events -> hexpansions (hexpansion_id));
diesel::joinable!(capture_logs -> raw_capture_events (raw_capture_event_id));
diesel::joinable!(capture_logs -> locations (location_id));
diesel::joinable!(capture_logs -> users (user_id));
diesel::joinable!(capture_events -> raw_capture_events (raw_capture_event_id));
diesel::joinable!(capture_events -> locations (location_id));
diesel::joinable!(capture_events -> users (user_id));
diesel::joinable!(score_records -> users (user_id));
diesel::joinable!(score_records -> capture_events (capture_event_id));
diesel::joinable!(score_records -> basic_achievement_events (basic_achievement_event_id));
diesel::joinable!(score_records -> first_capture_events (first_capture_event_id));
diesel::joinable!(user_scores -> users (user_id));
diesel::joinable!(leaderboard_members -> leaderboards (leaderboard_id));
diesel::joinable!(leaderboard_members -> users (user_id));
diesel::joinable!(basic_achievement_events -> basic_achievements (achievement_id));
diesel::joinable!(basic_achievement_events -> users (user_id));
diesel::joinable!(first_capture_events -> locations (location_id));
diesel::joinable!(first_capture_events -> users (user_id));
diesel::joinable!(first_capture_events -> capture_events (capture_event_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    badges,
    hexpansions,
    locations,
    raw_capture_events,
    capture_logs,
    capture_events,
    score_records,
    user_scores,
    leaderboards,
    leaderboard_members,
    basic_achievements,
    basic_achievement_events,
    first_capture_events,
);
