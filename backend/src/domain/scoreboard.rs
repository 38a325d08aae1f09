//! Scoreboard ranking.
//!
//! Ranking is a pure function over a snapshot of player standings so the
//! expensive part can be cached and served stale. Search filtering and the
//! final presentation sort are applied to an already-ranked snapshot:
//! searching never changes anyone's rank.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Cache/scope key identifying one scoreboard population.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScoreboardScope {
    /// All non-administrator players.
    Global,
    /// Members of one private leaderboard.
    Leaderboard(Uuid),
}

impl ScoreboardScope {
    /// Stable cache-key form, e.g. `global` or a leaderboard UUID.
    pub fn cache_key(&self) -> String {
        match self {
            Self::Global => "global".to_owned(),
            Self::Leaderboard(id) => id.to_string(),
        }
    }
}

/// One player's unranked standing, as loaded from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerStanding {
    /// Player identifier.
    pub user_id: Uuid,
    /// Unique account name.
    pub username: String,
    /// Scoreboard display name.
    pub display_name: String,
    /// Cached current score (0 when the player has no score row yet).
    pub current_score: i64,
    /// Number of distinct locations captured.
    pub capture_count: i64,
}

/// One ranked scoreboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ScoreboardRow {
    /// Player identifier.
    pub user_id: Uuid,
    /// Unique account name.
    pub username: String,
    /// Scoreboard display name.
    pub display_name: String,
    /// Dense rank: ties share a rank, the next distinct score continues at
    /// rank + 1.
    pub rank: u32,
    /// Number of distinct locations captured.
    pub capture_count: i64,
    /// Current score.
    pub current_score: i64,
}

/// Assign dense ranks over a snapshot of standings.
///
/// Players are ranked by score descending; equal scores share a rank and
/// the next distinct score takes the next consecutive rank. Rows come back
/// in presentation order: `(rank, capture_count, display_name)`.
pub fn rank_players(mut standings: Vec<PlayerStanding>) -> Vec<ScoreboardRow> {
    standings.sort_by(|a, b| b.current_score.cmp(&a.current_score));

    let mut rows = Vec::with_capacity(standings.len());
    let mut rank = 0u32;
    let mut previous_score: Option<i64> = None;
    for standing in standings {
        if previous_score != Some(standing.current_score) {
            rank += 1;
            previous_score = Some(standing.current_score);
        }
        rows.push(ScoreboardRow {
            user_id: standing.user_id,
            username: standing.username,
            display_name: standing.display_name,
            rank,
            capture_count: standing.capture_count,
            current_score: standing.current_score,
        });
    }

    sort_for_presentation(&mut rows);
    rows
}

/// Case-insensitive substring filter on display name.
///
/// Applied to a ranked snapshot at read time; a filtered view keeps the
/// ranks computed over the full population.
pub fn filter_rows(rows: &[ScoreboardRow], search: &str) -> Vec<ScoreboardRow> {
    let needle = search.to_lowercase();
    rows.iter()
        .filter(|row| row.display_name.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// Deterministic presentation order: rank, then capture count, then
/// display name.
pub fn sort_for_presentation(rows: &mut [ScoreboardRow]) {
    rows.sort_by(|a, b| {
        a.rank
            .cmp(&b.rank)
            .then_with(|| a.capture_count.cmp(&b.capture_count))
            .then_with(|| a.display_name.cmp(&b.display_name))
    });
}
