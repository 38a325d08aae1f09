//! Score ledger types and grade labelling.
//!
//! Every point a player holds is justified by exactly one ledger entry
//! (a [`ScoreRecord`]) linked to the event that earned it. The per-user
//! current score is a denormalised cache recomputed from the ledger, never
//! incremented.

use std::fmt;

use uuid::Uuid;

use super::user::UserId;

/// The event a ledger entry is linked to.
///
/// Exactly one variant per record; the storage layer enforces the same
/// shape with a check constraint across the four link columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreSource {
    /// First capture of a location by this player.
    Capture(Uuid),
    /// A basic achievement award.
    BasicAchievement(Uuid),
    /// First-ever capture of a location by anyone.
    FirstCapture(Uuid),
    /// Completion of a location group (awarded by an external collaborator).
    LocationGroup(Uuid),
}

/// An append-only ledger entry answering "why does this player have this
/// score".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRecord {
    /// Stable identifier.
    pub id: Uuid,
    /// Player the points belong to.
    pub user_id: UserId,
    /// Event that earned the points.
    pub source: ScoreSource,
    /// Point value.
    pub score: i32,
}

/// Grade thresholds, descending. The highest threshold at or below the
/// score wins; zero is always covered.
const GRADES: [(i64, &str); 6] = [
    (800, "Badge destroyer"),
    (400, "Missing talks"),
    (100, "Running around site"),
    (50, "Hexpansion collector"),
    (1, "Warming up"),
    (0, "Just observing"),
];

/// Map a score to its human-readable grade label.
///
/// Total over all non-negative scores; negative input clamps to the lowest
/// grade rather than panicking, since the ledger only holds positive point
/// values.
pub fn grade_for_score(score: i64) -> &'static str {
    for (threshold, label) in GRADES {
        if score >= threshold {
            return label;
        }
    }
    GRADES[GRADES.len() - 1].1
}

impl fmt::Display for ScoreRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} points for {}", self.score, self.user_id)
    }
}
