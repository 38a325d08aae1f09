//! Scoreboard reads.
//!
//! The expensive part of a scoreboard is loading and ranking the whole
//! population, so that snapshot is cached per scope and served slightly
//! stale. Search and pagination are cheap and always applied at read time
//! against the cached snapshot, which means a filtered page shows the
//! players' true ranks.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use super::error::Error;
use super::ports::{ScoreboardCache, ScoreboardQuery, ScoreboardQueryError};
use super::scoreboard::{filter_rows, rank_players, ScoreboardRow, ScoreboardScope};

/// Rows returned per scoreboard page.
pub const SCOREBOARD_PAGE_SIZE: usize = 50;

/// One page of a (possibly filtered) scoreboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreboardPage {
    /// Rows for this page, in presentation order.
    pub rows: Vec<ScoreboardRow>,
    /// 1-based page number requested.
    pub page: u32,
    /// Total rows matching the filter, across all pages.
    pub total: usize,
}

/// Application service serving ranked scoreboards.
pub struct ScoreboardService {
    query: Arc<dyn ScoreboardQuery>,
    cache: Arc<dyn ScoreboardCache>,
}

impl ScoreboardService {
    /// Build the service over its ports.
    pub fn new(query: Arc<dyn ScoreboardQuery>, cache: Arc<dyn ScoreboardCache>) -> Self {
        Self { query, cache }
    }

    /// The global scoreboard over all non-administrator players.
    pub async fn global(&self, search: Option<&str>, page: u32) -> Result<ScoreboardPage, Error> {
        let snapshot = self.snapshot(&ScoreboardScope::Global).await?;
        paginate(snapshot, search, page)
    }

    /// One private leaderboard's scoreboard.
    pub async fn leaderboard(
        &self,
        leaderboard_id: Uuid,
        search: Option<&str>,
        page: u32,
    ) -> Result<ScoreboardPage, Error> {
        let scope = ScoreboardScope::Leaderboard(leaderboard_id);
        if let Some(rows) = self.cached(&scope).await {
            return paginate(rows, search, page);
        }

        let standings = self
            .query
            .load_leaderboard_standings(leaderboard_id)
            .await
            .map_err(map_query_error)?
            .ok_or_else(|| Error::not_found("no such leaderboard"))?;
        let rows = rank_players(standings);
        self.store(&scope, rows.clone()).await;
        paginate(rows, search, page)
    }

    async fn snapshot(&self, scope: &ScoreboardScope) -> Result<Vec<ScoreboardRow>, Error> {
        if let Some(rows) = self.cached(scope).await {
            return Ok(rows);
        }
        let standings = self
            .query
            .load_global_standings()
            .await
            .map_err(map_query_error)?;
        let rows = rank_players(standings);
        self.store(scope, rows.clone()).await;
        Ok(rows)
    }

    /// Cache reads degrade to a miss on failure; a broken cache must never
    /// take the scoreboard down.
    async fn cached(&self, scope: &ScoreboardScope) -> Option<Vec<ScoreboardRow>> {
        match self.cache.get(scope).await {
            Ok(hit) => hit,
            Err(err) => {
                warn!(scope = %scope.cache_key(), error = %err, "scoreboard cache read failed");
                None
            }
        }
    }

    async fn store(&self, scope: &ScoreboardScope, rows: Vec<ScoreboardRow>) {
        if let Err(err) = self.cache.put(scope, rows).await {
            warn!(scope = %scope.cache_key(), error = %err, "scoreboard cache write failed");
        }
    }
}

fn paginate(
    rows: Vec<ScoreboardRow>,
    search: Option<&str>,
    page: u32,
) -> Result<ScoreboardPage, Error> {
    if page == 0 {
        return Err(Error::invalid_request("page numbers start at 1"));
    }
    let filtered = match search {
        Some(needle) if !needle.is_empty() => filter_rows(&rows, needle),
        _ => rows,
    };
    let total = filtered.len();
    let start = (page as usize - 1) * SCOREBOARD_PAGE_SIZE;
    let rows = filtered
        .into_iter()
        .skip(start)
        .take(SCOREBOARD_PAGE_SIZE)
        .collect();
    Ok(ScoreboardPage { rows, page, total })
}

fn map_query_error(err: ScoreboardQueryError) -> Error {
    match err {
        ScoreboardQueryError::Connection { message } => Error::service_unavailable(message),
        ScoreboardQueryError::Query { message } => Error::internal(message),
    }
}
