//! In-process scoreboard cache.
//!
//! A TTL map guarded by an async `RwLock`. Expiry is jittered by ±10% per
//! entry so the global and leaderboard snapshots do not all fall due on the
//! same request after a quiet period.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::RwLock;

use crate::domain::ports::{ScoreboardCache, ScoreboardCacheError};
use crate::domain::{ScoreboardRow, ScoreboardScope};

struct Entry {
    expires_at: Instant,
    rows: Vec<ScoreboardRow>,
}

/// TTL-based in-memory implementation of the `ScoreboardCache` port.
pub struct InMemoryScoreboardCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, Entry>>,
}

impl InMemoryScoreboardCache {
    /// Create a cache whose entries live for roughly `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn jittered_ttl(&self) -> Duration {
        let factor = rand::thread_rng().gen_range(0.9..=1.1);
        self.ttl.mul_f64(factor)
    }
}

#[async_trait]
impl ScoreboardCache for InMemoryScoreboardCache {
    async fn get(
        &self,
        scope: &ScoreboardScope,
    ) -> Result<Option<Vec<ScoreboardRow>>, ScoreboardCacheError> {
        let key = scope.cache_key();
        {
            let entries = self.entries.read().await;
            match entries.get(&key) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Ok(Some(entry.rows.clone()));
                }
                Some(_) => {}
                None => return Ok(None),
            }
        }
        // Expired: drop the stale entry under the write lock.
        self.entries.write().await.remove(&key);
        Ok(None)
    }

    async fn put(
        &self,
        scope: &ScoreboardScope,
        rows: Vec<ScoreboardRow>,
    ) -> Result<(), ScoreboardCacheError> {
        let entry = Entry {
            expires_at: Instant::now() + self.jittered_ttl(),
            rows,
        };
        self.entries.write().await.insert(scope.cache_key(), entry);
        Ok(())
    }

    async fn bust(&self, scope: &ScoreboardScope) -> Result<(), ScoreboardCacheError> {
        self.entries.write().await.remove(&scope.cache_key());
        Ok(())
    }
}
