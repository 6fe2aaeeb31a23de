// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::clock::Clock;
use crate::models::FeedPost;

/// Key-value store with per-entry expiry for ranked trending snapshots.
///
/// `get` only returns entries that have not expired; `set` overwrites
/// unconditionally. There is no invalidation on writes.
#[async_trait]
pub trait TrendingCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<Vec<FeedPost>>;

    async fn set(&self, key: String, posts: Vec<FeedPost>, ttl: Duration);
}

/// Cache key for a trending request; each limit gets its own entry
pub fn trending_key(limit: Option<i64>) -> String {
    match limit {
        Some(limit) => format!("trending_feed_{}", limit),
        None => "trending_feed_all".to_string(),
    }
}

#[derive(Clone)]
struct CacheEntry {
    posts: Vec<FeedPost>,
    expires_at: DateTime<Utc>,
}

/// In-process trending cache. Expiry is measured against the injected clock.
pub struct MemoryTrendingCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
}

impl MemoryTrendingCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Drop every expired entry
    pub async fn cleanup_expired(&self) {
        let now = self.clock.now();
        self.entries
            .write()
            .await
            .retain(|_, entry| entry.expires_at > now);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl TrendingCache for MemoryTrendingCache {
    async fn get(&self, key: &str) -> Option<Vec<FeedPost>> {
        let entries = self.entries.read().await;

        if let Some(entry) = entries.get(key) {
            if entry.expires_at > self.clock.now() {
                return Some(entry.posts.clone());
            }
        }

        None
    }

    async fn set(&self, key: String, posts: Vec<FeedPost>, ttl: Duration) {
        let now = self.clock.now();
        let entry = CacheEntry {
            posts,
            expires_at: now + ttl,
        };

        let mut entries = self.entries.write().await;
        // Keys come from caller-supplied limits, so stale ones must not pile up
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(key, entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::models::{EngagementCounts, Post};
    use chrono::TimeZone;

    fn feed_post(id: i32) -> FeedPost {
        FeedPost::new(
            Post {
                id,
                author_id: 1,
                content: "cached".to_string(),
                created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            },
            EngagementCounts::new(id as i64, 0, 0),
        )
    }

    #[test]
    fn keys_are_distinct_per_limit() {
        assert_eq!(trending_key(Some(10)), "trending_feed_10");
        assert_eq!(trending_key(None), "trending_feed_all");
        assert_ne!(trending_key(Some(5)), trending_key(Some(50)));
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let clock = Arc::new(ManualClock::default());
        let cache = MemoryTrendingCache::new(clock.clone());

        cache
            .set("k".to_string(), vec![feed_post(1)], Duration::seconds(60))
            .await;
        clock.advance(Duration::seconds(59));
        assert_eq!(cache.get("k").await, Some(vec![feed_post(1)]));

        clock.advance(Duration::seconds(1));
        assert!(cache.get("k").await.is_none());

        cache.cleanup_expired().await;
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn set_overwrites_and_restarts_expiry() {
        let clock = Arc::new(ManualClock::default());
        let cache = MemoryTrendingCache::new(clock.clone());

        cache
            .set("k".to_string(), vec![feed_post(1)], Duration::seconds(60))
            .await;
        clock.advance(Duration::seconds(50));
        cache
            .set("k".to_string(), vec![feed_post(2)], Duration::seconds(60))
            .await;
        clock.advance(Duration::seconds(50));

        assert_eq!(cache.get("k").await, Some(vec![feed_post(2)]));
        assert!(cache.get("other").await.is_none());
    }

    #[tokio::test]
    async fn stale_limits_are_dropped_on_the_next_write() {
        let clock = Arc::new(ManualClock::default());
        let cache = MemoryTrendingCache::new(clock.clone());

        for limit in 0..1000 {
            cache
                .set(trending_key(Some(limit)), vec![feed_post(1)], Duration::seconds(60))
                .await;
        }
        assert_eq!(cache.len().await, 1000);

        clock.advance(Duration::seconds(3600));
        cache
            .set(trending_key(Some(1000)), vec![feed_post(2)], Duration::seconds(60))
            .await;

        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get(&trending_key(Some(1000))).await, Some(vec![feed_post(2)]));
    }
}
