// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, info};

use crate::auth::Caller;
use crate::error::{Result, SocialError};
use crate::feed::aggregator::Aggregator;
use crate::feed::ordering::{Page, PostFilter, PostOrder, PostQuery};
use crate::feed::trending_cache::{trending_key, TrendingCache};
use crate::metrics::{FeedKind, FeedMetrics};
use crate::models::{FeedPost, PostId};
use crate::social_graph::SocialGraph;

/// Builds the chronological, personalized and trending views of posts.
///
/// Every path is a pure read except `trending_feed`, which may populate the
/// trending cache.
#[derive(Clone)]
pub struct FeedQueryEngine {
    aggregator: Aggregator,
    graph: Arc<dyn SocialGraph>,
    cache: Arc<dyn TrendingCache>,
    trending_ttl: Duration,
    metrics: FeedMetrics,
}

impl FeedQueryEngine {
    pub fn new(
        aggregator: Aggregator,
        graph: Arc<dyn SocialGraph>,
        cache: Arc<dyn TrendingCache>,
        trending_ttl: Duration,
        metrics: FeedMetrics,
    ) -> Self {
        Self {
            aggregator,
            graph,
            cache,
            trending_ttl,
            metrics,
        }
    }

    /// All posts ordered by `order_by` (newest first when absent), then paginated
    pub async fn list_posts(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
        order_by: Option<&str>,
    ) -> Result<Vec<FeedPost>> {
        self.metrics.feed_request(FeedKind::Posts);

        let order = match order_by {
            Some(order_by) => order_by.parse::<PostOrder>()?,
            None => PostOrder::default(),
        };
        let page = Page::new(limit, offset)?;

        debug!("Listing posts order={} limit={:?} offset={}", order, page.limit(), page.offset());
        self.aggregator
            .ranked(&PostQuery::new(PostFilter::All, order, page))
            .await
    }

    pub async fn get_post(&self, post_id: PostId) -> Result<FeedPost> {
        self.aggregator
            .posts(&[post_id])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SocialError::not_found(format!("post {}", post_id)))
    }

    /// Newest-first posts by the authors the caller follows
    pub async fn personalized_feed(
        &self,
        caller: Caller,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<FeedPost>> {
        let user_id = caller.require()?;
        let page = Page::new(limit, offset)?;
        self.metrics.feed_request(FeedKind::Personalized);

        let mut followed: Vec<_> = self
            .graph
            .followed_author_ids(user_id)
            .await?
            .into_iter()
            .collect();
        if followed.is_empty() {
            debug!("User {} follows nobody, personalized feed is empty", user_id);
            return Ok(Vec::new());
        }
        followed.sort_unstable();

        let query = PostQuery::new(PostFilter::Authors(followed), PostOrder::NEWEST_FIRST, page);
        self.aggregator.ranked(&query).await
    }

    /// Posts by descending popularity, served from the cache while fresh.
    ///
    /// Writes made after a snapshot was cached are not visible until the
    /// entry for that limit expires.
    pub async fn trending_feed(&self, limit: Option<i64>) -> Result<Vec<FeedPost>> {
        let page = Page::new(limit, None)?;
        self.metrics.feed_request(FeedKind::Trending);

        let key = trending_key(page.limit());
        if let Some(posts) = self.cache.get(&key).await {
            debug!("Trending cache hit for {}", key);
            self.metrics.trending_cache_hit();
            return Ok(posts);
        }

        self.metrics.trending_cache_miss();
        let posts = self
            .aggregator
            .ranked(&PostQuery::new(PostFilter::All, PostOrder::MOST_POPULAR, page))
            .await?;

        info!("Recomputed trending feed {} with {} posts", key, posts.len());
        self.cache.set(key, posts.clone(), self.trending_ttl).await;

        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::error::ErrorKind;
    use crate::feed::MemoryTrendingCache;
    use crate::models::engagement::NewLike;
    use crate::models::post::NewPost;
    use crate::social_graph::InMemorySocialGraph;
    use crate::store::{EngagementStore, InMemoryEngagementStore};
    use tracing_test::traced_test;

    struct Fixture {
        store: Arc<InMemoryEngagementStore>,
        graph: Arc<InMemorySocialGraph>,
        clock: Arc<ManualClock>,
        metrics: FeedMetrics,
        engine: FeedQueryEngine,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryEngagementStore::new());
        let graph = Arc::new(InMemorySocialGraph::new());
        let clock = Arc::new(ManualClock::default());
        let metrics = FeedMetrics::new().unwrap();
        let engine = FeedQueryEngine::new(
            Aggregator::new(store.clone()),
            graph.clone(),
            Arc::new(MemoryTrendingCache::new(clock.clone())),
            Duration::seconds(60),
            metrics.clone(),
        );
        Fixture { store, graph, clock, metrics, engine }
    }

    impl Fixture {
        async fn post(&self, author_id: i32) -> PostId {
            self.clock.advance(Duration::seconds(1));
            self.store
                .insert_post(NewPost {
                    author_id,
                    content: format!("by {}", author_id),
                    created_at: self.clock.now(),
                })
                .await
                .unwrap()
                .id
        }

        async fn like(&self, post_id: PostId, user_id: i32) {
            self.store
                .like_post(NewLike { post_id, user_id, created_at: self.clock.now() })
                .await
                .unwrap();
        }
    }

    fn ids(posts: &[FeedPost]) -> Vec<PostId> {
        posts.iter().map(|p| p.post.id).collect()
    }

    #[tokio::test]
    async fn list_posts_defaults_to_newest_first() {
        let f = fixture();
        let a = f.post(1).await;
        let b = f.post(2).await;
        let c = f.post(1).await;

        assert_eq!(ids(&f.engine.list_posts(None, None, None).await.unwrap()), vec![c, b, a]);
        assert_eq!(ids(&f.engine.list_posts(None, Some(1), None).await.unwrap()), vec![b, a]);
        assert_eq!(ids(&f.engine.list_posts(Some(1), Some(1), None).await.unwrap()), vec![b]);
        assert_eq!(
            ids(&f.engine.list_posts(None, None, Some("created_at")).await.unwrap()),
            vec![a, b, c]
        );

        let err = f.engine.list_posts(None, None, Some("-author")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
    }

    #[tokio::test]
    async fn get_post_reports_missing_posts() {
        let f = fixture();
        let id = f.post(1).await;
        f.like(id, 2).await;

        let post = f.engine.get_post(id).await.unwrap();
        assert_eq!(post.engagement().likes_count(), 1);
        assert_eq!(f.engine.get_post(id + 1).await.unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn personalized_feed_covers_followed_authors_only() {
        let f = fixture();
        let own = f.post(1).await;
        let followed_old = f.post(2).await;
        let _stranger = f.post(3).await;
        let followed_new = f.post(4).await;

        let err = f.engine.personalized_feed(Caller::anonymous(), None, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthenticationRequired);

        assert!(f.engine.personalized_feed(Caller::user(1), None, None).await.unwrap().is_empty());

        f.graph.follow(1, 2).await;
        f.graph.follow(1, 4).await;
        let feed = f.engine.personalized_feed(Caller::user(1), None, None).await.unwrap();
        assert_eq!(ids(&feed), vec![followed_new, followed_old]);
        assert!(!ids(&feed).contains(&own));

        let page = f.engine.personalized_feed(Caller::user(1), Some(1), Some(1)).await.unwrap();
        assert_eq!(ids(&page), vec![followed_old]);
    }

    #[tokio::test]
    #[traced_test]
    async fn trending_is_cached_per_limit_until_expiry() {
        let f = fixture();
        let quiet = f.post(1).await;
        let busy = f.post(1).await;
        f.like(busy, 2).await;

        let first = f.engine.trending_feed(Some(10)).await.unwrap();
        assert_eq!(ids(&first), vec![busy, quiet]);
        assert!(logs_contain("Recomputed trending feed trending_feed_10"));

        // Engagement after the snapshot is invisible until it expires
        f.like(quiet, 2).await;
        f.like(quiet, 3).await;
        f.clock.advance(Duration::seconds(30));
        assert_eq!(f.engine.trending_feed(Some(10)).await.unwrap(), first);
        assert_eq!(f.metrics.trending_cache_hits(), 1);

        // A different limit has its own entry
        assert_eq!(ids(&f.engine.trending_feed(Some(1)).await.unwrap()), vec![quiet]);

        f.clock.advance(Duration::seconds(31));
        assert_eq!(ids(&f.engine.trending_feed(Some(10)).await.unwrap()), vec![quiet, busy]);
        assert_eq!(f.metrics.trending_cache_misses(), 3);
    }

    #[tokio::test]
    async fn trending_ties_prefer_newer_posts() {
        let f = fixture();
        let older = f.post(1).await;
        let newer = f.post(1).await;
        f.like(older, 2).await;
        f.like(newer, 2).await;

        assert_eq!(ids(&f.engine.trending_feed(None).await.unwrap()), vec![newer, older]);
        assert!(f.engine.trending_feed(Some(0)).await.unwrap().is_empty());
        assert_eq!(
            f.engine.trending_feed(Some(-1)).await.unwrap_err().kind(),
            ErrorKind::ValidationError
        );
    }
}
