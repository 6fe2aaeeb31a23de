// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::models::EngagementKind;

/// Which feed a read was served for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    Posts,
    Personalized,
    Trending,
}

impl FeedKind {
    fn as_str(self) -> &'static str {
        match self {
            FeedKind::Posts => "posts",
            FeedKind::Personalized => "personalized",
            FeedKind::Trending => "trending",
        }
    }
}

/// Counters owned by the application state and exposed on `/metrics`
#[derive(Clone)]
pub struct FeedMetrics {
    registry: Registry,
    feed_requests: IntCounterVec,
    trending_cache_hits: IntCounter,
    trending_cache_misses: IntCounter,
    engagement_writes: IntCounterVec,
}

impl FeedMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new_custom(Some("mys_social_feed".into()), None)?;

        let feed_requests = IntCounterVec::new(
            Opts::new("feed_requests_total", "Feed reads served, by feed"),
            &["feed"],
        )?;
        registry.register(Box::new(feed_requests.clone()))?;

        let trending_cache_hits = IntCounter::with_opts(Opts::new(
            "trending_cache_hits_total",
            "Trending feed reads answered from the cache",
        ))?;
        registry.register(Box::new(trending_cache_hits.clone()))?;

        let trending_cache_misses = IntCounter::with_opts(Opts::new(
            "trending_cache_misses_total",
            "Trending feed reads that recomputed the ranking",
        ))?;
        registry.register(Box::new(trending_cache_misses.clone()))?;

        let engagement_writes = IntCounterVec::new(
            Opts::new(
                "engagement_writes_total",
                "Comment, like and share writes, by kind and whether a row was created",
            ),
            &["kind", "created"],
        )?;
        registry.register(Box::new(engagement_writes.clone()))?;

        Ok(Self {
            registry,
            feed_requests,
            trending_cache_hits,
            trending_cache_misses,
            engagement_writes,
        })
    }

    pub fn feed_request(&self, feed: FeedKind) {
        self.feed_requests.with_label_values(&[feed.as_str()]).inc();
    }

    pub fn trending_cache_hit(&self) {
        self.trending_cache_hits.inc();
    }

    pub fn trending_cache_miss(&self) {
        self.trending_cache_misses.inc();
    }

    pub fn engagement_write(&self, kind: EngagementKind, created: bool) {
        let kind = kind.to_string();
        let created = if created { "true" } else { "false" };
        self.engagement_writes
            .with_label_values(&[kind.as_str(), created])
            .inc();
    }

    pub fn trending_cache_hits(&self) -> u64 {
        self.trending_cache_hits.get()
    }

    pub fn trending_cache_misses(&self) -> u64 {
        self.trending_cache_misses.get()
    }

    /// Prometheus text exposition of every registered metric
    pub fn encode(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
