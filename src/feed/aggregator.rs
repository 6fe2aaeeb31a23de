// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::feed::ordering::{Page, PostFilter, PostOrder, PostQuery};
use crate::models::{FeedPost, PostId};
use crate::store::EngagementStore;

/// Set-based engagement aggregation.
///
/// Counts always come from one grouped read per request, so a snapshot never
/// mixes rows from before and after a concurrent commit. The popularity score
/// is derived from those counts and never stored.
#[derive(Clone)]
pub struct Aggregator {
    store: Arc<dyn EngagementStore>,
}

impl Aggregator {
    pub fn new(store: Arc<dyn EngagementStore>) -> Self {
        Self { store }
    }

    /// Posts with their snapshots for the given ids, in ascending id order.
    /// Ids that do not (or no longer) exist are left out of the result.
    pub async fn posts(&self, ids: &[PostId]) -> Result<Vec<FeedPost>> {
        let ids: Vec<PostId> = ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let requested = ids.len();
        let posts = self
            .ranked(&PostQuery::new(PostFilter::Ids(ids), PostOrder::BY_ID, Page::all()))
            .await?;

        if posts.len() < requested {
            debug!("Omitted {} missing posts from aggregation", requested - posts.len());
        }

        Ok(posts)
    }

    /// Posts matching `query` with their snapshots attached, in query order
    pub async fn ranked(&self, query: &PostQuery) -> Result<Vec<FeedPost>> {
        let rows = self.store.query_posts(query).await?;
        Ok(rows.into_iter().map(FeedPost::from).collect())
    }
}
