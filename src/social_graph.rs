// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

//! Read-only access to the follow graph, which is owned elsewhere.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::db::Database;
use crate::error::Result;
use crate::models::UserId;
use crate::schema::follows;

#[async_trait]
pub trait SocialGraph: Send + Sync {
    /// Ids of every user that `user_id` follows
    async fn followed_author_ids(&self, user_id: UserId) -> Result<HashSet<UserId>>;
}

pub struct PgSocialGraph {
    db: Arc<Database>,
}

impl PgSocialGraph {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SocialGraph for PgSocialGraph {
    async fn followed_author_ids(&self, user_id: UserId) -> Result<HashSet<UserId>> {
        let mut conn = self.db.get_connection().await?;

        let ids = follows::table
            .filter(follows::follower_id.eq(user_id))
            .select(follows::following_id)
            .load::<UserId>(&mut conn)
            .await?;

        Ok(ids.into_iter().collect())
    }
}

/// Follow graph held in memory, seeded through [`InMemorySocialGraph::follow`]
#[derive(Debug, Default)]
pub struct InMemorySocialGraph {
    following: RwLock<HashMap<UserId, HashSet<UserId>>>,
}

impl InMemorySocialGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn follow(&self, follower_id: UserId, following_id: UserId) {
        self.following
            .write()
            .await
            .entry(follower_id)
            .or_default()
            .insert(following_id);
    }

    #[cfg(test)]
    pub async fn unfollow(&self, follower_id: UserId, following_id: UserId) {
        if let Some(set) = self.following.write().await.get_mut(&follower_id) {
            set.remove(&following_id);
        }
    }
}

#[async_trait]
impl SocialGraph for InMemorySocialGraph {
    async fn followed_author_ids(&self, user_id: UserId) -> Result<HashSet<UserId>> {
        Ok(self
            .following
            .read()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }
}
