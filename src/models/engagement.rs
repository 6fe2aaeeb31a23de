// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::post::{CommentId, Post, PostId, UserId};
use crate::schema::{comments, likes, shares};

pub const LIKE_WEIGHT: i64 = 1;
pub const COMMENT_WEIGHT: i64 = 2;
pub const SHARE_WEIGHT: i64 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub author_id: UserId,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = comments)]
pub struct NewComment {
    pub post_id: PostId,
    pub author_id: UserId,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Request body for commenting on a post
#[derive(Debug, Clone, Deserialize)]
pub struct CommentInput {
    pub text: String,
}

/// At most one per (post, user), enforced by the store
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = likes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Like {
    pub id: i32,
    pub post_id: PostId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = likes)]
pub struct NewLike {
    pub post_id: PostId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// At most one per (post, user), enforced by the store
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = shares)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Share {
    pub id: i32,
    pub post_id: PostId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = shares)]
pub struct NewShare {
    pub post_id: PostId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// Outcome of a get-or-create write. `created` is false when the row
/// already existed and `record` is that existing row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inserted<T> {
    pub record: T,
    pub created: bool,
}

impl<T> Inserted<T> {
    pub fn created(record: T) -> Self {
        Self { record, created: true }
    }

    pub fn existing(record: T) -> Self {
        Self { record, created: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngagementKind {
    Like,
    Comment,
    Share,
}

impl fmt::Display for EngagementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngagementKind::Like => "like",
            EngagementKind::Comment => "comment",
            EngagementKind::Share => "share",
        };
        f.write_str(name)
    }
}

/// Raw row counts for one post
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngagementCounts {
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
}

impl EngagementCounts {
    pub fn new(likes: i64, comments: i64, shares: i64) -> Self {
        Self { likes, comments, shares }
    }

    pub fn popularity_score(&self) -> i64 {
        self.likes * LIKE_WEIGHT + self.comments * COMMENT_WEIGHT + self.shares * SHARE_WEIGHT
    }
}

/// Derived engagement view of a post. Only constructible from counts, so the
/// score can never disagree with them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngagementSnapshot {
    #[serde(skip_serializing)]
    post_id: PostId,
    likes_count: i64,
    comments_count: i64,
    shares_count: i64,
    popularity_score: i64,
}

impl EngagementSnapshot {
    pub fn new(post_id: PostId, counts: EngagementCounts) -> Self {
        Self {
            post_id,
            likes_count: counts.likes,
            comments_count: counts.comments,
            shares_count: counts.shares,
            popularity_score: counts.popularity_score(),
        }
    }

    pub fn post_id(&self) -> PostId {
        self.post_id
    }

    pub fn likes_count(&self) -> i64 {
        self.likes_count
    }

    pub fn comments_count(&self) -> i64 {
        self.comments_count
    }

    pub fn shares_count(&self) -> i64 {
        self.shares_count
    }

    pub fn popularity_score(&self) -> i64 {
        self.popularity_score
    }
}

/// A post together with the engagement counts read alongside it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostCounts {
    pub post: Post,
    pub counts: EngagementCounts,
}

/// A post as served by the feeds: the stored fields flattened together with
/// its engagement snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedPost {
    #[serde(flatten)]
    pub post: Post,
    #[serde(flatten)]
    engagement: EngagementSnapshot,
}

impl FeedPost {
    pub fn new(post: Post, counts: EngagementCounts) -> Self {
        let engagement = EngagementSnapshot::new(post.id, counts);
        Self { post, engagement }
    }

    pub fn engagement(&self) -> &EngagementSnapshot {
        &self.engagement
    }
}

impl From<PostCounts> for FeedPost {
    fn from(row: PostCounts) -> Self {
        FeedPost::new(row.post, row.counts)
    }
}
