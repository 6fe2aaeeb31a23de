// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

//! Engagement store: durable posts, comments, likes and shares.
//!
//! Implementations own the integrity rules. Like/share uniqueness, ownership
//! checks on edits and the existence of a referenced post are all decided
//! inside a single atomic unit of work in the store, never by a separate read
//! in the caller.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::error::Result;
use crate::feed::ordering::PostQuery;
use crate::models::engagement::{NewComment, NewLike, NewShare};
use crate::models::post::NewPost;
use crate::models::{Comment, CommentId, Inserted, Like, Post, PostCounts, PostId, Share, UserId};

pub use memory::InMemoryEngagementStore;
pub use postgres::PgEngagementStore;

/// Result of a write that only the owner of a row may perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ownership<T> {
    Applied(T),
    /// The row exists but belongs to someone else
    Forbidden,
    Missing,
}

#[async_trait]
pub trait EngagementStore: Send + Sync {
    /// Cheap reachability check for health reporting
    async fn ping(&self) -> Result<()>;

    async fn insert_post(&self, post: NewPost) -> Result<Post>;

    /// Replace the content of a post owned by `author_id`
    async fn update_post_content(
        &self,
        post_id: PostId,
        author_id: UserId,
        content: String,
    ) -> Result<Ownership<Post>>;

    /// Delete a post owned by `author_id` together with its engagement
    async fn delete_post(&self, post_id: PostId, author_id: UserId) -> Result<Ownership<()>>;

    /// `None` when the post does not exist
    async fn insert_comment(&self, comment: NewComment) -> Result<Option<Comment>>;

    async fn delete_comment(&self, comment_id: CommentId, author_id: UserId)
        -> Result<Ownership<()>>;

    /// Get-or-create on (post, user). `None` when the post does not exist.
    async fn like_post(&self, like: NewLike) -> Result<Option<Inserted<Like>>>;

    /// Get-or-create on (post, user). `None` when the post does not exist.
    async fn share_post(&self, share: NewShare) -> Result<Option<Inserted<Share>>>;

    /// Posts matching the query with their engagement counts, ordered and
    /// paginated, read from one consistent snapshot
    async fn query_posts(&self, query: &PostQuery) -> Result<Vec<PostCounts>>;
}
