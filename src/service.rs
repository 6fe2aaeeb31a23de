// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

//! Post and engagement mutations.
//!
//! Each operation checks the caller, validates its input and then hands a
//! single atomic write to the engagement store.

use std::sync::Arc;
use tracing::{debug, info};

use crate::auth::Caller;
use crate::clock::Clock;
use crate::error::{Result, SocialError};
use crate::metrics::FeedMetrics;
use crate::models::engagement::{CommentInput, NewComment, NewLike, NewShare};
use crate::models::post::{NewPost, PostInput};
use crate::models::{Comment, CommentId, EngagementKind, Inserted, Like, Post, PostId, Share};
use crate::store::{EngagementStore, Ownership};

#[derive(Clone)]
pub struct SocialService {
    store: Arc<dyn EngagementStore>,
    clock: Arc<dyn Clock>,
    metrics: FeedMetrics,
    max_content_length: usize,
}

/// Reject blank text and text longer than `max` characters
fn validate_text(field: &str, text: &str, max: usize) -> Result<()> {
    if text.trim().is_empty() {
        return Err(SocialError::validation(format!("{} must not be empty", field)));
    }
    if text.chars().count() > max {
        return Err(SocialError::validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

fn owned<T>(outcome: Ownership<T>, what: String) -> Result<T> {
    match outcome {
        Ownership::Applied(value) => Ok(value),
        Ownership::Forbidden => Err(SocialError::Unauthorized(what)),
        Ownership::Missing => Err(SocialError::NotFound(what)),
    }
}

impl SocialService {
    pub fn new(
        store: Arc<dyn EngagementStore>,
        clock: Arc<dyn Clock>,
        metrics: FeedMetrics,
        max_content_length: usize,
    ) -> Self {
        Self {
            store,
            clock,
            metrics,
            max_content_length,
        }
    }

    pub async fn create_post(&self, caller: Caller, input: PostInput) -> Result<Post> {
        let author_id = caller.require()?;
        validate_text("content", &input.content, self.max_content_length)?;

        let post = self
            .store
            .insert_post(NewPost {
                author_id,
                content: input.content,
                created_at: self.clock.now(),
            })
            .await?;

        info!("User {} created post {}", author_id, post.id);
        Ok(post)
    }

    /// Author-only edit; `created_at` is left as it was
    pub async fn update_post(&self, caller: Caller, post_id: PostId, input: PostInput) -> Result<Post> {
        let author_id = caller.require()?;
        validate_text("content", &input.content, self.max_content_length)?;

        let outcome = self
            .store
            .update_post_content(post_id, author_id, input.content)
            .await?;
        let post = owned(outcome, format!("post {}", post_id))?;

        info!("User {} edited post {}", author_id, post_id);
        Ok(post)
    }

    /// Author-only delete, taking the post's comments, likes and shares with it
    pub async fn delete_post(&self, caller: Caller, post_id: PostId) -> Result<()> {
        let author_id = caller.require()?;

        let outcome = self.store.delete_post(post_id, author_id).await?;
        owned(outcome, format!("post {}", post_id))?;

        info!("User {} deleted post {}", author_id, post_id);
        Ok(())
    }

    pub async fn create_comment(
        &self,
        caller: Caller,
        post_id: PostId,
        input: CommentInput,
    ) -> Result<Comment> {
        let author_id = caller.require()?;
        validate_text("text", &input.text, self.max_content_length)?;

        let comment = self
            .store
            .insert_comment(NewComment {
                post_id,
                author_id,
                text: input.text,
                created_at: self.clock.now(),
            })
            .await?
            .ok_or_else(|| SocialError::not_found(format!("post {}", post_id)))?;

        self.metrics.engagement_write(EngagementKind::Comment, true);
        info!("User {} commented on post {}", author_id, post_id);
        Ok(comment)
    }

    pub async fn delete_comment(&self, caller: Caller, comment_id: CommentId) -> Result<()> {
        let author_id = caller.require()?;

        let outcome = self.store.delete_comment(comment_id, author_id).await?;
        owned(outcome, format!("comment {}", comment_id))?;

        info!("User {} deleted comment {}", author_id, comment_id);
        Ok(())
    }

    /// Idempotent: a repeated like returns the original row with `created = false`
    pub async fn like_post(&self, caller: Caller, post_id: PostId) -> Result<Inserted<Like>> {
        let user_id = caller.require()?;

        let like = self
            .store
            .like_post(NewLike {
                post_id,
                user_id,
                created_at: self.clock.now(),
            })
            .await?
            .ok_or_else(|| SocialError::not_found(format!("post {}", post_id)))?;

        self.metrics.engagement_write(EngagementKind::Like, like.created);
        if like.created {
            info!("User {} liked post {}", user_id, post_id);
        } else {
            debug!("User {} already liked post {}", user_id, post_id);
        }
        Ok(like)
    }

    /// Idempotent: a repeated share returns the original row with `created = false`
    pub async fn share_post(&self, caller: Caller, post_id: PostId) -> Result<Inserted<Share>> {
        let user_id = caller.require()?;

        let share = self
            .store
            .share_post(NewShare {
                post_id,
                user_id,
                created_at: self.clock.now(),
            })
            .await?
            .ok_or_else(|| SocialError::not_found(format!("post {}", post_id)))?;

        self.metrics.engagement_write(EngagementKind::Share, share.created);
        if share.created {
            info!("User {} shared post {}", user_id, post_id);
        } else {
            debug!("User {} already shared post {}", user_id, post_id);
        }
        Ok(share)
    }
}
