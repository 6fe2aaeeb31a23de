// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::debug;

use super::{EngagementStore, Ownership};
use crate::error::Result;
use crate::feed::ordering::PostQuery;
use crate::models::engagement::{NewComment, NewLike, NewShare};
use crate::models::post::NewPost;
use crate::models::{
    Comment, CommentId, EngagementCounts, Inserted, Like, Post, PostCounts, PostId, Share, UserId,
};

#[derive(Debug, Default)]
struct Tables {
    last_post_id: PostId,
    last_comment_id: CommentId,
    last_like_id: i32,
    last_share_id: i32,
    posts: BTreeMap<PostId, Post>,
    comments: BTreeMap<CommentId, Comment>,
    likes: HashMap<(PostId, UserId), Like>,
    shares: HashMap<(PostId, UserId), Share>,
}

impl Tables {
    /// Grouped counts over every engagement table in one pass each
    fn counts(&self) -> HashMap<PostId, EngagementCounts> {
        let mut counts: HashMap<PostId, EngagementCounts> = HashMap::new();
        for (post_id, _) in self.likes.keys() {
            counts.entry(*post_id).or_default().likes += 1;
        }
        for comment in self.comments.values() {
            counts.entry(comment.post_id).or_default().comments += 1;
        }
        for (post_id, _) in self.shares.keys() {
            counts.entry(*post_id).or_default().shares += 1;
        }
        counts
    }
}

/// Engagement store kept in process memory.
///
/// Every operation runs under one lock acquisition, which gives the same
/// atomicity the Postgres store gets from its transactions: uniqueness and
/// cascade rules are applied while no other writer can interleave.
#[derive(Debug, Default)]
pub struct InMemoryEngagementStore {
    tables: RwLock<Tables>,
}

impl InMemoryEngagementStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EngagementStore for InMemoryEngagementStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn insert_post(&self, post: NewPost) -> Result<Post> {
        let mut tables = self.tables.write().await;
        tables.last_post_id += 1;
        let post = Post {
            id: tables.last_post_id,
            author_id: post.author_id,
            content: post.content,
            created_at: post.created_at,
        };
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update_post_content(
        &self,
        post_id: PostId,
        author_id: UserId,
        content: String,
    ) -> Result<Ownership<Post>> {
        let mut tables = self.tables.write().await;
        let Some(post) = tables.posts.get_mut(&post_id) else {
            return Ok(Ownership::Missing);
        };
        if post.author_id != author_id {
            return Ok(Ownership::Forbidden);
        }
        post.content = content;
        Ok(Ownership::Applied(post.clone()))
    }

    async fn delete_post(&self, post_id: PostId, author_id: UserId) -> Result<Ownership<()>> {
        let mut tables = self.tables.write().await;
        match tables.posts.get(&post_id) {
            None => return Ok(Ownership::Missing),
            Some(post) if post.author_id != author_id => return Ok(Ownership::Forbidden),
            Some(_) => {}
        }

        tables.posts.remove(&post_id);
        tables.comments.retain(|_, c| c.post_id != post_id);
        tables.likes.retain(|(p, _), _| *p != post_id);
        tables.shares.retain(|(p, _), _| *p != post_id);
        debug!("Deleted post {} and its engagement", post_id);
        Ok(Ownership::Applied(()))
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<Option<Comment>> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&comment.post_id) {
            return Ok(None);
        }
        tables.last_comment_id += 1;
        let comment = Comment {
            id: tables.last_comment_id,
            post_id: comment.post_id,
            author_id: comment.author_id,
            text: comment.text,
            created_at: comment.created_at,
        };
        tables.comments.insert(comment.id, comment.clone());
        Ok(Some(comment))
    }

    async fn delete_comment(
        &self,
        comment_id: CommentId,
        author_id: UserId,
    ) -> Result<Ownership<()>> {
        let mut tables = self.tables.write().await;
        match tables.comments.get(&comment_id) {
            None => Ok(Ownership::Missing),
            Some(comment) if comment.author_id != author_id => Ok(Ownership::Forbidden),
            Some(_) => {
                tables.comments.remove(&comment_id);
                Ok(Ownership::Applied(()))
            }
        }
    }

    async fn like_post(&self, like: NewLike) -> Result<Option<Inserted<Like>>> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&like.post_id) {
            return Ok(None);
        }
        let key = (like.post_id, like.user_id);
        if let Some(existing) = tables.likes.get(&key) {
            return Ok(Some(Inserted::existing(existing.clone())));
        }
        tables.last_like_id += 1;
        let like = Like {
            id: tables.last_like_id,
            post_id: like.post_id,
            user_id: like.user_id,
            created_at: like.created_at,
        };
        tables.likes.insert(key, like.clone());
        Ok(Some(Inserted::created(like)))
    }

    async fn share_post(&self, share: NewShare) -> Result<Option<Inserted<Share>>> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&share.post_id) {
            return Ok(None);
        }
        let key = (share.post_id, share.user_id);
        if let Some(existing) = tables.shares.get(&key) {
            return Ok(Some(Inserted::existing(existing.clone())));
        }
        tables.last_share_id += 1;
        let share = Share {
            id: tables.last_share_id,
            post_id: share.post_id,
            user_id: share.user_id,
            created_at: share.created_at,
        };
        tables.shares.insert(key, share.clone());
        Ok(Some(Inserted::created(share)))
    }

    async fn query_posts(&self, query: &PostQuery) -> Result<Vec<PostCounts>> {
        let tables = self.tables.read().await;
        let counts = tables.counts();

        let mut rows: Vec<PostCounts> = tables
            .posts
            .values()
            .map(|post| PostCounts {
                post: post.clone(),
                counts: counts.get(&post.id).copied().unwrap_or_default(),
            })
            .filter(|row| query.filter.matches(row))
            .collect();
        drop(tables);

        query.order.sort(&mut rows);
        Ok(query.page.apply(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::ordering::{Page, PostFilter, PostOrder};
    use chrono::Utc;
    use std::sync::Arc;

    async fn seed_post(store: &InMemoryEngagementStore, author_id: UserId) -> Post {
        store
            .insert_post(NewPost {
                author_id,
                content: "Hello".to_string(),
                created_at: Utc::now(),
            })
            .await
            .unwrap()
    }

    fn like(post_id: PostId, user_id: UserId) -> NewLike {
        NewLike { post_id, user_id, created_at: Utc::now() }
    }

    fn all_posts() -> PostQuery {
        PostQuery::new(PostFilter::All, PostOrder::NEWEST_FIRST, Page::all())
    }

    #[tokio::test]
    async fn repeated_like_returns_existing_row() {
        let store = InMemoryEngagementStore::new();
        let post = seed_post(&store, 1).await;

        let first = store.like_post(like(post.id, 2)).await.unwrap().unwrap();
        let second = store.like_post(like(post.id, 2)).await.unwrap().unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.record.id, second.record.id);

        let rows = store.query_posts(&all_posts()).await.unwrap();
        assert_eq!(rows[0].counts.likes, 1);
    }

    #[tokio::test]
    async fn concurrent_likes_by_one_user_create_one_row() {
        let store = Arc::new(InMemoryEngagementStore::new());
        let post_id = seed_post(&store, 1).await.id;

        let attempts = (0..16).map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.like_post(like(post_id, 7)).await })
        });
        let outcomes: Vec<Inserted<Like>> = futures::future::join_all(attempts)
            .await
            .into_iter()
            .map(|joined| joined.unwrap().unwrap().unwrap())
            .collect();

        assert_eq!(outcomes.iter().filter(|o| o.created).count(), 1);
        let first_id = outcomes[0].record.id;
        assert!(outcomes.iter().all(|o| o.record.id == first_id));
    }

    #[tokio::test]
    async fn engagement_on_missing_post_is_rejected() {
        let store = InMemoryEngagementStore::new();

        assert!(store.like_post(like(42, 1)).await.unwrap().is_none());
        let comment = NewComment {
            post_id: 42,
            author_id: 1,
            text: "hi".to_string(),
            created_at: Utc::now(),
        };
        assert!(store.insert_comment(comment).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deleting_post_cascades_to_engagement() {
        let store = InMemoryEngagementStore::new();
        let kept = seed_post(&store, 1).await;
        let doomed = seed_post(&store, 1).await;

        for post_id in [kept.id, doomed.id] {
            store.like_post(like(post_id, 2)).await.unwrap();
            store
                .share_post(NewShare { post_id, user_id: 2, created_at: Utc::now() })
                .await
                .unwrap();
            store
                .insert_comment(NewComment {
                    post_id,
                    author_id: 2,
                    text: "Nice!".to_string(),
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }

        assert_eq!(store.delete_post(doomed.id, 1).await.unwrap(), Ownership::Applied(()));

        let rows = store.query_posts(&all_posts()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].post.id, kept.id);
        assert_eq!(rows[0].counts, EngagementCounts::new(1, 1, 1));

        let tables = store.tables.read().await;
        assert!(tables.comments.values().all(|c| c.post_id == kept.id));
        assert!(tables.likes.keys().all(|(p, _)| *p == kept.id));
        assert!(tables.shares.keys().all(|(p, _)| *p == kept.id));
    }

    #[tokio::test]
    async fn only_the_author_may_edit_or_delete() {
        let store = InMemoryEngagementStore::new();
        let post = seed_post(&store, 1).await;

        assert_eq!(
            store.update_post_content(post.id, 2, "hijack".into()).await.unwrap(),
            Ownership::Forbidden
        );
        assert_eq!(store.delete_post(post.id, 2).await.unwrap(), Ownership::Forbidden);
        assert_eq!(store.delete_post(999, 1).await.unwrap(), Ownership::Missing);

        match store.update_post_content(post.id, 1, "edited".into()).await.unwrap() {
            Ownership::Applied(updated) => {
                assert_eq!(updated.content, "edited");
                assert_eq!(updated.created_at, post.created_at);
            }
            other => panic!("expected update to apply, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn query_filters_by_author_and_ids() {
        let store = InMemoryEngagementStore::new();
        let a = seed_post(&store, 1).await;
        let b = seed_post(&store, 2).await;
        let c = seed_post(&store, 3).await;

        let by_authors = PostQuery::new(
            PostFilter::Authors(vec![1, 3]),
            PostOrder::BY_ID,
            Page::all(),
        );
        let rows = store.query_posts(&by_authors).await.unwrap();
        assert_eq!(rows.iter().map(|r| r.post.id).collect::<Vec<_>>(), vec![a.id, c.id]);

        let by_ids = PostQuery::new(PostFilter::Ids(vec![b.id, 77]), PostOrder::BY_ID, Page::all());
        let rows = store.query_posts(&by_ids).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].post.id, b.id);
    }
}
