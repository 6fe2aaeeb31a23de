// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{Array, BigInt, Integer, Nullable, Text, Timestamptz};
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::RunQueryDsl;
use std::sync::Arc;
use tracing::debug;

use super::{EngagementStore, Ownership};
use crate::db::{Database, DbConnection};
use crate::error::{Result, SocialError};
use crate::feed::ordering::{PostFilter, PostOrder, PostQuery};
use crate::models::engagement::{
    NewComment, NewLike, NewShare, COMMENT_WEIGHT, LIKE_WEIGHT, SHARE_WEIGHT,
};
use crate::models::post::NewPost;
use crate::models::{
    Comment, CommentId, EngagementCounts, Inserted, Like, Post, PostCounts, PostId, Share, UserId,
};
use crate::schema::{comments, likes, posts, shares};

/// Row shape of the feed query
#[derive(Debug, QueryableByName)]
struct PostCountsRow {
    #[diesel(sql_type = Integer)]
    id: i32,
    #[diesel(sql_type = Integer)]
    author_id: i32,
    #[diesel(sql_type = Text)]
    content: String,
    #[diesel(sql_type = Timestamptz)]
    created_at: DateTime<Utc>,
    #[diesel(sql_type = BigInt)]
    likes_count: i64,
    #[diesel(sql_type = BigInt)]
    comments_count: i64,
    #[diesel(sql_type = BigInt)]
    shares_count: i64,
}

impl From<PostCountsRow> for PostCounts {
    fn from(row: PostCountsRow) -> Self {
        PostCounts {
            post: Post {
                id: row.id,
                author_id: row.author_id,
                content: row.content,
                created_at: row.created_at,
            },
            counts: EngagementCounts::new(row.likes_count, row.comments_count, row.shares_count),
        }
    }
}

/// Posts joined with one grouped count per engagement table. Being a single
/// statement, it reads every table from the same snapshot.
///
/// Binds: $1 author ids, $2 post ids (both nullable = no filter),
/// $3 limit (nullable = no limit), $4 offset.
fn feed_sql(order: PostOrder) -> String {
    format!(
        "SELECT p.id, p.author_id, p.content, p.created_at,
                COALESCE(l.total, 0) AS likes_count,
                COALESCE(c.total, 0) AS comments_count,
                COALESCE(s.total, 0) AS shares_count,
                COALESCE(l.total, 0) * {like_weight}
                    + COALESCE(c.total, 0) * {comment_weight}
                    + COALESCE(s.total, 0) * {share_weight} AS popularity_score
         FROM posts p
         LEFT JOIN (SELECT post_id, COUNT(*) AS total FROM likes GROUP BY post_id) l
                ON l.post_id = p.id
         LEFT JOIN (SELECT post_id, COUNT(*) AS total FROM comments GROUP BY post_id) c
                ON c.post_id = p.id
         LEFT JOIN (SELECT post_id, COUNT(*) AS total FROM shares GROUP BY post_id) s
                ON s.post_id = p.id
         WHERE ($1::int4[] IS NULL OR p.author_id = ANY($1))
           AND ($2::int4[] IS NULL OR p.id = ANY($2))
         ORDER BY {order}
         LIMIT $3 OFFSET $4",
        like_weight = LIKE_WEIGHT,
        comment_weight = COMMENT_WEIGHT,
        share_weight = SHARE_WEIGHT,
        order = order.sql(),
    )
}

/// Engagement store backed by PostgreSQL
pub struct PgEngagementStore {
    db: Arc<Database>,
}

impl PgEngagementStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Get a database connection from the pool
    async fn get_connection(&self) -> Result<DbConnection> {
        Ok(self.db.get_connection().await?)
    }
}

#[async_trait]
impl EngagementStore for PgEngagementStore {
    async fn ping(&self) -> Result<()> {
        let mut conn = self.get_connection().await?;
        diesel::sql_query("SELECT 1").execute(&mut conn).await?;
        Ok(())
    }

    async fn insert_post(&self, post: NewPost) -> Result<Post> {
        let mut conn = self.get_connection().await?;

        let post = diesel::insert_into(posts::table)
            .values(&post)
            .returning(Post::as_returning())
            .get_result(&mut conn)
            .await?;

        Ok(post)
    }

    async fn update_post_content(
        &self,
        post_id: PostId,
        author_id: UserId,
        content: String,
    ) -> Result<Ownership<Post>> {
        let mut conn = self.get_connection().await?;

        conn.build_transaction()
            .read_committed()
            .run(move |conn| {
                async move {
                    // Lock the row so ownership cannot change under us
                    let owner = posts::table
                        .find(post_id)
                        .select(posts::author_id)
                        .for_update()
                        .first::<UserId>(conn)
                        .await
                        .optional()?;

                    let outcome = match owner {
                        None => Ownership::Missing,
                        Some(owner) if owner != author_id => Ownership::Forbidden,
                        Some(_) => {
                            let post = diesel::update(posts::table.find(post_id))
                                .set(posts::content.eq(content))
                                .returning(Post::as_returning())
                                .get_result(conn)
                                .await?;
                            Ownership::Applied(post)
                        }
                    };
                    Ok::<_, SocialError>(outcome)
                }
                .scope_boxed()
            })
            .await
    }

    async fn delete_post(&self, post_id: PostId, author_id: UserId) -> Result<Ownership<()>> {
        let mut conn = self.get_connection().await?;

        conn.build_transaction()
            .read_committed()
            .run(move |conn| {
                async move {
                    let owner = posts::table
                        .find(post_id)
                        .select(posts::author_id)
                        .for_update()
                        .first::<UserId>(conn)
                        .await
                        .optional()?;

                    let outcome = match owner {
                        None => Ownership::Missing,
                        Some(owner) if owner != author_id => Ownership::Forbidden,
                        Some(_) => {
                            // Comments, likes and shares go with it via ON DELETE CASCADE
                            diesel::delete(posts::table.find(post_id))
                                .execute(conn)
                                .await?;
                            debug!("Deleted post {} and its engagement", post_id);
                            Ownership::Applied(())
                        }
                    };
                    Ok::<_, SocialError>(outcome)
                }
                .scope_boxed()
            })
            .await
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<Option<Comment>> {
        let mut conn = self.get_connection().await?;

        conn.build_transaction()
            .read_committed()
            .run(move |conn| {
                async move {
                    // Key-share lock keeps the post from being deleted until we commit
                    let post = posts::table
                        .find(comment.post_id)
                        .select(posts::id)
                        .for_key_share()
                        .first::<PostId>(conn)
                        .await
                        .optional()?;
                    if post.is_none() {
                        return Ok(None);
                    }

                    let comment = diesel::insert_into(comments::table)
                        .values(&comment)
                        .returning(Comment::as_returning())
                        .get_result(conn)
                        .await?;
                    Ok::<_, SocialError>(Some(comment))
                }
                .scope_boxed()
            })
            .await
    }

    async fn delete_comment(
        &self,
        comment_id: CommentId,
        author_id: UserId,
    ) -> Result<Ownership<()>> {
        let mut conn = self.get_connection().await?;

        conn.build_transaction()
            .read_committed()
            .run(move |conn| {
                async move {
                    let owner = comments::table
                        .find(comment_id)
                        .select(comments::author_id)
                        .for_update()
                        .first::<UserId>(conn)
                        .await
                        .optional()?;

                    let outcome = match owner {
                        None => Ownership::Missing,
                        Some(owner) if owner != author_id => Ownership::Forbidden,
                        Some(_) => {
                            diesel::delete(comments::table.find(comment_id))
                                .execute(conn)
                                .await?;
                            Ownership::Applied(())
                        }
                    };
                    Ok::<_, SocialError>(outcome)
                }
                .scope_boxed()
            })
            .await
    }

    async fn like_post(&self, like: NewLike) -> Result<Option<Inserted<Like>>> {
        let mut conn = self.get_connection().await?;

        conn.build_transaction()
            .read_committed()
            .run(move |conn| {
                async move {
                    let post = posts::table
                        .find(like.post_id)
                        .select(posts::id)
                        .for_key_share()
                        .first::<PostId>(conn)
                        .await
                        .optional()?;
                    if post.is_none() {
                        return Ok(None);
                    }

                    // The unique (post_id, user_id) constraint decides who wins a race;
                    // losers fall through to reading the winner's row.
                    let inserted = diesel::insert_into(likes::table)
                        .values(&like)
                        .on_conflict((likes::post_id, likes::user_id))
                        .do_nothing()
                        .returning(Like::as_returning())
                        .get_result(conn)
                        .await
                        .optional()?;

                    let outcome = match inserted {
                        Some(row) => Inserted::created(row),
                        None => {
                            let existing = likes::table
                                .filter(likes::post_id.eq(like.post_id))
                                .filter(likes::user_id.eq(like.user_id))
                                .select(Like::as_select())
                                .first(conn)
                                .await?;
                            Inserted::existing(existing)
                        }
                    };
                    Ok::<_, SocialError>(Some(outcome))
                }
                .scope_boxed()
            })
            .await
    }

    async fn share_post(&self, share: NewShare) -> Result<Option<Inserted<Share>>> {
        let mut conn = self.get_connection().await?;

        conn.build_transaction()
            .read_committed()
            .run(move |conn| {
                async move {
                    let post = posts::table
                        .find(share.post_id)
                        .select(posts::id)
                        .for_key_share()
                        .first::<PostId>(conn)
                        .await
                        .optional()?;
                    if post.is_none() {
                        return Ok(None);
                    }

                    let inserted = diesel::insert_into(shares::table)
                        .values(&share)
                        .on_conflict((shares::post_id, shares::user_id))
                        .do_nothing()
                        .returning(Share::as_returning())
                        .get_result(conn)
                        .await
                        .optional()?;

                    let outcome = match inserted {
                        Some(row) => Inserted::created(row),
                        None => {
                            let existing = shares::table
                                .filter(shares::post_id.eq(share.post_id))
                                .filter(shares::user_id.eq(share.user_id))
                                .select(Share::as_select())
                                .first(conn)
                                .await?;
                            Inserted::existing(existing)
                        }
                    };
                    Ok::<_, SocialError>(Some(outcome))
                }
                .scope_boxed()
            })
            .await
    }

    async fn query_posts(&self, query: &PostQuery) -> Result<Vec<PostCounts>> {
        let mut conn = self.get_connection().await?;

        let (authors, ids) = match &query.filter {
            PostFilter::All => (None, None),
            PostFilter::Authors(authors) => (Some(authors.clone()), None),
            PostFilter::Ids(ids) => (None, Some(ids.clone())),
        };

        debug!(
            "Querying posts: filter={:?}, order={}, limit={:?}, offset={}",
            query.filter,
            query.order,
            query.page.limit(),
            query.page.offset()
        );

        let rows = diesel::sql_query(feed_sql(query.order))
            .bind::<Nullable<Array<Integer>>, _>(authors)
            .bind::<Nullable<Array<Integer>>, _>(ids)
            .bind::<Nullable<BigInt>, _>(query.page.limit())
            .bind::<BigInt, _>(query.page.offset())
            .load::<PostCountsRow>(&mut conn)
            .await?;

        Ok(rows.into_iter().map(PostCounts::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::feed::ordering::Page;
    use crate::schema::users;
    use futures::future::join_all;

    #[test]
    fn feed_sql_orders_and_weights_consistently() {
        let sql = feed_sql(PostOrder::MOST_POPULAR);
        assert!(sql.contains("ORDER BY popularity_score DESC, p.created_at DESC, p.id DESC"));
        assert!(sql.contains("COALESCE(l.total, 0) * 1"));
        assert!(sql.contains("COALESCE(c.total, 0) * 2"));
        assert!(sql.contains("COALESCE(s.total, 0) * 3"));
        assert!(sql.contains("LIMIT $3 OFFSET $4"));
    }

    #[test]
    fn feed_sql_defaults_to_newest_first() {
        let sql = feed_sql(PostOrder::default());
        assert!(sql.contains("ORDER BY p.created_at DESC, p.id DESC"));
    }

    async fn seed_user(store: &PgEngagementStore, username: String) -> UserId {
        let mut conn = store.get_connection().await.unwrap();
        diesel::insert_into(users::table)
            .values(users::username.eq(username))
            .returning(users::id)
            .get_result(&mut conn)
            .await
            .unwrap()
    }

    /// Runs against a disposable database named by `TEST_DATABASE_URL`:
    /// `cargo test -- --ignored racing_likes_and_shares`
    #[tokio::test]
    #[ignore]
    async fn racing_likes_and_shares_keep_one_row_each() {
        let url = match std::env::var("TEST_DATABASE_URL") {
            Ok(url) => url,
            Err(_) => return,
        };
        let db = Database::new(&DatabaseConfig { url, max_connections: 8 }).await.unwrap();
        let store = PgEngagementStore::new(Arc::new(db));

        let suffix = Utc::now().timestamp_micros();
        let author = seed_user(&store, format!("race_author_{}", suffix)).await;
        let fan = seed_user(&store, format!("race_fan_{}", suffix)).await;
        let post = store
            .insert_post(NewPost {
                author_id: author,
                content: "contested".to_string(),
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let like = NewLike { post_id: post.id, user_id: fan, created_at: Utc::now() };
        let likes: Vec<Inserted<Like>> =
            join_all((0..8).map(|_| store.like_post(like.clone())))
                .await
                .into_iter()
                .map(|outcome| outcome.unwrap().unwrap())
                .collect();
        assert_eq!(likes.iter().filter(|l| l.created).count(), 1);
        assert!(likes.iter().all(|l| l.record.id == likes[0].record.id));

        let share = NewShare { post_id: post.id, user_id: fan, created_at: Utc::now() };
        let shares: Vec<Inserted<Share>> =
            join_all((0..8).map(|_| store.share_post(share.clone())))
                .await
                .into_iter()
                .map(|outcome| outcome.unwrap().unwrap())
                .collect();
        assert_eq!(shares.iter().filter(|s| s.created).count(), 1);
        assert!(shares.iter().all(|s| s.record.id == shares[0].record.id));

        let query = PostQuery::new(PostFilter::Ids(vec![post.id]), PostOrder::BY_ID, Page::all());
        let rows = store.query_posts(&query).await.unwrap();
        assert_eq!(rows[0].counts, EngagementCounts { likes: 1, comments: 0, shares: 1 });

        let mut conn = store.get_connection().await.unwrap();
        diesel::delete(users::table.filter(users::id.eq_any(vec![author, fan])))
            .execute(&mut conn)
            .await
            .unwrap();
    }
}
