// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

//! Ordering, filtering and pagination for post queries.
//!
//! Every ordering ends in a total order over posts: the requested field first,
//! then `created_at`, then `id`. Equal scores or identical timestamps therefore
//! never make a page boundary depend on storage order.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SocialError};
use crate::models::{PostCounts, PostId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    Id,
    LikesCount,
    CommentsCount,
    SharesCount,
    PopularityScore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        }
    }
}

/// A caller-selected ordering such as `-created_at` or `popularity_score`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostOrder {
    pub field: SortField,
    pub direction: Direction,
}

impl PostOrder {
    /// Reverse-chronological, the default for every listing
    pub const NEWEST_FIRST: PostOrder = PostOrder {
        field: SortField::CreatedAt,
        direction: Direction::Desc,
    };

    /// Trending order
    pub const MOST_POPULAR: PostOrder = PostOrder {
        field: SortField::PopularityScore,
        direction: Direction::Desc,
    };

    pub const BY_ID: PostOrder = PostOrder {
        field: SortField::Id,
        direction: Direction::Asc,
    };

    /// Total order over posts with their counts
    pub fn compare(&self, a: &PostCounts, b: &PostCounts) -> Ordering {
        let newest_first = || {
            b.post
                .created_at
                .cmp(&a.post.created_at)
                .then_with(|| b.post.id.cmp(&a.post.id))
        };

        match self.field {
            SortField::CreatedAt => self.direction.apply(
                a.post
                    .created_at
                    .cmp(&b.post.created_at)
                    .then_with(|| a.post.id.cmp(&b.post.id)),
            ),
            SortField::Id => self.direction.apply(a.post.id.cmp(&b.post.id)),
            SortField::LikesCount => self
                .direction
                .apply(a.counts.likes.cmp(&b.counts.likes))
                .then_with(newest_first),
            SortField::CommentsCount => self
                .direction
                .apply(a.counts.comments.cmp(&b.counts.comments))
                .then_with(newest_first),
            SortField::SharesCount => self
                .direction
                .apply(a.counts.shares.cmp(&b.counts.shares))
                .then_with(newest_first),
            SortField::PopularityScore => self
                .direction
                .apply(a.counts.popularity_score().cmp(&b.counts.popularity_score()))
                .then_with(newest_first),
        }
    }

    pub fn sort(&self, rows: &mut [PostCounts]) {
        rows.sort_by(|a, b| self.compare(a, b));
    }

    /// ORDER BY clause matching [`PostOrder::compare`]. Refers to the
    /// `p` alias for posts and the count aliases of the feed query.
    pub fn sql(&self) -> &'static str {
        use Direction::*;
        use SortField::*;

        match (self.field, self.direction) {
            (CreatedAt, Asc) => "p.created_at ASC, p.id ASC",
            (CreatedAt, Desc) => "p.created_at DESC, p.id DESC",
            (Id, Asc) => "p.id ASC",
            (Id, Desc) => "p.id DESC",
            (LikesCount, Asc) => "likes_count ASC, p.created_at DESC, p.id DESC",
            (LikesCount, Desc) => "likes_count DESC, p.created_at DESC, p.id DESC",
            (CommentsCount, Asc) => "comments_count ASC, p.created_at DESC, p.id DESC",
            (CommentsCount, Desc) => "comments_count DESC, p.created_at DESC, p.id DESC",
            (SharesCount, Asc) => "shares_count ASC, p.created_at DESC, p.id DESC",
            (SharesCount, Desc) => "shares_count DESC, p.created_at DESC, p.id DESC",
            (PopularityScore, Asc) => "popularity_score ASC, p.created_at DESC, p.id DESC",
            (PopularityScore, Desc) => "popularity_score DESC, p.created_at DESC, p.id DESC",
        }
    }
}

impl Default for PostOrder {
    fn default() -> Self {
        PostOrder::NEWEST_FIRST
    }
}

impl FromStr for PostOrder {
    type Err = SocialError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (direction, name) = match s.strip_prefix('-') {
            Some(rest) => (Direction::Desc, rest),
            None => (Direction::Asc, s.strip_prefix('+').unwrap_or(s)),
        };

        let field = match name {
            "created_at" => SortField::CreatedAt,
            "id" => SortField::Id,
            "likes_count" => SortField::LikesCount,
            "comments_count" => SortField::CommentsCount,
            "shares_count" => SortField::SharesCount,
            "popularity_score" => SortField::PopularityScore,
            _ => {
                return Err(SocialError::validation(format!(
                    "cannot order posts by {:?}",
                    s
                )))
            }
        };

        Ok(PostOrder { field, direction })
    }
}

impl fmt::Display for PostOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.field {
            SortField::CreatedAt => "created_at",
            SortField::Id => "id",
            SortField::LikesCount => "likes_count",
            SortField::CommentsCount => "comments_count",
            SortField::SharesCount => "shares_count",
            SortField::PopularityScore => "popularity_score",
        };
        match self.direction {
            Direction::Asc => f.write_str(name),
            Direction::Desc => write!(f, "-{}", name),
        }
    }
}

/// Offset/limit window applied after ordering.
///
/// No limit means "everything from `offset` on"; a limit of zero is an
/// empty page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    limit: Option<i64>,
    offset: i64,
}

impl Page {
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Result<Self> {
        if let Some(limit) = limit {
            if limit < 0 {
                return Err(SocialError::validation("limit must not be negative"));
            }
        }
        let offset = offset.unwrap_or(0);
        if offset < 0 {
            return Err(SocialError::validation("offset must not be negative"));
        }
        Ok(Self { limit, offset })
    }

    pub fn all() -> Self {
        Self::default()
    }

    pub fn limit(&self) -> Option<i64> {
        self.limit
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let skipped = items.into_iter().skip(self.offset as usize);
        match self.limit {
            Some(limit) => skipped.take(limit as usize).collect(),
            None => skipped.collect(),
        }
    }
}

/// Which posts a query covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Authors(Vec<UserId>),
    Ids(Vec<PostId>),
}

impl PostFilter {
    pub fn matches(&self, row: &PostCounts) -> bool {
        match self {
            PostFilter::All => true,
            PostFilter::Authors(authors) => authors.contains(&row.post.author_id),
            PostFilter::Ids(ids) => ids.contains(&row.post.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostQuery {
    pub filter: PostFilter,
    pub order: PostOrder,
    pub page: Page,
}

impl PostQuery {
    pub fn new(filter: PostFilter, order: PostOrder, page: Page) -> Self {
        Self { filter, order, page }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EngagementCounts, Post};
    use chrono::{Duration, TimeZone, Utc};

    fn row(id: PostId, minute: i64, counts: (i64, i64, i64)) -> PostCounts {
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        PostCounts {
            post: Post {
                id,
                author_id: 1,
                content: format!("post {}", id),
                created_at: base + Duration::minutes(minute),
            },
            counts: EngagementCounts::new(counts.0, counts.1, counts.2),
        }
    }

    fn ids(rows: &[PostCounts]) -> Vec<PostId> {
        rows.iter().map(|r| r.post.id).collect()
    }

    #[test]
    fn parses_django_style_order_names() {
        assert_eq!("-created_at".parse::<PostOrder>().unwrap(), PostOrder::NEWEST_FIRST);
        assert_eq!("-popularity_score".parse::<PostOrder>().unwrap(), PostOrder::MOST_POPULAR);
        assert_eq!(
            "likes_count".parse::<PostOrder>().unwrap(),
            PostOrder { field: SortField::LikesCount, direction: Direction::Asc }
        );
        assert_eq!(PostOrder::default().to_string(), "-created_at");
    }

    #[test]
    fn rejects_unknown_order_fields() {
        let err = "author__username".parse::<PostOrder>().unwrap_err();
        assert!(matches!(err, SocialError::ValidationError(_)));
    }

    #[test]
    fn newest_first_breaks_timestamp_ties_by_id() {
        let mut rows = vec![row(1, 0, (0, 0, 0)), row(3, 5, (0, 0, 0)), row(2, 5, (0, 0, 0))];
        PostOrder::NEWEST_FIRST.sort(&mut rows);
        assert_eq!(ids(&rows), vec![3, 2, 1]);
    }

    #[test]
    fn popularity_ties_fall_back_to_recency_then_id() {
        let mut rows = vec![
            row(1, 0, (6, 0, 0)),   // 6
            row(2, 10, (0, 0, 2)),  // 6, newer
            row(3, 10, (0, 3, 0)),  // 6, same time as 2, higher id
            row(4, 20, (1, 0, 0)),  // 1
        ];
        PostOrder::MOST_POPULAR.sort(&mut rows);
        assert_eq!(ids(&rows), vec![3, 2, 1, 4]);
    }

    #[test]
    fn ascending_counts_keep_newest_first_tiebreak() {
        let order: PostOrder = "comments_count".parse().unwrap();
        let mut rows = vec![row(1, 0, (0, 1, 0)), row(2, 1, (0, 0, 0)), row(3, 2, (0, 0, 0))];
        order.sort(&mut rows);
        assert_eq!(ids(&rows), vec![3, 2, 1]);
    }

    #[test]
    fn page_applies_offset_then_limit() {
        let items: Vec<i32> = (1..=10).collect();

        assert_eq!(Page::all().apply(items.clone()), items);
        assert_eq!(Page::new(Some(3), None).unwrap().apply(items.clone()), vec![1, 2, 3]);
        assert_eq!(Page::new(None, Some(8)).unwrap().apply(items.clone()), vec![9, 10]);
        assert_eq!(Page::new(Some(2), Some(4)).unwrap().apply(items.clone()), vec![5, 6]);
        assert!(Page::new(Some(0), None).unwrap().apply(items.clone()).is_empty());
        assert!(Page::new(None, Some(50)).unwrap().apply(items).is_empty());
    }

    #[test]
    fn page_rejects_negative_bounds() {
        assert!(Page::new(Some(-1), None).is_err());
        assert!(Page::new(None, Some(-5)).is_err());
    }
}
