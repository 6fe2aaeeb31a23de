// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::posts;

pub type UserId = i32;
pub type PostId = i32;
pub type CommentId = i32;

/// A post as stored; `created_at` never changes after insert
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Post {
    pub id: PostId,
    pub author_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewPost {
    pub author_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Request body for creating or editing a post
#[derive(Debug, Clone, Deserialize)]
pub struct PostInput {
    pub content: String,
}
