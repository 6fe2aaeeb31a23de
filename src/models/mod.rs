// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

pub mod post;
pub mod engagement;

pub use engagement::{
    Comment, EngagementCounts, EngagementKind, EngagementSnapshot, FeedPost, Inserted, Like,
    PostCounts, Share,
};
pub use post::{CommentId, Post, PostId, UserId};
