// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

// Import diesel table macros
use diesel::{allow_tables_to_appear_in_same_query, joinable, table};

// Users are owned by the account service; we only reference them
table! {
    users (id) {
        id -> Integer,
        username -> Varchar,
        created_at -> Timestamptz,
    }
}

// Follow graph, owned by the account service
table! {
    follows (id) {
        id -> Integer,
        follower_id -> Integer,
        following_id -> Integer,
        created_at -> Timestamptz,
    }
}

table! {
    posts (id) {
        id -> Integer,
        author_id -> Integer,
        content -> Text,
        created_at -> Timestamptz,
    }
}

table! {
    comments (id) {
        id -> Integer,
        post_id -> Integer,
        author_id -> Integer,
        text -> Text,
        created_at -> Timestamptz,
    }
}

table! {
    likes (id) {
        id -> Integer,
        post_id -> Integer,
        user_id -> Integer,
        created_at -> Timestamptz,
    }
}

table! {
    shares (id) {
        id -> Integer,
        post_id -> Integer,
        user_id -> Integer,
        created_at -> Timestamptz,
    }
}

joinable!(posts -> users (author_id));
joinable!(comments -> posts (post_id));
joinable!(likes -> posts (post_id));
joinable!(shares -> posts (post_id));

allow_tables_to_appear_in_same_query!(
    users,
    follows,
    posts,
    comments,
    likes,
    shares,
);
