// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use axum::{extract::State, http::StatusCode, response::IntoResponse};

use crate::api::extract::{ApiJson, ApiPath};
use crate::api::routes::{error_reply, respond, ApiReply};
use crate::api::AppState;
use crate::auth::Caller;
use crate::error::Result;
use crate::models::engagement::CommentInput;
use crate::models::{CommentId, Inserted, PostId};

/// 201 when a row was written, 200 when an existing one was returned
fn get_or_create_reply<T>(result: Result<Inserted<T>>) -> ApiReply<Inserted<T>> {
    match result {
        Ok(inserted) => {
            let status = if inserted.created { StatusCode::CREATED } else { StatusCode::OK };
            respond(Ok(inserted), status)
        }
        Err(err) => error_reply(err),
    }
}

pub async fn create_comment(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(post_id): ApiPath<PostId>,
    ApiJson(input): ApiJson<CommentInput>,
) -> impl IntoResponse {
    respond(
        state.service.create_comment(caller, post_id, input).await,
        StatusCode::CREATED,
    )
}

pub async fn delete_comment(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(comment_id): ApiPath<CommentId>,
) -> impl IntoResponse {
    respond(state.service.delete_comment(caller, comment_id).await, StatusCode::OK)
}

pub async fn like_post(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(post_id): ApiPath<PostId>,
) -> impl IntoResponse {
    get_or_create_reply(state.service.like_post(caller, post_id).await)
}

pub async fn share_post(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(post_id): ApiPath<PostId>,
) -> impl IntoResponse {
    get_or_create_reply(state.service.share_post(caller, post_id).await)
}
