// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use axum::{extract::State, http::StatusCode, response::IntoResponse};

use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::routes::{respond, ListParams};
use crate::api::AppState;
use crate::auth::Caller;
use crate::models::post::PostInput;
use crate::models::PostId;

/// List posts with pagination and ordering
pub async fn list_posts(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> impl IntoResponse {
    let result = state
        .feed
        .list_posts(params.limit, params.offset, params.order_by.as_deref())
        .await;
    respond(result, StatusCode::OK)
}

/// Get one post with its engagement counts
pub async fn get_post(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<PostId>,
) -> impl IntoResponse {
    respond(state.feed.get_post(id).await, StatusCode::OK)
}

pub async fn create_post(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(input): ApiJson<PostInput>,
) -> impl IntoResponse {
    respond(state.service.create_post(caller, input).await, StatusCode::CREATED)
}

pub async fn update_post(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<PostId>,
    ApiJson(input): ApiJson<PostInput>,
) -> impl IntoResponse {
    respond(state.service.update_post(caller, id, input).await, StatusCode::OK)
}

pub async fn delete_post(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(id): ApiPath<PostId>,
) -> impl IntoResponse {
    respond(state.service.delete_post(caller, id).await, StatusCode::OK)
}
