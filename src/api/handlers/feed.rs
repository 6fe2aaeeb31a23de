// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use axum::{extract::State, http::StatusCode, response::IntoResponse};

use crate::api::extract::ApiQuery;
use crate::api::routes::{respond, ListParams, TrendingParams};
use crate::api::AppState;
use crate::auth::Caller;

/// Posts by followed authors, newest first
pub async fn personalized_feed(
    State(state): State<AppState>,
    caller: Caller,
    ApiQuery(params): ApiQuery<ListParams>,
) -> impl IntoResponse {
    let result = state
        .feed
        .personalized_feed(caller, params.limit, params.offset)
        .await;
    respond(result, StatusCode::OK)
}

/// Posts by popularity, served from the trending cache while fresh
pub async fn trending_feed(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<TrendingParams>,
) -> impl IntoResponse {
    respond(state.feed.trending_feed(params.limit).await, StatusCode::OK)
}
