// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::error::{ErrorKind, Result, SocialError};

/// Structured failure carried in every error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
}

/// Standard API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T> ApiResponse<T> {
    /// Create a success response with data
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(err: &SocialError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                kind: err.kind(),
                message: err.to_string(),
            }),
        }
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::AuthenticationRequired => StatusCode::UNAUTHORIZED,
        ErrorKind::Unauthorized => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::ConstraintViolation => StatusCode::CONFLICT,
        ErrorKind::ValidationError => StatusCode::BAD_REQUEST,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub type ApiReply<T> = (StatusCode, Json<ApiResponse<T>>);

pub fn error_reply<T>(err: SocialError) -> ApiReply<T> {
    let status = status_for(err.kind());
    if status.is_server_error() {
        error!("Request failed: {}", err);
    } else {
        warn!("Request rejected: {}", err);
    }
    (status, Json(ApiResponse::error(&err)))
}

/// Convert a result to an API response, using `status` on success
pub fn respond<T>(result: Result<T>, status: StatusCode) -> ApiReply<T> {
    match result {
        Ok(data) => (status, Json(ApiResponse::success(data))),
        Err(err) => error_reply(err),
    }
}

/// Pagination and ordering parameters
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub order_by: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TrendingParams {
    pub limit: Option<i64>,
}
