// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Path, Query,
    },
    http::{request::Parts, Request},
    Json,
};
use serde::de::DeserializeOwned;

use super::routes::{error_reply, ApiReply};
use crate::auth::{Caller, USER_ID_HEADER};
use crate::error::SocialError;

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiReply<()>;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = match parts.headers.get(USER_ID_HEADER) {
            None => None,
            Some(value) => Some(value.to_str().map_err(|_| {
                error_reply(SocialError::validation(format!(
                    "invalid {} header",
                    USER_ID_HEADER
                )))
            })?),
        };

        Caller::from_header(raw).map_err(error_reply)
    }
}

/// `Query` whose rejection is a `ValidationError` envelope
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiReply<()>;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| ApiQuery(value))
            .map_err(|rejection: QueryRejection| {
                error_reply(SocialError::validation(rejection.body_text()))
            })
    }
}

/// `Path` whose rejection is a `ValidationError` envelope
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiReply<()>;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(value)| ApiPath(value))
            .map_err(|rejection: PathRejection| {
                error_reply(SocialError::validation(rejection.body_text()))
            })
    }
}

/// JSON body whose rejection is a `ValidationError` envelope
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, B, T> FromRequest<S, B> for ApiJson<T>
where
    Json<T>: FromRequest<S, B, Rejection = JsonRejection>,
    S: Send + Sync,
    B: Send + 'static,
{
    type Rejection = ApiReply<()>;

    async fn from_request(req: Request<B>, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| ApiJson(value))
            .map_err(|rejection| error_reply(SocialError::validation(rejection.body_text())))
    }
}
