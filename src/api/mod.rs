// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

mod extract;
mod handlers;
pub mod routes;

use anyhow::Result;
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::clock::Clock;
use crate::config::{FeedConfig, ServerConfig};
use crate::feed::{Aggregator, FeedQueryEngine, TrendingCache};
use crate::metrics::FeedMetrics;
use crate::service::SocialService;
use crate::social_graph::SocialGraph;
use crate::store::EngagementStore;

pub use routes::{ApiError, ApiResponse};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub feed: FeedQueryEngine,
    pub service: SocialService,
    pub store: Arc<dyn EngagementStore>,
    pub metrics: FeedMetrics,
}

impl AppState {
    /// Wire the feed engine and mutation service over one store
    pub fn new(
        store: Arc<dyn EngagementStore>,
        graph: Arc<dyn SocialGraph>,
        cache: Arc<dyn TrendingCache>,
        clock: Arc<dyn Clock>,
        config: &FeedConfig,
    ) -> prometheus::Result<Self> {
        let metrics = FeedMetrics::new()?;
        let ttl = chrono::Duration::seconds(config.trending_cache_ttl_secs as i64);

        let feed = FeedQueryEngine::new(
            Aggregator::new(store.clone()),
            graph,
            cache,
            ttl,
            metrics.clone(),
        );
        let service = SocialService::new(
            store.clone(),
            clock,
            metrics.clone(),
            config.max_content_length,
        );

        Ok(Self {
            feed,
            service,
            store,
            metrics,
        })
    }
}

/// Build the router with all routes and middleware
pub fn router(state: AppState, enable_cors: bool) -> Router {
    let app = Router::new()
        // General routes
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::get_metrics))
        // Post routes
        .route(
            "/api/posts",
            get(handlers::posts::list_posts).post(handlers::posts::create_post),
        )
        .route(
            "/api/posts/:id",
            get(handlers::posts::get_post)
                .patch(handlers::posts::update_post)
                .delete(handlers::posts::delete_post),
        )
        // Engagement routes
        .route("/api/posts/:id/comments", post(handlers::engagement::create_comment))
        .route("/api/comments/:id", delete(handlers::engagement::delete_comment))
        .route("/api/posts/:id/like", post(handlers::engagement::like_post))
        .route("/api/posts/:id/share", post(handlers::engagement::share_post))
        // Feed routes
        .route("/api/feed/personalized", get(handlers::feed::personalized_feed))
        .route("/api/feed/trending", get(handlers::feed::trending_feed))
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        app
    }
}

/// Start the API server, stopping gracefully once `shutdown` resolves
pub async fn start_api_server<F>(state: AppState, config: &ServerConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(state, config.enable_cors);

    // Get bind address
    let addr = format!("{}:{}", config.host, config.port).parse::<SocketAddr>()?;

    // Start server
    info!("Starting API server on {}", addr);
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("API server stopped");
    Ok(())
}
