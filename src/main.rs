// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use dotenv::dotenv;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mys_social_feed::api::{self, AppState};
use mys_social_feed::clock::{Clock, SystemClock};
use mys_social_feed::config::{Config, StorageBackend};
use mys_social_feed::db::init_database;
use mys_social_feed::feed::MemoryTrendingCache;
use mys_social_feed::social_graph::{InMemorySocialGraph, PgSocialGraph, SocialGraph};
use mys_social_feed::store::{EngagementStore, InMemoryEngagementStore, PgEngagementStore};

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received, initiating graceful shutdown"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if present
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,mys_social_feed=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::init()?;
    info!("Initialized configuration");

    let (store, graph): (Arc<dyn EngagementStore>, Arc<dyn SocialGraph>) = match config.storage {
        StorageBackend::Postgres => {
            let db = Arc::new(init_database(&config.database).await?);
            info!("Connected to database");
            (
                Arc::new(PgEngagementStore::new(db.clone())),
                Arc::new(PgSocialGraph::new(db)),
            )
        }
        StorageBackend::Memory => {
            info!("Using in-memory engagement store");
            (
                Arc::new(InMemoryEngagementStore::new()),
                Arc::new(InMemorySocialGraph::new()),
            )
        }
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let cache = Arc::new(MemoryTrendingCache::new(clock.clone()));

    // Sweep snapshots for limits nobody asks for again
    let sweep_cache = cache.clone();
    let sweep_every = Duration::from_secs(config.feed.trending_cache_ttl_secs.max(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_every);
        loop {
            ticker.tick().await;
            sweep_cache.cleanup_expired().await;
            debug!("Trending cache holds {} entries after sweep", sweep_cache.len().await);
        }
    });

    let state = AppState::new(store, graph, cache, clock, &config.feed)?;

    api::start_api_server(state, &config.server, shutdown_signal()).await?;

    info!("MySocial feed shutdown complete");
    Ok(())
}
