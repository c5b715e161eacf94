//! API server for the task service

use anyhow::Result;
use axum::{routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tasks_cache::kv::{spawn_purge_task, MemoryKv};
use tasks_cache::CachedRecords;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::config::ApiServerConfig;
use crate::tasks::MemoryTaskStore;

use super::routes::{
    create_task, delete_task, health_check, list_tasks, not_found, read_task, update_task,
    AppState, SharedState,
};

/// How often expired cache entries are swept from the in-memory store
const PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// API server
pub struct ApiServer {
    config: ApiServerConfig,
    kv: MemoryKv,
}

impl ApiServer {
    /// Create a new API server with configuration
    pub fn new(config: ApiServerConfig) -> Self {
        Self {
            config,
            kv: MemoryKv::new(),
        }
    }

    /// Fresh application state over an empty task table and this server's
    /// key-value store
    pub fn state(&self) -> SharedState {
        Arc::new(AppState {
            tasks: CachedRecords::new(
                Arc::new(MemoryTaskStore::new()),
                Arc::new(self.kv.clone()),
                self.config.cache.clone(),
            ),
        })
    }

    /// Build the router for `state`
    pub fn router(state: SharedState) -> Router {
        Router::new()
            .route("/health", get(health_check))
            .route("/tasks", get(list_tasks).post(create_task))
            .route(
                "/tasks/:id",
                get(read_task).put(update_task).delete(delete_task),
            )
            .fallback(not_found)
            .with_state(state)
            .layer(CorsLayer::permissive())
    }

    /// Bind the configured address and serve until the process exits
    pub async fn start(self) -> Result<()> {
        let addr = self.config.bind_address();
        let listener = TcpListener::bind(&addr).await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let state = self.state();
        let _purge = spawn_purge_task(self.kv.clone(), PURGE_INTERVAL);

        info!(
            "Starting API server on {} (cache {}, ttl {}s)",
            listener.local_addr()?,
            if self.config.cache.enabled { "enabled" } else { "disabled" },
            self.config.cache.ttl.as_secs()
        );

        axum::serve(listener, Self::router(state)).await?;

        Ok(())
    }
}
