//! HTTP server
//!
//! ```text
//! ┌────────┐  HTTP   ┌──────────────────────────┐        ┌────────────────────┐
//! │ Client │ ──────> │ api.rs (axum handlers)   │ ─────> │ BuildCache<Build>  │
//! └────────┘         └──────────────────────────┘        └────────────────────┘
//!                          │ Build::start                      ▲
//!                          ▼                                   │ refresh()
//!                    <builds dir>/<id>/{repo,build.log}    sweeper task
//! ```

mod api;
mod page;

pub use api::{api_router, ApiError, CreatedResponse};

use crate::audit::AuditLog;
use crate::build::Pipeline;
use crate::cache::BuildCache;
use crate::config::{Config, ConfigManager};
use crate::error::{BuildyError, BuildyResult};
use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Shared application state
#[derive(Debug)]
pub struct AppState {
    /// Base directory holding one subdirectory per build
    pub builds_dir: PathBuf,
    pub pipeline: Pipeline,
    pub cache: BuildCache,
    pub audit: AuditLog,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: &Config, builds_dir: PathBuf) -> Self {
        let pipeline =
            Pipeline::new(config.builds.command.clone()).with_timeout(config.builds.timeout());

        Self {
            pipeline,
            cache: BuildCache::new(config.builds.capacity),
            audit: AuditLog::new(config, &builds_dir),
            builds_dir,
        }
    }
}

/// Build the application router
pub fn build_router(state: SharedState) -> Router {
    api_router().with_state(state)
}

/// Run the server until Ctrl+C
pub async fn serve(config: &Config) -> BuildyResult<()> {
    let builds_dir = ConfigManager::builds_dir(config);
    ConfigManager::ensure_builds_dir(&builds_dir).await?;

    let state = Arc::new(AppState::new(config, builds_dir));
    let sweeper = spawn_sweeper(state.clone(), config.builds.poll_interval());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| BuildyError::Bind {
            addr: addr.clone(),
            source: e,
        })?;
    let local_addr = listener
        .local_addr()
        .map_err(|e| BuildyError::io("reading listener address", e))?;

    info!(
        "Buildy server v{} started http://{} - dir: {} - capacity: {} - command: {}",
        env!("CARGO_PKG_VERSION"),
        local_addr,
        state.builds_dir.display(),
        state.cache.capacity(),
        state.pipeline.build_command()
    );

    let result = axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| BuildyError::io("serving HTTP", e));

    sweeper.abort();
    info!("Buildy server stopped");
    result
}

/// Poll tracked builds periodically so completions are noticed and
/// timeouts enforced even when nobody asks. Timeout notes are written
/// to the logs here.
fn spawn_sweeper(state: SharedState, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let running = state.cache.refresh();
            for build in state.cache.values() {
                build.flush_note().await;
            }
            debug!(
                "Sweep: {} tracked, {} running",
                state.cache.len(),
                running
            );
        }
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down...");
}
