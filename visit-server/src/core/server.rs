//! Server Implementation
//!
//! HTTP 服务器启动和管理

use crate::core::tasks::{BackgroundTasks, spawn_session_sweeper};
use crate::core::{Config, Result, ServerError, ServerState};
use std::time::Duration;

/// HTTP Server
pub struct Server {
    config: Config,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Serve until Ctrl-C, then stop background tasks
    pub async fn run(&self) -> Result<()> {
        let state = ServerState::initialize(&self.config).await?;

        let mut tasks = BackgroundTasks::new();
        spawn_session_sweeper(
            &mut tasks,
            state.sessions.clone(),
            Duration::from_secs(self.config.session_sweep_interval_secs),
            self.config.session_idle(),
        );

        crate::api::health::mark_started();
        let app = crate::routes::build_app(state);

        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(ServerError::Bind)?;
        tracing::info!("Visit server listening on {}", addr);

        let shutdown = async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
        };

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Internal(e.into()));

        tasks.shutdown().await;
        served
    }
}
