//! Swarm Deploy Hook - 镜像仓库 webhook 接收器
//!
//! 接收镜像推送通知，将镜像映射到 Docker Swarm 服务并重新部署
//! (`docker login` + `docker service update --force`)。

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod infra;
pub mod middleware;
pub mod services;
pub mod state;
pub mod telemetry;

pub use config::Settings;
pub use state::AppState;

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use config::env::constants::SHUTDOWN_DRAIN_TIMEOUT;

/// 启动 HTTP 服务，直到 `shutdown` 被取消
///
/// After the listener stops, running deployments get up to
/// [`SHUTDOWN_DRAIN_TIMEOUT`] to finish and report.
pub async fn serve(state: Arc<AppState>, shutdown: CancellationToken) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], state.settings.env.port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(
        "Listening for webhooks on http://localhost:{}",
        state.settings.env.port
    );

    let app = api::router(state.clone());
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    state.drain(SHUTDOWN_DRAIN_TIMEOUT).await;

    tracing::info!("Server stopped");
    Ok(())
}
