use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, warn};

/// 等待 Ctrl+C，随后停止后台任务
pub async fn listen_for_shutdown(background: Option<JoinHandle<()>>) {
    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        return;
    }
    warn!("Shutdown signal received, initiating graceful shutdown...");

    if let Some(handle) = background {
        handle.abort();
        warn!("Expired session sweeper stopped");
    }
}
