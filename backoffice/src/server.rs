//! axumサーバー起動・シャットダウンハンドリング

use crate::shutdown::{os_signal, ShutdownController};
use crate::AppState;
use std::net::SocketAddr;
use tracing::info;

/// axumサーバーを起動し、シャットダウンシグナルを待機する
///
/// OSシグナルを受けた場合は`ShutdownController`にも伝え、定期タスクを止める。
pub async fn run(state: AppState, bind_addr: &str) -> anyhow::Result<()> {
    let shutdown = state.shutdown.clone();

    let app = crate::api::create_app(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;

    info!("Backoffice server listening on {}", bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown))
    .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// シャットダウンシグナルを待機
async fn shutdown_signal(shutdown: ShutdownController) {
    tokio::select! {
        _ = os_signal() => {
            info!("Received OS signal, shutting down...");
            shutdown.request_shutdown();
        }
        _ = shutdown.wait() => {
            info!("Shutdown requested, shutting down...");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn shutdown_signal_completes_when_controller_requests_shutdown() {
        let shutdown = ShutdownController::default();
        let wait_task = tokio::spawn(shutdown_signal(shutdown.clone()));

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        shutdown.request_shutdown();

        tokio::time::timeout(std::time::Duration::from_secs(2), wait_task)
            .await
            .expect("shutdown signal task timed out")
            .expect("shutdown signal task panicked");
    }

    #[tokio::test]
    async fn run_stops_after_shutdown_request() {
        let state = crate::test_support::test_state().await;
        let shutdown = state.shutdown.clone();
        let server = tokio::spawn(async move { run(state, "127.0.0.1:0").await });

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        shutdown.request_shutdown();

        let result = tokio::time::timeout(std::time::Duration::from_secs(5), server)
            .await
            .expect("server did not stop")
            .expect("server task panicked");
        assert!(result.is_ok());
    }
}
