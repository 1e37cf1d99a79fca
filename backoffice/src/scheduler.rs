//! 定期タスク
//!
//! ログバッファの排出（既定1時間ごと）、署名鍵のローテーション（既定1週間ごと）、
//! 期限切れキャッシュとレート制限状態の回収（既定1分ごと）。
//! いずれのタスクも、失敗はログに残して次の周期を待つ。

use crate::AppState;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// 定期タスクのハンドル
pub struct Scheduler {
    handles: Vec<JoinHandle<()>>,
}

impl Scheduler {
    /// タスクを起動する
    ///
    /// `state.shutdown`が要求されると各タスクは終了する。ログ排出タスクは
    /// 終了前に最後の排出を行う。
    pub fn start(state: &AppState) -> Self {
        let tasks = state.config.tasks;
        let handles = vec![
            tokio::spawn(sync_logs_task(state.clone(), tasks.sync_logs_interval)),
            tokio::spawn(rotate_key_task(state.clone(), tasks.rotate_key_interval)),
            tokio::spawn(cleanup_task(state.clone(), tasks.cleanup_interval)),
        ];
        info!(
            sync_logs_secs = tasks.sync_logs_interval.as_secs(),
            rotate_key_secs = tasks.rotate_key_interval.as_secs(),
            cleanup_secs = tasks.cleanup_interval.as_secs(),
            "Scheduler started"
        );
        Self { handles }
    }

    /// すべてのタスクの終了を待つ
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Scheduled task panicked: {}", e);
            }
        }
    }
}

/// ログバッファを1回排出する
pub async fn sync_logs(state: &AppState) {
    if let Err(e) = state.log_buffer.drain_all().await {
        error!(error = %e, "Scheduled log drain failed");
    }
}

/// 署名鍵を1回ローテーションする
pub fn rotate_key(state: &AppState) {
    if let Err(e) = state.tokens.rotate_signing_key() {
        error!(error = %e, "Scheduled signing key rotation failed");
    }
}

/// 期限切れのキャッシュエントリと放置されたレート制限状態を1回回収する
pub async fn cleanup(state: &AppState) {
    match state.cache.cleanup_expired().await {
        Ok(0) => {}
        Ok(removed) => debug!(removed, "Expired cache entries removed"),
        Err(e) => error!(error = %e, "Scheduled cache cleanup failed"),
    }
    let purged = state.rate_limiter.purge_stale();
    if purged > 0 {
        debug!(purged, "Idle rate limit windows removed");
    }
}

async fn sync_logs_task(state: AppState, period: Duration) {
    let mut interval = tokio::time::interval(period);
    // 最初のtickはすぐに発火するのでスキップ
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => sync_logs(&state).await,
            _ = state.shutdown.wait() => {
                info!("Log sync task shutting down, draining remaining events");
                sync_logs(&state).await;
                return;
            }
        }
    }
}

async fn rotate_key_task(state: AppState, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => rotate_key(&state),
            _ = state.shutdown.wait() => {
                info!("Key rotation task stopped");
                return;
            }
        }
    }
}

async fn cleanup_task(state: AppState, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => cleanup(&state).await,
            _ = state.shutdown.wait() => {
                info!("Cleanup task stopped");
                return;
            }
        }
    }
}
