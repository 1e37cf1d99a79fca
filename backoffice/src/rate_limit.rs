//! 接続元IPごとのレート制限
//!
//! スライディングウィンドウで直近`expiration`のリクエスト数を見積もる。
//! 直前ウィンドウの件数を、現在ウィンドウの経過割合に応じて按分して加える。

use crate::api::error::AppError;
use crate::common::error::{AdminError, AdminResult};
use crate::common::ip::ClientInfo;
use crate::config::LimiterConfig;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: Instant,
    current: u32,
    previous: u32,
}

impl Window {
    fn new(now: Instant) -> Self {
        Self {
            started_at: now,
            current: 0,
            previous: 0,
        }
    }

    /// `now`を含むウィンドウまで進める
    fn advance(&mut self, now: Instant, expiration: Duration) {
        let elapsed = now.saturating_duration_since(self.started_at);
        if elapsed < expiration {
            return;
        }
        if elapsed < expiration * 2 {
            self.previous = self.current;
            self.started_at += expiration;
        } else {
            // 1ウィンドウ以上空いたので直前の件数は数えない
            self.previous = 0;
            self.started_at = now;
        }
        self.current = 0;
    }

    fn estimate(&self, now: Instant, expiration: Duration) -> f64 {
        let elapsed = now.saturating_duration_since(self.started_at).as_secs_f64();
        let weight = 1.0 - (elapsed / expiration.as_secs_f64()).min(1.0);
        f64::from(self.previous) * weight + f64::from(self.current)
    }
}

/// レート制限器
///
/// ウィンドウの更新はDashMapのエントリロック内で行うため、同じ接続元からの
/// 同時リクエストが上限を超えて通ることはない。拒否したリクエストは数えない。
#[derive(Clone)]
pub struct RateLimiter {
    windows: Arc<DashMap<String, Window>>,
    config: LimiterConfig,
}

impl RateLimiter {
    /// 作成
    pub fn new(config: LimiterConfig) -> Self {
        Self {
            windows: Arc::new(DashMap::new()),
            config,
        }
    }

    /// 1リクエスト分を記録する。上限を超える場合は`ServerBusy`
    pub fn check(&self, client_key: &str) -> AdminResult<()> {
        if !self.config.enabled {
            return Ok(());
        }
        self.check_at(client_key, Instant::now())
    }

    fn check_at(&self, client_key: &str, now: Instant) -> AdminResult<()> {
        let expiration = self.config.expiration;
        let mut window = self
            .windows
            .entry(client_key.to_string())
            .or_insert_with(|| Window::new(now));
        window.advance(now, expiration);

        if window.estimate(now, expiration) + 1.0 > f64::from(self.config.max) {
            return Err(AdminError::ServerBusy("too many requests".to_string()));
        }
        window.current = window.current.saturating_add(1);
        Ok(())
    }

    /// 2ウィンドウ以上リクエストの無い接続元を忘れ、削除件数を返す
    pub fn purge_stale(&self) -> usize {
        self.purge_stale_at(Instant::now())
    }

    fn purge_stale_at(&self, now: Instant) -> usize {
        let horizon = self.config.expiration * 2;
        let before = self.windows.len();
        self.windows
            .retain(|_, window| now.saturating_duration_since(window.started_at) < horizon);
        before.saturating_sub(self.windows.len())
    }

    /// 追跡中の接続元数
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// 追跡中の接続元が無いか
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

/// 接続元IPごとにリクエスト数を制限するミドルウェア
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    client: ClientInfo,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Err(e) = state.rate_limiter.check(&client.ip_address) {
        tracing::warn!(ip = %client.ip_address, "Rate limit exceeded");
        return Err(e.into());
    }
    Ok(next.run(request).await)
}
