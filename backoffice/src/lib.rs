//! Admin back-office server
//!
//! ユーザー・お知らせ・ドキュメントを管理するバックオフィスAPIサーバー

#![warn(missing_docs)]

/// 共通型定義（エラー、クライアント情報）
pub mod common;

/// REST APIハンドラー
pub mod api;

/// データベースアクセス
pub mod db;

/// キャッシュ層（Redis / プロセス内）
pub mod cache;

/// ロギング初期化ユーティリティ
pub mod logging;

/// 設定管理（環境変数ヘルパー）
pub mod config;

/// 認証・認可機能
pub mod auth;

/// ログの書き込みバッファ
pub mod audit;

/// 冪等性トークン
pub mod idempotency;

/// レート制限
pub mod rate_limit;

/// 業務ロジック
pub mod service;

/// 定期タスク
pub mod scheduler;

/// CLIインターフェース
pub mod cli;

/// 型定義
pub mod types;

/// Shutdown controller
pub mod shutdown;

/// HTTPサーバー起動
pub mod server;

use crate::audit::LogBuffer;
use crate::auth::jwt::TokenManager;
use crate::auth::revocation::RevocationStore;
use crate::cache::SharedCache;
use crate::common::error::AdminResult;
use crate::config::AppConfig;
use crate::db::{
    DocumentationRepository, LoginLogRepository, NoticeRepository, OperationLogRepository,
    UserRepository,
};
use crate::idempotency::IdempotencyGuard;
use crate::rate_limit::RateLimiter;
use std::sync::Arc;

/// アプリケーション状態
#[derive(Clone)]
pub struct AppState {
    /// 設定
    pub config: Arc<AppConfig>,
    /// データベース接続プール
    pub db_pool: sqlx::SqlitePool,
    /// キャッシュ層
    pub cache: SharedCache,
    /// トークン発行・検証
    pub tokens: Arc<TokenManager>,
    /// 失効トークンストア
    pub revocations: RevocationStore,
    /// 冪等性ガード
    pub idempotency: IdempotencyGuard,
    /// 接続元IPごとのレート制限
    pub rate_limiter: RateLimiter,
    /// ユーザー
    pub users: UserRepository,
    /// お知らせ
    pub notices: NoticeRepository,
    /// ドキュメント
    pub documentation: DocumentationRepository,
    /// ログインログ
    pub login_logs: LoginLogRepository,
    /// 操作ログ
    pub operation_logs: OperationLogRepository,
    /// ログの書き込みバッファ
    pub log_buffer: LogBuffer,
    /// Cooperative shutdown controller
    pub shutdown: shutdown::ShutdownController,
}

impl AppState {
    /// 設定・接続済みプール・キャッシュから状態を組み立てる
    ///
    /// 間隔・タイムアウトが0の場合やトークン寿命の設定が不正な場合は
    /// `InvalidConfiguration`。
    pub fn new(config: AppConfig, db_pool: sqlx::SqlitePool, cache: SharedCache) -> AdminResult<Self> {
        config.validate()?;
        let tokens = Arc::new(TokenManager::new(&config.jwt)?);
        let ttl = config.cache.resource_ttl;

        let users = UserRepository::new(db_pool.clone(), cache.clone(), ttl);
        let notices = NoticeRepository::new(db_pool.clone(), cache.clone(), ttl);
        let documentation = DocumentationRepository::new(db_pool.clone(), cache.clone(), ttl);
        let login_logs = LoginLogRepository::new(db_pool.clone(), users.clone());
        let operation_logs = OperationLogRepository::new(db_pool.clone(), users.clone());
        let log_buffer = LogBuffer::new(cache.clone(), login_logs.clone(), operation_logs.clone());

        Ok(Self {
            revocations: RevocationStore::new(cache.clone(), config.cache.blacklist_ttl),
            idempotency: IdempotencyGuard::new(cache.clone(), config.idempotency.ttl),
            rate_limiter: RateLimiter::new(config.limiter),
            config: Arc::new(config),
            db_pool,
            cache,
            tokens,
            users,
            notices,
            documentation,
            login_logs,
            operation_logs,
            log_buffer,
            shutdown: shutdown::ShutdownController::default(),
        })
    }
}
