//! Configuration management via environment variables
//!
//! Provides helper functions for reading environment variables with fallback
//! to deprecated variable names with warning logs, plus the typed
//! configuration sections consumed by the composition root.

use crate::common::error::{AdminError, AdminResult};
use std::time::Duration;

/// Get an environment variable with fallback to a deprecated name
///
/// If the new variable name is set, returns its value.
/// If only the old (deprecated) variable name is set, returns its value
/// and logs a deprecation warning.
///
/// # Arguments
/// * `new_name` - The new environment variable name (preferred)
/// * `old_name` - The deprecated environment variable name (fallback)
///
/// # Returns
/// * `Some(value)` - The environment variable value
/// * `None` - Neither variable is set
///
/// # Example
/// ```
/// use backoffice::config::get_env_with_fallback;
///
/// let port = get_env_with_fallback("BACKOFFICE_PORT", "PORT");
/// ```
pub fn get_env_with_fallback(new_name: &str, old_name: &str) -> Option<String> {
    if let Ok(val) = std::env::var(new_name) {
        return Some(val);
    }
    if let Ok(val) = std::env::var(old_name) {
        tracing::warn!(
            "Environment variable '{}' is deprecated, use '{}' instead",
            old_name,
            new_name
        );
        return Some(val);
    }
    None
}

/// Get an environment variable with fallback and default value
pub fn get_env_with_fallback_or(new_name: &str, old_name: &str, default: &str) -> String {
    get_env_with_fallback(new_name, old_name).unwrap_or_else(|| default.to_string())
}

/// Get an environment variable with fallback, parsing to a specific type
///
/// Falls back to `default` if neither is set or parsing fails.
pub fn get_env_with_fallback_parse<T: std::str::FromStr>(
    new_name: &str,
    old_name: &str,
    default: T,
) -> T {
    get_env_with_fallback(new_name, old_name)
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Get a boolean flag (`true/1/yes/on` → true, `false/0/no/off` → false)
pub fn get_env_flag(new_name: &str, old_name: &str, default: bool) -> bool {
    get_env_with_fallback(new_name, old_name)
        .and_then(
            |value| match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Some(true),
                "0" | "false" | "no" | "off" => Some(false),
                _ => None,
            },
        )
        .unwrap_or(default)
}

fn get_env_secs(new_name: &str, old_name: &str, default_secs: u64) -> Duration {
    Duration::from_secs(get_env_with_fallback_parse(new_name, old_name, default_secs))
}

/// HTTPサーバー設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// Listen port
    pub port: u16,
    /// Deadline applied to every HTTP request
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ServerConfig {
    /// Load server configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: get_env_with_fallback_or("BACKOFFICE_HOST", "HOST", &defaults.host),
            port: get_env_with_fallback_parse("BACKOFFICE_PORT", "PORT", defaults.port),
            request_timeout: get_env_secs(
                "BACKOFFICE_REQUEST_TIMEOUT_SECS",
                "REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            ),
        }
    }

    /// `host:port` 形式のバインドアドレス
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// ドキュメントストア（SQLite）設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// sqlx接続URL
    pub url: String,
    /// 最大接続数
    pub max_connections: u32,
    /// 接続取得のタイムアウト
    pub acquire_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://backoffice.db?mode=rwc".to_string(),
            max_connections: 10,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

impl DatabaseConfig {
    /// Load database configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: get_env_with_fallback_or("BACKOFFICE_DATABASE_URL", "DATABASE_URL", &defaults.url),
            max_connections: get_env_with_fallback_parse(
                "BACKOFFICE_DB_MAX_CONNECTIONS",
                "DB_MAX_CONNECTIONS",
                defaults.max_connections,
            ),
            acquire_timeout: get_env_secs(
                "BACKOFFICE_DB_ACQUIRE_TIMEOUT_SECS",
                "DB_ACQUIRE_TIMEOUT_SECS",
                defaults.acquire_timeout.as_secs(),
            ),
        }
    }
}

/// キャッシュ層設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Redis URL（未設定ならプロセス内キャッシュ）
    pub redis_url: Option<String>,
    /// Redisコネクションプールの最大サイズ
    pub pool_size: usize,
    /// Redis接続待ちのタイムアウト
    pub timeout: Duration,
    /// ユーザー・お知らせ・ドキュメントのキャッシュTTL
    pub resource_ttl: Duration,
    /// ログアウト済みトークンのブラックリスト保持期間
    pub blacklist_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            pool_size: 16,
            timeout: Duration::from_secs(3),
            resource_ttl: Duration::from_secs(300),
            blacklist_ttl: Duration::from_secs(3600),
        }
    }
}

impl CacheConfig {
    /// Load cache configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_url: get_env_with_fallback("BACKOFFICE_REDIS_URL", "REDIS_URL")
                .filter(|url| !url.trim().is_empty()),
            pool_size: get_env_with_fallback_parse(
                "BACKOFFICE_REDIS_POOL_SIZE",
                "REDIS_POOL_SIZE",
                defaults.pool_size,
            ),
            timeout: get_env_secs(
                "BACKOFFICE_REDIS_TIMEOUT_SECS",
                "REDIS_TIMEOUT_SECS",
                defaults.timeout.as_secs(),
            ),
            resource_ttl: get_env_secs(
                "BACKOFFICE_CACHE_TTL_SECS",
                "CACHE_TTL_SECS",
                defaults.resource_ttl.as_secs(),
            ),
            blacklist_ttl: get_env_secs(
                "BACKOFFICE_BLACKLIST_TTL_SECS",
                "BLACKLIST_TTL_SECS",
                defaults.blacklist_ttl.as_secs(),
            ),
        }
    }
}

/// トークン寿命設定
///
/// 妥当性（access ≤ refresh、buffer ≤ 両方）は`TokenManager`の構築時に検証する。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JwtConfig {
    /// アクセストークンの寿命
    pub access_token_lifetime: Duration,
    /// リフレッシュトークンの寿命
    pub refresh_token_lifetime: Duration,
    /// リフレッシュ可能になる残り時間のバッファ
    pub refresh_buffer: Duration,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            access_token_lifetime: Duration::from_secs(7200),
            refresh_token_lifetime: Duration::from_secs(14400),
            refresh_buffer: Duration::from_secs(300),
        }
    }
}

impl JwtConfig {
    /// Load token lifetimes from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            access_token_lifetime: get_env_secs(
                "BACKOFFICE_JWT_ACCESS_TOKEN_SECS",
                "JWT_ACCESS_TOKEN_SECS",
                defaults.access_token_lifetime.as_secs(),
            ),
            refresh_token_lifetime: get_env_secs(
                "BACKOFFICE_JWT_REFRESH_TOKEN_SECS",
                "JWT_REFRESH_TOKEN_SECS",
                defaults.refresh_token_lifetime.as_secs(),
            ),
            refresh_buffer: get_env_secs(
                "BACKOFFICE_JWT_REFRESH_BUFFER_SECS",
                "JWT_REFRESH_BUFFER_SECS",
                defaults.refresh_buffer.as_secs(),
            ),
        }
    }
}

/// 冪等性トークン設定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdempotencyConfig {
    /// トークンの有効期間
    pub ttl: Duration,
}

impl Default for IdempotencyConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
        }
    }
}

impl IdempotencyConfig {
    /// Load idempotency configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            ttl: get_env_secs(
                "BACKOFFICE_IDEMPOTENCY_TTL_SECS",
                "IDEMPOTENCY_TTL_SECS",
                Self::default().ttl.as_secs(),
            ),
        }
    }
}

/// 定期タスク設定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TasksConfig {
    /// ログバッファ排出の間隔
    pub sync_logs_interval: Duration,
    /// 署名鍵ローテーションの間隔
    pub rotate_key_interval: Duration,
    /// 期限切れキャッシュとレート制限ウィンドウを回収する間隔
    pub cleanup_interval: Duration,
    /// ログ一覧の読み取り前にバッファを排出するか
    pub drain_before_log_list: bool,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            sync_logs_interval: Duration::from_secs(60 * 60),
            rotate_key_interval: Duration::from_secs(7 * 24 * 60 * 60),
            cleanup_interval: Duration::from_secs(60),
            drain_before_log_list: true,
        }
    }
}

impl TasksConfig {
    /// Load scheduler configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            sync_logs_interval: get_env_secs(
                "BACKOFFICE_SYNC_LOGS_INTERVAL_SECS",
                "SYNC_LOGS_INTERVAL_SECS",
                defaults.sync_logs_interval.as_secs(),
            ),
            rotate_key_interval: get_env_secs(
                "BACKOFFICE_ROTATE_KEY_INTERVAL_SECS",
                "ROTATE_KEY_INTERVAL_SECS",
                defaults.rotate_key_interval.as_secs(),
            ),
            cleanup_interval: get_env_secs(
                "BACKOFFICE_CLEANUP_INTERVAL_SECS",
                "CLEANUP_INTERVAL_SECS",
                defaults.cleanup_interval.as_secs(),
            ),
            drain_before_log_list: get_env_flag(
                "BACKOFFICE_DRAIN_BEFORE_LOG_LIST",
                "DRAIN_BEFORE_LOG_LIST",
                defaults.drain_before_log_list,
            ),
        }
    }
}

/// 接続元IPごとのレート制限設定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimiterConfig {
    /// 有効にするか
    pub enabled: bool,
    /// ウィンドウあたりの最大リクエスト数
    pub max: u32,
    /// ウィンドウの長さ
    pub expiration: Duration,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max: 20,
            expiration: Duration::from_secs(30),
        }
    }
}

impl LimiterConfig {
    /// Load rate limiter configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: get_env_flag(
                "BACKOFFICE_LIMITER_ENABLED",
                "LIMITER_ENABLED",
                defaults.enabled,
            ),
            max: get_env_with_fallback_parse("BACKOFFICE_LIMITER_MAX", "LIMITER_MAX", defaults.max),
            expiration: get_env_secs(
                "BACKOFFICE_LIMITER_EXPIRATION_SECS",
                "LIMITER_EXPIRATION_SECS",
                defaults.expiration.as_secs(),
            ),
        }
    }
}

/// 初回管理者アカウント設定
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapConfig {
    /// 管理者メールアドレス
    pub admin_email: Option<String>,
    /// 管理者ユーザー名
    pub admin_username: Option<String>,
    /// 管理者パスワード
    pub admin_password: Option<String>,
}

impl BootstrapConfig {
    /// Load bootstrap credentials from environment variables.
    pub fn from_env() -> Self {
        let non_empty = |value: String| (!value.trim().is_empty()).then_some(value);
        Self {
            admin_email: get_env_with_fallback("BACKOFFICE_ADMIN_EMAIL", "ADMIN_EMAIL")
                .and_then(non_empty),
            admin_username: get_env_with_fallback("BACKOFFICE_ADMIN_USERNAME", "ADMIN_USERNAME")
                .and_then(non_empty),
            admin_password: get_env_with_fallback("BACKOFFICE_ADMIN_PASSWORD", "ADMIN_PASSWORD")
                .and_then(non_empty),
        }
    }
}

/// アプリケーション全体の設定
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// HTTPサーバー
    pub server: ServerConfig,
    /// ドキュメントストア
    pub database: DatabaseConfig,
    /// キャッシュ層
    pub cache: CacheConfig,
    /// トークン寿命
    pub jwt: JwtConfig,
    /// 冪等性トークン
    pub idempotency: IdempotencyConfig,
    /// 定期タスク
    pub tasks: TasksConfig,
    /// レート制限
    pub limiter: LimiterConfig,
    /// 初回管理者
    pub bootstrap: BootstrapConfig,
}

impl AppConfig {
    /// Load every section from environment variables.
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig::from_env(),
            database: DatabaseConfig::from_env(),
            cache: CacheConfig::from_env(),
            jwt: JwtConfig::from_env(),
            idempotency: IdempotencyConfig::from_env(),
            tasks: TasksConfig::from_env(),
            limiter: LimiterConfig::from_env(),
            bootstrap: BootstrapConfig::from_env(),
        }
    }

    /// 0では動作できない期間・上限を検証する
    ///
    /// トークン寿命は`TokenManager`の構築時に検証する。
    pub fn validate(&self) -> AdminResult<()> {
        let durations = [
            ("request timeout", self.server.request_timeout),
            ("log sync interval", self.tasks.sync_logs_interval),
            ("key rotation interval", self.tasks.rotate_key_interval),
            ("cleanup interval", self.tasks.cleanup_interval),
            ("limiter expiration", self.limiter.expiration),
        ];
        if let Some((name, _)) = durations.iter().find(|(_, value)| value.is_zero()) {
            return Err(AdminError::InvalidConfiguration(format!(
                "{} must be greater than zero",
                name
            )));
        }
        if self.limiter.enabled && self.limiter.max == 0 {
            return Err(AdminError::InvalidConfiguration(
                "limiter max must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
