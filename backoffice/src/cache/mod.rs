//! キャッシュ層
//!
//! TTL付きキー・バリューとFIFOリストを提供するキャッシュ層の抽象。
//! Redisが設定されていれば`RedisCache`、無ければプロセス内の`MemoryCache`を使う。

/// キャッシュキーの構築
pub mod keys;

/// プロセス内キャッシュ（DashMap）
pub mod memory;

/// Redisキャッシュ（deadpool-redis）
pub mod redis_cache;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub use self::memory::MemoryCache;
pub use self::redis_cache::RedisCache;

/// キャッシュ層のエラー
#[derive(Debug, Error)]
pub enum CacheError {
    /// 接続・プール取得の失敗
    #[error("Cache connection error: {0}")]
    Connection(String),

    /// コマンド実行の失敗
    #[error("Cache command error: {0}")]
    Command(String),

    /// キーが別の型（文字列 / リスト）として保持されている
    #[error("Wrong type for cache key: {0}")]
    WrongType(String),
}

/// Result type alias (cache tier)
pub type CacheResult<T> = Result<T, CacheError>;

/// キャッシュ層の操作
///
/// 「キーが存在しない」は常に`Ok(None)`で表し、エラーとは区別する。
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// 値を取得する
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// TTL付きで値を設定する
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    /// キーを削除し、削除したかどうかを返す
    ///
    /// 存在確認と削除は一つの操作として行われる。
    async fn delete(&self, key: &str) -> CacheResult<bool>;

    /// プレフィックスに一致するキーをすべて削除し、削除件数を返す
    async fn delete_prefix(&self, prefix: &str) -> CacheResult<u64>;

    /// リスト末尾に追加する
    async fn rpush(&self, key: &str, value: &str) -> CacheResult<()>;

    /// リスト先頭を取り出す（原子的）
    async fn lpop(&self, key: &str) -> CacheResult<Option<String>>;

    /// 期限切れのキーを回収し、回収件数を返す
    ///
    /// 期限切れを自前で消すバックエンド（Redis）では何もしない。
    async fn cleanup_expired(&self) -> CacheResult<u64> {
        Ok(0)
    }
}

/// 共有キャッシュハンドル
pub type SharedCache = Arc<dyn CacheStore>;

/// 設定に応じてキャッシュ層を構築する
///
/// Redisのプール作成・疎通確認に失敗した場合はプロセス内キャッシュにフォールバックする。
pub async fn connect(config: &crate::config::CacheConfig) -> SharedCache {
    let Some(url) = config.redis_url.as_deref() else {
        tracing::info!("Redis not configured, using in-process cache");
        return Arc::new(MemoryCache::new());
    };

    match RedisCache::connect(url, config.pool_size, config.timeout).await {
        Ok(cache) => {
            tracing::info!("Connected to Redis cache tier");
            Arc::new(cache)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to connect to Redis, falling back to in-process cache");
            Arc::new(MemoryCache::new())
        }
    }
}
