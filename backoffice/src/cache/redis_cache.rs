use super::{CacheError, CacheResult, CacheStore};
use async_trait::async_trait;
use deadpool_redis::{Config, Connection, Pool, PoolConfig, Runtime};
use redis::AsyncCommands;
use std::time::Duration;

/// SCAN 1回あたりの取得目安
const SCAN_BATCH: usize = 200;

/// Redisキャッシュ
///
/// プールの待ち・作成・再利用タイムアウトが各コマンドの期限になる。
#[derive(Clone)]
pub struct RedisCache {
    pool: Pool,
}

impl RedisCache {
    /// プールを作成し、1接続取得して疎通を確認する
    pub async fn connect(url: &str, pool_size: usize, timeout: Duration) -> CacheResult<Self> {
        let mut config = Config::from_url(url);
        let mut pool_config = PoolConfig::new(pool_size);
        pool_config.timeouts.wait = Some(timeout);
        pool_config.timeouts.create = Some(timeout);
        pool_config.timeouts.recycle = Some(timeout);
        config.pool = Some(pool_config);
        let pool = config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        let cache = Self { pool };
        cache.conn().await?;
        Ok(cache)
    }

    /// 既存のプールから作る
    pub fn from_pool(pool: Pool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> CacheResult<Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))
    }
}

fn command_error(e: redis::RedisError) -> CacheError {
    if e.kind() == redis::ErrorKind::TypeError {
        CacheError::WrongType(e.to_string())
    } else {
        CacheError::Command(e.to_string())
    }
}

/// `MATCH`パターン中のglobメタ文字をエスケープする
fn escape_glob(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('*');
    escaped
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.conn().await?;
        conn.get::<_, Option<String>>(key)
            .await
            .map_err(command_error)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let mut conn = self.conn().await?;
        // SETEXは0秒を受け付けないため最低1秒に切り上げる
        let secs = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, secs)
            .await
            .map_err(command_error)
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.conn().await?;
        let removed: u64 = conn.del(key).await.map_err(command_error)?;
        Ok(removed > 0)
    }

    async fn delete_prefix(&self, prefix: &str) -> CacheResult<u64> {
        let mut conn = self.conn().await?;
        let pattern = escape_glob(prefix);
        let mut cursor: u64 = 0;
        let mut removed = 0u64;
        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(command_error)?;
            if !keys.is_empty() {
                let count: u64 = conn.del(&keys).await.map_err(command_error)?;
                removed += count;
            }
            if next == 0 {
                break;
            }
            cursor = next;
        }
        Ok(removed)
    }

    async fn rpush(&self, key: &str, value: &str) -> CacheResult<()> {
        let mut conn = self.conn().await?;
        conn.rpush::<_, _, ()>(key, value)
            .await
            .map_err(command_error)
    }

    async fn lpop(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.conn().await?;
        conn.lpop::<_, Option<String>>(key, None)
            .await
            .map_err(command_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_glob_appends_wildcard() {
        assert_eq!(escape_glob("dao:notice:"), "dao:notice:*");
    }

    #[test]
    fn escape_glob_escapes_metacharacters() {
        assert_eq!(escape_glob("a*b?[c]"), "a\\*b\\?\\[c\\]*");
    }

    #[tokio::test]
    async fn connect_to_unreachable_server_fails() {
        let result =
            RedisCache::connect("redis://127.0.0.1:1/", 1, Duration::from_millis(200)).await;
        assert!(matches!(result, Err(CacheError::Connection(_))));
    }
}
