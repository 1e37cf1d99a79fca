use crate::cache::keys::namespace;
use crate::cache::SharedCache;
use crate::common::error::AdminResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;

/// リソース1種類分のキャッシュ名前空間
///
/// キャッシュ層の失敗は読み取りでも無効化でも呼び出し元に伝播しない。
#[derive(Clone)]
pub struct CacheAside {
    cache: SharedCache,
    prefix: &'static str,
    ttl: Duration,
}

impl CacheAside {
    /// 名前空間とTTLを指定して作る
    pub fn new(cache: SharedCache, prefix: &'static str, ttl: Duration) -> Self {
        Self { cache, prefix, ttl }
    }

    /// 名前空間のプレフィックス
    pub fn prefix(&self) -> &'static str {
        self.prefix
    }

    /// キャッシュを読み、無ければ`fetch`で取得して書き戻す
    ///
    /// ヒット時はストレージに問い合わせない。デシリアライズに失敗したエントリはミス扱い。
    pub async fn read_through<T, F, Fut>(&self, key: &str, fetch: F) -> AdminResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = AdminResult<T>>,
    {
        match self.cache.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
                Ok(value) => {
                    tracing::debug!(key, "cache hit");
                    return Ok(value);
                }
                Err(e) => {
                    tracing::warn!(key, error = %e, "Discarding undecodable cache entry");
                }
            },
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(key, error = %e, "Cache read failed, falling back to storage");
            }
        }

        let value = fetch().await?;

        match serde_json::to_string(&value) {
            Ok(raw) => {
                if let Err(e) = self.cache.set_ex(key, &raw, self.ttl).await {
                    tracing::warn!(key, error = %e, "Failed to populate cache");
                }
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to encode cache entry");
            }
        }
        Ok(value)
    }

    /// 名前空間のエントリをすべて削除する
    ///
    /// 一覧キーは列挙できないため、単一キーではなく名前空間ごと捨てる。
    pub async fn invalidate(&self) {
        match self.cache.delete_prefix(&namespace(self.prefix)).await {
            Ok(removed) => {
                tracing::debug!(prefix = self.prefix, removed, "cache namespace invalidated");
            }
            Err(e) => {
                tracing::warn!(prefix = self.prefix, error = %e, "Failed to invalidate cache namespace");
            }
        }
    }
}
