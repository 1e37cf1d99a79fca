//! ログアウト済みアクセストークンのブラックリスト

use crate::cache::keys::{CacheKey, PRESENCE_FLAG, TOKEN_BLACKLIST_PREFIX};
use crate::cache::SharedCache;
use crate::common::error::{AdminError, AdminResult};
use sha2::{Digest, Sha256};
use std::time::Duration;

/// SHA-256ハッシュを16進文字列で返す
pub fn hash_with_sha256(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect()
}

/// 失効トークンストア
///
/// トークン本体は保存せず、ハッシュをキーとした存在フラグだけをTTL付きで置く。
#[derive(Clone)]
pub struct RevocationStore {
    cache: SharedCache,
    ttl: Duration,
}

impl RevocationStore {
    /// 保持期間を指定して作る
    pub fn new(cache: SharedCache, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    fn key(token: &str) -> String {
        CacheKey::new(TOKEN_BLACKLIST_PREFIX, "token")
            .field("hash", hash_with_sha256(token))
            .build()
    }

    /// トークンを失効させる
    ///
    /// 保持期間は設定値とトークンの残り寿命の長い方。自然失効するまで拒否し続ける。
    pub async fn revoke(&self, token: &str, remaining_lifetime: Option<Duration>) -> AdminResult<()> {
        let ttl = remaining_lifetime.map_or(self.ttl, |remaining| remaining.max(self.ttl));
        self.cache
            .set_ex(&Self::key(token), PRESENCE_FLAG, ttl)
            .await
            .map_err(|e| AdminError::ServiceError(format!("Failed to revoke token: {}", e)))
    }

    /// 失効済みか
    ///
    /// キャッシュ層に到達できない場合は失効扱いにできないため`ServiceError`を返す。
    pub async fn is_revoked(&self, token: &str) -> AdminResult<bool> {
        self.cache
            .get(&Self::key(token))
            .await
            .map(|value| value.is_some())
            .map_err(|e| {
                AdminError::ServiceError(format!("Failed to check token revocation: {}", e))
            })
    }
}
