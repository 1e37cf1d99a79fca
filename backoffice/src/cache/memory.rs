use super::{CacheError, CacheResult, CacheStore};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[derive(Debug)]
enum Entry {
    Value {
        data: String,
        cached_at: Instant,
        ttl: Duration,
    },
    List(VecDeque<String>),
}

impl Entry {
    fn is_expired(&self) -> bool {
        match self {
            Entry::Value { cached_at, ttl, .. } => cached_at.elapsed() >= *ttl,
            Entry::List(items) => items.is_empty(),
        }
    }
}

/// プロセス内キャッシュ
///
/// 単一プロセス構成とテストで使う。期限切れの値は読み取り時と
/// `cleanup_expired`（定期タスクから呼ばれる）で取り除く。
/// リスト操作はDashMapのシャードロック内で完結するため、`lpop`は原子的。
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, Entry>,
}

impl MemoryCache {
    /// 空のキャッシュを作る
    pub fn new() -> Self {
        Self::default()
    }

    /// 保持しているキー数（期限切れ未回収を含む）
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 空かどうか
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let value = match self.entries.get(key) {
            Some(entry) => match entry.value() {
                Entry::Value { data, .. } if !entry.is_expired() => Some(data.clone()),
                Entry::Value { .. } => None,
                Entry::List(_) => return Err(CacheError::WrongType(key.to_string())),
            },
            None => return Ok(None),
        };
        if value.is_none() {
            self.entries.remove_if(key, |_, entry| entry.is_expired());
        }
        Ok(value)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        self.entries.insert(
            key.to_string(),
            Entry::Value {
                data: value.to_string(),
                cached_at: Instant::now(),
                ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        Ok(self
            .entries
            .remove(key)
            .map(|(_, entry)| !entry.is_expired())
            .unwrap_or(false))
    }

    async fn delete_prefix(&self, prefix: &str) -> CacheResult<u64> {
        let mut removed = 0u64;
        self.entries.retain(|key, _| {
            if key.starts_with(prefix) {
                removed += 1;
                false
            } else {
                true
            }
        });
        Ok(removed)
    }

    async fn rpush(&self, key: &str, value: &str) -> CacheResult<()> {
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::List(VecDeque::new()));
        if entry.is_expired() && !matches!(entry.value(), Entry::List(_)) {
            *entry = Entry::List(VecDeque::new());
        }
        match entry.value_mut() {
            Entry::List(items) => {
                items.push_back(value.to_string());
                Ok(())
            }
            Entry::Value { .. } => Err(CacheError::WrongType(key.to_string())),
        }
    }

    async fn lpop(&self, key: &str) -> CacheResult<Option<String>> {
        let popped = {
            let Some(mut entry) = self.entries.get_mut(key) else {
                return Ok(None);
            };
            match entry.value_mut() {
                Entry::List(items) => items.pop_front(),
                Entry::Value { .. } => return Err(CacheError::WrongType(key.to_string())),
            }
        };
        // 空になったリストはRedis同様にキーごと消す
        self.entries
            .remove_if(key, |_, entry| matches!(entry, Entry::List(items) if items.is_empty()));
        Ok(popped)
    }

    async fn cleanup_expired(&self) -> CacheResult<u64> {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        Ok(before.saturating_sub(self.entries.len()) as u64)
    }
}
