// ドキュメントCRUD操作（キャッシュアサイド）

use super::cached::CacheAside;
use super::query::{order_clause, QueryFilter};
use super::users::placeholders;
use super::{ensure_affected, map_sqlx_error, parse_db_time, parse_db_uuid, to_db_time};
use crate::cache::keys::{id_key, DOCUMENTATION_PREFIX};
use crate::cache::SharedCache;
use crate::common::error::{AdminError, AdminResult};
use crate::types::{CachedList, Documentation, DocumentationFilter, DocumentationUpdate, Pagination};
use chrono::Utc;
use sqlx::SqlitePool;
use std::time::Duration;
use uuid::Uuid;

#[derive(sqlx::FromRow)]
struct DocumentationRow {
    id: String,
    title: String,
    content: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<DocumentationRow> for Documentation {
    type Error = AdminError;

    fn try_from(row: DocumentationRow) -> Result<Self, Self::Error> {
        Ok(Documentation {
            id: parse_db_uuid(&row.id)?,
            title: row.title,
            content: row.content,
            created_at: parse_db_time(&row.created_at)?,
            updated_at: parse_db_time(&row.updated_at)?,
        })
    }
}

/// ドキュメントリポジトリ
#[derive(Clone)]
pub struct DocumentationRepository {
    pool: SqlitePool,
    cache: CacheAside,
}

impl DocumentationRepository {
    /// 作成
    pub fn new(pool: SqlitePool, cache: SharedCache, ttl: Duration) -> Self {
        Self {
            pool,
            cache: CacheAside::new(cache, DOCUMENTATION_PREFIX, ttl),
        }
    }

    /// IDで取得
    pub async fn get_by_id(&self, id: Uuid) -> AdminResult<Documentation> {
        let key = id_key(DOCUMENTATION_PREFIX, id);
        self.cache.read_through(&key, || self.fetch_by_id(id)).await
    }

    async fn fetch_by_id(&self, id: Uuid) -> AdminResult<Documentation> {
        let row = sqlx::query_as::<_, DocumentationRow>(
            "SELECT id, title, content, created_at, updated_at FROM documentation WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Failed to get documentation"))?
        .ok_or_else(|| AdminError::NotFound(format!("documentation ({}) not found", id)))?;
        Documentation::try_from(row)
    }

    /// 一覧取得（総件数付き）
    pub async fn get_list(
        &self,
        filter: &DocumentationFilter,
        pagination: &Pagination,
    ) -> AdminResult<CachedList<Documentation>> {
        let query_filter =
            QueryFilter::new(DOCUMENTATION_PREFIX, "list").range("updated_at", &filter.updated);
        let key = query_filter.list_key(pagination);
        self.cache
            .read_through(&key, || self.fetch_list(&query_filter, pagination))
            .await
    }

    async fn fetch_list(
        &self,
        query_filter: &QueryFilter,
        pagination: &Pagination,
    ) -> AdminResult<CachedList<Documentation>> {
        let where_clause = query_filter.where_clause();

        let count_sql = format!("SELECT COUNT(*) FROM documentation {}", where_clause);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        for val in query_filter.bind_values() {
            count_query = count_query.bind(val.as_str());
        }
        let total = count_query
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to count documentation"))?;

        let sql = format!(
            "SELECT id, title, content, created_at, updated_at FROM documentation {} {} \
             LIMIT ? OFFSET ?",
            where_clause,
            order_clause(pagination, "created_at", "id")
        );
        let mut query = sqlx::query_as::<_, DocumentationRow>(&sql);
        for val in query_filter.bind_values() {
            query = query.bind(val.as_str());
        }
        let rows = query
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to list documentation"))?;

        let items = rows
            .into_iter()
            .map(Documentation::try_from)
            .collect::<AdminResult<Vec<_>>>()?;
        Ok(CachedList { total, items })
    }

    /// 作成
    pub async fn insert(&self, doc: &Documentation) -> AdminResult<()> {
        sqlx::query(
            "INSERT INTO documentation (id, title, content, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(doc.id.to_string())
        .bind(&doc.title)
        .bind(&doc.content)
        .bind(to_db_time(&doc.created_at))
        .bind(to_db_time(&doc.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Failed to insert documentation"))?;

        self.cache.invalidate().await;
        Ok(())
    }

    /// 更新（`None`のフィールドは変更しない）
    pub async fn update(&self, id: Uuid, update: &DocumentationUpdate) -> AdminResult<()> {
        let mut sets: Vec<&str> = Vec::new();
        let mut bind_values: Vec<String> = Vec::new();
        if let Some(ref title) = update.title {
            sets.push("title = ?");
            bind_values.push(title.clone());
        }
        if let Some(ref content) = update.content {
            sets.push("content = ?");
            bind_values.push(content.clone());
        }
        sets.push("updated_at = ?");
        bind_values.push(to_db_time(&Utc::now()));

        let sql = format!("UPDATE documentation SET {} WHERE id = ?", sets.join(", "));
        let mut query = sqlx::query(&sql);
        for val in &bind_values {
            query = query.bind(val.as_str());
        }
        let result = query
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to update documentation"))?;
        ensure_affected(
            result.rows_affected(),
            &format!("documentation ({}) not found", id),
        )?;

        self.cache.invalidate().await;
        Ok(())
    }

    /// 削除
    pub async fn delete(&self, id: Uuid) -> AdminResult<()> {
        let affected = self.delete_many(&[id]).await?;
        ensure_affected(affected, &format!("documentation ({}) not found", id))
    }

    /// 複数を削除し、削除件数を返す
    pub async fn delete_many(&self, ids: &[Uuid]) -> AdminResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let sql = format!(
            "DELETE FROM documentation WHERE id IN ({})",
            placeholders(ids.len())
        );
        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(id.to_string());
        }
        let result = query
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to delete documentation"))?;

        self.cache.invalidate().await;
        Ok(result.rows_affected())
    }
}
