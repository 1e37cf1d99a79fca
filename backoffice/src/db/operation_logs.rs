// 操作ログの永続化

use super::query::{fold_case, order_clause, QueryFilter};
use super::users::placeholders;
use super::{
    ensure_affected, map_sqlx_error, parse_db_enum, parse_db_time, parse_db_uuid, to_db_time,
    UserRepository,
};
use crate::cache::keys::OPERATION_LOG_QUEUE;
use crate::common::error::{AdminError, AdminResult};
use crate::types::{CachedList, NewOperationLog, OperationLogEntry, OperationLogFilter, Pagination};
use sqlx::SqlitePool;
use uuid::Uuid;

const OPERATION_LOG_COLUMNS: &str = "id, user_id, username, email, ip_address, user_agent, \
     operation, entity_id, entity_type, description, status, created_at";

#[derive(sqlx::FromRow)]
struct OperationLogRow {
    id: String,
    user_id: String,
    username: String,
    email: String,
    ip_address: String,
    user_agent: String,
    operation: String,
    entity_id: String,
    entity_type: String,
    description: String,
    status: String,
    created_at: String,
}

impl TryFrom<OperationLogRow> for OperationLogEntry {
    type Error = AdminError;

    fn try_from(row: OperationLogRow) -> Result<Self, Self::Error> {
        Ok(OperationLogEntry {
            id: parse_db_uuid(&row.id)?,
            user_id: parse_db_uuid(&row.user_id)?,
            username: row.username,
            email: row.email,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            operation: parse_db_enum(&row.operation)?,
            entity_id: parse_db_uuid(&row.entity_id)?,
            entity_type: parse_db_enum(&row.entity_type)?,
            description: row.description,
            status: parse_db_enum(&row.status)?,
            created_at: parse_db_time(&row.created_at)?,
        })
    }
}

/// 操作ログリポジトリ
#[derive(Clone)]
pub struct OperationLogRepository {
    pool: SqlitePool,
    users: UserRepository,
}

impl OperationLogRepository {
    /// 作成
    pub fn new(pool: SqlitePool, users: UserRepository) -> Self {
        Self { pool, users }
    }

    /// 書き込み（操作者のユーザー名・メールアドレスを複製する）
    pub async fn insert(&self, log: &NewOperationLog) -> AdminResult<OperationLogEntry> {
        let user = self.users.get_by_id(log.user_id).await?;
        let entry = OperationLogEntry {
            id: Uuid::new_v4(),
            user_id: user.id,
            username: user.username,
            email: user.email,
            ip_address: log.ip_address.clone(),
            user_agent: log.user_agent.clone(),
            operation: log.operation,
            entity_id: log.entity_id,
            entity_type: log.entity_type,
            description: log.description.clone(),
            status: log.status,
            created_at: log.created_at,
        };

        sqlx::query(
            "INSERT INTO operation_logs (id, user_id, username, email, ip_address, user_agent, \
             operation, entity_id, entity_type, description, status, created_at, \
             username_folded, email_folded, user_agent_folded, description_folded) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(entry.id.to_string())
        .bind(entry.user_id.to_string())
        .bind(&entry.username)
        .bind(&entry.email)
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .bind(entry.operation.as_str())
        .bind(entry.entity_id.to_string())
        .bind(entry.entity_type.as_str())
        .bind(&entry.description)
        .bind(entry.status.as_str())
        .bind(to_db_time(&entry.created_at))
        .bind(fold_case(&entry.username))
        .bind(fold_case(&entry.email))
        .bind(fold_case(&entry.user_agent))
        .bind(fold_case(&entry.description))
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Failed to insert operation log"))?;

        Ok(entry)
    }

    /// IDで取得
    pub async fn get_by_id(&self, id: Uuid) -> AdminResult<OperationLogEntry> {
        let sql = format!(
            "SELECT {} FROM operation_logs WHERE id = ?",
            OPERATION_LOG_COLUMNS
        );
        let row = sqlx::query_as::<_, OperationLogRow>(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to get operation log"))?
            .ok_or_else(|| AdminError::NotFound(format!("operation log ({}) not found", id)))?;
        OperationLogEntry::try_from(row)
    }

    /// 一覧取得（総件数付き）
    pub async fn get_list(
        &self,
        filter: &OperationLogFilter,
        pagination: &Pagination,
    ) -> AdminResult<CachedList<OperationLogEntry>> {
        let query_filter = QueryFilter::new(OPERATION_LOG_QUEUE, "list")
            .eq("operation", filter.operation.map(|o| o.as_str()))
            .eq("entity_type", filter.entity_type.map(|t| t.as_str()))
            .eq("status", filter.status.map(|s| s.as_str()))
            .range("created_at", &filter.created)
            .contains_any(
                &[
                    "username_folded",
                    "email_folded",
                    "ip_address",
                    "user_agent_folded",
                    "description_folded",
                ],
                filter.query.as_deref(),
            );
        let where_clause = query_filter.where_clause();

        let count_sql = format!("SELECT COUNT(*) FROM operation_logs {}", where_clause);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        for val in query_filter.bind_values() {
            count_query = count_query.bind(val.as_str());
        }
        let total = count_query
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to count operation logs"))?;

        let sql = format!(
            "SELECT {} FROM operation_logs {} {} LIMIT ? OFFSET ?",
            OPERATION_LOG_COLUMNS,
            where_clause,
            order_clause(pagination, "created_at", "seq")
        );
        let mut query = sqlx::query_as::<_, OperationLogRow>(&sql);
        for val in query_filter.bind_values() {
            query = query.bind(val.as_str());
        }
        let rows = query
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to list operation logs"))?;

        let items = rows
            .into_iter()
            .map(OperationLogEntry::try_from)
            .collect::<AdminResult<Vec<_>>>()?;
        Ok(CachedList { total, items })
    }

    /// 削除
    pub async fn delete(&self, id: Uuid) -> AdminResult<()> {
        let affected = self.delete_many(&[id]).await?;
        ensure_affected(affected, &format!("operation log ({}) not found", id))
    }

    /// 複数を削除し、削除件数を返す
    pub async fn delete_many(&self, ids: &[Uuid]) -> AdminResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let sql = format!(
            "DELETE FROM operation_logs WHERE id IN ({})",
            placeholders(ids.len())
        );
        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(id.to_string());
        }
        let result = query
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to delete operation logs"))?;
        Ok(result.rows_affected())
    }
}
