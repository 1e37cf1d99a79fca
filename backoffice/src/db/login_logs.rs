// ログインログの永続化

use super::query::{fold_case, order_clause, QueryFilter};
use super::users::placeholders;
use super::{ensure_affected, map_sqlx_error, parse_db_time, parse_db_uuid, to_db_time, UserRepository};
use crate::cache::keys::LOGIN_LOG_QUEUE;
use crate::common::error::{AdminError, AdminResult};
use crate::types::{CachedList, LoginLogEntry, LoginLogFilter, NewLoginLog, Pagination};
use sqlx::SqlitePool;
use uuid::Uuid;

const LOGIN_LOG_COLUMNS: &str =
    "id, user_id, username, email, ip_address, user_agent, created_at";

#[derive(sqlx::FromRow)]
struct LoginLogRow {
    id: String,
    user_id: String,
    username: String,
    email: String,
    ip_address: String,
    user_agent: String,
    created_at: String,
}

impl TryFrom<LoginLogRow> for LoginLogEntry {
    type Error = AdminError;

    fn try_from(row: LoginLogRow) -> Result<Self, Self::Error> {
        Ok(LoginLogEntry {
            id: parse_db_uuid(&row.id)?,
            user_id: parse_db_uuid(&row.user_id)?,
            username: row.username,
            email: row.email,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            created_at: parse_db_time(&row.created_at)?,
        })
    }
}

/// ログインログリポジトリ
///
/// ログは不変で、一覧は書き込みバッファの排出直後に読まれるためキャッシュしない。
#[derive(Clone)]
pub struct LoginLogRepository {
    pool: SqlitePool,
    users: UserRepository,
}

impl LoginLogRepository {
    /// 作成
    pub fn new(pool: SqlitePool, users: UserRepository) -> Self {
        Self { pool, users }
    }

    /// 書き込み
    ///
    /// ユーザー名・メールアドレスをこの時点のユーザーレコードから複製する。
    /// ユーザーを引けない場合は書き込まない。
    pub async fn insert(&self, log: &NewLoginLog) -> AdminResult<LoginLogEntry> {
        let user = self.users.get_by_id(log.user_id).await?;
        let entry = LoginLogEntry {
            id: Uuid::new_v4(),
            user_id: user.id,
            username: user.username,
            email: user.email,
            ip_address: log.ip_address.clone(),
            user_agent: log.user_agent.clone(),
            created_at: log.created_at,
        };

        sqlx::query(
            "INSERT INTO login_logs (id, user_id, username, email, ip_address, user_agent, \
             username_folded, email_folded, user_agent_folded, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(entry.id.to_string())
        .bind(entry.user_id.to_string())
        .bind(&entry.username)
        .bind(&entry.email)
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .bind(fold_case(&entry.username))
        .bind(fold_case(&entry.email))
        .bind(fold_case(&entry.user_agent))
        .bind(to_db_time(&entry.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Failed to insert login log"))?;

        Ok(entry)
    }

    /// IDで取得
    pub async fn get_by_id(&self, id: Uuid) -> AdminResult<LoginLogEntry> {
        let sql = format!("SELECT {} FROM login_logs WHERE id = ?", LOGIN_LOG_COLUMNS);
        let row = sqlx::query_as::<_, LoginLogRow>(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to get login log"))?
            .ok_or_else(|| AdminError::NotFound(format!("login log ({}) not found", id)))?;
        LoginLogEntry::try_from(row)
    }

    /// 一覧取得（総件数付き）
    pub async fn get_list(
        &self,
        filter: &LoginLogFilter,
        pagination: &Pagination,
    ) -> AdminResult<CachedList<LoginLogEntry>> {
        let query_filter = QueryFilter::new(LOGIN_LOG_QUEUE, "list")
            .range("created_at", &filter.created)
            .contains_any(
                &["username_folded", "email_folded", "ip_address", "user_agent_folded"],
                filter.query.as_deref(),
            );
        let where_clause = query_filter.where_clause();

        let count_sql = format!("SELECT COUNT(*) FROM login_logs {}", where_clause);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        for val in query_filter.bind_values() {
            count_query = count_query.bind(val.as_str());
        }
        let total = count_query
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to count login logs"))?;

        let sql = format!(
            "SELECT {} FROM login_logs {} {} LIMIT ? OFFSET ?",
            LOGIN_LOG_COLUMNS,
            where_clause,
            order_clause(pagination, "created_at", "seq")
        );
        let mut query = sqlx::query_as::<_, LoginLogRow>(&sql);
        for val in query_filter.bind_values() {
            query = query.bind(val.as_str());
        }
        let rows = query
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to list login logs"))?;

        let items = rows
            .into_iter()
            .map(LoginLogEntry::try_from)
            .collect::<AdminResult<Vec<_>>>()?;
        Ok(CachedList { total, items })
    }

    /// 削除
    pub async fn delete(&self, id: Uuid) -> AdminResult<()> {
        let affected = self.delete_many(&[id]).await?;
        ensure_affected(affected, &format!("login log ({}) not found", id))
    }

    /// 複数を削除し、削除件数を返す
    pub async fn delete_many(&self, ids: &[Uuid]) -> AdminResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let sql = format!(
            "DELETE FROM login_logs WHERE id IN ({})",
            placeholders(ids.len())
        );
        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(id.to_string());
        }
        let result = query
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to delete login logs"))?;
        Ok(result.rows_affected())
    }
}
