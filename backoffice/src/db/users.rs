// ユーザーCRUD操作（キャッシュアサイド）

use super::cached::CacheAside;
use super::query::{fold_case, order_clause, QueryFilter};
use super::{
    ensure_affected, map_sqlx_error, parse_db_enum, parse_db_time, parse_db_uuid,
    parse_opt_db_time, to_db_time,
};
use crate::cache::keys::{id_key, CacheKey, USER_PREFIX};
use crate::cache::SharedCache;
use crate::common::error::{AdminError, AdminResult};
use crate::types::{CachedList, Pagination, User, UserFilter, UserRole, UserUpdate};
use chrono::Utc;
use sqlx::SqlitePool;
use std::time::Duration;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, username, email, password_hash, role, organization, \
     last_login, deleted, deleted_at, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    username: String,
    email: String,
    password_hash: String,
    role: String,
    organization: String,
    last_login: Option<String>,
    deleted: bool,
    deleted_at: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<UserRow> for User {
    type Error = AdminError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: parse_db_uuid(&row.id)?,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            role: parse_db_enum(&row.role)?,
            organization: row.organization,
            last_login: parse_opt_db_time(row.last_login)?,
            deleted: row.deleted,
            deleted_at: parse_opt_db_time(row.deleted_at)?,
            created_at: parse_db_time(&row.created_at)?,
            updated_at: parse_db_time(&row.updated_at)?,
        })
    }
}

/// ユーザーリポジトリ
///
/// 論理削除済みのユーザーは、物理削除以外のすべての読み取りから見えない。
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
    cache: CacheAside,
}

impl UserRepository {
    /// 作成
    pub fn new(pool: SqlitePool, cache: SharedCache, ttl: Duration) -> Self {
        Self {
            pool,
            cache: CacheAside::new(cache, USER_PREFIX, ttl),
        }
    }

    async fn fetch_one_by(&self, column: &str, value: &str) -> AdminResult<User> {
        let sql = format!(
            "SELECT {} FROM users WHERE {} = ? AND deleted = 0",
            USER_COLUMNS, column
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to get user"))?
            .ok_or_else(|| AdminError::NotFound(format!("user ({}: {}) not found", column, value)))?;
        User::try_from(row)
    }

    /// IDで取得
    pub async fn get_by_id(&self, id: Uuid) -> AdminResult<User> {
        let key = id_key(USER_PREFIX, id);
        let id = id.to_string();
        self.cache
            .read_through(&key, || self.fetch_one_by("id", &id))
            .await
    }

    /// メールアドレスで取得
    pub async fn get_by_email(&self, email: &str) -> AdminResult<User> {
        let key = CacheKey::new(USER_PREFIX, "email")
            .field("email", email)
            .build();
        self.cache
            .read_through(&key, || self.fetch_one_by("email", email))
            .await
    }

    /// ユーザー名で取得
    pub async fn get_by_username(&self, username: &str) -> AdminResult<User> {
        let key = CacheKey::new(USER_PREFIX, "username")
            .field("username", username)
            .build();
        self.cache
            .read_through(&key, || self.fetch_one_by("username", username))
            .await
    }

    fn list_filter(filter: &UserFilter) -> QueryFilter {
        QueryFilter::new(USER_PREFIX, "list")
            .fixed("deleted = 0")
            .eq("role", filter.role.map(|role| role.as_str()))
            .eq("organization", filter.organization.as_deref())
            .range("last_login", &filter.last_login)
            .range("created_at", &filter.created)
            .contains_any(&["username_folded", "email_folded"], filter.query.as_deref())
    }

    /// 一覧取得（総件数付き）
    pub async fn get_list(
        &self,
        filter: &UserFilter,
        pagination: &Pagination,
    ) -> AdminResult<CachedList<User>> {
        let query_filter = Self::list_filter(filter);
        let key = query_filter.list_key(pagination);
        self.cache
            .read_through(&key, || self.fetch_list(&query_filter, pagination))
            .await
    }

    async fn fetch_list(
        &self,
        query_filter: &QueryFilter,
        pagination: &Pagination,
    ) -> AdminResult<CachedList<User>> {
        let where_clause = query_filter.where_clause();

        let count_sql = format!("SELECT COUNT(*) FROM users {}", where_clause);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        for val in query_filter.bind_values() {
            count_query = count_query.bind(val.as_str());
        }
        let total = count_query
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to count users"))?;

        let sql = format!(
            "SELECT {} FROM users {} {} LIMIT ? OFFSET ?",
            USER_COLUMNS,
            where_clause,
            order_clause(pagination, "created_at", "id")
        );
        let mut query = sqlx::query_as::<_, UserRow>(&sql);
        for val in query_filter.bind_values() {
            query = query.bind(val.as_str());
        }
        let rows = query
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to list users"))?;

        let items = rows
            .into_iter()
            .map(User::try_from)
            .collect::<AdminResult<Vec<_>>>()?;
        Ok(CachedList { total, items })
    }

    /// 件数（`include_deleted`で論理削除済みを含める）
    pub async fn count(&self, include_deleted: bool) -> AdminResult<i64> {
        let sql = if include_deleted {
            "SELECT COUNT(*) FROM users"
        } else {
            "SELECT COUNT(*) FROM users WHERE deleted = 0"
        };
        sqlx::query_scalar::<_, i64>(sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to count users"))
    }

    /// 管理者が1人以上いるか
    pub async fn admin_exists(&self) -> AdminResult<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE role = ? AND deleted = 0",
        )
        .bind(UserRole::Admin.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Failed to count admins"))?;
        Ok(count > 0)
    }

    /// 作成
    ///
    /// ユーザー名・メールアドレスの重複は`DuplicateKey`。
    pub async fn insert(&self, user: &User) -> AdminResult<()> {
        sqlx::query(
            "INSERT INTO users (id, username, email, username_folded, email_folded, \
             password_hash, role, organization, last_login, deleted, deleted_at, \
             created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user.id.to_string())
        .bind(&user.username)
        .bind(&user.email)
        .bind(fold_case(&user.username))
        .bind(fold_case(&user.email))
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(&user.organization)
        .bind(user.last_login.as_ref().map(to_db_time))
        .bind(user.deleted)
        .bind(user.deleted_at.as_ref().map(to_db_time))
        .bind(to_db_time(&user.created_at))
        .bind(to_db_time(&user.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Failed to insert user"))?;

        self.cache.invalidate().await;
        Ok(())
    }

    /// プロフィール更新（`None`のフィールドは変更しない）
    pub async fn update(&self, id: Uuid, update: &UserUpdate) -> AdminResult<()> {
        let mut sets: Vec<&str> = Vec::new();
        let mut bind_values: Vec<String> = Vec::new();
        if let Some(ref username) = update.username {
            sets.push("username = ?");
            bind_values.push(username.clone());
            sets.push("username_folded = ?");
            bind_values.push(fold_case(username));
        }
        if let Some(ref email) = update.email {
            sets.push("email = ?");
            bind_values.push(email.clone());
            sets.push("email_folded = ?");
            bind_values.push(fold_case(email));
        }
        if let Some(ref organization) = update.organization {
            sets.push("organization = ?");
            bind_values.push(organization.clone());
        }
        sets.push("updated_at = ?");
        bind_values.push(to_db_time(&Utc::now()));

        let sql = format!(
            "UPDATE users SET {} WHERE id = ? AND deleted = 0",
            sets.join(", ")
        );
        let mut query = sqlx::query(&sql);
        for val in &bind_values {
            query = query.bind(val.as_str());
        }
        let result = query
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to update user"))?;
        ensure_affected(result.rows_affected(), &format!("user ({}) not found", id))?;

        self.cache.invalidate().await;
        Ok(())
    }

    /// パスワードハッシュを更新
    pub async fn update_password(&self, id: Uuid, password_hash: &str) -> AdminResult<()> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ? AND deleted = 0",
        )
        .bind(password_hash)
        .bind(to_db_time(&Utc::now()))
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Failed to update password"))?;
        ensure_affected(result.rows_affected(), &format!("user ({}) not found", id))?;

        self.cache.invalidate().await;
        Ok(())
    }

    /// 最終ログイン日時を現在時刻にする
    pub async fn update_last_login(&self, id: Uuid) -> AdminResult<()> {
        let now = to_db_time(&Utc::now());
        let result = sqlx::query(
            "UPDATE users SET last_login = ?, updated_at = ? WHERE id = ? AND deleted = 0",
        )
        .bind(&now)
        .bind(&now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Failed to update last login"))?;
        ensure_affected(result.rows_affected(), &format!("user ({}) not found", id))?;

        self.cache.invalidate().await;
        Ok(())
    }

    /// 論理削除
    pub async fn soft_delete(&self, id: Uuid) -> AdminResult<()> {
        let affected = self.soft_delete_many(&[id]).await?;
        ensure_affected(affected, &format!("user ({}) not found", id))
    }

    /// 複数を論理削除し、削除件数を返す
    pub async fn soft_delete_many(&self, ids: &[Uuid]) -> AdminResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let now = to_db_time(&Utc::now());
        let sql = format!(
            "UPDATE users SET deleted = 1, deleted_at = ?, updated_at = ? \
             WHERE deleted = 0 AND id IN ({})",
            placeholders(ids.len())
        );
        let mut query = sqlx::query(&sql).bind(&now).bind(&now);
        for id in ids {
            query = query.bind(id.to_string());
        }
        let result = query
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to soft delete users"))?;

        self.cache.invalidate().await;
        Ok(result.rows_affected())
    }

    /// 物理削除（論理削除済みも対象）
    pub async fn delete(&self, id: Uuid) -> AdminResult<()> {
        let affected = self.delete_many(&[id]).await?;
        ensure_affected(affected, &format!("user ({}) not found", id))
    }

    /// 複数を物理削除し、削除件数を返す
    pub async fn delete_many(&self, ids: &[Uuid]) -> AdminResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let sql = format!("DELETE FROM users WHERE id IN ({})", placeholders(ids.len()));
        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(id.to_string());
        }
        let result = query
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to delete users"))?;

        self.cache.invalidate().await;
        Ok(result.rows_affected())
    }

    /// 論理削除の有無に関係なく行を読む（監査・テスト用）
    pub async fn find_raw(&self, id: Uuid) -> AdminResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to get user"))?
            .map(User::try_from)
            .transpose()
    }
}

/// `?, ?, ?` を作る
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::{test_cache, test_db_pool};

    async fn repo() -> UserRepository {
        UserRepository::new(test_db_pool().await, test_cache(), Duration::from_secs(60))
    }

    fn user(name: &str) -> User {
        User::new(
            name,
            format!("{}@example.com", name),
            "hash",
            UserRole::User,
            "acme",
        )
    }

    #[tokio::test]
    async fn test_insert_and_get_by_id_email_username() {
        let repo = repo().await;
        let alice = user("alice");
        repo.insert(&alice).await.unwrap();

        assert_eq!(repo.get_by_id(alice.id).await.unwrap().username, "alice");
        assert_eq!(repo.get_by_email("alice@example.com").await.unwrap().id, alice.id);
        assert_eq!(repo.get_by_username("alice").await.unwrap().id, alice.id);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_duplicate_key_and_count_unchanged() {
        let repo = repo().await;
        repo.insert(&user("alice")).await.unwrap();
        let before = repo.count(true).await.unwrap();

        let mut clash = user("alice2");
        clash.email = "alice@example.com".to_string();
        assert!(matches!(
            repo.insert(&clash).await,
            Err(AdminError::DuplicateKey(_))
        ));
        assert_eq!(repo.count(true).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_duplicate_username_on_update() {
        let repo = repo().await;
        let alice = user("alice");
        let bob = user("bob");
        repo.insert(&alice).await.unwrap();
        repo.insert(&bob).await.unwrap();

        let update = UserUpdate {
            username: Some("alice".to_string()),
            ..UserUpdate::default()
        };
        assert!(matches!(
            repo.update(bob.id, &update).await,
            Err(AdminError::DuplicateKey(_))
        ));
    }

    #[tokio::test]
    async fn test_soft_deleted_user_is_invisible_but_row_remains() {
        let repo = repo().await;
        let alice = user("alice");
        repo.insert(&alice).await.unwrap();
        // キャッシュを温めてから削除する
        repo.get_by_id(alice.id).await.unwrap();

        repo.soft_delete(alice.id).await.unwrap();

        assert!(matches!(
            repo.get_by_id(alice.id).await,
            Err(AdminError::NotFound(_))
        ));
        assert!(matches!(
            repo.get_by_email("alice@example.com").await,
            Err(AdminError::NotFound(_))
        ));
        let list = repo
            .get_list(&UserFilter::default(), &Pagination::default())
            .await
            .unwrap();
        assert_eq!(list.total, 0);

        let raw = repo.find_raw(alice.id).await.unwrap().unwrap();
        assert!(raw.deleted);
        assert!(raw.deleted_at.is_some());

        // 論理削除済みでも物理削除はできる
        repo.delete(alice.id).await.unwrap();
        assert!(repo.find_raw(alice.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_user_is_not_found() {
        let repo = repo().await;
        let update = UserUpdate {
            organization: Some("x".to_string()),
            ..UserUpdate::default()
        };
        assert!(matches!(
            repo.update(Uuid::new_v4(), &update).await,
            Err(AdminError::NotFound(_))
        ));
        assert!(matches!(
            repo.delete(Uuid::new_v4()).await,
            Err(AdminError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_filters_and_query() {
        let repo = repo().await;
        let mut admin = user("root");
        admin.role = UserRole::Admin;
        repo.insert(&admin).await.unwrap();
        let alice = user("alice");
        let mut alicia = user("alicia");
        alicia.created_at = alice.created_at + chrono::Duration::seconds(1);
        repo.insert(&alice).await.unwrap();
        repo.insert(&alicia).await.unwrap();

        let filter = UserFilter {
            role: Some(UserRole::User),
            query: Some("ALI".to_string()),
            ..UserFilter::default()
        };
        let list = repo.get_list(&filter, &Pagination::new(1, 1, true)).await.unwrap();
        assert_eq!(list.total, 2);
        assert_eq!(list.items.len(), 1);
        assert_eq!(list.items[0].username, "alicia");

        let admins = UserFilter {
            role: Some(UserRole::Admin),
            ..UserFilter::default()
        };
        let list = repo.get_list(&admins, &Pagination::default()).await.unwrap();
        assert_eq!(list.total, 1);
        assert!(repo.admin_exists().await.unwrap());
    }

    #[tokio::test]
    async fn test_query_folds_non_ascii_case() {
        let repo = repo().await;
        let elodie = user("élodie");
        repo.insert(&elodie).await.unwrap();
        repo.insert(&user("bob")).await.unwrap();

        let by_query = |query: &str| UserFilter {
            query: Some(query.to_string()),
            ..UserFilter::default()
        };
        let list = repo.get_list(&by_query("ÉLO"), &Pagination::default()).await.unwrap();
        assert_eq!(list.total, 1);
        assert_eq!(list.items[0].id, elodie.id);

        // 更新後の値でも一致する
        let update = UserUpdate {
            username: Some("Ωmega".to_string()),
            ..UserUpdate::default()
        };
        repo.update(elodie.id, &update).await.unwrap();
        let list = repo.get_list(&by_query("ωMEGA"), &Pagination::default()).await.unwrap();
        assert_eq!(list.total, 1);
        assert_eq!(list.items[0].username, "Ωmega");
        let list = repo.get_list(&by_query("élodie"), &Pagination::default()).await.unwrap();
        assert_eq!(list.total, 1, "email still matches");
    }

    #[tokio::test]
    async fn test_update_last_login_and_password_invalidate_cache() {
        let repo = repo().await;
        let alice = user("alice");
        repo.insert(&alice).await.unwrap();
        assert!(repo.get_by_id(alice.id).await.unwrap().last_login.is_none());

        repo.update_last_login(alice.id).await.unwrap();
        repo.update_password(alice.id, "new-hash").await.unwrap();

        let fresh = repo.get_by_id(alice.id).await.unwrap();
        assert!(fresh.last_login.is_some());
        assert_eq!(fresh.password_hash, "new-hash");
    }

    #[tokio::test]
    async fn test_bulk_soft_delete_and_delete() {
        let repo = repo().await;
        let users: Vec<User> = ["a1", "a2", "a3"].iter().map(|n| user(n)).collect();
        for u in &users {
            repo.insert(u).await.unwrap();
        }
        let ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();

        assert_eq!(repo.soft_delete_many(&ids[..2]).await.unwrap(), 2);
        assert_eq!(repo.count(false).await.unwrap(), 1);
        assert_eq!(repo.count(true).await.unwrap(), 3);

        assert_eq!(repo.delete_many(&ids).await.unwrap(), 3);
        assert_eq!(repo.count(true).await.unwrap(), 0);
        assert_eq!(repo.delete_many(&[]).await.unwrap(), 0);
    }
}
