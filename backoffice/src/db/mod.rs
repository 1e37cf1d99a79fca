//! データベースアクセス層
//!
//! SQLiteをドキュメントストアとして使い、ユーザー・お知らせ・ドキュメントは
//! キャッシュ層を前段に置いたキャッシュアサイド方式で読み取る。

/// キャッシュアサイドの読み取り・無効化
pub mod cached;

/// WHERE句とキャッシュキーの構築
pub mod query;

/// ユーザー管理
pub mod users;

/// お知らせ管理
pub mod notices;

/// ドキュメント管理
pub mod documentation;

/// ログインログ
pub mod login_logs;

/// 操作ログ
pub mod operation_logs;

pub use documentation::DocumentationRepository;
pub use login_logs::LoginLogRepository;
pub use notices::NoticeRepository;
pub use operation_logs::OperationLogRepository;
pub use users::UserRepository;

use crate::common::error::{AdminError, AdminResult};
use crate::config::DatabaseConfig;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use uuid::Uuid;

/// 接続プールを作成する
///
/// SQLiteファイルはディレクトリが存在しないと作成できないため、先に作成しておく。
pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<SqlitePool> {
    if let Some(path) = config.url.strip_prefix("sqlite:") {
        // `sqlite::memory:` のような特殊指定はスキップ
        if !path.starts_with(':') {
            let normalized = path.trim_start_matches("//");
            let path_without_params = normalized.split('?').next().unwrap_or(normalized);
            if let Some(parent) = std::path::Path::new(path_without_params).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }
    }

    let connect_options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect_with(connect_options)
        .await?;
    Ok(pool)
}

/// マイグレーションを実行する
pub async fn migrate(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// 保存用の時刻表現
///
/// マイクロ秒固定幅のUTC RFC3339。文字列比較の順序が時刻順と一致する。
pub(crate) fn to_db_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_db_time(value: &str) -> AdminResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AdminError::OperationFailed(format!("Invalid timestamp '{}': {}", value, e)))
}

pub(crate) fn parse_opt_db_time(value: Option<String>) -> AdminResult<Option<DateTime<Utc>>> {
    value.as_deref().map(parse_db_time).transpose()
}

pub(crate) fn parse_db_uuid(value: &str) -> AdminResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| AdminError::OperationFailed(format!("Invalid id '{}': {}", value, e)))
}

pub(crate) fn parse_db_enum<T>(value: &str) -> AdminResult<T>
where
    T: FromStr<Err = AdminError>,
{
    value
        .parse()
        .map_err(|e: AdminError| AdminError::OperationFailed(format!("Corrupt row: {}", e)))
}

/// sqlxのエラーを分類する
///
/// 一意制約違反は`DuplicateKey`、該当行なしは`NotFound`、それ以外は`OperationFailed`。
pub(crate) fn map_sqlx_error(e: sqlx::Error, context: &str) -> AdminError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return AdminError::DuplicateKey(format!("{}: {}", context, db_err.message()));
        }
    }
    match e {
        sqlx::Error::RowNotFound => AdminError::NotFound(context.to_string()),
        other => AdminError::OperationFailed(format!("{}: {}", context, other)),
    }
}

/// 更新・削除の影響行数が0なら`NotFound`
pub(crate) fn ensure_affected(rows_affected: u64, context: &str) -> AdminResult<()> {
    if rows_affected == 0 {
        Err(AdminError::NotFound(context.to_string()))
    } else {
        Ok(())
    }
}
