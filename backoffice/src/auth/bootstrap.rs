//! 初回起動時の管理者アカウント作成
//!
//! 環境変数から管理者を作成

use crate::auth::password::hash_password;
use crate::common::error::{AdminError, AdminResult};
use crate::config::BootstrapConfig;
use crate::db::UserRepository;
use crate::types::{User, UserRole};

/// 管理者ユーザー名の既定値
const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// 管理者が1人もいなければ設定から作成する
///
/// # Returns
/// * `Ok(Some(user))` - 管理者作成成功
/// * `Ok(None)` - 既に管理者がいる、またはパスワードが未設定（作成しない）
/// * `Err(AdminError)` - 作成失敗
pub async fn ensure_admin(
    users: &UserRepository,
    config: &BootstrapConfig,
) -> AdminResult<Option<User>> {
    if users.admin_exists().await? {
        tracing::debug!("Admin user already exists, skipping bootstrap");
        return Ok(None);
    }

    // パスワードが設定されていなければスキップ
    let password = match config.admin_password.as_deref() {
        Some(p) if !p.is_empty() => p,
        _ => {
            tracing::warn!(
                "No admin user exists and BACKOFFICE_ADMIN_PASSWORD is not set; admin API is unusable"
            );
            return Ok(None);
        }
    };

    let username = config
        .admin_username
        .clone()
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| DEFAULT_ADMIN_USERNAME.to_string());
    let email = config
        .admin_email
        .clone()
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| format!("{}@localhost", username));

    let password_hash = hash_password(password)?;
    let admin = User::new(&username, &email, password_hash, UserRole::Admin, "");

    match users.insert(&admin).await {
        Ok(()) => {
            tracing::info!(username = %admin.username, email = %admin.email, "Created admin user from env");
            Ok(Some(admin))
        }
        Err(AdminError::DuplicateKey(e)) => {
            tracing::warn!(
                username = %username,
                "Bootstrap admin collides with an existing user, skipping creation: {}",
                e
            );
            Ok(None)
        }
        Err(e) => {
            tracing::error!("Failed to create admin user from env: {}", e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::verify_password;
    use crate::db::test_utils::{test_cache, test_db_pool};
    use std::time::Duration;

    async fn repo() -> UserRepository {
        UserRepository::new(test_db_pool().await, test_cache(), Duration::from_secs(60))
    }

    fn config(password: Option<&str>) -> BootstrapConfig {
        BootstrapConfig {
            admin_email: Some("root@example.com".to_string()),
            admin_username: Some("root".to_string()),
            admin_password: password.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn creates_admin_once() {
        let users = repo().await;
        let created = ensure_admin(&users, &config(Some("s3cret-pass")))
            .await
            .unwrap()
            .expect("admin should be created");
        assert!(created.is_admin());
        assert!(verify_password("s3cret-pass", &created.password_hash).unwrap());

        let again = ensure_admin(&users, &config(Some("s3cret-pass"))).await.unwrap();
        assert!(again.is_none());
        assert_eq!(users.count(true).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn skips_without_password() {
        let users = repo().await;
        assert!(ensure_admin(&users, &config(None)).await.unwrap().is_none());
        assert!(!users.admin_exists().await.unwrap());
    }

    #[tokio::test]
    async fn default_username_and_email() {
        let users = repo().await;
        let cfg = BootstrapConfig {
            admin_password: Some("pw".to_string()),
            ..BootstrapConfig::default()
        };
        let created = ensure_admin(&users, &cfg).await.unwrap().unwrap();
        assert_eq!(created.username, "admin");
        assert_eq!(created.email, "admin@localhost");
    }
}
