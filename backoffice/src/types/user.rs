use super::TimeRange;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// ユーザーロール
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// 一般ユーザー
    User,
    /// 管理者
    Admin,
}

string_enum!(UserRole {
    User => "USER",
    Admin => "ADMIN",
});

/// ユーザー
///
/// キャッシュにもこの形のままJSONで保存される。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// ユーザーID
    pub id: Uuid,
    /// ユーザー名（一意）
    pub username: String,
    /// メールアドレス（一意）
    pub email: String,
    /// パスワードハッシュ
    pub password_hash: String,
    /// ロール
    pub role: UserRole,
    /// 所属組織
    pub organization: String,
    /// 最終ログイン日時
    pub last_login: Option<DateTime<Utc>>,
    /// 論理削除フラグ
    pub deleted: bool,
    /// 論理削除日時
    pub deleted_at: Option<DateTime<Utc>>,
    /// 作成日時
    pub created_at: DateTime<Utc>,
    /// 更新日時
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// 新規ユーザーを作る（IDとタイムスタンプは現在時刻で採番）
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        role: UserRole,
        organization: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            role,
            organization: organization.into(),
            last_login: None,
            deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 管理者か
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// ユーザー一覧のフィルタ
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFilter {
    /// ロール完全一致
    pub role: Option<UserRole>,
    /// 所属組織完全一致
    pub organization: Option<String>,
    /// 最終ログイン日時の範囲
    pub last_login: TimeRange,
    /// 作成日時の範囲
    pub created: TimeRange,
    /// ユーザー名・メールアドレスへの部分一致（大文字小文字を区別しない）
    pub query: Option<String>,
}

/// ユーザー更新内容（`None`のフィールドは変更しない）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdate {
    /// ユーザー名
    pub username: Option<String>,
    /// メールアドレス
    pub email: Option<String>,
    /// 所属組織
    pub organization: Option<String>,
}

impl UserUpdate {
    /// 変更するフィールドが一つもない
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none() && self.organization.is_none()
    }
}
