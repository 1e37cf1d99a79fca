//! ユーザー管理API（管理者のみ）

use super::error::{ApiResponse, ApiResult};
use super::validation::{
    self, format_time, JsonBody, QueryParams, ORGANIZATION_MAX_LEN, PASSWORD_LEN, USERNAME_LEN,
};
use crate::auth::middleware::AuthUser;
use crate::common::ip::ClientInfo;
use crate::service::{self, users::NewUser, Operator};
use crate::types::{User, UserFilter, UserRole, UserUpdate};
use crate::AppState;
use axum::{extract::State, Extension};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// ユーザーID指定のクエリ
#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    /// ユーザーID
    #[serde(rename = "userID")]
    pub user_id: Option<Uuid>,
}

/// ユーザー一覧のクエリ
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListQuery {
    /// ページ番号
    pub page: Option<u32>,
    /// 1ページの件数
    pub page_size: Option<u32>,
    /// 降順か
    pub desc: Option<bool>,
    /// ロール
    pub role: Option<UserRole>,
    /// 所属組織
    pub organization: Option<String>,
    /// 最終ログイン日時の下限
    pub last_login_start_time: Option<DateTime<Utc>>,
    /// 最終ログイン日時の上限
    pub last_login_end_time: Option<DateTime<Utc>>,
    /// 作成日時の下限
    pub create_start_time: Option<DateTime<Utc>>,
    /// 作成日時の上限
    pub create_end_time: Option<DateTime<Utc>>,
    /// ユーザー名・メールアドレスの部分一致
    pub query: Option<String>,
}

/// ユーザー作成リクエスト
#[derive(Debug, Deserialize)]
pub struct InsertUserRequest {
    /// ユーザー名
    pub username: String,
    /// メールアドレス
    pub email: String,
    /// 初期パスワード
    pub password: String,
    /// 所属組織
    pub organization: String,
}

/// ユーザー更新リクエスト
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    /// ユーザーID
    pub user_id: Option<Uuid>,
    /// ユーザー名
    pub username: Option<String>,
    /// メールアドレス
    pub email: Option<String>,
    /// 所属組織
    pub organization: Option<String>,
}

/// パスワード再設定リクエスト
#[derive(Debug, Deserialize)]
pub struct ChangeUserPasswordRequest {
    /// ユーザーID
    pub user_id: Option<Uuid>,
    /// 新しいパスワード
    pub new_password: String,
}

/// ユーザー情報
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// ユーザーID
    pub user_id: String,
    /// ユーザー名
    pub username: String,
    /// メールアドレス
    pub email: String,
    /// ロール
    pub role: String,
    /// 所属組織
    pub organization: String,
    /// 最終ログイン日時（未ログインは空文字）
    pub last_login: String,
    /// 作成日時
    pub created_at: String,
    /// 更新日時
    pub updated_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id.to_string(),
            last_login: user.last_login.as_ref().map(format_time).unwrap_or_default(),
            created_at: format_time(&user.created_at),
            updated_at: format_time(&user.updated_at),
            username: user.username,
            email: user.email,
            role: user.role.to_string(),
            organization: user.organization,
        }
    }
}

/// ユーザー一覧
#[derive(Debug, Serialize)]
pub struct UserListResponse {
    /// 総件数
    pub total: i64,
    /// 現在ページの要素
    pub user_list: Vec<UserResponse>,
}

/// POST /api/v1/admin/user
///
/// 一般ユーザーを作成する。`Idempotency-Key` ヘッダーが必要。
pub async fn insert_user(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    client: ClientInfo,
    JsonBody(request): JsonBody<InsertUserRequest>,
) -> ApiResult<UserResponse> {
    validation::length("username", &request.username, USERNAME_LEN)?;
    validation::email("email", &request.email)?;
    validation::length("password", &request.password, PASSWORD_LEN)?;
    validation::length("organization", &request.organization, (0, ORGANIZATION_MAX_LEN))?;

    let operator = Operator::new(auth_user.user_id, client);
    let input = NewUser {
        username: request.username,
        email: request.email,
        password: request.password,
        organization: request.organization,
    };
    let user = service::users::insert_user(&state, &operator, input).await?;
    Ok(ApiResponse::ok(user.into()))
}

/// GET /api/v1/admin/user?userID=
pub async fn get_user(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<UserIdQuery>,
) -> ApiResult<UserResponse> {
    let user_id = validation::required("userID", query.user_id)?;
    let user = service::users::get_user(&state, user_id).await?;
    Ok(ApiResponse::ok(user.into()))
}

/// GET /api/v1/admin/user/list
pub async fn get_user_list(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<UserListQuery>,
) -> ApiResult<UserListResponse> {
    let pagination = validation::pagination(query.page, query.page_size, query.desc)?;
    validation::optional_length(
        "organization",
        query.organization.as_deref(),
        (0, ORGANIZATION_MAX_LEN),
    )?;
    let filter = UserFilter {
        role: query.role,
        organization: query.organization.filter(|o| !o.is_empty()),
        last_login: validation::time_range(
            query.last_login_start_time,
            query.last_login_end_time,
        )?,
        created: validation::time_range(query.create_start_time, query.create_end_time)?,
        query: validation::search_query(query.query)?,
    };

    let list = service::users::get_user_list(&state, &filter, &pagination).await?;
    Ok(ApiResponse::ok(UserListResponse {
        total: list.total,
        user_list: list.items.into_iter().map(UserResponse::from).collect(),
    }))
}

/// PUT /api/v1/admin/user
pub async fn update_user(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    client: ClientInfo,
    JsonBody(request): JsonBody<UpdateUserRequest>,
) -> ApiResult<()> {
    let user_id = validation::required("user_id", request.user_id)?;
    validation::optional_length("username", request.username.as_deref(), USERNAME_LEN)?;
    if let Some(email) = request.email.as_deref() {
        validation::email("email", email)?;
    }
    validation::optional_length(
        "organization",
        request.organization.as_deref(),
        (0, ORGANIZATION_MAX_LEN),
    )?;

    let update = UserUpdate {
        username: request.username,
        email: request.email,
        organization: request.organization,
    };
    let operator = Operator::new(auth_user.user_id, client);
    service::users::update_user(&state, &operator, user_id, &update).await?;
    Ok(ApiResponse::empty())
}

/// DELETE /api/v1/admin/user?userID=
///
/// 論理削除。削除後はログイン・参照できなくなる。
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    client: ClientInfo,
    QueryParams(query): QueryParams<UserIdQuery>,
) -> ApiResult<()> {
    let user_id = validation::required("userID", query.user_id)?;
    let operator = Operator::new(auth_user.user_id, client);
    service::users::delete_user(&state, &operator, user_id).await?;
    Ok(ApiResponse::empty())
}

/// PUT /api/v1/admin/user/password
pub async fn change_user_password(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    client: ClientInfo,
    JsonBody(request): JsonBody<ChangeUserPasswordRequest>,
) -> ApiResult<()> {
    let user_id = validation::required("user_id", request.user_id)?;
    validation::length("new_password", &request.new_password, PASSWORD_LEN)?;

    let operator = Operator::new(auth_user.user_id, client);
    service::users::change_user_password(&state, &operator, user_id, &request.new_password)
        .await?;
    Ok(ApiResponse::empty())
}
