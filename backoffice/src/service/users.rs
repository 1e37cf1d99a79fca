use super::operation::{record, Operator};
use crate::auth::password::hash_password;
use crate::common::error::AdminResult;
use crate::types::{
    CachedList, EntityType, Operation, Pagination, User, UserFilter, UserRole, UserUpdate,
};
use crate::AppState;
use uuid::Uuid;

/// 新規ユーザーの入力
#[derive(Debug, Clone)]
pub struct NewUser {
    /// ユーザー名
    pub username: String,
    /// メールアドレス
    pub email: String,
    /// 平文パスワード
    pub password: String,
    /// 所属組織
    pub organization: String,
}

/// 一般ユーザーを作成する（管理者の追加はブートストラップのみ）
pub async fn insert_user(state: &AppState, operator: &Operator, input: NewUser) -> AdminResult<User> {
    let description = format!("Insert user {}", input.username);
    let mut entity_id = Uuid::nil();
    let result = async {
        let password_hash = hash_password(&input.password)?;
        let user = User::new(
            input.username,
            input.email,
            password_hash,
            UserRole::User,
            input.organization,
        );
        entity_id = user.id;
        state.users.insert(&user).await?;
        Ok(user)
    }
    .await;
    record(
        state,
        operator,
        Operation::Create,
        EntityType::User,
        entity_id,
        description,
        result,
    )
    .await
}

/// ユーザーを取得する
pub async fn get_user(state: &AppState, user_id: Uuid) -> AdminResult<User> {
    state.users.get_by_id(user_id).await
}

/// ユーザー一覧
pub async fn get_user_list(
    state: &AppState,
    filter: &UserFilter,
    pagination: &Pagination,
) -> AdminResult<CachedList<User>> {
    state.users.get_list(filter, pagination).await
}

/// ユーザー情報を更新する
pub async fn update_user(
    state: &AppState,
    operator: &Operator,
    user_id: Uuid,
    update: &UserUpdate,
) -> AdminResult<()> {
    let result = state.users.update(user_id, update).await;
    record(
        state,
        operator,
        Operation::Update,
        EntityType::User,
        user_id,
        format!("Update user {}", user_id),
        result,
    )
    .await
}

/// ユーザーを論理削除する
pub async fn delete_user(state: &AppState, operator: &Operator, user_id: Uuid) -> AdminResult<()> {
    let result = state.users.soft_delete(user_id).await;
    record(
        state,
        operator,
        Operation::Delete,
        EntityType::User,
        user_id,
        format!("Delete user {}", user_id),
        result,
    )
    .await
}

/// ユーザーのパスワードを再設定する
pub async fn change_user_password(
    state: &AppState,
    operator: &Operator,
    user_id: Uuid,
    new_password: &str,
) -> AdminResult<()> {
    let result = async {
        let password_hash = hash_password(new_password)?;
        state.users.update_password(user_id, &password_hash).await
    }
    .await;
    record(
        state,
        operator,
        Operation::Update,
        EntityType::User,
        user_id,
        format!("Change password of user {}", user_id),
        result,
    )
    .await
}
