use crate::common::error::AdminResult;
use crate::types::User;
use crate::AppState;
use uuid::Uuid;

/// 自分のユーザーレコードを取得する
pub async fn get_profile(state: &AppState, user_id: Uuid) -> AdminResult<User> {
    state.users.get_by_id(user_id).await
}
