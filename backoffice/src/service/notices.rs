use super::operation::{record, Operator};
use crate::common::error::AdminResult;
use crate::types::{
    CachedList, EntityType, Notice, NoticeFilter, NoticeType, NoticeUpdate, Operation, Pagination,
};
use crate::AppState;
use uuid::Uuid;

/// お知らせを取得する
pub async fn get_notice(state: &AppState, notice_id: Uuid) -> AdminResult<Notice> {
    state.notices.get_by_id(notice_id).await
}

/// お知らせ一覧
pub async fn get_notice_list(
    state: &AppState,
    filter: &NoticeFilter,
    pagination: &Pagination,
) -> AdminResult<CachedList<Notice>> {
    state.notices.get_list(filter, pagination).await
}

/// お知らせを作成する
pub async fn insert_notice(
    state: &AppState,
    operator: &Operator,
    title: String,
    content: String,
    notice_type: NoticeType,
) -> AdminResult<Notice> {
    let description = format!("Insert notice {}", title);
    let notice = Notice::new(title, content, notice_type);
    let entity_id = notice.id;
    let result = state.notices.insert(&notice).await.map(|()| notice);
    record(
        state,
        operator,
        Operation::Create,
        EntityType::Notice,
        entity_id,
        description,
        result,
    )
    .await
}

/// お知らせを更新する
pub async fn update_notice(
    state: &AppState,
    operator: &Operator,
    notice_id: Uuid,
    update: &NoticeUpdate,
) -> AdminResult<()> {
    let result = state.notices.update(notice_id, update).await;
    record(
        state,
        operator,
        Operation::Update,
        EntityType::Notice,
        notice_id,
        format!("Update notice {}", notice_id),
        result,
    )
    .await
}

/// お知らせを削除する
pub async fn delete_notice(
    state: &AppState,
    operator: &Operator,
    notice_id: Uuid,
) -> AdminResult<()> {
    let result = state.notices.delete(notice_id).await;
    record(
        state,
        operator,
        Operation::Delete,
        EntityType::Notice,
        notice_id,
        format!("Delete notice {}", notice_id),
        result,
    )
    .await
}
