use super::operation::{record, Operator};
use crate::common::error::AdminResult;
use crate::types::{
    CachedList, Documentation, DocumentationFilter, DocumentationUpdate, EntityType, Operation,
    Pagination,
};
use crate::AppState;
use uuid::Uuid;

/// ドキュメントを取得する
pub async fn get_documentation(state: &AppState, documentation_id: Uuid) -> AdminResult<Documentation> {
    state.documentation.get_by_id(documentation_id).await
}

/// ドキュメント一覧
pub async fn get_documentation_list(
    state: &AppState,
    filter: &DocumentationFilter,
    pagination: &Pagination,
) -> AdminResult<CachedList<Documentation>> {
    state.documentation.get_list(filter, pagination).await
}

/// ドキュメントを作成する
pub async fn insert_documentation(
    state: &AppState,
    operator: &Operator,
    title: String,
    content: String,
) -> AdminResult<Documentation> {
    let description = format!("Insert documentation {}", title);
    let doc = Documentation::new(title, content);
    let entity_id = doc.id;
    let result = state.documentation.insert(&doc).await.map(|()| doc);
    record(
        state,
        operator,
        Operation::Create,
        EntityType::Documentation,
        entity_id,
        description,
        result,
    )
    .await
}

/// ドキュメントを更新する
pub async fn update_documentation(
    state: &AppState,
    operator: &Operator,
    documentation_id: Uuid,
    update: &DocumentationUpdate,
) -> AdminResult<()> {
    let result = state.documentation.update(documentation_id, update).await;
    record(
        state,
        operator,
        Operation::Update,
        EntityType::Documentation,
        documentation_id,
        format!("Update documentation {}", documentation_id),
        result,
    )
    .await
}

/// ドキュメントを削除する
pub async fn delete_documentation(
    state: &AppState,
    operator: &Operator,
    documentation_id: Uuid,
) -> AdminResult<()> {
    let result = state.documentation.delete(documentation_id).await;
    record(
        state,
        operator,
        Operation::Delete,
        EntityType::Documentation,
        documentation_id,
        format!("Delete documentation {}", documentation_id),
        result,
    )
    .await
}
