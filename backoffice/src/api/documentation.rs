//! ドキュメントAPI

use super::error::{ApiResponse, ApiResult};
use super::validation::{self, format_time, JsonBody, QueryParams, CONTENT_LEN, TITLE_LEN};
use crate::auth::middleware::AuthUser;
use crate::common::ip::ClientInfo;
use crate::service::{self, Operator};
use crate::types::{Documentation, DocumentationFilter, DocumentationUpdate};
use crate::AppState;
use axum::{extract::State, Extension};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// ドキュメントID指定のクエリ
#[derive(Debug, Deserialize)]
pub struct DocumentationIdQuery {
    /// ドキュメントID
    #[serde(rename = "documentationID")]
    pub documentation_id: Option<Uuid>,
}

/// ドキュメント一覧のクエリ
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentationListQuery {
    /// ページ番号
    pub page: Option<u32>,
    /// 1ページの件数
    pub page_size: Option<u32>,
    /// 降順か
    pub desc: Option<bool>,
    /// 更新日時の下限
    pub update_start_time: Option<DateTime<Utc>>,
    /// 更新日時の上限
    pub update_end_time: Option<DateTime<Utc>>,
}

/// ドキュメント作成リクエスト
#[derive(Debug, Deserialize)]
pub struct InsertDocumentationRequest {
    /// タイトル
    pub title: String,
    /// 本文
    pub content: String,
}

/// ドキュメント更新リクエスト
#[derive(Debug, Deserialize)]
pub struct UpdateDocumentationRequest {
    /// ドキュメントID
    pub documentation_id: Option<Uuid>,
    /// タイトル
    pub title: Option<String>,
    /// 本文
    pub content: Option<String>,
}

/// ドキュメント詳細
#[derive(Debug, Serialize)]
pub struct DocumentationResponse {
    /// ドキュメントID
    pub document_id: String,
    /// タイトル
    pub title: String,
    /// 本文
    pub content: String,
    /// 作成日時
    pub created_at: String,
    /// 更新日時
    pub updated_at: String,
}

impl From<Documentation> for DocumentationResponse {
    fn from(doc: Documentation) -> Self {
        Self {
            document_id: doc.id.to_string(),
            title: doc.title,
            content: doc.content,
            created_at: format_time(&doc.created_at),
            updated_at: format_time(&doc.updated_at),
        }
    }
}

/// ドキュメント一覧の要素
#[derive(Debug, Serialize)]
pub struct DocumentationSummary {
    /// ドキュメントID
    pub document_id: String,
    /// タイトル
    pub title: String,
    /// 作成日時
    pub created_at: String,
}

/// ドキュメント一覧
#[derive(Debug, Serialize)]
pub struct DocumentationListResponse {
    /// 総件数
    pub total: i64,
    /// 現在ページの要素
    pub documentation_summary_list: Vec<DocumentationSummary>,
}

/// GET /api/v1/documentation?documentationID=
pub async fn get_documentation(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<DocumentationIdQuery>,
) -> ApiResult<DocumentationResponse> {
    let documentation_id = validation::required("documentationID", query.documentation_id)?;
    let doc = service::documentation::get_documentation(&state, documentation_id).await?;
    Ok(ApiResponse::ok(doc.into()))
}

/// GET /api/v1/documentation/list
pub async fn get_documentation_list(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<DocumentationListQuery>,
) -> ApiResult<DocumentationListResponse> {
    let pagination = validation::pagination(query.page, query.page_size, query.desc)?;
    let filter = DocumentationFilter {
        updated: validation::time_range(query.update_start_time, query.update_end_time)?,
    };

    let list = service::documentation::get_documentation_list(&state, &filter, &pagination).await?;
    Ok(ApiResponse::ok(DocumentationListResponse {
        total: list.total,
        documentation_summary_list: list
            .items
            .into_iter()
            .map(|doc| DocumentationSummary {
                document_id: doc.id.to_string(),
                title: doc.title,
                created_at: format_time(&doc.created_at),
            })
            .collect(),
    }))
}

/// POST /api/v1/admin/documentation
///
/// `Idempotency-Key` ヘッダーが必要。
pub async fn insert_documentation(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    client: ClientInfo,
    JsonBody(request): JsonBody<InsertDocumentationRequest>,
) -> ApiResult<DocumentationResponse> {
    validation::length("title", &request.title, TITLE_LEN)?;
    validation::length("content", &request.content, CONTENT_LEN)?;

    let operator = Operator::new(auth_user.user_id, client);
    let doc = service::documentation::insert_documentation(
        &state,
        &operator,
        request.title,
        request.content,
    )
    .await?;
    Ok(ApiResponse::ok(doc.into()))
}

/// PUT /api/v1/admin/documentation
pub async fn update_documentation(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    client: ClientInfo,
    JsonBody(request): JsonBody<UpdateDocumentationRequest>,
) -> ApiResult<()> {
    let documentation_id = validation::required("documentation_id", request.documentation_id)?;
    validation::optional_length("title", request.title.as_deref(), TITLE_LEN)?;
    validation::optional_length("content", request.content.as_deref(), CONTENT_LEN)?;

    let update = DocumentationUpdate {
        title: request.title,
        content: request.content,
    };
    let operator = Operator::new(auth_user.user_id, client);
    service::documentation::update_documentation(&state, &operator, documentation_id, &update)
        .await?;
    Ok(ApiResponse::empty())
}

/// DELETE /api/v1/admin/documentation?documentationID=
pub async fn delete_documentation(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    client: ClientInfo,
    QueryParams(query): QueryParams<DocumentationIdQuery>,
) -> ApiResult<()> {
    let documentation_id = validation::required("documentationID", query.documentation_id)?;
    let operator = Operator::new(auth_user.user_id, client);
    service::documentation::delete_documentation(&state, &operator, documentation_id).await?;
    Ok(ApiResponse::empty())
}
