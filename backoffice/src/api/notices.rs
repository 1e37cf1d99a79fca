//! お知らせAPI
//!
//! 参照はログイン済みユーザー、作成・更新・削除は管理者のみ

use super::error::{ApiResponse, ApiResult};
use super::validation::{self, format_time, JsonBody, QueryParams, CONTENT_LEN, TITLE_LEN};
use crate::auth::middleware::AuthUser;
use crate::common::ip::ClientInfo;
use crate::service::{self, Operator};
use crate::types::{Notice, NoticeFilter, NoticeType, NoticeUpdate};
use crate::AppState;
use axum::{extract::State, Extension};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// お知らせID指定のクエリ
#[derive(Debug, Deserialize)]
pub struct NoticeIdQuery {
    /// お知らせID
    #[serde(rename = "noticeID")]
    pub notice_id: Option<Uuid>,
}

/// お知らせ一覧のクエリ
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoticeListQuery {
    /// ページ番号
    pub page: Option<u32>,
    /// 1ページの件数
    pub page_size: Option<u32>,
    /// 降順か
    pub desc: Option<bool>,
    /// 種別
    pub notice_type: Option<NoticeType>,
    /// 更新日時の下限
    pub update_start_time: Option<DateTime<Utc>>,
    /// 更新日時の上限
    pub update_end_time: Option<DateTime<Utc>>,
}

/// お知らせ作成リクエスト
#[derive(Debug, Deserialize)]
pub struct InsertNoticeRequest {
    /// タイトル
    pub title: String,
    /// 本文
    pub content: String,
    /// 種別
    pub notice_type: NoticeType,
}

/// お知らせ更新リクエスト
#[derive(Debug, Deserialize)]
pub struct UpdateNoticeRequest {
    /// お知らせID
    pub notice_id: Option<Uuid>,
    /// タイトル
    pub title: Option<String>,
    /// 本文
    pub content: Option<String>,
    /// 種別
    pub notice_type: Option<NoticeType>,
}

/// お知らせ詳細
#[derive(Debug, Serialize)]
pub struct NoticeResponse {
    /// お知らせID
    pub notice_id: String,
    /// タイトル
    pub title: String,
    /// 本文
    pub content: String,
    /// 種別
    #[serde(rename = "type")]
    pub notice_type: String,
    /// 作成日時
    pub created_at: String,
    /// 更新日時
    pub updated_at: String,
}

impl From<Notice> for NoticeResponse {
    fn from(notice: Notice) -> Self {
        Self {
            notice_id: notice.id.to_string(),
            title: notice.title,
            content: notice.content,
            notice_type: notice.notice_type.to_string(),
            created_at: format_time(&notice.created_at),
            updated_at: format_time(&notice.updated_at),
        }
    }
}

/// お知らせ一覧の要素
#[derive(Debug, Serialize)]
pub struct NoticeSummary {
    /// お知らせID
    pub notice_id: String,
    /// タイトル
    pub title: String,
    /// 種別
    #[serde(rename = "type")]
    pub notice_type: String,
    /// 作成日時
    pub created_at: String,
}

/// お知らせ一覧
#[derive(Debug, Serialize)]
pub struct NoticeListResponse {
    /// 総件数
    pub total: i64,
    /// 現在ページの要素
    pub notice_summary_list: Vec<NoticeSummary>,
}

/// GET /api/v1/notice?noticeID=
pub async fn get_notice(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<NoticeIdQuery>,
) -> ApiResult<NoticeResponse> {
    let notice_id = validation::required("noticeID", query.notice_id)?;
    let notice = service::notices::get_notice(&state, notice_id).await?;
    Ok(ApiResponse::ok(notice.into()))
}

/// GET /api/v1/notice/list
pub async fn get_notice_list(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<NoticeListQuery>,
) -> ApiResult<NoticeListResponse> {
    let pagination = validation::pagination(query.page, query.page_size, query.desc)?;
    let filter = NoticeFilter {
        notice_type: query.notice_type,
        updated: validation::time_range(query.update_start_time, query.update_end_time)?,
    };

    let list = service::notices::get_notice_list(&state, &filter, &pagination).await?;
    Ok(ApiResponse::ok(NoticeListResponse {
        total: list.total,
        notice_summary_list: list
            .items
            .into_iter()
            .map(|notice| NoticeSummary {
                notice_id: notice.id.to_string(),
                title: notice.title,
                notice_type: notice.notice_type.to_string(),
                created_at: format_time(&notice.created_at),
            })
            .collect(),
    }))
}

/// POST /api/v1/admin/notice
///
/// `Idempotency-Key` ヘッダーが必要。
pub async fn insert_notice(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    client: ClientInfo,
    JsonBody(request): JsonBody<InsertNoticeRequest>,
) -> ApiResult<NoticeResponse> {
    validation::length("title", &request.title, TITLE_LEN)?;
    validation::length("content", &request.content, CONTENT_LEN)?;

    let operator = Operator::new(auth_user.user_id, client);
    let notice = service::notices::insert_notice(
        &state,
        &operator,
        request.title,
        request.content,
        request.notice_type,
    )
    .await?;
    Ok(ApiResponse::ok(notice.into()))
}

/// PUT /api/v1/admin/notice
pub async fn update_notice(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    client: ClientInfo,
    JsonBody(request): JsonBody<UpdateNoticeRequest>,
) -> ApiResult<()> {
    let notice_id = validation::required("notice_id", request.notice_id)?;
    validation::optional_length("title", request.title.as_deref(), TITLE_LEN)?;
    validation::optional_length("content", request.content.as_deref(), CONTENT_LEN)?;

    let update = NoticeUpdate {
        title: request.title,
        content: request.content,
        notice_type: request.notice_type,
    };
    let operator = Operator::new(auth_user.user_id, client);
    service::notices::update_notice(&state, &operator, notice_id, &update).await?;
    Ok(ApiResponse::empty())
}

/// DELETE /api/v1/admin/notice?noticeID=
pub async fn delete_notice(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    client: ClientInfo,
    QueryParams(query): QueryParams<NoticeIdQuery>,
) -> ApiResult<()> {
    let notice_id = validation::required("noticeID", query.notice_id)?;
    let operator = Operator::new(auth_user.user_id, client);
    service::notices::delete_notice(&state, &operator, notice_id).await?;
    Ok(ApiResponse::empty())
}
