//! リクエストの抽出と入力検証
//!
//! JSON・クエリの解析失敗も含め、入力の不備はすべて`InvalidRequest`として
//! 共通のエンベロープで返す

use crate::api::error::AppError;
use crate::common::error::{AdminError, AdminResult};
use crate::types::{Pagination, TimeRange};
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;

/// ユーザー名の長さ
pub const USERNAME_LEN: (usize, usize) = (3, 20);
/// パスワードの長さ
pub const PASSWORD_LEN: (usize, usize) = (8, 20);
/// メールアドレスの最大長
pub const EMAIL_MAX_LEN: usize = 100;
/// 所属組織の最大長
pub const ORGANIZATION_MAX_LEN: usize = 100;
/// タイトルの長さ
pub const TITLE_LEN: (usize, usize) = (1, 100);
/// 本文の長さ
pub const CONTENT_LEN: (usize, usize) = (1, 10_000);
/// 検索文字列の最大長
pub const QUERY_MAX_LEN: usize = 100;
/// 1ページの最大件数
pub const MAX_PAGE_SIZE: u32 = 100;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*$")
        .expect("email regex is valid")
});

/// JSONボディ（解析失敗は`InvalidRequest`）
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError(AdminError::InvalidRequest(e.body_text())))?;
        Ok(Self(value))
    }
}

/// クエリパラメーター（解析失敗は`InvalidRequest`）
#[derive(Debug, Clone)]
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError(AdminError::InvalidRequest(e.body_text())))?;
        Ok(Self(value))
    }
}

/// 必須項目を取り出す
pub fn required<T>(field: &str, value: Option<T>) -> AdminResult<T> {
    value.ok_or_else(|| AdminError::InvalidRequest(format!("{} is required", field)))
}

/// 文字数が範囲内か（両端を含む）
pub fn length(field: &str, value: &str, (min, max): (usize, usize)) -> AdminResult<()> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(AdminError::InvalidRequest(format!(
            "{} must be between {} and {} characters",
            field, min, max
        )));
    }
    Ok(())
}

/// 指定された場合だけ文字数を検証する
pub fn optional_length(
    field: &str,
    value: Option<&str>,
    bounds: (usize, usize),
) -> AdminResult<()> {
    match value {
        Some(value) => length(field, value, bounds),
        None => Ok(()),
    }
}

/// メールアドレスの形式と長さ
pub fn email(field: &str, value: &str) -> AdminResult<()> {
    length(field, value, (1, EMAIL_MAX_LEN))?;
    if !EMAIL_RE.is_match(value) {
        return Err(AdminError::InvalidRequest(format!(
            "{} is not a valid email address",
            field
        )));
    }
    Ok(())
}

/// 時間範囲（開始は終了以前）
pub fn time_range(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> AdminResult<TimeRange> {
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(AdminError::InvalidRequest(
                "start time must not be later than end time".to_string(),
            ));
        }
    }
    Ok(TimeRange::new(start, end))
}

/// ページング（未指定は1ページ目・10件・降順）
pub fn pagination(
    page: Option<u32>,
    page_size: Option<u32>,
    desc: Option<bool>,
) -> AdminResult<Pagination> {
    let defaults = Pagination::default();
    let page = page.unwrap_or(defaults.page);
    let page_size = page_size.unwrap_or(defaults.page_size);
    if page < 1 {
        return Err(AdminError::InvalidRequest("page must be at least 1".to_string()));
    }
    if page_size < 1 || page_size > MAX_PAGE_SIZE {
        return Err(AdminError::InvalidRequest(format!(
            "pageSize must be between 1 and {}",
            MAX_PAGE_SIZE
        )));
    }
    Ok(Pagination::new(page, page_size, desc.unwrap_or(defaults.desc)))
}

/// 検索文字列（空文字は未指定扱い）
pub fn search_query(value: Option<String>) -> AdminResult<Option<String>> {
    match value.filter(|q| !q.is_empty()) {
        Some(q) => {
            if q.chars().count() > QUERY_MAX_LEN {
                return Err(AdminError::InvalidRequest(format!(
                    "query must be at most {} characters",
                    QUERY_MAX_LEN
                )));
            }
            Ok(Some(q))
        }
        None => Ok(None),
    }
}

/// RFC3339形式で出力する
pub fn format_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339()
}
