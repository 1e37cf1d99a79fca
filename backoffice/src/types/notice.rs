use super::TimeRange;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// お知らせ種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NoticeType {
    /// 緊急
    Urgent,
    /// 通常
    Normal,
}

string_enum!(NoticeType {
    Urgent => "URGENT",
    Normal => "NORMAL",
});

/// お知らせ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    /// お知らせID
    pub id: Uuid,
    /// タイトル（一意）
    pub title: String,
    /// 本文（Markdown）
    pub content: String,
    /// 種別
    pub notice_type: NoticeType,
    /// 作成日時
    pub created_at: DateTime<Utc>,
    /// 更新日時
    pub updated_at: DateTime<Utc>,
}

impl Notice {
    /// 新規お知らせを作る
    pub fn new(title: impl Into<String>, content: impl Into<String>, notice_type: NoticeType) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            content: content.into(),
            notice_type,
            created_at: now,
            updated_at: now,
        }
    }
}

/// お知らせ一覧のフィルタ
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeFilter {
    /// 種別完全一致
    pub notice_type: Option<NoticeType>,
    /// 更新日時の範囲
    pub updated: TimeRange,
}

/// お知らせ更新内容
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeUpdate {
    /// タイトル
    pub title: Option<String>,
    /// 本文
    pub content: Option<String>,
    /// 種別
    pub notice_type: Option<NoticeType>,
}

impl NoticeUpdate {
    /// 変更するフィールドが一つもない
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.notice_type.is_none()
    }
}
