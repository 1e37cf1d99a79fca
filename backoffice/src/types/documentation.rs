use super::TimeRange;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// ドキュメント
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Documentation {
    /// ドキュメントID
    pub id: Uuid,
    /// タイトル（一意）
    pub title: String,
    /// 本文
    pub content: String,
    /// 作成日時
    pub created_at: DateTime<Utc>,
    /// 更新日時
    pub updated_at: DateTime<Utc>,
}

impl Documentation {
    /// 新規ドキュメントを作る
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            content: content.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// ドキュメント一覧のフィルタ
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentationFilter {
    /// 更新日時の範囲
    pub updated: TimeRange,
}

/// ドキュメント更新内容
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentationUpdate {
    /// タイトル
    pub title: Option<String>,
    /// 本文
    pub content: Option<String>,
}

impl DocumentationUpdate {
    /// 変更するフィールドが一つもない
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }
}
