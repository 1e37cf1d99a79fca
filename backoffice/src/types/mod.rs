//! 型定義モジュール
//!
//! ドメインエンティティと一覧クエリの型定義を提供

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 大文字の識別子で保存・送受信される列挙型に
/// `as_str` / `FromStr` / `Display` を実装する
macro_rules! string_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// 保存・送受信用の文字列表現
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::common::error::AdminError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(crate::common::error::AdminError::InvalidRequest(format!(
                        "unknown {}: {}",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

/// ユーザー
pub mod user;

/// お知らせ
pub mod notice;

/// ドキュメント
pub mod documentation;

/// ログインログ・操作ログ
pub mod logs;

pub use documentation::{Documentation, DocumentationFilter, DocumentationUpdate};
pub use logs::{
    EntityType, LoginLogEntry, LoginLogFilter, NewLoginLog, NewOperationLog, Operation,
    OperationLogEntry, OperationLogFilter, OperationStatus,
};
pub use notice::{Notice, NoticeFilter, NoticeType, NoticeUpdate};
pub use user::{User, UserFilter, UserRole, UserUpdate};

/// 一覧キャッシュのエントリ
///
/// 特定のフィルタ・ページングキーに対する、直近の書き込み時点のスナップショット。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedList<T> {
    /// フィルタに一致する総件数
    pub total: i64,
    /// 現在ページの要素
    pub items: Vec<T>,
}

impl<T> CachedList<T> {
    /// 空の一覧
    pub fn empty() -> Self {
        Self {
            total: 0,
            items: Vec::new(),
        }
    }
}

/// 両端を含む時間範囲
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// 開始（含む）
    pub start: Option<DateTime<Utc>>,
    /// 終了（含む）
    pub end: Option<DateTime<Utc>>,
}

impl TimeRange {
    /// 範囲を作る
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    /// どちらの端も指定されていない
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// オフセット／リミット方式のページング
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// 1始まりのページ番号
    pub page: u32,
    /// 1ページあたりの件数
    pub page_size: u32,
    /// 作成日時の降順で並べるか
    pub desc: bool,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 10,
            desc: true,
        }
    }
}

impl Pagination {
    /// ページングを作る
    pub fn new(page: u32, page_size: u32, desc: bool) -> Self {
        Self {
            page,
            page_size,
            desc,
        }
    }

    /// SQLの`OFFSET`
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.page_size)
    }

    /// SQLの`LIMIT`
    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_offset_starts_at_zero() {
        assert_eq!(Pagination::new(1, 20, true).offset(), 0);
        assert_eq!(Pagination::new(3, 20, true).offset(), 40);
        assert_eq!(Pagination::new(0, 20, true).offset(), 0);
    }

    #[test]
    fn enum_round_trip_through_str() {
        assert_eq!("ADMIN".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!(NoticeType::Urgent.to_string(), "URGENT");
        assert!("admin".parse::<UserRole>().is_err());
    }
}
