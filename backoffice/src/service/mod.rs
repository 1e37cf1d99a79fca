//! 業務ロジック
//!
//! ハンドラーから呼ばれ、リポジトリ・トークン・ログバッファを組み合わせる。

/// ログイン・トークン更新・ログアウト・パスワード変更
pub mod auth;

/// 自分のプロフィール
pub mod profile;

/// ユーザー管理（管理者）
pub mod users;

/// お知らせ
pub mod notices;

/// ドキュメント
pub mod documentation;

/// ログ閲覧（管理者）
pub mod logs;

/// 管理操作の記録
pub mod operation;

pub use operation::Operator;
