//! 監査ログの書き込みバッファ
//!
//! ログイン・管理操作のログはリクエスト処理中にキャッシュ層のキューへ積み、
//! スケジューラ（またはログ一覧の読み取り直前）にまとめて永続化する。

/// キューに積むイベントの型定義
pub mod events;

/// キューへの投入と排出
pub mod buffer;

pub use buffer::{DrainReport, LogBuffer};
pub use events::{LoginLogEvent, OperationLogEvent};
