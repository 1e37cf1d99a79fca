//! 共通モジュール

/// エラー型
pub mod error;

/// クライアントIP・User-Agentの抽出
pub mod ip;
