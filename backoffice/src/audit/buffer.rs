//! ログの書き込みバッファ
//!
//! キャッシュ層のリスト（`log:login` / `log:operation`）をFIFOキューとして使う。
//! 排出はトランザクションではなく、取り出した後に書き込みが失敗したイベントは失われる。

use super::events::{LoginLogEvent, OperationLogEvent};
use crate::cache::keys::{LOGIN_LOG_QUEUE, OPERATION_LOG_QUEUE};
use crate::cache::SharedCache;
use crate::common::error::{AdminError, AdminResult};
use crate::db::{LoginLogRepository, OperationLogRepository};
use crate::types::{NewLoginLog, NewOperationLog};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use tracing::{debug, error, info, warn};

/// 1回の排出結果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// 永続化できた件数
    pub inserted: usize,
    /// 解釈できずに捨てた件数
    pub skipped: usize,
    /// 永続化に失敗して失われた件数
    pub failed: usize,
}

impl DrainReport {
    /// キューから取り出した総数
    pub fn popped(&self) -> usize {
        self.inserted + self.skipped + self.failed
    }

    fn merge(self, other: DrainReport) -> DrainReport {
        DrainReport {
            inserted: self.inserted + other.inserted,
            skipped: self.skipped + other.skipped,
            failed: self.failed + other.failed,
        }
    }
}

/// ログの書き込みバッファ
#[derive(Clone)]
pub struct LogBuffer {
    cache: SharedCache,
    login_logs: LoginLogRepository,
    operation_logs: OperationLogRepository,
}

impl LogBuffer {
    /// 作成
    pub fn new(
        cache: SharedCache,
        login_logs: LoginLogRepository,
        operation_logs: OperationLogRepository,
    ) -> Self {
        Self {
            cache,
            login_logs,
            operation_logs,
        }
    }

    /// ログインイベントをキューへ積む
    ///
    /// 失敗しても呼び出し元の処理は成功のまま返す。
    pub async fn enqueue_login(&self, event: &LoginLogEvent) {
        self.enqueue(LOGIN_LOG_QUEUE, event).await;
    }

    /// 管理操作イベントをキューへ積む
    pub async fn enqueue_operation(&self, event: &OperationLogEvent) {
        self.enqueue(OPERATION_LOG_QUEUE, event).await;
    }

    async fn enqueue<E: Serialize>(&self, queue: &str, event: &E) {
        let payload = match serde_json::to_string(event) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(queue, error = %e, "Failed to encode log event, dropping it");
                return;
            }
        };
        if let Err(e) = self.cache.rpush(queue, &payload).await {
            warn!(queue, error = %e, "Failed to enqueue log event, dropping it");
        }
    }

    /// ログインログのキューを空になるまで排出する
    pub async fn drain_login(&self) -> AdminResult<DrainReport> {
        self.drain_queue::<LoginLogEvent, NewLoginLog, _, _>(LOGIN_LOG_QUEUE, |record| async move {
            self.login_logs.insert(&record).await.map(|_| ())
        })
        .await
    }

    /// 操作ログのキューを空になるまで排出する
    pub async fn drain_operation(&self) -> AdminResult<DrainReport> {
        self.drain_queue::<OperationLogEvent, NewOperationLog, _, _>(
            OPERATION_LOG_QUEUE,
            |record| async move { self.operation_logs.insert(&record).await.map(|_| ()) },
        )
        .await
    }

    /// 両方のキューを排出する
    ///
    /// 片方のキューが読めなくても、もう片方は排出する。
    pub async fn drain_all(&self) -> AdminResult<DrainReport> {
        let login = self.drain_login().await;
        let operation = self.drain_operation().await;
        match (login, operation) {
            (Ok(a), Ok(b)) => Ok(a.merge(b)),
            (Err(e), _) | (_, Err(e)) => Err(e),
        }
    }

    /// 先頭から1件ずつ取り出して永続化する
    ///
    /// 解釈できないイベントは警告を出して捨て、排出は続ける。
    /// キュー自体が読めない場合だけ中断する。
    async fn drain_queue<E, R, F, Fut>(&self, queue: &str, insert: F) -> AdminResult<DrainReport>
    where
        E: DeserializeOwned,
        R: TryFrom<E, Error = AdminError>,
        F: Fn(R) -> Fut,
        Fut: Future<Output = AdminResult<()>>,
    {
        let mut report = DrainReport::default();
        loop {
            let raw = match self.cache.lpop(queue).await {
                Ok(Some(raw)) => raw,
                Ok(None) => break,
                Err(e) => {
                    error!(queue, error = %e, "Failed to pop log queue, aborting drain");
                    return Err(AdminError::ServiceError(format!(
                        "Failed to pop {}: {}",
                        queue, e
                    )));
                }
            };

            let record = match serde_json::from_str::<E>(&raw)
                .map_err(|e| AdminError::InvalidRequest(e.to_string()))
                .and_then(R::try_from)
            {
                Ok(record) => record,
                Err(e) => {
                    warn!(queue, error = %e, "Skipping malformed log event");
                    report.skipped += 1;
                    continue;
                }
            };

            match insert(record).await {
                Ok(()) => report.inserted += 1,
                Err(e) => {
                    error!(queue, error = %e, "Failed to persist log event, event lost");
                    report.failed += 1;
                }
            }
        }

        if report.popped() > 0 {
            info!(
                queue,
                inserted = report.inserted,
                skipped = report.skipped,
                failed = report.failed,
                "Drained log queue"
            );
        } else {
            debug!(queue, "Log queue empty");
        }
        Ok(report)
    }
}
