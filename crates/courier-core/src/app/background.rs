//! Background - バックグラウンド実行
//!
//! # 契約
//! - completion はちょうど 1 回呼ばれる（成功 true / store エラー・時間切れ false）
//! - 時間切れで drain が中断されたら inProgress を pending に戻す
//! - バックグラウンド中は到達性トリガーを止め、定期 refresh だけで drain する

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::QueueProcessor;
use super::config::BackgroundConfig;

/// バックグラウンド実行 1 回分の結果を受け取るホスト側のコールバック
pub type Completion = Arc<dyn Fn(bool) + Send + Sync>;

/// budget 内で 1 回 drain し、結果を `completion` に渡す
///
/// 時間切れのときは completion(false) を先に呼び、そのあとで中断されたレコードを戻す。
pub async fn run_background_refresh(
    processor: &QueueProcessor,
    budget: Duration,
    completion: impl FnOnce(bool),
) -> bool {
    debug!(?budget, "background refresh started");
    let (success, expired) = match tokio::time::timeout(budget, processor.drain(0)).await {
        Ok(Ok(report)) => {
            info!(sent = report.sent, failed = report.failed, outcome = ?report.outcome, "background refresh finished");
            (true, false)
        }
        Ok(Err(e)) => {
            warn!(error = %e, "background refresh failed");
            (false, false)
        }
        Err(_) => {
            warn!(?budget, "background refresh ran out of time");
            (false, true)
        }
    };
    completion(success);

    if expired {
        // 中断された送信は結果不明。次回また送る
        if let Err(e) = processor.recover_interrupted().await {
            warn!(error = %e, "could not recover interrupted requests");
        }
    }
    success
}

/// processor をフォアグラウンドと定期 refresh の間で切り替える
pub struct LifecycleScheduler {
    processor: Weak<QueueProcessor>,
    refresh_interval: Duration,
    time_budget: Duration,
    completion: Completion,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl LifecycleScheduler {
    pub fn new(
        processor: &Arc<QueueProcessor>,
        refresh_interval: Duration,
        time_budget: Duration,
        completion: Completion,
    ) -> Self {
        Self {
            processor: Arc::downgrade(processor),
            refresh_interval,
            time_budget,
            completion,
            task: Mutex::new(None),
        }
    }

    pub fn from_config(
        processor: &Arc<QueueProcessor>,
        config: &BackgroundConfig,
        completion: Completion,
    ) -> Self {
        Self::new(
            processor,
            config.refresh_interval(),
            config.time_budget(),
            completion,
        )
    }

    pub fn enter_background(&self) {
        let Some(processor) = self.processor.upgrade() else {
            return;
        };
        processor.set_foreground(false);

        let mut task = self.task.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            return;
        }

        let weak = self.processor.clone();
        let interval = self.refresh_interval;
        let budget = self.time_budget;
        let completion = self.completion.clone();
        info!(?interval, "entered background; scheduling refresh");
        *task = Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let Some(processor) = weak.upgrade() else {
                    break;
                };
                let completion = completion.clone();
                run_background_refresh(&processor, budget, move |ok| completion(ok)).await;
            }
        }));
    }

    pub fn enter_foreground(&self) {
        if let Some(task) = self
            .task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
        {
            task.abort();
        }
        if let Some(processor) = self.processor.upgrade() {
            processor.set_foreground(true);
            info!("entered foreground; background refresh cancelled");
        }
    }

    pub fn is_background_scheduled(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .is_some_and(|t| !t.is_finished())
    }
}

impl Drop for LifecycleScheduler {
    fn drop(&mut self) {
        if let Some(task) = self
            .task
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
        {
            task.abort();
        }
    }
}
