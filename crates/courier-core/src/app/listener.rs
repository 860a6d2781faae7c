//! ReachabilityListener - 到達性の変化で drain を起動する
//!
//! - processor は Weak で保持する。processor が drop されたらループを抜ける
//! - listener の handle が drop されたらタスクを abort する
//! - drain のエラーはログに残すだけ（トリガー元に返す相手がいない）

use std::sync::Weak;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::QueueProcessor;

pub struct ReachabilityListener {
    handle: JoinHandle<()>,
}

impl ReachabilityListener {
    pub(crate) fn spawn(weak: Weak<QueueProcessor>, mut rx: watch::Receiver<bool>) -> Self {
        let handle = tokio::spawn(async move {
            loop {
                if rx.changed().await.is_err() {
                    debug!("reachability signal closed; listener stopping");
                    break;
                }
                let available = *rx.borrow_and_update();
                if !available {
                    continue;
                }

                let Some(processor) = weak.upgrade() else {
                    debug!("queue processor dropped; listener stopping");
                    break;
                };
                if !processor.is_foreground() {
                    debug!("network available while in background; waiting for refresh");
                    continue;
                }

                match processor.drain(0).await {
                    Ok(report) => debug!(?report, "reachability-triggered drain finished"),
                    Err(e) => warn!(error = %e, "reachability-triggered drain failed"),
                }
            }
        });
        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ReachabilityListener {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
