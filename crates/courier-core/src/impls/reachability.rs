//! ReachabilityMonitor - watch チャネルによる到達性シグナル
//!
//! # 設計原則
//! - 値が変わったときだけ通知する（同じ値の set は無視）
//! - 購読者ごとに独立した Receiver を渡す。drop された購読者は自然に外れる
//! - 購読側のタスクが panic しても、送信側と他の購読者には影響しない

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::ports::ReachabilitySignal;

#[derive(Debug)]
pub struct ReachabilityMonitor {
    tx: watch::Sender<bool>,
}

impl ReachabilityMonitor {
    pub fn new(initially_available: bool) -> Self {
        let (tx, _rx) = watch::channel(initially_available);
        Self { tx }
    }

    /// 現在の経路状態を報告する。購読者への通知は値が変わったときだけ
    pub fn set_available(&self, available: bool) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == available {
                false
            } else {
                *current = available;
                true
            }
        });
        if changed {
            info!(available, "network reachability changed");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl ReachabilitySignal for ReachabilityMonitor {
    fn is_available(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// `ReachabilityMonitor` に結果を流す定期 TCP 接続プローブ
///
/// OS の経路監視の代わり。`connect_timeout` 内に `addr` へ接続できれば到達可能とみなす。
pub struct ConnectivityProbe {
    addr: String,
    interval: Duration,
    connect_timeout: Duration,
}

impl ConnectivityProbe {
    pub fn new(addr: impl Into<String>, interval: Duration, connect_timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            interval,
            connect_timeout,
        }
    }

    /// 1 回だけ試す
    pub async fn check(&self) -> bool {
        match tokio::time::timeout(self.connect_timeout, TcpStream::connect(&self.addr)).await {
            Ok(Ok(_stream)) => true,
            Ok(Err(e)) => {
                debug!(addr = %self.addr, error = %e, "probe connect failed");
                false
            }
            Err(_) => {
                debug!(addr = %self.addr, "probe connect timed out");
                false
            }
        }
    }

    /// 結果を流し続ける。止めるときは handle を abort する
    pub fn spawn(self, monitor: Arc<ReachabilityMonitor>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            loop {
                ticker.tick().await;
                let available = self.check().await;
                monitor.set_available(available);
            }
        })
    }
}
