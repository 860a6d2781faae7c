//! ReachabilitySignal port - ネットワーク到達性
//!
//! 購読は `watch::Receiver` を渡すだけ。購読側が receiver を drop すれば
//! 通知対象から外れ、他の購読者には影響しない。

use tokio::sync::watch;

pub trait ReachabilitySignal: Send + Sync {
    /// 現在の「到達可能」の値
    fn is_available(&self) -> bool;

    /// 値の変化をすべて観測する Receiver
    fn subscribe(&self) -> watch::Receiver<bool>;
}
