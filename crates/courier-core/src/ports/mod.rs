//! Ports - 外部コラボレーターへのインターフェース
//!
//! Queue Processor はここにある trait だけに依存します。
//! 実装（in-memory / file / reqwest / TCP probe）は `impls` にあります。

pub mod clock;
pub mod reachability;
pub mod store;
pub mod transport;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::reachability::ReachabilitySignal;
pub use self::store::{RecordMutation, RequestStore, set_status};
pub use self::transport::Transport;
