//! App - アプリケーション層
//!
//! ports を組み合わせてキュー処理を実装します。
//!
//! # 主要コンポーネント
//! - **QueueProcessor**: enqueue と drain（同時実行は 1 つ、トリガーは合流）
//! - **ReachabilityListener**: 到達性の回復で drain を起動
//! - **LifecycleScheduler**: バックグラウンド中の定期 refresh
//! - **QueueProcessorBuilder**: 協調オブジェクトの組み立て
//! - **CourierRuntime**: 設定からの配線

pub mod background;
pub mod builder;
pub mod config;
pub mod listener;
pub mod processor;
pub mod runtime;

// 主要な型を再エクスポート
pub use self::background::{Completion, LifecycleScheduler, run_background_refresh};
pub use self::builder::{BuildError, QueueProcessorBuilder};
pub use self::config::QueueConfig;
pub use self::listener::ReachabilityListener;
pub use self::processor::QueueProcessor;
pub use self::runtime::{CourierRuntime, RuntimeError};
