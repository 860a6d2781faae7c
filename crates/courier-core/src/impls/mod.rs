//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryRequestStore**: テスト・開発用の store
//! - **JsonFileRequestStore**: JSON ファイルに永続化する store
//! - **ReachabilityMonitor / ConnectivityProbe**: 到達性シグナルと TCP プローブ
//! - **HttpTransport**: reqwest による送信
//! - **ScriptedTransport**: 結果をスクリプトで決める送信（デモ・テスト用）

pub mod file_store;
pub mod http_transport;
pub mod inmem_store;
pub mod reachability;
pub mod scripted_transport;

pub use self::file_store::JsonFileRequestStore;
pub use self::http_transport::HttpTransport;
pub use self::inmem_store::InMemoryRequestStore;
pub use self::reachability::{ConnectivityProbe, ReachabilityMonitor};
pub use self::scripted_transport::ScriptedTransport;
