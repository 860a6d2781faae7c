//! courier-core
//!
//! Durable outbound request queue: requests are persisted first and sent
//! when the network is reachable.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, status, record, report, errors）
//! - **ports**: 抽象化レイヤー（RequestStore, Transport, ReachabilitySignal, Clock）
//! - **impls**: 実装（in-memory / JSON ファイル store, reqwest transport, TCP probe）
//! - **app**: アプリケーションロジック（processor, listener, background, builder, config, runtime）

pub mod domain;
pub mod ports;
pub mod impls;
pub mod app;
