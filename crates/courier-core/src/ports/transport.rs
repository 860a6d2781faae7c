//! Transport port - 実際のネットワーク送信
//!
//! タイムアウトは Transport 側の責務。コアは結果を成功/失敗の二値としてしか扱わない。

use async_trait::async_trait;

use crate::domain::{OutboundRequest, TransportError};

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &OutboundRequest) -> Result<(), TransportError>;
}
