//! ScriptedTransport - 決定的に振る舞う Transport（デモ・テスト用）
//!
//! 送られたリクエストをすべて記録し、スクリプトの先頭から結果を返す。
//! スクリプトが空なら `default` の結果を返す。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{OutboundRequest, TransportError};
use crate::ports::Transport;

pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<(), TransportError>>>,
    default: Result<(), TransportError>,
    sent: Mutex<Vec<OutboundRequest>>,
}

impl ScriptedTransport {
    /// スクリプトが無ければ常に成功
    pub fn succeeding() -> Self {
        Self::with_default(Ok(()))
    }

    /// スクリプトが無ければ常に失敗
    pub fn failing() -> Self {
        Self::with_default(Err(TransportError::Network("scripted failure".to_string())))
    }

    fn with_default(default: Result<(), TransportError>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            default,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// 次の送信結果をスクリプトに積む
    pub fn then(self, outcome: Result<(), TransportError>) -> Self {
        self.push(outcome);
        self
    }

    pub fn push(&self, outcome: Result<(), TransportError>) {
        self.script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(outcome);
    }

    /// これまでに送られたリクエスト（送信順）
    pub fn sent(&self) -> Vec<OutboundRequest> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// これまでに送られた url（送信順）
    pub fn sent_urls(&self) -> Vec<String> {
        self.sent().iter().map(|r| r.url.to_string()).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &OutboundRequest) -> Result<(), TransportError> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request.clone());
        let next = self
            .script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front();
        next.unwrap_or_else(|| self.default.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RecordId;
    use chrono::Utc;
    use std::collections::HashMap;

    fn request(url: &str) -> OutboundRequest {
        OutboundRequest {
            record_id: RecordId::generate(Utc::now()),
            url: url.parse().unwrap(),
            method: None,
            headers: HashMap::new(),
            body: None,
        }
    }

    #[tokio::test]
    async fn script_runs_before_default() {
        let transport = ScriptedTransport::succeeding()
            .then(Err(TransportError::Status(500)));

        let first = transport.send(&request("https://example.com/1")).await;
        let second = transport.send(&request("https://example.com/2")).await;

        assert_eq!(first, Err(TransportError::Status(500)));
        assert_eq!(second, Ok(()));
        assert_eq!(
            transport.sent_urls(),
            vec!["https://example.com/1", "https://example.com/2"]
        );
    }

    #[tokio::test]
    async fn failing_default() {
        let transport = ScriptedTransport::failing();
        assert!(transport.send(&request("https://example.com")).await.is_err());
    }
}
