//! Request record: a persisted outbound call + its lifecycle status.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use super::{RecordId, RequestStatus};

/// RequestDescriptor は `enqueue` に渡す入力
///
/// enqueue の時点ではどのフィールドも省略できる。使える url が無くても永続化され、
/// 最初にそこへ到達した drain が破棄する。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    pub url: Option<String>,
    pub method: Option<String>,
    pub body: Option<Vec<u8>>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl RequestDescriptor {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// `RequestStore::create` に渡す、すべて埋まったレコード内容
///
/// store が付け足すのは id（と store 自身の挿入順）だけ。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub url: Option<String>,
    pub method: Option<String>,
    pub body: Option<Vec<u8>>,
    pub headers: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub status: RequestStatus,
}

impl NewRecord {
    /// `created_at` に作られた pending のレコード
    pub fn pending(descriptor: RequestDescriptor, created_at: DateTime<Utc>) -> Self {
        Self {
            url: descriptor.url,
            method: descriptor.method,
            body: descriptor.body,
            headers: descriptor.headers,
            created_at,
            status: RequestStatus::Pending,
        }
    }

    pub fn into_record(self, id: RecordId) -> RequestRecord {
        RequestRecord {
            id,
            url: self.url,
            method: self.method,
            body: self.body,
            headers: self.headers,
            created_at: self.created_at,
            status: self.status,
        }
    }
}

/// RequestRecord は永続化されたリクエスト
///
/// `created_at` は `create` で一度だけ書かれ、処理順を決める。store の変更で書き換えないこと。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestRecord {
    pub id: RecordId,
    pub url: Option<String>,
    pub method: Option<String>,
    pub body: Option<Vec<u8>>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub status: RequestStatus,
}

impl RequestRecord {
    /// url があり、空白でなく、絶対 URL として解釈できるときだけ返す
    pub fn usable_url(&self) -> Option<Url> {
        let raw = self.url.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        Url::parse(raw).ok()
    }

    /// transport に渡すリクエストを組み立てる
    ///
    /// 使える url が無いレコードでは `None`。
    pub fn outbound_request(&self) -> Option<OutboundRequest> {
        let url = self.usable_url()?;
        Some(OutboundRequest {
            record_id: self.id,
            url,
            method: self.method.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
        })
    }
}

/// 送信できる状態のリクエスト
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub record_id: RecordId,
    pub url: Url,
    /// `None` は transport の既定（HTTP なら GET）
    pub method: Option<String>,
    pub headers: HashMap<String, String>,
    pub body: Option<Vec<u8>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use ulid::Ulid;

    fn record_with_url(url: Option<&str>) -> RequestRecord {
        NewRecord::pending(
            RequestDescriptor {
                url: url.map(str::to_string),
                ..RequestDescriptor::default()
            },
            Utc::now(),
        )
        .into_record(RecordId::from_ulid(Ulid::new()))
    }

    #[rstest]
    #[case::absent(None)]
    #[case::empty(Some(""))]
    #[case::blank(Some("   "))]
    #[case::relative(Some("/only/a/path"))]
    fn malformed_urls_are_not_usable(#[case] url: Option<&str>) {
        let record = record_with_url(url);
        assert!(record.usable_url().is_none());
        assert!(record.outbound_request().is_none());
    }

    #[test]
    fn outbound_request_copies_fields() {
        let descriptor = RequestDescriptor::new("https://example.com/a")
            .with_method("POST")
            .with_body(b"{\"k\":1}".to_vec())
            .with_header("Content-Type", "application/json");
        let id = RecordId::from_ulid(Ulid::new());
        let record = NewRecord::pending(descriptor, Utc::now()).into_record(id);

        let request = record.outbound_request().unwrap();
        assert_eq!(request.record_id, id);
        assert_eq!(request.url.as_str(), "https://example.com/a");
        assert_eq!(request.method.as_deref(), Some("POST"));
        assert_eq!(request.body.as_deref(), Some(&b"{\"k\":1}"[..]));
        assert_eq!(
            request.headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
    }

    #[test]
    fn new_record_starts_pending() {
        let created_at = Utc::now();
        let new = NewRecord::pending(RequestDescriptor::new("https://example.com"), created_at);
        assert_eq!(new.status, RequestStatus::Pending);
        assert_eq!(new.created_at, created_at);
    }

    #[test]
    fn record_without_status_field_deserializes_as_pending() {
        let json = serde_json::json!({
            "id": Ulid::new().to_string(),
            "url": "https://example.com",
            "method": null,
            "body": null,
            "created_at": "2024-01-13T09:00:00Z"
        });
        let record: RequestRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.status, RequestStatus::Pending);
        assert!(record.headers.is_empty());
    }
}
