//! HttpTransport - reqwest による送信
//!
//! - ネットワークエラー / タイムアウト → `TransportError::Network`
//! - 2xx 以外のステータス → `TransportError::Status`
//! - method が無ければ GET

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::domain::{OutboundRequest, TransportError};
use crate::ports::Transport;

pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| TransportError::InvalidRequest(format!("http client: {e}")))?;
        Ok(Self { client })
    }

    fn build(&self, request: &OutboundRequest) -> Result<reqwest::Request, TransportError> {
        let method = match request.method.as_deref() {
            Some(m) => Method::from_bytes(m.to_ascii_uppercase().as_bytes())
                .map_err(|_| TransportError::InvalidRequest(format!("method {m:?}")))?,
            None => Method::GET,
        };

        let mut headers = HeaderMap::with_capacity(request.headers.len());
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| TransportError::InvalidRequest(format!("header name {name:?}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| TransportError::InvalidRequest(format!("header value for {name}")))?;
            headers.insert(name, value);
        }

        let mut builder = self
            .client
            .request(method, request.url.clone())
            .headers(headers);
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        builder
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &OutboundRequest) -> Result<(), TransportError> {
        let http_request = self.build(request)?;
        let response = self
            .client
            .execute(http_request)
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(TransportError::Status(status.as_u16()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RecordId;
    use chrono::Utc;
    use std::collections::HashMap;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn request(url: &str, method: Option<&str>) -> OutboundRequest {
        OutboundRequest {
            record_id: RecordId::generate(Utc::now()),
            url: url.parse().unwrap(),
            method: method.map(str::to_string),
            headers: HashMap::from([("X-Queue".to_string(), "courier".to_string())]),
            body: Some(b"payload".to_vec()),
        }
    }

    fn transport() -> HttpTransport {
        HttpTransport::new(Duration::from_secs(5), "courier-test").unwrap()
    }

    /// 決まったステータス行で 1 接続だけ応答する
    async fn one_shot_server(status_line: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!("{status_line}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
            socket.write_all(response.as_bytes()).await.unwrap();
        });
        format!("http://{addr}/hook")
    }

    #[test]
    fn builds_default_get() {
        let built = transport().build(&request("https://example.com/a", None)).unwrap();
        assert_eq!(*built.method(), Method::GET);
        assert_eq!(built.url().as_str(), "https://example.com/a");
        assert_eq!(built.headers()["x-queue"], "courier");
    }

    #[test]
    fn method_is_case_insensitive() {
        let built = transport()
            .build(&request("https://example.com/a", Some("post")))
            .unwrap();
        assert_eq!(*built.method(), Method::POST);
    }

    #[test]
    fn invalid_header_is_rejected() {
        let mut req = request("https://example.com/a", None);
        req.headers.insert("bad header".to_string(), "x".to_string());
        let err = transport().build(&req).unwrap_err();
        assert!(matches!(err, TransportError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn success_status_is_ok() {
        let url = one_shot_server("HTTP/1.1 204 No Content").await;
        transport().send(&request(&url, Some("POST"))).await.unwrap();
    }

    #[tokio::test]
    async fn server_error_is_failure() {
        let url = one_shot_server("HTTP/1.1 503 Service Unavailable").await;
        let err = transport().send(&request(&url, None)).await.unwrap_err();
        assert_eq!(err, TransportError::Status(503));
    }

    #[tokio::test]
    async fn refused_connection_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = transport()
            .send(&request(&format!("http://{addr}/"), None))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Network(_)));
    }
}
