//! Errors - エラー型と分類
//!
//! - `StoreError`: 永続化の失敗。enqueue / drain の呼び出し元へ必ず伝播する
//! - `TransportError`: 1 件の送信失敗。drain 内で捕捉され、pending への巻き戻しになる
//! - `ConfigError`: 設定ファイルの読み込み・検証エラー
//!
//! url を持たないレコードはエラーではなく、drain が黙って削除する。

use thiserror::Error;

use super::RecordId;

/// 永続化層の失敗（create / fetch / update / delete）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(RecordId),

    #[error("store io error: {0}")]
    Io(String),

    #[error("store data is corrupt: {0}")]
    Corrupt(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// 1 件の送信失敗
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected http status {0}")]
    Status(u16),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(String),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}
