//! Request status state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// RequestStatus はキュー内リクエストの状態を表現
///
/// # 状態遷移（drain だけが動かす）
/// - Pending -> InProgress: 送信対象に選ばれた
/// - InProgress -> (削除): 送信成功
/// - InProgress -> Pending: 送信失敗
/// - Pending -> (削除): 使える url が無い
///
/// `Cancelled` は processor が付けることはない。store を外部から書く側のために残してある。
/// drain は `Pending` しか選ばないので、cancelled のレコードはそのまま残る。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RequestStatus {
    #[default]
    Pending,
    InProgress,
    Cancelled,
}

impl RequestStatus {
    /// 永続化するときの文字列
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::InProgress => "inProgress",
            RequestStatus::Cancelled => "cancelled",
        }
    }

    /// 永続化された文字列を読む。未知の値は `Pending`
    pub fn from_persisted(raw: &str) -> Self {
        match raw {
            "inProgress" => RequestStatus::InProgress,
            "cancelled" => RequestStatus::Cancelled,
            _ => RequestStatus::Pending,
        }
    }

    /// drain が送信対象にしてよい状態か
    pub fn is_sendable(self) -> bool {
        matches!(self, RequestStatus::Pending)
    }
}

impl From<String> for RequestStatus {
    fn from(raw: String) -> Self {
        Self::from_persisted(&raw)
    }
}

impl From<RequestStatus> for String {
    fn from(status: RequestStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
