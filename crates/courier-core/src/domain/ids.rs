//! Record identifiers.
//!
//! # ULID ベースの ID
//! - **時刻でソート可能**: timestamp が先頭にあるため、生成順序でソートできる
//! - **調整不要**: store ごとに独立して生成できる
//!
//! ID は store が create 時に割り当てます。処理順序は `created_at` で決まるので、
//! ID の順序には依存しないこと。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// RecordId は永続化されたレコードの識別子
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Ulid);

impl RecordId {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    /// timestamp 部分が `now` の id を生成
    ///
    /// 時刻を引数で受けるので、FixedClock の下では（乱数部分を除き）決定的になる。
    pub fn generate(now: DateTime<Utc>) -> Self {
        let timestamp_ms = now.timestamp_millis().max(0) as u64;
        Self(Ulid::from_parts(timestamp_ms, rand::random()))
    }

    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl From<Ulid> for RecordId {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn generated_ids_are_unique() {
        let now = Utc::now();
        let id1 = RecordId::generate(now);
        let id2 = RecordId::generate(now);
        assert_ne!(id1, id2);
    }

    #[test]
    fn timestamp_part_follows_given_time() {
        let fixed = Utc.with_ymd_and_hms(2024, 1, 13, 9, 0, 0).unwrap();
        let id = RecordId::generate(fixed);

        // ULID の上位 48bit が timestamp
        let timestamp = (id.as_ulid().0 >> 80) as u64;
        assert_eq!(timestamp, fixed.timestamp_millis() as u64);
    }

    #[test]
    fn display_has_prefix() {
        let id = RecordId::from_ulid(Ulid::new());
        assert!(id.to_string().starts_with("req-"));
    }

    #[test]
    fn serializes_as_plain_ulid_string() {
        let ulid = Ulid::new();
        let id = RecordId::from(ulid);
        let s = serde_json::to_string(&id).unwrap();
        assert_eq!(s, format!("\"{ulid}\""));
    }
}
