//! RequestStore port - レコードの永続化
//!
//! # 設計原則
//! - コアは create / fetch / update / delete だけを要求する
//! - update / delete のコミットは、次の fetch から必ず見える（read-your-writes）
//! - インデックスやトランザクション、ディスク上の形式は実装側の責務

use async_trait::async_trait;

use crate::domain::{NewRecord, RecordId, RequestRecord, RequestStatus, StoreError};

/// レコードの正本に適用する変更
pub type RecordMutation = Box<dyn FnOnce(&mut RequestRecord) + Send>;

#[async_trait]
pub trait RequestStore: Send + Sync {
    /// 新しいレコードを永続化する。id は store が割り当てる
    async fn create(&self, record: NewRecord) -> Result<RequestRecord, StoreError>;

    /// `status` のレコードを `created_at` 昇順で返す。同時刻は挿入順
    async fn fetch(&self, status: RequestStatus) -> Result<Vec<RequestRecord>, StoreError>;

    /// 保存済みレコードに `mutation` を適用して永続化する
    ///
    /// `id` と `created_at` は mutation のあとで元に戻す。
    async fn update(&self, id: RecordId, mutation: RecordMutation) -> Result<RequestRecord, StoreError>;

    async fn delete(&self, id: RecordId) -> Result<(), StoreError>;

    /// status を問わず全レコードを処理順で返す
    async fn all(&self) -> Result<Vec<RequestRecord>, StoreError>;
}

/// status だけを変える mutation
pub fn set_status(status: RequestStatus) -> RecordMutation {
    Box::new(move |record: &mut RequestRecord| record.status = status)
}
