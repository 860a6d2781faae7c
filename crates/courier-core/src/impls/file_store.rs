//! JsonFileRequestStore - ファイルに永続化する store
//!
//! # 実装詳細
//! - 全レコードをメモリ上の RecordTable に保持し、変更ごとに JSON ドキュメントを書き出す
//! - 書き込みは一時ファイル → rename で行い、途中で落ちても前の状態が残る
//! - 書き込みに失敗した変更はメモリ上でも巻き戻す（メモリとディスクを一致させる）
//! - 未知の status 文字列は読み込み時に pending として扱う

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::inmem_store::RecordTable;
use crate::domain::{NewRecord, RecordId, RequestRecord, RequestStatus, StoreError};
use crate::ports::{Clock, RecordMutation, RequestStore, SystemClock};

pub struct JsonFileRequestStore {
    path: PathBuf,
    table: Mutex<RecordTable>,
    clock: Arc<dyn Clock>,
}

impl JsonFileRequestStore {
    /// `path` の store を開く。ファイルが無ければ空の store になる
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Self::open_with_clock(path, Arc::new(SystemClock)).await
    }

    pub async fn open_with_clock(
        path: impl Into<PathBuf>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StoreError> {
        let path = path.into();
        let table = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let mut table: RecordTable = serde_json::from_slice(&bytes)
                    .map_err(|e| StoreError::Corrupt(format!("{}: {e}", path.display())))?;
                table.reindex()?;
                table
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => RecordTable::default(),
            Err(e) => return Err(StoreError::Io(format!("{}: {e}", path.display()))),
        };
        debug!(path = %path.display(), records = table.len(), "opened request store");

        Ok(Self {
            path,
            table: Mutex::new(table),
            clock,
        })
    }

    async fn persist(&self, table: &RecordTable) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(table)
            .map_err(|e| StoreError::Corrupt(format!("encode: {e}")))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StoreError::Io(format!("{}: {e}", parent.display())))?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| StoreError::Io(format!("{}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::Io(format!("{}: {e}", self.path.display())))?;
        Ok(())
    }
}

#[async_trait]
impl RequestStore for JsonFileRequestStore {
    async fn create(&self, record: NewRecord) -> Result<RequestRecord, StoreError> {
        let id = RecordId::generate(self.clock.now());
        let mut table = self.table.lock().await;
        let created = table.insert(record, id);
        if let Err(e) = self.persist(&table).await {
            table.remove(id)?;
            return Err(e);
        }
        Ok(created)
    }

    async fn fetch(&self, status: RequestStatus) -> Result<Vec<RequestRecord>, StoreError> {
        let table = self.table.lock().await;
        Ok(table.select(Some(status)))
    }

    async fn update(&self, id: RecordId, mutation: RecordMutation) -> Result<RequestRecord, StoreError> {
        let mut table = self.table.lock().await;
        let next = table.mutated(id, mutation)?;
        let previous = table.get(id).cloned().ok_or(StoreError::NotFound(id))?;

        table.replace(next.clone())?;
        if let Err(e) = self.persist(&table).await {
            table.replace(previous)?;
            return Err(e);
        }
        Ok(next)
    }

    async fn delete(&self, id: RecordId) -> Result<(), StoreError> {
        let mut table = self.table.lock().await;
        let seq = table.seq_of(id).ok_or(StoreError::NotFound(id))?;
        let removed = table.remove(id)?;
        if let Err(e) = self.persist(&table).await {
            table.restore(removed, seq);
            return Err(e);
        }
        Ok(())
    }

    async fn all(&self) -> Result<Vec<RequestRecord>, StoreError> {
        let table = self.table.lock().await;
        Ok(table.select(None))
    }
}
