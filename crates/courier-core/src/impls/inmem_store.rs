//! InMemoryRequestStore - 開発用・テスト用の store
//!
//! # 実装詳細
//! - Vec<Slot> がレコードの正本。id から位置への索引を別に持つ
//! - Slot は挿入順の seq を持ち、同じ created_at のタイブレークに使う
//! - tokio::sync::Mutex で排他制御（ロックを跨いで await しない）

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::domain::{NewRecord, RecordId, RequestRecord, RequestStatus, StoreError};
use crate::ports::{Clock, RecordMutation, RequestStore, SystemClock};

/// レコードと挿入順の seq
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Slot {
    pub seq: u64,
    pub record: RequestRecord,
}

/// in-memory store と file store が共有するレコード表
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct RecordTable {
    next_seq: u64,
    slots: Vec<Slot>,
    #[serde(skip)]
    index: HashMap<RecordId, usize>,
}

impl RecordTable {
    /// デシリアライズ後に id の索引を作り直す
    pub fn reindex(&mut self) -> Result<(), StoreError> {
        self.index.clear();
        for (pos, slot) in self.slots.iter().enumerate() {
            if self.index.insert(slot.record.id, pos).is_some() {
                return Err(StoreError::Corrupt(format!(
                    "duplicate record id {}",
                    slot.record.id
                )));
            }
            self.next_seq = self.next_seq.max(slot.seq + 1);
        }
        Ok(())
    }

    pub fn insert(&mut self, new: NewRecord, id: RecordId) -> RequestRecord {
        let record = new.into_record(id);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.index.insert(id, self.slots.len());
        self.slots.push(Slot {
            seq,
            record: record.clone(),
        });
        record
    }

    pub fn select(&self, status: Option<RequestStatus>) -> Vec<RequestRecord> {
        let mut selected: Vec<&Slot> = self
            .slots
            .iter()
            .filter(|slot| status.is_none_or(|s| slot.record.status == s))
            .collect();
        selected.sort_by(|a, b| {
            a.record
                .created_at
                .cmp(&b.record.created_at)
                .then(a.seq.cmp(&b.seq))
        });
        selected.into_iter().map(|slot| slot.record.clone()).collect()
    }

    /// コピーに `mutation` を適用する。採用するかは呼び出し側が決める
    pub fn mutated(&self, id: RecordId, mutation: RecordMutation) -> Result<RequestRecord, StoreError> {
        let pos = *self.index.get(&id).ok_or(StoreError::NotFound(id))?;
        let current = &self.slots[pos].record;
        let mut next = current.clone();
        mutation(&mut next);
        next.id = current.id;
        next.created_at = current.created_at;
        Ok(next)
    }

    pub fn replace(&mut self, record: RequestRecord) -> Result<(), StoreError> {
        let pos = *self
            .index
            .get(&record.id)
            .ok_or(StoreError::NotFound(record.id))?;
        self.slots[pos].record = record;
        Ok(())
    }

    pub fn remove(&mut self, id: RecordId) -> Result<RequestRecord, StoreError> {
        let pos = self.index.remove(&id).ok_or(StoreError::NotFound(id))?;
        let removed = self.slots.remove(pos);
        for slot in &self.slots[pos..] {
            if let Some(p) = self.index.get_mut(&slot.record.id) {
                *p -= 1;
            }
        }
        Ok(removed.record)
    }

    /// `remove` で外したレコードを元の seq のまま戻す
    pub fn restore(&mut self, record: RequestRecord, seq: u64) {
        self.index.insert(record.id, self.slots.len());
        self.slots.push(Slot { seq, record });
    }

    pub fn get(&self, id: RecordId) -> Option<&RequestRecord> {
        self.index.get(&id).map(|&pos| &self.slots[pos].record)
    }

    pub fn seq_of(&self, id: RecordId) -> Option<u64> {
        self.index.get(&id).map(|&pos| self.slots[pos].seq)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }
}

/// InMemoryRequestStore はメモリ上の `RequestStore`
///
/// プロセスと一緒に消える。テストと、store のパスを設定しない実行で使う。
pub struct InMemoryRequestStore {
    table: Mutex<RecordTable>,
    clock: Arc<dyn Clock>,
}

impl InMemoryRequestStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// id は `clock` から生成するので `created_at` と揃う
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            table: Mutex::new(RecordTable::default()),
            clock,
        }
    }

    pub async fn len(&self) -> usize {
        self.table.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryRequestStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RequestStore for InMemoryRequestStore {
    async fn create(&self, record: NewRecord) -> Result<RequestRecord, StoreError> {
        let id = RecordId::generate(self.clock.now());
        let mut table = self.table.lock().await;
        Ok(table.insert(record, id))
    }

    async fn fetch(&self, status: RequestStatus) -> Result<Vec<RequestRecord>, StoreError> {
        let table = self.table.lock().await;
        Ok(table.select(Some(status)))
    }

    async fn update(&self, id: RecordId, mutation: RecordMutation) -> Result<RequestRecord, StoreError> {
        let mut table = self.table.lock().await;
        let next = table.mutated(id, mutation)?;
        table.replace(next.clone())?;
        Ok(next)
    }

    async fn delete(&self, id: RecordId) -> Result<(), StoreError> {
        let mut table = self.table.lock().await;
        table.remove(id).map(|_| ())
    }

    async fn all(&self) -> Result<Vec<RequestRecord>, StoreError> {
        let table = self.table.lock().await;
        Ok(table.select(None))
    }
}
