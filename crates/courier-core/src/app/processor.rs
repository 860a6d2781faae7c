//! QueueProcessor - enqueue と drain
//!
//! # フロー（drain 1 パス）
//! 1. 到達性を確認（不可ならそのまま終了）
//! 2. pending を created_at 昇順で取得。このスナップショットがこのパスの正本
//! 3. 先頭から位置で進む。各アイテムの状態変更をコミットしてから次へ
//!    - url が使えない → 削除（送信しない）
//!    - inProgress にして送信 → 成功なら削除 / 失敗なら pending に戻す
//! 4. 送信失敗は同じパスで再試行しない（次のトリガーを待つ）
//!
//! # 排他
//! - 同時に走る drain は 1 つだけ（run_lock を try_lock）
//! - 走行中に来たトリガーは rerun_requested を立てて即座に返る。
//!   走行中の drain はロックを離す前にもう 1 パス回る

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::listener::ReachabilityListener;
use crate::domain::{
    DrainOutcome, DrainReport, NewRecord, RecordId, RequestDescriptor, RequestRecord,
    RequestStatus, StoreError,
};
use crate::ports::{Clock, ReachabilitySignal, RequestStore, Transport, set_status};

pub struct QueueProcessor {
    store: Arc<dyn RequestStore>,
    transport: Arc<dyn Transport>,
    reachability: Arc<dyn ReachabilitySignal>,
    clock: Arc<dyn Clock>,

    /// drain 呼び出し全体（全パス）の間保持する
    run_lock: Mutex<()>,
    rerun_requested: AtomicBool,

    /// 到達性トリガーの drain はフォアグラウンドでのみ走る
    foreground: AtomicBool,

    listener: OnceLock<ReachabilityListener>,
}

impl QueueProcessor {
    pub fn new(
        store: Arc<dyn RequestStore>,
        transport: Arc<dyn Transport>,
        reachability: Arc<dyn ReachabilitySignal>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            transport,
            reachability,
            clock,
            run_lock: Mutex::new(()),
            rerun_requested: AtomicBool::new(false),
            foreground: AtomicBool::new(true),
            listener: OnceLock::new(),
        }
    }

    /// 中断された実行が残した `inProgress` を戻してから、到達性の購読を始める
    ///
    /// 2 回目以降の呼び出しは回復だけを行う。
    pub async fn start(self: &Arc<Self>) -> Result<(), StoreError> {
        self.recover_interrupted().await?;
        if self.listener.get().is_none() {
            let listener =
                ReachabilityListener::spawn(Arc::downgrade(self), self.reachability.subscribe());
            // 競合して負けた方の listener は drop（= abort）される
            let _ = self.listener.set(listener);
        }
        Ok(())
    }

    /// pending のリクエストを永続化し、到達可能ならその場で drain する
    ///
    /// 起動した drain の store エラーは呼び出し元へ伝播する。送信失敗は伝播しない。
    pub async fn enqueue(&self, descriptor: RequestDescriptor) -> Result<RecordId, StoreError> {
        let record = self
            .store
            .create(NewRecord::pending(descriptor, self.clock.now()))
            .await?;
        info!(id = %record.id, url = ?record.url, "enqueued request");

        if self.reachability.is_available() {
            self.drain(0).await?;
        }
        Ok(record.id)
    }

    /// pending を作成順に `start_index` から処理する
    ///
    /// # 合流
    /// 別の drain が走行中なら `DrainOutcome::Coalesced` で即座に返り、走行中の drain が
    /// ロックを離す前にもう 1 パス回る。ただし走行中の drain が完了前に drop された場合
    /// （バックグラウンドの時間切れなど）、そのパスは行われない。合流したトリガーは
    /// 次のトリガー（到達性の変化・enqueue・refresh）で拾われる。
    pub async fn drain(&self, start_index: usize) -> Result<DrainReport, StoreError> {
        let mut report = DrainReport::new(DrainOutcome::Completed);
        let mut start = start_index;

        loop {
            let Ok(guard) = self.run_lock.try_lock() else {
                self.rerun_requested.store(true, Ordering::SeqCst);
                debug!("drain already running; trigger coalesced");
                if report.passes == 0 {
                    return Ok(DrainReport::coalesced());
                }
                return Ok(report);
            };

            // このパスは最新の pending を取得するので、ここまでのトリガーは吸収済み
            self.rerun_requested.store(false, Ordering::SeqCst);
            report.absorb(self.drain_pass(start).await?);

            while self.rerun_requested.swap(false, Ordering::SeqCst) {
                debug!("running another pass for a coalesced trigger");
                report.absorb(self.drain_pass(0).await?);
            }

            drop(guard);
            // ロック解放の直前に立ったフラグを取りこぼさない
            if !self.rerun_requested.load(Ordering::SeqCst) {
                return Ok(report);
            }
            start = 0;
        }
    }

    async fn drain_pass(&self, start_index: usize) -> Result<DrainReport, StoreError> {
        let mut pass = DrainReport::new(DrainOutcome::Completed);
        pass.passes = 1;

        if !self.reachability.is_available() {
            debug!("network unavailable; drain skipped");
            pass.outcome = DrainOutcome::Unreachable;
            return Ok(pass);
        }

        let pending = self.store.fetch(RequestStatus::Pending).await?;
        debug!(pending = pending.len(), start_index, "drain pass started");

        for record in pending.iter().skip(start_index) {
            if !record.status.is_sendable() {
                continue;
            }
            if !self.reachability.is_available() {
                info!("network became unavailable; stopping drain");
                pass.outcome = DrainOutcome::Unreachable;
                break;
            }
            self.resolve(record, &mut pass).await?;
        }

        debug!(
            sent = pass.sent,
            failed = pass.failed,
            discarded = pass.discarded,
            "drain pass finished"
        );
        Ok(pass)
    }

    /// 1 件を送信・破棄・巻き戻しのいずれかで解決する。返った時点で状態はコミット済み
    async fn resolve(&self, record: &RequestRecord, pass: &mut DrainReport) -> Result<(), StoreError> {
        let Some(request) = record.outbound_request() else {
            warn!(id = %record.id, url = ?record.url, "discarding request without a usable url");
            self.store.delete(record.id).await?;
            pass.discarded += 1;
            return Ok(());
        };

        self.store
            .update(record.id, set_status(RequestStatus::InProgress))
            .await?;

        match self.transport.send(&request).await {
            Ok(()) => {
                self.store.delete(record.id).await?;
                info!(id = %record.id, url = %request.url, "request delivered");
                pass.sent += 1;
            }
            Err(e) => {
                self.store
                    .update(record.id, set_status(RequestStatus::Pending))
                    .await?;
                warn!(id = %record.id, url = %request.url, error = %e, "send failed; will retry on next trigger");
                pass.failed += 1;
            }
        }
        Ok(())
    }

    /// `inProgress` のレコードをすべて `pending` に戻す
    ///
    /// 走行中の drain があれば終わるのを待つ。
    pub async fn recover_interrupted(&self) -> Result<usize, StoreError> {
        let _guard = self.run_lock.lock().await;
        let stuck = self.store.fetch(RequestStatus::InProgress).await?;
        for record in &stuck {
            self.store
                .update(record.id, set_status(RequestStatus::Pending))
                .await?;
        }
        if !stuck.is_empty() {
            warn!(count = stuck.len(), "reverted interrupted requests to pending");
        }
        Ok(stuck.len())
    }

    pub fn set_foreground(&self, foreground: bool) {
        self.foreground.store(foreground, Ordering::SeqCst);
    }

    pub fn is_foreground(&self) -> bool {
        self.foreground.load(Ordering::SeqCst)
    }

    pub fn is_listening(&self) -> bool {
        self.listener.get().is_some_and(|l| !l.is_finished())
    }

    pub async fn pending_count(&self) -> Result<usize, StoreError> {
        Ok(self.store.fetch(RequestStatus::Pending).await?.len())
    }

    /// `status` のレコードを処理順で返す
    pub async fn records(&self, status: RequestStatus) -> Result<Vec<RequestRecord>, StoreError> {
        self.store.fetch(status).await
    }
}
