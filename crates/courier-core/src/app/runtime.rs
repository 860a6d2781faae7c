//! CourierRuntime - 設定からの配線
//!
//! QueueConfig から store / transport / 到達性を組み立て、processor を起動する。
//! probe のタスクは runtime が持ち、drop で止める。

use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::info;

use super::QueueProcessor;
use super::background::{Completion, LifecycleScheduler};
use super::builder::{BuildError, QueueProcessorBuilder};
use super::config::QueueConfig;
use crate::domain::{ConfigError, StoreError, TransportError};
use crate::impls::{
    ConnectivityProbe, HttpTransport, InMemoryRequestStore, JsonFileRequestStore,
    ReachabilityMonitor,
};
use crate::ports::RequestStore;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Build(#[from] BuildError),
}

pub struct CourierRuntime {
    processor: Arc<QueueProcessor>,
    monitor: Arc<ReachabilityMonitor>,
    scheduler: LifecycleScheduler,
    probe: Option<JoinHandle<()>>,
}

impl CourierRuntime {
    pub async fn from_config(config: &QueueConfig) -> Result<Self, RuntimeError> {
        Self::with_completion(config, Arc::new(|_: bool| {})).await
    }

    /// `completion` はバックグラウンド refresh のたびに結果を受け取る
    pub async fn with_completion(
        config: &QueueConfig,
        completion: Completion,
    ) -> Result<Self, RuntimeError> {
        config.validate()?;

        let store: Arc<dyn RequestStore> = match &config.store.path {
            Some(path) => {
                info!(path = %path.display(), "using json file store");
                Arc::new(JsonFileRequestStore::open(path.clone()).await?)
            }
            None => {
                info!("using in-memory store");
                Arc::new(InMemoryRequestStore::new())
            }
        };
        let transport = Arc::new(HttpTransport::new(
            config.transport.timeout(),
            &config.transport.user_agent,
        )?);

        let monitor = Arc::new(ReachabilityMonitor::new(false));
        let probe = match &config.probe {
            Some(probe) => {
                let probe = ConnectivityProbe::new(
                    probe.addr.clone(),
                    std::time::Duration::from_secs(probe.interval_secs),
                    std::time::Duration::from_secs(probe.connect_timeout_secs),
                );
                // 初回の結果を待ってから processor を動かす
                monitor.set_available(probe.check().await);
                Some(probe.spawn(monitor.clone()))
            }
            None => {
                monitor.set_available(true);
                None
            }
        };

        let processor = QueueProcessorBuilder::new()
            .store(store)
            .transport(transport)
            .reachability(monitor.clone())
            .build()?;
        processor.start().await?;

        let scheduler = LifecycleScheduler::from_config(&processor, &config.background, completion);

        Ok(Self {
            processor,
            monitor,
            scheduler,
            probe,
        })
    }

    pub fn processor(&self) -> &Arc<QueueProcessor> {
        &self.processor
    }

    pub fn monitor(&self) -> &Arc<ReachabilityMonitor> {
        &self.monitor
    }

    pub fn scheduler(&self) -> &LifecycleScheduler {
        &self.scheduler
    }
}

impl Drop for CourierRuntime {
    fn drop(&mut self) {
        if let Some(probe) = self.probe.take() {
            probe.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::config::ProbeConfig;
    use crate::domain::{NewRecord, RequestDescriptor, RequestStatus};
    use crate::ports::set_status;

    fn scratch_path() -> std::path::PathBuf {
        std::env::temp_dir()
            .join(format!("courier-runtime-{}", ulid::Ulid::new()))
            .join("queue.json")
    }

    #[tokio::test]
    async fn without_probe_the_network_is_available() {
        let runtime = CourierRuntime::from_config(&QueueConfig::default())
            .await
            .unwrap();
        assert!(runtime.monitor().subscriber_count() >= 1);
        assert!(runtime.processor().is_listening());
        assert!(runtime.processor().is_foreground());
        assert_eq!(runtime.processor().pending_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn file_store_survives_restart_and_recovers_in_progress() {
        let path = scratch_path();
        let mut config = QueueConfig::default();
        config.store.path = Some(path.clone());

        {
            let store = JsonFileRequestStore::open(path.clone()).await.unwrap();
            let created = store
                .create(NewRecord::pending(
                    RequestDescriptor::new("https://example.com/a"),
                    chrono::Utc::now(),
                ))
                .await
                .unwrap();
            store
                .update(created.id, set_status(RequestStatus::InProgress))
                .await
                .unwrap();
        }

        // probe を指定して送信させない（到達しないアドレス）
        config.probe = Some(ProbeConfig {
            addr: "127.0.0.1:9".to_string(),
            interval_secs: 3600,
            connect_timeout_secs: 1,
        });
        let runtime = CourierRuntime::from_config(&config).await.unwrap();

        let pending = runtime
            .processor()
            .records(RequestStatus::Pending)
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].url.as_deref(), Some("https://example.com/a"));

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[tokio::test]
    async fn invalid_config_is_rejected() {
        let mut config = QueueConfig::default();
        config.transport.timeout_secs = 0;
        let err = CourierRuntime::from_config(&config).await.err().unwrap();
        assert!(matches!(err, RuntimeError::Config(ConfigError::Invalid(_))));
    }
}
