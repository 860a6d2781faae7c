//! QueueProcessorBuilder - 協調オブジェクトの組み立て
//!
//! store / transport / reachability は必須。clock は省略時 SystemClock。

use std::sync::Arc;

use thiserror::Error;

use super::QueueProcessor;
use crate::ports::{Clock, ReachabilitySignal, RequestStore, SystemClock, Transport};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("missing collaborator: {0}")]
    MissingCollaborator(&'static str),
}

#[derive(Default)]
pub struct QueueProcessorBuilder {
    store: Option<Arc<dyn RequestStore>>,
    transport: Option<Arc<dyn Transport>>,
    reachability: Option<Arc<dyn ReachabilitySignal>>,
    clock: Option<Arc<dyn Clock>>,
}

impl QueueProcessorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(mut self, store: Arc<dyn RequestStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn reachability(mut self, reachability: Arc<dyn ReachabilitySignal>) -> Self {
        self.reachability = Some(reachability);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<Arc<QueueProcessor>, BuildError> {
        let store = self.store.ok_or(BuildError::MissingCollaborator("store"))?;
        let transport = self
            .transport
            .ok_or(BuildError::MissingCollaborator("transport"))?;
        let reachability = self
            .reachability
            .ok_or(BuildError::MissingCollaborator("reachability"))?;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        Ok(Arc::new(QueueProcessor::new(
            store,
            transport,
            reachability,
            clock,
        )))
    }
}
