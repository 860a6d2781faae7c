//! QueueConfig - 設定
//!
//! JSON で読み込む。すべてのセクションとフィールドに既定値があるので、
//! `{}` だけでも有効な設定になる。

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub background: BackgroundConfig,
    pub transport: TransportConfig,
    /// 省略時はプローブせず、ネットワークは常に到達可能とみなす
    pub probe: Option<ProbeConfig>,
    pub store: StoreConfig,
}

/// バックグラウンド中の定期起床
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundConfig {
    pub refresh_interval_secs: u64,
    /// ホストが 1 回のバックグラウンド実行に与える時間
    pub time_budget_secs: u64,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 5 * 60,
            time_budget_secs: 30,
        }
    }
}

impl BackgroundConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn time_budget(&self) -> Duration {
        Duration::from_secs(self.time_budget_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("courier/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl TransportConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// 接続先の `host:port`
    pub addr: String,
    pub interval_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            addr: "1.1.1.1:443".to_string(),
            interval_secs: 10,
            connect_timeout_secs: 3,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// 省略時は in-memory store
    pub path: Option<PathBuf>,
}

impl QueueConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: QueueConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut zero = Vec::new();
        if self.background.refresh_interval_secs == 0 {
            zero.push("background.refresh_interval_secs");
        }
        if self.background.time_budget_secs == 0 {
            zero.push("background.time_budget_secs");
        }
        if self.transport.timeout_secs == 0 {
            zero.push("transport.timeout_secs");
        }
        if let Some(probe) = &self.probe {
            if probe.addr.trim().is_empty() {
                return Err(ConfigError::Invalid("probe.addr must not be empty".to_string()));
            }
            if probe.interval_secs == 0 {
                zero.push("probe.interval_secs");
            }
            if probe.connect_timeout_secs == 0 {
                zero.push("probe.connect_timeout_secs");
            }
        }
        if !zero.is_empty() {
            return Err(ConfigError::Invalid(format!("must be > 0: {}", zero.join(", "))));
        }
        Ok(())
    }
}
