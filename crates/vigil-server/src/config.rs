use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
    #[serde(default)]
    pub hbs: HbsConfig,
    #[serde(default)]
    pub alarm: AlarmConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

/// Heartbeat-server client settings for the periodic rule refresh.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HbsConfig {
    #[serde(default = "default_hbs_addr")]
    pub addr: String,
    #[serde(default = "default_hbs_interval_secs")]
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmConfig {
    #[serde(default = "default_alarm_enabled")]
    pub enabled: bool,
    #[serde(default = "default_min_interval")]
    pub min_interval: i64,
    #[serde(default = "default_queue_pattern")]
    pub queue_pattern: String,
    #[serde(default = "default_redis")]
    pub redis: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryConfig {
    #[serde(default = "default_max_history")]
    pub max_history: usize,
    #[serde(default = "default_stale_timeout")]
    pub stale_timeout: i64,
    #[serde(default = "default_clean_interval")]
    pub clean_interval: u64,
    #[serde(default = "default_shard_count")]
    pub shard_count: usize,
}

impl Default for HbsConfig {
    fn default() -> Self {
        Self {
            addr: default_hbs_addr(),
            interval_secs: default_hbs_interval_secs(),
        }
    }
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            enabled: default_alarm_enabled(),
            min_interval: default_min_interval(),
            queue_pattern: default_queue_pattern(),
            redis: default_redis(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_history: default_max_history(),
            stale_timeout: default_stale_timeout(),
            clean_interval: default_clean_interval(),
            shard_count: default_shard_count(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:6081".to_string()
}

fn default_epsilon() -> f64 {
    1e-4
}

fn default_hbs_addr() -> String {
    "http://127.0.0.1:6030/strategies".to_string()
}

fn default_hbs_interval_secs() -> u64 {
    60
}

fn default_alarm_enabled() -> bool {
    true
}

fn default_min_interval() -> i64 {
    300
}

fn default_queue_pattern() -> String {
    "event:p{}".to_string()
}

fn default_redis() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_max_history() -> usize {
    11
}

fn default_stale_timeout() -> i64 {
    3600
}

fn default_clean_interval() -> u64 {
    3600
}

fn default_shard_count() -> usize {
    256
}

impl ServerConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{path}'"))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config file '{path}'"))?;
        Ok(config)
    }
}
