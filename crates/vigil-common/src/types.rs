use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    #[default]
    #[serde(rename = "GAUGE")]
    Gauge,
    #[serde(rename = "COUNTER")]
    Counter,
    #[serde(rename = "DERIVE")]
    Derive,
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueType::Gauge => write!(f, "GAUGE"),
            ValueType::Counter => write!(f, "COUNTER"),
            ValueType::Derive => write!(f, "DERIVE"),
        }
    }
}

/// One metric sample reported by an upstream agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSample {
    pub endpoint: String,
    pub metric: String,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    pub timestamp: i64,
    pub value: f64,
    #[serde(rename = "valueType", default)]
    pub value_type: ValueType,
}

impl MetricSample {
    /// Stable series fingerprint over endpoint, metric, sorted tags and
    /// value type. Samples with equal fingerprints share one history window.
    pub fn primary_key(&self) -> String {
        let mut canon = String::with_capacity(
            self.endpoint.len() + self.metric.len() + 16 * self.tags.len() + 16,
        );
        canon.push_str(&self.endpoint);
        canon.push('/');
        canon.push_str(&self.metric);
        canon.push('/');
        let mut keys: Vec<&String> = self.tags.keys().collect();
        keys.sort();
        for key in keys {
            let _ = write!(canon, "{key}={},", self.tags[key]);
        }
        let _ = write!(canon, "{}", self.value_type);

        let digest = Sha256::digest(canon.as_bytes());
        let mut out = String::with_capacity(32);
        for b in &digest[..16] {
            let _ = write!(out, "{b:02x}");
        }
        out
    }
}

/// A single point inside a series window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: i64,
    pub value: f64,
}

/// Coarse-grained rule bound to an `<endpoint, metric>` plane, with an
/// optional tag filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Strategy {
    pub id: i64,
    pub metric: String,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    pub func: String,
    pub operator: String,
    #[serde(rename = "rightValue")]
    pub right_value: f64,
    #[serde(rename = "maxStep")]
    pub max_step: i32,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub note: String,
}

/// Fine-grained rule keyed by metric plus a single tag. The tag filter may
/// reference the synthetic `endpoint` tag carrying the sample's endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expression {
    pub id: i64,
    pub metric: String,
    pub tags: HashMap<String, String>,
    pub func: String,
    pub operator: String,
    #[serde(rename = "rightValue")]
    pub right_value: f64,
    #[serde(rename = "maxStep")]
    pub max_step: i32,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventStatus {
    #[serde(rename = "PROBLEM")]
    Problem,
    #[serde(rename = "OK")]
    Ok,
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventStatus::Problem => write!(f, "PROBLEM"),
            EventStatus::Ok => write!(f, "OK"),
        }
    }
}

/// Alert event pushed to the outbound queue. Field names stay compatible
/// with the downstream alert routers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub status: EventStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<Expression>,
    pub endpoint: String,
    #[serde(rename = "leftValue")]
    pub left_value: f64,
    #[serde(rename = "currentStep")]
    pub current_step: i32,
    #[serde(rename = "eventTime")]
    pub event_time: i64,
    #[serde(rename = "pushedTags", default)]
    pub pushed_tags: HashMap<String, String>,
}

impl Event {
    /// Priority of the rule that produced this event; selects the outbound
    /// queue. Falls back to 0 when the rule carries none.
    pub fn priority(&self) -> i32 {
        if let Some(s) = &self.strategy {
            return s.priority;
        }
        if let Some(e) = &self.expression {
            return e.priority;
        }
        0
    }
}
