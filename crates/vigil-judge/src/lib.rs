//! Rule evaluation core of the vigil alert judge.
//!
//! Incoming metric samples are appended to bounded per-series history
//! windows and matched against two overlapping rule corpora: strategies
//! (keyed by endpoint and metric) and expressions (keyed by metric plus a
//! single tag). Windowed aggregation functions decide whether a rule
//! fires; the event state machine debounces, escalates and rate-limits
//! emissions before they reach the outbound [`EventSink`].

pub mod engine;
pub mod events;
pub mod func;
pub mod history;
pub mod index;


use anyhow::Result;
use async_trait::async_trait;
use vigil_common::types::Event;

/// Outbound delivery seam for judged events.
///
/// The state machine records the event in the last-event index first and
/// then publishes through this trait on the caller task. A failed publish
/// is logged and dropped; the rule re-fires on the next trigger.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Delivers one event to the external alert queue.
    async fn publish(&self, event: &Event) -> Result<()>;
}
