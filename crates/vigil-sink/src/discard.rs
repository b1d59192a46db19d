use async_trait::async_trait;
use vigil_common::types::Event;
use vigil_judge::EventSink;

/// Sink used when alarming is disabled: events are logged at debug level
/// and dropped.
#[derive(Debug, Default)]
pub struct DiscardSink;

#[async_trait]
impl EventSink for DiscardSink {
    async fn publish(&self, event: &Event) -> anyhow::Result<()> {
        tracing::debug!(event_id = %event.id, status = %event.status, "alarm disabled, event discarded");
        Ok(())
    }
}
