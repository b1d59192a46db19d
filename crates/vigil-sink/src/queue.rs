use crate::error::Result;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use vigil_common::types::Event;
use vigil_judge::EventSink;

/// Pushes serialized events onto priority-bucketed Redis lists with LPUSH
/// semantics. The connection manager multiplexes and reconnects on its
/// own; each publish checks out a clone and releases it on return.
pub struct RedisSink {
    conn: ConnectionManager,
    queue_pattern: String,
}

impl RedisSink {
    /// Connects to the queue server. `queue_pattern` carries one `{}`
    /// placeholder for the event priority, e.g. `event:p{}`.
    pub async fn connect(url: &str, queue_pattern: impl Into<String>) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self {
            conn,
            queue_pattern: queue_pattern.into(),
        })
    }

    async fn push(&self, event: &Event) -> Result<()> {
        let payload = serde_json::to_string(event)?;
        let key = format_queue_key(&self.queue_pattern, event.priority());
        let mut conn = self.conn.clone();
        let _: i64 = redis::cmd("LPUSH")
            .arg(&key)
            .arg(&payload)
            .query_async(&mut conn)
            .await?;
        tracing::debug!(event_id = %event.id, queue = %key, "event queued");
        Ok(())
    }
}

#[async_trait]
impl EventSink for RedisSink {
    async fn publish(&self, event: &Event) -> anyhow::Result<()> {
        self.push(event).await.map_err(Into::into)
    }
}

fn format_queue_key(pattern: &str, priority: i32) -> String {
    pattern.replacen("{}", &priority.to_string(), 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_key_substitutes_the_priority() {
        assert_eq!(format_queue_key("event:p{}", 0), "event:p0");
        assert_eq!(format_queue_key("event:p{}", 3), "event:p3");
    }

    #[test]
    fn queue_key_without_placeholder_is_untouched() {
        assert_eq!(format_queue_key("event:all", 3), "event:all");
    }
}
