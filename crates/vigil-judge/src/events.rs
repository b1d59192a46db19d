use crate::EventSink;
use dashmap::DashMap;
use vigil_common::types::{Event, EventStatus, HistoryEntry};

/// Most recently emitted event per rule+series pair, keyed by event id.
/// One entry per active pair, process-wide.
pub struct LastEventIndex {
    events: DashMap<String, Event>,
}

impl LastEventIndex {
    pub fn new() -> Self {
        Self {
            events: DashMap::new(),
        }
    }

    pub fn get(&self, id: &str) -> Option<Event> {
        self.events.get(id).map(|e| e.value().clone())
    }

    pub fn set(&self, event: Event) {
        self.events.insert(event.id.clone(), event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for LastEventIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Decides whether an evaluated verdict becomes an emission.
///
/// `history` is the slice of entries the evaluator consulted, newest
/// first; its last element is the oldest point that contributed to the
/// verdict.
pub(crate) async fn send_event_if_needed(
    history: &[HistoryEntry],
    triggered: bool,
    now: i64,
    mut event: Event,
    max_step: i32,
    min_interval: i64,
    last_events: &LastEventIndex,
    sink: &dyn EventSink,
) {
    let last = last_events.get(&event.id);

    if triggered {
        event.status = EventStatus::Problem;

        // max_step 0 mutes the rule entirely
        if max_step == 0 {
            return;
        }

        match last {
            Some(prev) if prev.status == EventStatus::Problem => {
                if prev.current_step >= max_step {
                    return;
                }
                // The oldest point we judged was already covered by the
                // previous emission; evaluating it again would re-alert on
                // every arriving sample.
                if history
                    .last()
                    .is_some_and(|oldest| oldest.timestamp <= prev.event_time)
                {
                    return;
                }
                if now - prev.event_time < min_interval {
                    return;
                }
                event.current_step = prev.current_step + 1;
                emit(event, last_events, sink).await;
            }
            _ => {
                // first incident, or a new one after recovery
                event.current_step = 1;
                emit(event, last_events, sink).await;
            }
        }
    } else if last.is_some_and(|prev| prev.status == EventStatus::Problem) {
        event.status = EventStatus::Ok;
        event.current_step = 1;
        emit(event, last_events, sink).await;
    }
}

async fn emit(event: Event, last_events: &LastEventIndex, sink: &dyn EventSink) {
    // Record first so a concurrent evaluation of the same series observes
    // the new state before the queue publish lands.
    last_events.set(event.clone());

    if let Err(e) = sink.publish(&event).await {
        tracing::error!(event_id = %event.id, error = %e, "event publish failed, event dropped");
    }
}
