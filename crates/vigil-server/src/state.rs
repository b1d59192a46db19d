use std::sync::Arc;
use vigil_judge::engine::JudgeEngine;
use vigil_judge::events::LastEventIndex;
use vigil_judge::history::HistoryStore;
use vigil_judge::index::RuleIndex;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<JudgeEngine>,
    pub history: Arc<HistoryStore>,
    pub rules: Arc<RuleIndex>,
    pub last_events: Arc<LastEventIndex>,
}
