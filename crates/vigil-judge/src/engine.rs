use crate::events::{send_event_if_needed, LastEventIndex};
use crate::func::Function;
use crate::history::{HistoryStore, SeriesHandle};
use crate::index::RuleIndex;
use crate::EventSink;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use vigil_common::types::{Event, EventStatus, Expression, MetricSample};

#[derive(Debug, Clone)]
pub struct JudgeConfig {
    /// Rate-limit floor, in seconds, between consecutive PROBLEM
    /// emissions for one rule+series pair.
    pub min_interval: i64,
    /// Tolerance for `=`/`!=` comparisons.
    pub epsilon: f64,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            min_interval: 300,
            epsilon: 1e-4,
        }
    }
}

/// The judge: appends each incoming sample to its series window, selects
/// matching strategies and expressions from the current index snapshots,
/// evaluates them and feeds verdicts to the event state machine.
pub struct JudgeEngine {
    history: Arc<HistoryStore>,
    rules: Arc<RuleIndex>,
    last_events: Arc<LastEventIndex>,
    sink: Arc<dyn EventSink>,
    config: JudgeConfig,
}

impl JudgeEngine {
    pub fn new(
        history: Arc<HistoryStore>,
        rules: Arc<RuleIndex>,
        last_events: Arc<LastEventIndex>,
        sink: Arc<dyn EventSink>,
        config: JudgeConfig,
    ) -> Self {
        Self {
            history,
            rules,
            last_events,
            sink,
            config,
        }
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn last_events(&self) -> &LastEventIndex {
        &self.last_events
    }

    /// Appends the sample to its series window without evaluating rules.
    pub fn push_history(&self, sample: &MetricSample) -> SeriesHandle {
        self.history.push(sample)
    }

    /// Judges one sample at wall-clock `now` (epoch seconds).
    pub async fn judge(&self, sample: &MetricSample, now: i64) {
        let pk = sample.primary_key();
        let window = self.history.push_keyed(&pk, sample);
        self.check_strategies(&window, sample, &pk, now).await;
        self.check_expressions(&window, sample, &pk, now).await;
    }

    async fn check_strategies(
        &self,
        window: &SeriesHandle,
        sample: &MetricSample,
        pk: &str,
        now: i64,
    ) {
        let snapshot = self.rules.strategies();
        let key = RuleIndex::strategy_key(&sample.endpoint, &sample.metric);
        let Some(candidates) = snapshot.get(&key) else {
            return;
        };

        for strategy in candidates {
            // The plane key carries no tags, so a strategy scoped to
            // name=docker must not fire for name=agent samples.
            if !tags_subset_match(&strategy.tags, &sample.tags) {
                continue;
            }

            let function =
                match Function::parse(&strategy.func, &strategy.operator, strategy.right_value) {
                    Ok(f) => f,
                    Err(e) => {
                        tracing::error!(
                            strategy_id = strategy.id,
                            func = %strategy.func,
                            error = %e,
                            "strategy function parse failed, evaluation skipped"
                        );
                        continue;
                    }
                };

            let Some(eval) = function.evaluate(window, self.config.epsilon) else {
                continue;
            };

            let event = Event {
                id: format!("s_{}_{}", strategy.id, pk),
                status: EventStatus::Problem,
                strategy: Some(strategy.clone()),
                expression: None,
                endpoint: sample.endpoint.clone(),
                left_value: eval.left_value,
                current_step: 0,
                event_time: sample.timestamp,
                pushed_tags: sample.tags.clone(),
            };

            send_event_if_needed(
                &eval.history,
                eval.triggered,
                now,
                event,
                strategy.max_step,
                self.config.min_interval,
                &self.last_events,
                self.sink.as_ref(),
            )
            .await;
        }
    }

    async fn check_expressions(
        &self,
        window: &SeriesHandle,
        sample: &MetricSample,
        pk: &str,
        now: i64,
    ) {
        let snapshot = self.rules.expressions();
        // An expression is indexed under every tag pair it carries, so the
        // same sample can reach it through several keys.
        let mut handled: HashSet<i64> = HashSet::new();

        for key in expression_keys(sample) {
            let Some(candidates) = snapshot.get(&key) else {
                continue;
            };

            for expression in candidates {
                if !handled.insert(expression.id) {
                    continue;
                }
                if !expression_matches(expression, sample) {
                    continue;
                }

                let function = match Function::parse(
                    &expression.func,
                    &expression.operator,
                    expression.right_value,
                ) {
                    Ok(f) => f,
                    Err(e) => {
                        tracing::error!(
                            expression_id = expression.id,
                            func = %expression.func,
                            error = %e,
                            "expression function parse failed, evaluation skipped"
                        );
                        continue;
                    }
                };

                let Some(eval) = function.evaluate(window, self.config.epsilon) else {
                    continue;
                };

                let event = Event {
                    id: format!("e_{}_{}", expression.id, pk),
                    status: EventStatus::Problem,
                    strategy: None,
                    expression: Some(expression.clone()),
                    endpoint: sample.endpoint.clone(),
                    left_value: eval.left_value,
                    current_step: 0,
                    event_time: sample.timestamp,
                    pushed_tags: sample.tags.clone(),
                };

                send_event_if_needed(
                    &eval.history,
                    eval.triggered,
                    now,
                    event,
                    expression.max_step,
                    self.config.min_interval,
                    &self.last_events,
                    self.sink.as_ref(),
                )
                .await;
            }
        }
    }
}

/// Lookup keys a sample can reach expressions through: one per tag pair
/// plus the synthetic endpoint key.
fn expression_keys(sample: &MetricSample) -> Vec<String> {
    let mut keys: Vec<String> = sample
        .tags
        .iter()
        .map(|(k, v)| RuleIndex::expression_key(&sample.metric, k, v))
        .collect();
    keys.push(RuleIndex::expression_key(
        &sample.metric,
        "endpoint",
        &sample.endpoint,
    ));
    keys
}

/// Every required tag must be present with an equal value. Extra tags on
/// the sample side are ignored.
pub fn tags_subset_match(
    required: &HashMap<String, String>,
    tags: &HashMap<String, String>,
) -> bool {
    required.iter().all(|(k, v)| tags.get(k) == Some(v))
}

// The effective tag map grows an endpoint entry only when the expression
// actually filters on it.
fn expression_matches(expression: &Expression, sample: &MetricSample) -> bool {
    if expression.tags.contains_key("endpoint") {
        let mut effective = sample.tags.clone();
        effective.insert("endpoint".to_string(), sample.endpoint.clone());
        tags_subset_match(&expression.tags, &effective)
    } else {
        tags_subset_match(&expression.tags, &sample.tags)
    }
}
