use anyhow::Result;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use vigil_common::types::{Expression, Strategy};
use vigil_judge::index::{ExpressionIndex, RuleIndex, StrategyIndex};

/// Rule corpus document served by the heartbeat server. Strategies arrive
/// grouped by the hosts they apply to (host-group membership is resolved
/// on the heartbeat side); expressions arrive flat.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulesDocument {
    #[serde(default)]
    pub host_strategies: Vec<HostStrategies>,
    #[serde(default)]
    pub expressions: Vec<Expression>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostStrategies {
    pub hostname: String,
    #[serde(default)]
    pub strategies: Vec<Strategy>,
}

/// Periodically fetches the rule corpora and swaps complete indexes into
/// the shared [`RuleIndex`]. A failed fetch keeps the previous snapshot.
pub struct RuleSyncer {
    http: reqwest::Client,
    endpoint: String,
    interval: Duration,
    rules: Arc<RuleIndex>,
}

impl RuleSyncer {
    pub fn new(endpoint: String, interval_secs: u64, rules: Arc<RuleIndex>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
            interval: Duration::from_secs(interval_secs.max(1)),
            rules,
        }
    }

    pub async fn run(self) {
        let mut tick = tokio::time::interval(self.interval);
        loop {
            tick.tick().await;
            match self.sync_once().await {
                Ok((strategies, expressions)) => {
                    tracing::info!(strategies, expressions, "rule corpora refreshed");
                }
                Err(e) => {
                    tracing::error!(error = %e, "rule sync failed, keeping previous snapshot");
                }
            }
        }
    }

    async fn sync_once(&self) -> Result<(usize, usize)> {
        let doc: RulesDocument = self
            .http
            .get(&self.endpoint)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let strategy_count = doc.host_strategies.iter().map(|h| h.strategies.len()).sum();
        let expression_count = doc.expressions.len();

        let strategies = build_strategy_index(&doc.host_strategies);
        let expressions = build_expression_index(&doc.expressions);
        self.rules.set(strategies, expressions);

        Ok((strategy_count, expression_count))
    }
}

pub fn build_strategy_index(host_strategies: &[HostStrategies]) -> StrategyIndex {
    let mut index: StrategyIndex = HashMap::new();
    for host in host_strategies {
        for strategy in &host.strategies {
            let key = RuleIndex::strategy_key(&host.hostname, &strategy.metric);
            index.entry(key).or_default().push(strategy.clone());
        }
    }
    index
}

pub fn build_expression_index(expressions: &[Expression]) -> ExpressionIndex {
    let mut index: ExpressionIndex = HashMap::new();
    for expression in expressions {
        for (tag_key, tag_value) in &expression.tags {
            let key = RuleIndex::expression_key(&expression.metric, tag_key, tag_value);
            index.entry(key).or_default().push(expression.clone());
        }
    }
    index
}
