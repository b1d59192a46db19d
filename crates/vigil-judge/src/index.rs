use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::sync::Arc;
use vigil_common::types::{Expression, Strategy};

/// Strategies grouped by `endpoint/metric`.
pub type StrategyIndex = HashMap<String, Vec<Strategy>>;

/// Expressions grouped by `metric/tagKey=tagValue`; one entry per tag pair
/// the expression carries.
pub type ExpressionIndex = HashMap<String, Vec<Expression>>;

/// Double-buffered rule corpora. Readers obtain pointer-stable immutable
/// snapshots for the duration of one judge call; the sync task swaps in
/// complete replacements and never mutates a published index.
pub struct RuleIndex {
    strategies: ArcSwap<StrategyIndex>,
    expressions: ArcSwap<ExpressionIndex>,
}

impl RuleIndex {
    pub fn new() -> Self {
        Self {
            strategies: ArcSwap::from_pointee(HashMap::new()),
            expressions: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    /// Atomically publishes freshly built indexes. Callers must hand in
    /// complete maps, never partially built ones.
    pub fn set(&self, strategies: StrategyIndex, expressions: ExpressionIndex) {
        self.strategies.store(Arc::new(strategies));
        self.expressions.store(Arc::new(expressions));
    }

    pub fn strategies(&self) -> Arc<StrategyIndex> {
        self.strategies.load_full()
    }

    pub fn expressions(&self) -> Arc<ExpressionIndex> {
        self.expressions.load_full()
    }

    pub fn strategy_key(endpoint: &str, metric: &str) -> String {
        format!("{endpoint}/{metric}")
    }

    pub fn expression_key(metric: &str, tag_key: &str, tag_value: &str) -> String {
        format!("{metric}/{tag_key}={tag_value}")
    }
}

impl Default for RuleIndex {
    fn default() -> Self {
        Self::new()
    }
}
