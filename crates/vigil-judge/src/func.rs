use crate::history::SeriesHandle;
use vigil_common::types::HistoryEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FuncKind {
    Max,
    Min,
    All,
    Sum,
    Avg,
    Diff,
    PDiff,
}

#[derive(Debug, thiserror::Error)]
pub enum FuncError {
    #[error("not_supported_method")]
    NotSupportedMethod,

    #[error("malformed function text '{0}'")]
    Malformed(String),

    #[error("bad sample count: {0}")]
    BadLimit(#[from] std::num::ParseIntError),
}

/// Windowed aggregation predicate parsed from rule function text such as
/// `max(#3)` or `pdiff(#10)`, combined with the rule's comparison operator
/// and threshold.
#[derive(Debug, Clone)]
pub struct Function {
    kind: FuncKind,
    limit: usize,
    operator: String,
    right_value: f64,
}

/// Outcome of evaluating a [`Function`] over a window snapshot.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Entries the evaluator consulted, newest first.
    pub history: Vec<HistoryEntry>,
    pub left_value: f64,
    pub triggered: bool,
}

impl Function {
    /// Parses function text of the shape `name(#k)` with k >= 1.
    pub fn parse(text: &str, operator: &str, right_value: f64) -> Result<Self, FuncError> {
        let hash = text
            .find('#')
            .ok_or_else(|| FuncError::Malformed(text.to_string()))?;
        let limit: usize = text[hash + 1..]
            .strip_suffix(')')
            .ok_or_else(|| FuncError::Malformed(text.to_string()))?
            .parse()?;
        if limit == 0 {
            return Err(FuncError::Malformed(text.to_string()));
        }
        let name = text[..hash]
            .strip_suffix('(')
            .ok_or_else(|| FuncError::Malformed(text.to_string()))?;

        let kind = match name {
            "max" => FuncKind::Max,
            "min" => FuncKind::Min,
            "all" => FuncKind::All,
            "sum" => FuncKind::Sum,
            "avg" => FuncKind::Avg,
            "diff" => FuncKind::Diff,
            "pdiff" => FuncKind::PDiff,
            _ => return Err(FuncError::NotSupportedMethod),
        };

        Ok(Self {
            kind,
            limit,
            operator: operator.to_string(),
            right_value,
        })
    }

    // diff/pdiff compare the newest point against `limit` older ones.
    fn required(&self) -> usize {
        match self.kind {
            FuncKind::Diff | FuncKind::PDiff => self.limit + 1,
            _ => self.limit,
        }
    }

    /// Evaluates the predicate over a copied snapshot of the window.
    /// Returns `None` when the window holds fewer entries than the
    /// function needs.
    pub fn evaluate(&self, window: &SeriesHandle, epsilon: f64) -> Option<Evaluation> {
        let (history, enough) = window.read().snapshot(self.required());
        if !enough {
            return None;
        }

        let values: Vec<f64> = history.iter().map(|e| e.value).collect();
        let (left_value, triggered) = match self.kind {
            FuncKind::Max => {
                let left = values.iter().copied().fold(values[0], f64::max);
                (left, self.check(left, epsilon))
            }
            FuncKind::Min => {
                let left = values.iter().copied().fold(values[0], f64::min);
                (left, self.check(left, epsilon))
            }
            FuncKind::All => {
                let triggered = values.iter().all(|v| self.check(*v, epsilon));
                (values[0], triggered)
            }
            FuncKind::Sum => {
                let left = values.iter().sum();
                (left, self.check(left, epsilon))
            }
            FuncKind::Avg => {
                let left = values.iter().sum::<f64>() / self.limit as f64;
                (left, self.check(left, epsilon))
            }
            FuncKind::Diff => {
                let first = values[0];
                let mut left = 0.0;
                let mut triggered = false;
                for v in &values[1..] {
                    left = first - v;
                    if self.check(left, epsilon) {
                        triggered = true;
                        break;
                    }
                }
                (left, triggered)
            }
            FuncKind::PDiff => {
                let first = values[0];
                let mut left = 0.0;
                let mut triggered = false;
                for v in &values[1..] {
                    if *v == 0.0 {
                        continue;
                    }
                    left = (first - v) / v * 100.0;
                    if self.check(left, epsilon) {
                        triggered = true;
                        break;
                    }
                }
                (left, triggered)
            }
        };

        Some(Evaluation {
            history,
            left_value,
            triggered,
        })
    }

    fn check(&self, left: f64, epsilon: f64) -> bool {
        is_triggered(left, &self.operator, self.right_value, epsilon)
    }
}

/// Whether `left <op> right` holds. Equality operators compare within
/// `epsilon`; an unknown operator never triggers.
pub fn is_triggered(left: f64, operator: &str, right: f64, epsilon: f64) -> bool {
    match operator {
        "=" | "==" => (left - right).abs() < epsilon,
        "!=" => (left - right).abs() > epsilon,
        "<" => left < right,
        "<=" => left <= right,
        ">" => left > right,
        ">=" => left >= right,
        _ => false,
    }
}
