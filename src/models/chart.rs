use serde::{Deserialize, Serialize};

/// Chart specification as produced by the oracle.
///
/// Every field is optional on the wire: the oracle is best-effort and the
/// contract deliberately defaults missing fields to `None` instead of
/// rejecting an incomplete plan. Resolution of the `chart_type` and
/// `operation` strings is deferred to the renderer, so an unknown value
/// survives parsing and is reported as a warning there.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartPlan {
    #[serde(default)]
    pub chart_type: Option<String>,
    #[serde(default)]
    pub x: Option<String>,
    #[serde(default)]
    pub y: Option<String>,
    #[serde(default)]
    pub operation: Option<String>,
    #[serde(default)]
    pub filter: Option<String>,
}

/// The closed set of chart kinds the renderer knows how to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    Pie,
    Histogram,
    Box,
    Scatter,
}

impl ChartKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "bar" => Some(ChartKind::Bar),
            "pie" => Some(ChartKind::Pie),
            "hist" | "histogram" => Some(ChartKind::Histogram),
            "box" => Some(ChartKind::Box),
            "scatter" => Some(ChartKind::Scatter),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Pie => "pie",
            ChartKind::Histogram => "hist",
            ChartKind::Box => "box",
            ChartKind::Scatter => "scatter",
        }
    }
}

/// Aggregation applied before drawing bar/pie charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOp {
    Count,
    Mean,
    Sum,
}

impl AggregateOp {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "count" => Some(AggregateOp::Count),
            "mean" | "avg" | "average" => Some(AggregateOp::Mean),
            "sum" => Some(AggregateOp::Sum),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_kind_accepts_both_hist_spellings() {
        assert_eq!(ChartKind::parse("hist"), Some(ChartKind::Histogram));
        assert_eq!(ChartKind::parse("histogram"), Some(ChartKind::Histogram));
        assert_eq!(ChartKind::parse("Bar"), Some(ChartKind::Bar));
        assert_eq!(ChartKind::parse("scatterplot"), None);
    }

    #[test]
    fn plan_fields_all_default_to_none() {
        let plan: ChartPlan = serde_json::from_str("{}").unwrap();
        assert!(plan.chart_type.is_none());
        assert!(plan.x.is_none());
        assert!(plan.y.is_none());
        assert!(plan.operation.is_none());
        assert!(plan.filter.is_none());
    }
}
