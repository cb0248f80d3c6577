//! Risk detection over farm-plot records.
//!
//! Three fixed checks are evaluated per row, in order. Results are offered in
//! two shapes: a per-row list for display and a per-plot index for lookups
//! (export join, map highlighting).

use crate::types::{NumericColumn, PlotRecord};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Yield gaps above this many tons are flagged.
pub const YIELD_GAP_THRESHOLD: f64 = 10.0;

/// Real-time rainfall above this many millimetres is flagged.
pub const HEAVY_RAINFALL_MM: f64 = 50.0;

/// Fixed vocabulary of risk labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Issue {
    NegativeProfit,
    HighYieldGap,
    HeavyRainfall,
}

impl Issue {
    /// All issues in evaluation order.
    pub const ALL: [Issue; 3] = [
        Issue::NegativeProfit,
        Issue::HighYieldGap,
        Issue::HeavyRainfall,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Issue::NegativeProfit => "Negative profit",
            Issue::HighYieldGap => "High yield gap",
            Issue::HeavyRainfall => "Heavy rainfall",
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Issue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// A single check: the column it reads and the predicate on its coerced value.
pub struct Rule {
    pub issue: Issue,
    pub column: NumericColumn,
    pub triggers: fn(f64) -> bool,
}

fn is_negative(v: f64) -> bool {
    v < 0.0
}

fn exceeds_yield_gap(v: f64) -> bool {
    v > YIELD_GAP_THRESHOLD
}

fn exceeds_rainfall(v: f64) -> bool {
    v > HEAVY_RAINFALL_MM
}

/// Evaluation order is the order of this table.
pub const RULES: [Rule; 3] = [
    Rule {
        issue: Issue::NegativeProfit,
        column: NumericColumn::ProfitMargin,
        triggers: is_negative,
    },
    Rule {
        issue: Issue::HighYieldGap,
        column: NumericColumn::YieldGap,
        triggers: exceeds_yield_gap,
    },
    Rule {
        issue: Issue::HeavyRainfall,
        column: NumericColumn::RtRainfall,
        triggers: exceeds_rainfall,
    },
];

/// Issues raised by one record, in rule order.
///
/// Missing or unparseable cells are read as `0`, which none of the rules
/// accept, so bad input simply raises nothing.
pub fn classify(record: &PlotRecord) -> Vec<Issue> {
    RULES
        .iter()
        .filter(|rule| (rule.triggers)(record.numeric(rule.column).unwrap_or(0.0)))
        .map(|rule| rule.issue)
        .collect()
}

/// One alerted row, as listed on the alerts view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertEntry {
    pub plot_id: String,
    pub owner: String,
    pub location: String,
    pub issues: Vec<Issue>,
}

impl fmt::Display for AlertEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Plot {} ({}, {}): {}",
            self.plot_id,
            self.owner,
            self.location,
            join_issues(&self.issues)
        )
    }
}

/// Issues per `plot_id`. A repeated id keeps the issues of its last alerted row.
pub type AlertIndex = HashMap<String, Vec<Issue>>;

pub fn join_issues(issues: &[Issue]) -> String {
    issues
        .iter()
        .map(|i| i.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// One entry per alerted row, in dataset order. Repeated ids stay repeated.
pub fn detect_risks_list(data: &[PlotRecord]) -> Vec<AlertEntry> {
    let alerts: Vec<AlertEntry> = data
        .iter()
        .filter_map(|r| {
            let issues = classify(r);
            if issues.is_empty() {
                return None;
            }
            Some(AlertEntry {
                plot_id: r.plot_id.clone(),
                owner: r.owner().to_string(),
                location: r.location().to_string(),
                issues,
            })
        })
        .collect();
    debug!(rows = data.len(), alerts = alerts.len(), "risk list built");
    alerts
}

/// Issues keyed by plot id; later rows overwrite earlier ones with the same id.
pub fn detect_risks_map(data: &[PlotRecord]) -> AlertIndex {
    let mut index = AlertIndex::new();
    for r in data {
        let issues = classify(r);
        if !issues.is_empty() {
            index.insert(r.plot_id.clone(), issues);
        }
    }
    debug!(rows = data.len(), plots = index.len(), "risk index built");
    index
}
