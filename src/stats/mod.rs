use crate::api::types::{PredictionRecord, RiskLevel};

/// Aggregates over a set of loaded prediction records.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HistoryStats {
    pub total: usize,
    pub average_probability: f64,
    pub critical: usize,
}

pub fn summarize(records: &[PredictionRecord]) -> HistoryStats {
    if records.is_empty() {
        return HistoryStats::default();
    }
    let sum: f64 = records.iter().map(|r| r.probability).sum();
    let critical = records
        .iter()
        .filter(|r| r.risk_level == RiskLevel::Critical)
        .count();
    HistoryStats {
        total: records.len(),
        average_probability: sum / records.len() as f64,
        critical,
    }
}
