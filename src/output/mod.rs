use itertools::Itertools;
use serde::Serialize;

use crate::api::types::PredictionRecord;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".csv") {
        return Some(OutputFormat::Csv);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

#[derive(Clone, Debug, Serialize)]
pub struct ExportRecord {
    pub id: String,
    pub customer_name: String,
    pub party_size: u32,
    pub probability: f64,
    pub risk_level: String,
    pub lead_time_days: u32,
    pub deposit_paid: bool,
    pub timestamp: String,
}

pub fn build_records(records: &[PredictionRecord]) -> Vec<ExportRecord> {
    records
        .iter()
        .map(|r| ExportRecord {
            id: r.id.clone(),
            customer_name: r.customer_name.clone(),
            party_size: r.party_size,
            probability: r.probability,
            risk_level: r.risk_level.label().to_string(),
            lead_time_days: r.lead_time_days,
            deposit_paid: r.deposit_paid,
            timestamp: r.timestamp.clone(),
        })
        .collect()
}

pub fn render_text(records: &[ExportRecord]) -> Vec<u8> {
    let mut out = String::new();
    for r in records {
        out.push_str(&format!(
            "{}  {:<24} {:<8} {:>4.0}%  party={} lead={}d deposit={}\n",
            r.timestamp,
            r.customer_name,
            r.risk_level,
            r.probability * 100.0,
            r.party_size,
            r.lead_time_days,
            r.deposit_paid,
        ));
    }
    out.into_bytes()
}

pub fn render_json(records: &[ExportRecord]) -> Vec<u8> {
    serde_json::to_vec_pretty(records).unwrap_or_else(|_| b"[]\n".to_vec())
}

fn escape_csv(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn render_csv(records: &[ExportRecord]) -> Vec<u8> {
    let mut out = String::new();
    out.push_str(
        "id,customer_name,party_size,probability,risk_level,lead_time_days,deposit_paid,timestamp\n",
    );
    for r in records {
        let fields = [
            escape_csv(&r.id),
            escape_csv(&r.customer_name),
            r.party_size.to_string(),
            r.probability.to_string(),
            escape_csv(&r.risk_level),
            r.lead_time_days.to_string(),
            r.deposit_paid.to_string(),
            escape_csv(&r.timestamp),
        ];
        out.push_str(&fields.iter().join(","));
        out.push('\n');
    }
    out.into_bytes()
}
