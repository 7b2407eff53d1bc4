use colored::{ColoredString, Colorize};

use crate::api::types::{
    BusinessInsights, HealthStatus, PredictionDetail, PredictionInput, PredictionRecord,
    PredictionResult, RiskLevel,
};
use crate::history::{HistorySnapshot, RenderMode, ViewState};
use crate::stats::HistoryStats;
use crate::utils;

/// The sink the pager renders into. Replace discards the visible list and
/// draws `records` fresh; Append only draws the new records.
pub trait Renderer {
    fn render(&mut self, view: &ViewState);
}

fn risk_badge(level: RiskLevel) -> ColoredString {
    match level {
        RiskLevel::Low => "LOW".green().bold(),
        RiskLevel::Moderate => "MODERATE".yellow().bold(),
        RiskLevel::Critical => "CRITICAL".red().bold(),
    }
}

fn probability_colored(probability: f64, level: RiskLevel) -> ColoredString {
    let rendered = utils::percent(probability);
    match level {
        RiskLevel::Low => rendered.green(),
        RiskLevel::Moderate => rendered.yellow(),
        RiskLevel::Critical => rendered.red(),
    }
}

/// Prints history cards to the terminal, numbering them in display order.
pub struct TerminalRenderer {
    shown: usize,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self { shown: 0 }
    }

    fn print_card(&self, index: usize, record: &PredictionRecord) {
        // no width padding on the badge: escape codes would skew it
        println!(
            "[{index:>2}] {:<24} {} {}",
            record.customer_name,
            risk_badge(record.risk_level),
            utils::format_timestamp(&record.timestamp).dimmed(),
        );
        println!(
            "     party={} guests  no-show={}  lead={}d  deposit={}",
            record.party_size,
            probability_colored(record.probability, record.risk_level),
            record.lead_time_days,
            utils::deposit_label(record.deposit_paid),
        );
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for TerminalRenderer {
    fn render(&mut self, view: &ViewState) {
        if view.mode == RenderMode::Replace {
            self.shown = 0;
            if view.records.is_empty() {
                println!("   no predictions yet");
            }
        }
        for record in view.records.iter() {
            self.shown += 1;
            self.print_card(self.shown, record);
        }
    }
}

/// "showing N of M" trailer under the history list.
pub fn print_count_line(snapshot: &HistorySnapshot) {
    let loaded = snapshot.records.len();
    let total = if snapshot.total_count > 0 {
        snapshot.total_count
    } else {
        loaded
    };
    let status = if loaded < total {
        "more available"
    } else {
        "all loaded"
    };
    println!(
        "{}",
        format!(":: showing {loaded} of {total} predictions ({status})").dimmed()
    );
}

pub fn print_result(input: &PredictionInput, result: &PredictionResult) {
    println!(
        "{} {} no-show risk for {} (party of {})",
        risk_badge(result.risk_level),
        probability_colored(result.probability, result.risk_level),
        input.customer_name,
        input.party_size,
    );
    if !result.document_id.is_empty() {
        println!("{}", format!(":: saved as {}", result.document_id).dimmed());
    }
    if let Some(insights) = result.business_insights.as_ref() {
        println!();
        print_insights(insights);
    }
}

pub fn print_insights(insights: &BusinessInsights) {
    let revenue = &insights.revenue_impact;
    println!(
        "Revenue impact   : potential ${:.2}, at risk ${:.2} ({}%)",
        revenue.potential_revenue, revenue.potential_loss, revenue.risk_percentage,
    );
    let cost = &insights.cost_optimization;
    println!(
        "Cost optimization: prep waste avoided ${:.2}, staff savings ${:.2}, total ${:.2}",
        cost.prep_waste_avoided, cost.staff_savings, cost.total_savings,
    );
    let ops = &insights.operational_recommendations;
    println!("Overbooking      : {}", ops.overbooking);
    println!("Staffing         : {}", ops.staffing);
    println!("Food prep        : {}", ops.food_prep);
    if let Some(summary) = insights.financial_summary.as_ref() {
        println!(
            "Financial summary: net impact ${:.2}, confidence {}",
            summary.net_impact, summary.confidence_level,
        );
    }
}

pub fn print_detail(detail: &PredictionDetail) {
    let record = &detail.prediction;
    println!(
        "{:<24} {} {}",
        record.customer_name,
        risk_badge(record.risk_level),
        utils::format_timestamp(&record.timestamp).dimmed(),
    );
    println!(
        "party={} guests  no-show={}  lead={}d  deposit={}",
        record.party_size,
        probability_colored(record.probability, record.risk_level),
        record.lead_time_days,
        utils::deposit_label(record.deposit_paid),
    );
    println!("{}", format!("id: {}", record.id).dimmed());
    if let Some(insights) = detail.business_insights.as_ref() {
        println!();
        print_insights(insights);
    }
}

pub fn print_health(health: &HealthStatus) {
    let state = if health.is_healthy() {
        "ONLINE".green().bold()
    } else {
        "OFFLINE".red().bold()
    };
    println!(
        "{} database={} model={}",
        state, health.database, health.model
    );
    if let Some(error) = health.error.as_deref() {
        println!("{}", format!(":: {error}").red());
    }
    if !health.timestamp.is_empty() {
        println!(
            "{}",
            format!(":: checked at {}", utils::format_timestamp(&health.timestamp)).dimmed()
        );
    }
}

pub fn print_stats(stats: &HistoryStats) {
    println!(
        "predictions={}  avg-risk={}  critical={}",
        stats.total,
        utils::percent(stats.average_probability),
        stats.critical,
    );
}
