use serde::de::{self, Deserializer, Unexpected};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Risk banding assigned by the prediction service.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RiskLevel {
    #[default]
    Low,
    Moderate,
    Critical,
}

impl RiskLevel {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "moderate" => Some(Self::Moderate),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::Critical => "Critical",
        }
    }
}

impl<'de> Deserialize<'de> for RiskLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        RiskLevel::parse(&raw).ok_or_else(|| {
            de::Error::invalid_value(Unexpected::Str(&raw), &"Low, Moderate, or Critical")
        })
    }
}

impl Serialize for RiskLevel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.label())
    }
}

// The service stores the 0/1 integers the form submits; documents written
// by older builds carry real booleans. Accept both, emit 0/1.
fn flag_from_wire<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }
    match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => Ok(value),
        Flag::Int(value) => Ok(value != 0),
    }
}

fn flag_to_wire<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_i64(i64::from(*value))
}

/// One stored prediction, as returned by the listing endpoints.
///
/// `timestamp` is kept verbatim: ordering is the server's responsibility
/// and the string is only parsed when formatted for display.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct PredictionRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub customer_name: String,
    pub party_size: u32,
    #[serde(rename = "prediction_prob")]
    pub probability: f64,
    #[serde(default)]
    pub risk_level: RiskLevel,
    pub lead_time_days: u32,
    #[serde(
        deserialize_with = "flag_from_wire",
        serialize_with = "flag_to_wire"
    )]
    pub deposit_paid: bool,
    pub timestamp: String,
}

/// Reservation attributes submitted for scoring.
#[derive(Clone, Debug, Serialize)]
pub struct PredictionInput {
    pub customer_name: String,
    pub party_size: u32,
    #[serde(serialize_with = "flag_to_wire")]
    pub deposit_paid: bool,
    pub lead_time_days: u32,
    #[serde(serialize_with = "flag_to_wire")]
    pub is_repeated_guest: bool,
    pub previous_cancellations: u32,
    pub special_requests_count: u32,
    pub visit_month: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("customer_name must not be empty")]
    EmptyCustomerName,

    #[error("party_size must be at least 1")]
    ZeroPartySize,

    #[error("visit_month must be between 1 and 12, got {value}")]
    VisitMonthOutOfRange { value: u32 },
}

impl PredictionInput {
    /// Field checks performed before anything goes on the wire.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.customer_name.trim().is_empty() {
            return Err(ValidationError::EmptyCustomerName);
        }
        if self.party_size == 0 {
            return Err(ValidationError::ZeroPartySize);
        }
        if !(1..=12).contains(&self.visit_month) {
            return Err(ValidationError::VisitMonthOutOfRange {
                value: self.visit_month,
            });
        }
        Ok(())
    }
}

/// Scoring response from `POST /predict`.
#[derive(Clone, Debug, Deserialize)]
pub struct PredictionResult {
    pub probability: f64,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub business_insights: Option<BusinessInsights>,
    #[serde(default)]
    pub document_id: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BusinessInsights {
    pub revenue_impact: RevenueImpact,
    pub cost_optimization: CostOptimization,
    pub operational_recommendations: OperationalRecommendations,
    #[serde(default)]
    pub financial_summary: Option<FinancialSummary>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RevenueImpact {
    pub potential_revenue: f64,
    pub potential_loss: f64,
    pub risk_percentage: f64,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CostOptimization {
    pub prep_waste_avoided: f64,
    pub staff_savings: f64,
    pub total_savings: f64,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct OperationalRecommendations {
    pub overbooking: String,
    pub staffing: String,
    pub food_prep: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct FinancialSummary {
    pub net_impact: f64,
    pub confidence_level: String,
}

/// `GET /health` response.
#[derive(Clone, Debug, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub database: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub timestamp: String,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy" && self.database == "connected"
    }
}

/// `GET /predictions/{id}` response.
#[derive(Clone, Debug, Deserialize)]
pub struct PredictionDetail {
    pub prediction: PredictionRecord,
    #[serde(default)]
    pub business_insights: Option<BusinessInsights>,
}
