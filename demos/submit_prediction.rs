use noshow::api::types::PredictionInput;
use noshow::api::{ApiClient, ApiClientOptions};
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let client = ApiClient::new(ApiClientOptions {
        base_url: "http://127.0.0.1:8000".to_string(),
        timeout_seconds: 5,
        proxy: None,
    })?;

    let input = PredictionInput {
        customer_name: "Dana Cruz".to_string(),
        party_size: 4,
        deposit_paid: true,
        lead_time_days: 21,
        is_repeated_guest: false,
        previous_cancellations: 0,
        special_requests_count: 1,
        visit_month: 7,
    };
    input.validate()?;

    let result = client.submit(&input).await?;
    println!(
        "{}: {:.0}% no-show risk",
        result.risk_level.label(),
        result.probability * 100.0
    );

    Ok(())
}
