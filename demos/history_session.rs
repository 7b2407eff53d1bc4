use noshow::api::{ApiClient, ApiClientOptions};
use noshow::history::HistoryPager;
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let client = ApiClient::new(ApiClientOptions {
        base_url: "http://127.0.0.1:8000".to_string(),
        timeout_seconds: 5,
        proxy: None,
    })?;

    let pager = HistoryPager::with_page_size(client, 6);
    let first = pager.reset().await?;
    println!("first page: {} records", first.records.len());

    while let Some(button) = pager.load_more() {
        println!("{}", button.label());
        let view = pager.load_next().await?;
        println!("appended {} records", view.records.len());
    }

    let snapshot = pager.snapshot();
    println!(
        "loaded {} of {} predictions",
        snapshot.records.len(),
        snapshot.total_count
    );

    Ok(())
}
