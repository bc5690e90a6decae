//! Sales Feed Demo - a fast producer feeding a slow UI
//!
//! A sale is made every 500ms while the UI takes 700ms to redraw. The relay
//! folds the sales that pile up during a redraw into one update, so the UI
//! total never drifts and never lags more than one redraw behind.
//!
//! Run with: `cargo run --example sales_feed -- 20`

use std::time::Duration;

use conflate_relay::{ConflatingRelay, Sale};
use tokio::time::{sleep, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

const SALE_INTERVAL: Duration = Duration::from_millis(500);
const REDRAW_TIME: Duration = Duration::from_millis(700);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,conflate_relay=info")),
        )
        .init();

    let total_sales: u64 = match std::env::args().nth(1) {
        Some(arg) => arg.parse()?,
        None => 20,
    };

    // Default retry interval is 1ms
    let (sales, mut updates) = ConflatingRelay::with_defaults::<Sale>();
    let start = Instant::now();

    let producer = tokio::spawn(async move {
        let mut made = 0.0;
        for n in 1..=total_sales {
            sleep(SALE_INTERVAL).await;
            made += 1.0;
            let sale = Sale::new(made, n * SALE_INTERVAL.as_millis() as u64);
            info!("Made sale: {}", sale);
            sales.submit(sale).await?;
        }
        info!("Producer done: {}", sales.stats());
        Ok::<_, conflate_relay::RelayError>(())
    });

    let mut total_dollars = 0.0;
    while let Some(sale) = updates.recv().await {
        total_dollars += sale.dollars;
        let lag_ms = (start.elapsed().as_millis() as u64).saturating_sub(sale.timestamp_ms);
        sleep(REDRAW_TIME).await;
        info!(
            "Sale received after {}ms: {}. Total sales: ${:.2}",
            lag_ms, sale, total_dollars
        );
    }

    producer.await??;

    let expected: f64 = (1..=total_sales).map(|n| n as f64).sum();
    println!("\nFinal total ${:.2} (expected ${:.2})", total_dollars, expected);
    println!("{}", serde_json::to_string_pretty(&updates.stats())?);

    Ok(())
}
