//! Example showing several consumers sharing one poller.
//!
//! Run with a URL answering `{"data": ...}`:
//!
//! ```text
//! RUST_LOG=shared_poller=debug cargo run --example poll_status -- https://status.example.com/api
//! ```

use shared_poller::prelude::*;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://httpbin.org/json".to_string());

    println!("=== Shared Poller Example ===\n");

    let poller = Poller::builder(url.as_str())
        .with_timeout(Duration::from_secs(5))
        .with_user_agent("shared-poller-demo")
        .build::<serde_json::Value>()?;

    let _events = poller.subscribe_all(|event| match event {
        PollEvent::Fetch { options } => {
            println!("→ fetch (manual: {})", options.is_some());
        }
        PollEvent::Result { data, .. } => println!("✓ result: {}", data),
        PollEvent::Error { error, .. } => println!("✗ error: {}", error),
    });

    // A status bar refreshes every 10s, a background check every 30s.
    poller.start(Duration::from_secs(10));
    poller.start(Duration::from_secs(30));
    println!(
        "Effective interval: {:?}\n",
        poller.effective_interval().unwrap_or_default()
    );

    tokio::time::sleep(Duration::from_secs(12)).await;

    // The status bar closes; polling slows down.
    poller.stop(Duration::from_secs(10));
    println!(
        "\nStatus bar closed, effective interval: {:?}",
        poller.effective_interval().unwrap_or_default()
    );

    // A user clicks "refresh" with a short deadline of their own.
    let cancel = CancellationToken::new();
    let options = FetchOptions::new()
        .with_header("cache-control", "no-cache")
        .with_cancellation(cancel.clone());
    let refresh = poller.once(Some(options));
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        cancel.cancel();
    });

    match refresh.await {
        Ok(data) => println!("Manual refresh: {}", data),
        Err(e) if e.is_aborted() => println!("Manual refresh aborted"),
        Err(e) => println!("Manual refresh failed: {}", e),
    }

    poller.stop(Duration::from_secs(30));
    println!("\nAll consumers gone, scheduled: {}", poller.is_scheduled());

    Ok(())
}
