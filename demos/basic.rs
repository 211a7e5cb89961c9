use std::time::Duration;

use fenestra::SlidingWindow;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // at most 5 requests in any trailing second
    let window = SlidingWindow::try_new(5, Duration::from_secs(1))?;

    for _ in 0..7 {
        println!("Request allowed immediately: {}", window.try_acquire());
    }

    if window.acquire(Duration::from_secs(5)).await {
        println!("Request allowed after waiting.");
    } else {
        println!("Request timed out.");
    }
    Ok(())
}
