use std::time;

use anyhow::Result;
use drip_limiter::{Grant, RateLimiter};

#[tokio::main]
async fn main() -> Result<()> {
    helpers::init_logging();

    let waiting = RateLimiter::builder()
        .tokens_per_interval(5)
        .named_interval("second")?
        .build();

    let rejecting = RateLimiter::builder()
        .tokens_per_interval(5)
        .named_interval("second")?
        .fire_immediately(true)
        .build();

    let start = time::Instant::now();

    for n in 0..12 {
        let rejected = matches!(rejecting.remove_tokens(1).await?, Grant::Rejected);
        let grant = waiting.remove_tokens(1).await?;

        println!(
            "{:>2}: {:?} waiting={:?} rejected={}",
            n,
            time::Instant::now().duration_since(start),
            grant,
            rejected
        );
    }

    Ok(())
}
