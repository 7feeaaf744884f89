use drip_limiter::{Interval, TokenBucket};
use std::time;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    helpers::init_logging();

    let bucket = TokenBucket::builder()
        .capacity(10)
        .refill(5)
        .interval(Interval::SECOND)
        .build();

    let start = time::Instant::now();

    println!("Waiting for permit...");

    // Should take about 4 seconds to acquire in total.
    let a = bucket.remove_tokens(7);
    let b = bucket.remove_tokens(3);
    let c = bucket.remove_tokens(10);

    let (a, b, c) = tokio::join!(a, b, c);
    println!("Remaining: {:?} {:?} {:?}", a?, b?, c?);

    println!(
        "I made it in {:?}!",
        time::Instant::now().duration_since(start)
    );

    Ok(())
}
