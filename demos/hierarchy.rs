use std::sync::Arc;
use std::time;

use anyhow::Result;
use drip_limiter::{Interval, TokenBucket};

#[tokio::main]
async fn main() -> Result<()> {
    helpers::init_logging();

    // Every user shares a global quota of 20 tokens per second.
    let global = Arc::new(TokenBucket::new(20, 20, Interval::SECOND));

    let mut tasks = Vec::new();
    let start = time::Instant::now();

    for user in 0..4 {
        let bucket = TokenBucket::builder()
            .capacity(10)
            .refill(10)
            .interval(Interval::SECOND)
            .initial(10)
            .parent(global.clone())
            .build();

        tasks.push(tokio::spawn(async move {
            for request in 0..10 {
                let remaining = bucket.remove_tokens(1).await?;
                println!(
                    "user {} request {} at {:?}, remaining {:?}",
                    user,
                    request,
                    time::Instant::now().duration_since(start),
                    remaining
                );
            }

            Ok::<_, drip_limiter::Error>(())
        }));
    }

    for task in tasks {
        task.await??;
    }

    Ok(())
}
