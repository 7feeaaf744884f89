use drip_limiter::{Interval, TokenBucket};
use tokio::time::Duration;

#[tokio::main]
async fn main() {
    helpers::init_logging();

    let bucket = TokenBucket::builder()
        .capacity(2)
        .refill(1)
        .interval(Interval::from_millis(100))
        .initial(1)
        .build();

    assert!(bucket.try_remove_tokens(1));
    assert!(!bucket.try_remove_tokens(1));

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(bucket.try_remove_tokens(1));
    assert!(bucket.try_remove_tokens(1));
    assert!(!bucket.try_remove_tokens(1));
}
