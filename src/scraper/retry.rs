//! Fixed-delay retry for individual network calls

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

/// Run `op` up to `attempts` times, sleeping `delay` between failures
///
/// At least one attempt is always made. The last error is returned once the
/// attempts are exhausted.
pub async fn retry<T, E, F, Fut>(attempts: u32, delay: Duration, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= attempts => return Err(e),
            Err(e) => {
                warn!("Attempt {}/{} failed: {}", attempt, attempts, e);
                attempt += 1;
                sleep(delay).await;
            }
        }
    }
}
