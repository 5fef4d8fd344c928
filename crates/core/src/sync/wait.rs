//! Bounded predicate polling.

use std::time::Duration;

/// Polls `predicate` up to `retries + 1` times, `delay` apart, until it
/// holds. Returns whether it ever did.
pub async fn wait_for(retries: u32, delay: Duration, mut predicate: impl FnMut() -> bool) -> bool {
	for attempt in 0..=retries {
		if predicate() {
			return true;
		}
		if attempt < retries {
			tokio::time::sleep(delay).await;
		}
	}
	false
}
