//! Coalescing gate for refresh-style operations.

use std::future::Future;

use tokio::sync::Mutex;

/// Collapses overlapping refreshes into a single in-flight probe.
///
/// The first caller runs the refresh; callers arriving while it is in
/// flight simply await its completion instead of issuing a duplicate.
#[derive(Debug, Default)]
pub struct RefreshGate {
	lock: Mutex<()>,
}

impl RefreshGate {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns true when this caller performed the refresh itself.
	pub async fn run<F, Fut>(&self, refresh: F) -> bool
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = ()>,
	{
		match self.lock.try_lock() {
			Ok(_guard) => {
				refresh().await;
				true
			}
			Err(_) => {
				// Wait for the in-flight refresh to finish.
				let _guard = self.lock.lock().await;
				false
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;
	use std::sync::atomic::{AtomicU32, Ordering};
	use std::time::Duration;

	use super::*;

	#[tokio::test]
	async fn overlapping_callers_coalesce() {
		let gate = Arc::new(RefreshGate::new());
		let probes = Arc::new(AtomicU32::new(0));

		let slow = {
			let gate = Arc::clone(&gate);
			let probes = Arc::clone(&probes);
			tokio::spawn(async move {
				gate.run(|| async {
					probes.fetch_add(1, Ordering::SeqCst);
					tokio::time::sleep(Duration::from_millis(30)).await;
				})
				.await
			})
		};

		tokio::time::sleep(Duration::from_millis(5)).await;
		let coalesced = gate
			.run(|| async {
				probes.fetch_add(1, Ordering::SeqCst);
			})
			.await;

		assert!(slow.await.unwrap());
		assert!(!coalesced, "second caller must not probe");
		assert_eq!(probes.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn sequential_callers_each_refresh() {
		let gate = RefreshGate::new();
		let probes = AtomicU32::new(0);

		for _ in 0..2 {
			let ran = gate
				.run(|| async {
					probes.fetch_add(1, Ordering::SeqCst);
				})
				.await;
			assert!(ran);
		}
		assert_eq!(probes.load(Ordering::SeqCst), 2);
	}
}
