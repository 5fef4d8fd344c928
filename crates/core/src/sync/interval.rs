//! Reference-counted interval polling loop.
//!
//! Multiple independent observers (for example two surfaces showing the
//! same cached status) may request and release polling without creating
//! duplicate timers or starving each other: the timer exists exactly
//! while at least one consumer holds a `start()`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Callback invoked once per loop iteration. Errors are logged and
/// swallowed so a single failed iteration never stops the loop.
pub type LoopCallback =
	Arc<dyn Fn() -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>> + Send + Sync>;

pub struct RefcountedLoop {
	period: Duration,
	callback: LoopCallback,
	state: Mutex<LoopState>,
}

#[derive(Default)]
struct LoopState {
	consumers: u32,
	running: Option<RunningLoop>,
	retired: bool,
}

struct RunningLoop {
	stop_tx: watch::Sender<bool>,
	handle: JoinHandle<()>,
}

impl RefcountedLoop {
	pub fn new(period: Duration, callback: LoopCallback) -> Self {
		Self {
			period,
			callback,
			state: Mutex::new(LoopState::default()),
		}
	}

	/// Convenience constructor for closure callbacks.
	pub fn from_fn<F, Fut>(period: Duration, callback: F) -> Self
	where
		F: Fn() -> Fut + Send + Sync + 'static,
		Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
	{
		let callback = Arc::new(callback);
		Self::new(
			period,
			Arc::new(move || {
				let callback = Arc::clone(&callback);
				Box::pin(async move { callback().await })
			}),
		)
	}

	/// Registers a consumer; the first one brings the loop up.
	pub async fn start(&self) {
		let mut state = self.state.lock().await;
		if state.retired {
			debug!(target: "castway.sync", "start ignored, loop is retired");
			return;
		}

		state.consumers += 1;
		if state.running.is_none() {
			state.running = Some(self.spawn_loop());
		}
	}

	/// Releases a consumer; the last one tears the loop down, awaiting
	/// the in-flight iteration so no side effects happen afterwards.
	pub async fn stop(&self) {
		let mut state = self.state.lock().await;
		if state.consumers == 0 || state.retired {
			return;
		}

		state.consumers -= 1;
		if state.consumers == 0 {
			if let Some(running) = state.running.take() {
				shutdown(running).await;
			}
		}
	}

	/// Terminal shutdown regardless of outstanding consumers. Later
	/// `start()` calls are rejected.
	pub async fn deinit(&self) {
		let mut state = self.state.lock().await;
		state.retired = true;
		state.consumers = 0;
		if let Some(running) = state.running.take() {
			shutdown(running).await;
		}
	}

	fn spawn_loop(&self) -> RunningLoop {
		let (stop_tx, mut stop_rx) = watch::channel(false);
		let callback = Arc::clone(&self.callback);
		let period = self.period;

		let handle = tokio::spawn(async move {
			loop {
				if let Err(error) = callback().await {
					error!(target: "castway.sync", %error, "poll iteration failed");
				}

				if *stop_rx.borrow() {
					break;
				}

				tokio::select! {
					_ = tokio::time::sleep(period) => {}
					_ = stop_rx.changed() => {
						if *stop_rx.borrow() {
							break;
						}
					}
				}
			}
		});

		RunningLoop { stop_tx, handle }
	}
}

async fn shutdown(running: RunningLoop) {
	let _ = running.stop_tx.send(true);
	let _ = running.handle.await;
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicU32, Ordering};

	use super::*;

	fn counting_loop(period: Duration) -> (Arc<RefcountedLoop>, Arc<AtomicU32>) {
		let counter = Arc::new(AtomicU32::new(0));
		let counted = Arc::clone(&counter);
		let poller = Arc::new(RefcountedLoop::from_fn(period, move || {
			let counted = Arc::clone(&counted);
			async move {
				counted.fetch_add(1, Ordering::SeqCst);
				Ok(())
			}
		}));
		(poller, counter)
	}

	#[tokio::test]
	async fn loop_survives_one_of_two_consumers_stopping() {
		let (poller, counter) = counting_loop(Duration::from_millis(5));

		poller.start().await;
		poller.start().await;
		poller.stop().await;

		let before = counter.load(Ordering::SeqCst);
		tokio::time::sleep(Duration::from_millis(40)).await;
		assert!(counter.load(Ordering::SeqCst) > before, "loop should keep polling");

		poller.stop().await;
		let stopped_at = counter.load(Ordering::SeqCst);
		tokio::time::sleep(Duration::from_millis(40)).await;
		assert_eq!(counter.load(Ordering::SeqCst), stopped_at);
	}

	#[tokio::test]
	async fn stop_waits_for_inflight_iteration() {
		let entered = Arc::new(AtomicU32::new(0));
		let finished = Arc::new(AtomicU32::new(0));
		let entered_cb = Arc::clone(&entered);
		let finished_cb = Arc::clone(&finished);

		let poller = RefcountedLoop::from_fn(Duration::from_millis(5), move || {
			let entered = Arc::clone(&entered_cb);
			let finished = Arc::clone(&finished_cb);
			async move {
				entered.fetch_add(1, Ordering::SeqCst);
				tokio::time::sleep(Duration::from_millis(30)).await;
				finished.fetch_add(1, Ordering::SeqCst);
				Ok(())
			}
		});

		poller.start().await;
		tokio::time::sleep(Duration::from_millis(10)).await;
		poller.stop().await;

		assert_eq!(entered.load(Ordering::SeqCst), finished.load(Ordering::SeqCst));
	}

	#[tokio::test]
	async fn deinit_is_terminal() {
		let (poller, counter) = counting_loop(Duration::from_millis(5));

		poller.start().await;
		poller.start().await;
		poller.deinit().await;

		let at_deinit = counter.load(Ordering::SeqCst);
		tokio::time::sleep(Duration::from_millis(30)).await;
		assert_eq!(counter.load(Ordering::SeqCst), at_deinit);

		poller.start().await;
		tokio::time::sleep(Duration::from_millis(30)).await;
		assert_eq!(counter.load(Ordering::SeqCst), at_deinit, "retired loop must reject start");
	}

	#[tokio::test]
	async fn iteration_errors_do_not_stop_the_loop() {
		let counter = Arc::new(AtomicU32::new(0));
		let counted = Arc::clone(&counter);
		let poller = RefcountedLoop::from_fn(Duration::from_millis(5), move || {
			let counted = Arc::clone(&counted);
			async move {
				counted.fetch_add(1, Ordering::SeqCst);
				anyhow::bail!("probe failed")
			}
		});

		poller.start().await;
		tokio::time::sleep(Duration::from_millis(40)).await;
		assert!(counter.load(Ordering::SeqCst) >= 2);
		poller.deinit().await;
	}
}
