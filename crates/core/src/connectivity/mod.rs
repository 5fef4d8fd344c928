//! Connectivity/status layer: cached online state of the remote host
//! and its companion service, kept fresh by refcounted polling.

mod buddy;
mod channel;
mod commands;
mod server;

pub use buddy::BuddyClient;
pub use channel::CommandChannel;
pub use commands::CommandRunner;
pub use server::HostClient;

use std::sync::Arc;
use std::time::Duration;

use crate::config::SettingsManager;
use crate::sync::RefcountedLoop;

const POLL_PERIOD: Duration = Duration::from_secs(5);

/// Bundles both status clients with their polling loops. Consumers
/// needing fresh status call `start()`/`stop()` around their lifetime;
/// the loops run while anyone is subscribed.
pub struct ConnectivityManager<C: CommandChannel> {
	buddy: Arc<BuddyClient<C>>,
	host: Arc<HostClient<C>>,
	commands: Arc<CommandRunner<C>>,
	buddy_loop: RefcountedLoop,
	host_loop: RefcountedLoop,
}

impl<C: CommandChannel> ConnectivityManager<C> {
	pub fn new(channel: Arc<C>, settings: Arc<SettingsManager>) -> Self {
		let buddy = Arc::new(BuddyClient::new(Arc::clone(&channel), Arc::clone(&settings)));
		let host = Arc::new(HostClient::new(Arc::clone(&channel), Arc::clone(&settings)));
		let commands = Arc::new(CommandRunner::new(channel, settings));

		let buddy_loop = {
			let buddy = Arc::clone(&buddy);
			RefcountedLoop::from_fn(POLL_PERIOD, move || {
				let buddy = Arc::clone(&buddy);
				async move {
					buddy.refresh_status().await;
					Ok(())
				}
			})
		};
		let host_loop = {
			let host = Arc::clone(&host);
			RefcountedLoop::from_fn(POLL_PERIOD, move || {
				let host = Arc::clone(&host);
				async move {
					host.refresh_status().await;
					Ok(())
				}
			})
		};

		Self { buddy, host, commands, buddy_loop, host_loop }
	}

	pub fn buddy(&self) -> &Arc<BuddyClient<C>> {
		&self.buddy
	}

	pub fn host(&self) -> &Arc<HostClient<C>> {
		&self.host
	}

	pub fn commands(&self) -> &Arc<CommandRunner<C>> {
		&self.commands
	}

	/// Registers a polling consumer on both targets.
	pub async fn start(&self) {
		self.buddy_loop.start().await;
		self.host_loop.start().await;
	}

	/// Releases a polling consumer.
	pub async fn stop(&self) {
		self.buddy_loop.stop().await;
		self.host_loop.stop().await;
	}

	/// Terminal shutdown of both loops.
	pub async fn deinit(&self) {
		self.buddy_loop.deinit().await;
		self.host_loop.deinit().await;
	}

	/// One immediate refresh of both targets, coalescing with any
	/// probes already in flight.
	pub async fn refresh_now(&self) {
		tokio::join!(self.buddy.refresh_status(), self.host.refresh_status());
	}
}
