//! One-shot host commands: wake-on-LAN, power-state changes, closing
//! the remote client.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use castway_protocol::PcStateChange;
use tokio::sync::watch;
use tracing::debug;

use crate::config::SettingsManager;

use super::channel::CommandChannel;

const COMMAND_TIMEOUT: Duration = Duration::from_secs(5);
/// Grace period after a power-state change before the caller should
/// trust a status refresh again.
const SETTLE_DELAY: Duration = Duration::from_secs(2);

pub struct CommandRunner<C: CommandChannel> {
	channel: Arc<C>,
	settings: Arc<SettingsManager>,
	executing: watch::Sender<bool>,
}

impl<C: CommandChannel> CommandRunner<C> {
	pub fn new(channel: Arc<C>, settings: Arc<SettingsManager>) -> Self {
		Self {
			channel,
			settings,
			executing: watch::Sender::new(false),
		}
	}

	pub fn is_executing(&self) -> bool {
		*self.executing.borrow()
	}

	pub fn executing_changes(&self) -> watch::Receiver<bool> {
		self.executing.subscribe()
	}

	/// Sends a wake-on-LAN packet to the selected host.
	pub async fn wake_on_lan(&self) -> bool {
		self.run_exclusive(|| async {
			let Some(config) = self.settings.host_config() else {
				return false;
			};
			self.channel
				.wake_on_lan(config.mac, config.address, config.wol.port)
				.await
		})
		.await
		.unwrap_or(false)
	}

	/// Asks the buddy to restart/shut down/suspend the host PC.
	pub async fn change_pc_state(&self, state: PcStateChange) -> bool {
		self.run_exclusive(|| async {
			let Some((_, target)) = self.settings.buddy_target() else {
				return false;
			};
			let accepted = self.channel.change_pc_state(target, state, COMMAND_TIMEOUT).await;
			if accepted {
				tokio::time::sleep(SETTLE_DELAY).await;
			}
			accepted
		})
		.await
		.unwrap_or(false)
	}

	/// Asks the buddy to close the streaming client on the host.
	pub async fn close_steam(&self) -> bool {
		self.run_exclusive(|| async {
			let Some((_, target)) = self.settings.buddy_target() else {
				return false;
			};
			self.channel.close_steam(target, COMMAND_TIMEOUT).await
		})
		.await
		.unwrap_or(false)
	}

	/// At most one command runs at a time; an overlapping call is
	/// dropped, mirroring the launch lock's silent rejection.
	async fn run_exclusive<F, Fut, T>(&self, op: F) -> Option<T>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = T>,
	{
		if *self.executing.borrow() {
			debug!(target: "castway.connectivity", "a host command is already executing, dropping call");
			return None;
		}
		let _ = self.executing.send_replace(true);
		let result = op().await;
		let _ = self.executing.send_replace(false);
		Some(result)
	}
}
