//! Cached reachability of the companion service ("buddy").

use std::sync::Arc;
use std::time::Duration;

use castway_protocol::{BuddyStatus, PairingStartStatus};
use tokio::sync::watch;
use tracing::debug;

use crate::config::SettingsManager;
use crate::sync::RefreshGate;

use super::channel::CommandChannel;

/// Quick reachability probe; the buddy answers fast or not at all.
const PROBE_TIMEOUT: Duration = Duration::from_secs(1);
/// Slower RPCs that do real work on the host.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

pub struct BuddyClient<C: CommandChannel> {
	channel: Arc<C>,
	settings: Arc<SettingsManager>,
	status: watch::Sender<BuddyStatus>,
	refreshing: watch::Sender<bool>,
	gate: RefreshGate,
}

impl<C: CommandChannel> BuddyClient<C> {
	pub fn new(channel: Arc<C>, settings: Arc<SettingsManager>) -> Self {
		Self {
			channel,
			settings,
			status: watch::Sender::new(BuddyStatus::Offline),
			refreshing: watch::Sender::new(false),
			gate: RefreshGate::new(),
		}
	}

	pub fn status(&self) -> BuddyStatus {
		*self.status.borrow()
	}

	pub fn status_changes(&self) -> watch::Receiver<BuddyStatus> {
		self.status.subscribe()
	}

	pub fn is_refreshing(&self) -> bool {
		*self.refreshing.borrow()
	}

	pub fn refreshing_changes(&self) -> watch::Receiver<bool> {
		self.refreshing.subscribe()
	}

	/// Probes the buddy and commits the result, unless the selected
	/// host changed while the probe was in flight. Overlapping callers
	/// coalesce into the one in-flight probe.
	pub async fn refresh_status(&self) {
		self.gate
			.run(|| async {
				let _ = self.refreshing.send_replace(true);
				let probed = match self.settings.buddy_target() {
					Some((host_id, target)) => {
						let status = self.channel.buddy_status(target, PROBE_TIMEOUT).await;
						if self.settings.current_host_id().as_deref() == Some(host_id.as_str()) {
							Some(status)
						} else {
							debug!(target: "castway.connectivity", %host_id, "selected host changed mid-probe, discarding result");
							None
						}
					}
					None => Some(BuddyStatus::Offline),
				};
				if let Some(status) = probed {
					let _ = self.status.send_replace(status);
				}
				let _ = self.refreshing.send_replace(false);
			})
			.await;
	}

	/// App names the game-stream server advertises, via the buddy.
	pub async fn gamestream_app_names(&self) -> Option<Vec<String>> {
		let (_, target) = self.settings.buddy_target()?;
		self.channel.gamestream_app_names(target, REQUEST_TIMEOUT).await
	}

	pub async fn start_pairing(&self, pin: u32) -> PairingStartStatus {
		let Some((_, target)) = self.settings.buddy_target() else {
			return PairingStartStatus::Offline;
		};
		self.channel.start_pairing(target, pin, REQUEST_TIMEOUT).await
	}

	pub async fn abort_pairing(&self) {
		let Some((_, target)) = self.settings.buddy_target() else {
			return;
		};
		self.channel.abort_pairing(target, REQUEST_TIMEOUT).await;
	}
}
