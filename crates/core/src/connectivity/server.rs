//! Cached reachability of the game-stream server itself.

use std::sync::Arc;
use std::time::Duration;

use castway_protocol::{GameStreamHost, HostStatus};
use tokio::sync::watch;
use tracing::debug;

use crate::config::SettingsManager;
use crate::sync::RefreshGate;

use super::channel::CommandChannel;

const FIND_TIMEOUT: Duration = Duration::from_secs(1);
const SCAN_TIMEOUT: Duration = Duration::from_secs(5);

pub struct HostClient<C: CommandChannel> {
	channel: Arc<C>,
	settings: Arc<SettingsManager>,
	status: watch::Sender<HostStatus>,
	refreshing: watch::Sender<bool>,
	gate: RefreshGate,
}

impl<C: CommandChannel> HostClient<C> {
	pub fn new(channel: Arc<C>, settings: Arc<SettingsManager>) -> Self {
		Self {
			channel,
			settings,
			status: watch::Sender::new(HostStatus::Offline),
			refreshing: watch::Sender::new(false),
			gate: RefreshGate::new(),
		}
	}

	pub fn status(&self) -> HostStatus {
		*self.status.borrow()
	}

	pub fn status_changes(&self) -> watch::Receiver<HostStatus> {
		self.status.subscribe()
	}

	pub fn is_refreshing(&self) -> bool {
		*self.refreshing.borrow()
	}

	pub fn refreshing_changes(&self) -> watch::Receiver<bool> {
		self.refreshing.subscribe()
	}

	/// Looks the selected host up on the network and commits the
	/// result, unless the selection changed mid-probe. Overlapping
	/// callers coalesce. A found host also refreshes the stored address
	/// and name, since both can drift between sessions.
	pub async fn refresh_status(&self) {
		self.gate
			.run(|| async {
				let _ = self.refreshing.send_replace(true);
				let probed = match self.settings.current_host_id() {
					Some(host_id) => {
						let found = self.channel.find_host(host_id.clone(), FIND_TIMEOUT).await;
						if self.settings.current_host_id().as_deref() == Some(host_id.as_str()) {
							if let Some(host) = &found {
								self.absorb_host_details(&host_id, host);
							}
							Some(match found {
								Some(_) => HostStatus::Online,
								None => HostStatus::Offline,
							})
						} else {
							debug!(target: "castway.connectivity", %host_id, "selected host changed mid-probe, discarding result");
							None
						}
					}
					None => Some(HostStatus::Offline),
				};
				if let Some(status) = probed {
					let _ = self.status.send_replace(status);
				}
				let _ = self.refreshing.send_replace(false);
			})
			.await;
	}

	pub async fn scan_for_hosts(&self) -> Vec<GameStreamHost> {
		self.channel.scan_hosts(SCAN_TIMEOUT).await
	}

	pub async fn find_host(&self, host_id: &str) -> Option<GameStreamHost> {
		self.channel.find_host(host_id.to_string(), FIND_TIMEOUT).await
	}

	fn absorb_host_details(&self, host_id: &str, host: &GameStreamHost) {
		self.settings.update(|settings| {
			if let Some(config) = settings.host_settings.get_mut(host_id) {
				if config.address != host.address || config.host_name != host.host_name {
					debug!(target: "castway.connectivity", %host_id, address = %host.address, "host details drifted, updating settings");
					config.address = host.address.clone();
					config.host_name = host.host_name.clone();
				}
			}
		});
	}
}
