//! The remote command channel boundary.

use std::future::Future;
use std::time::Duration;

use castway_protocol::{BuddyStatus, GameStreamHost, PairingStartStatus, PcStateChange};

use crate::config::BuddyTarget;

/// Async RPCs to the remote host and its companion service.
///
/// Every call carries an explicit timeout and resolves to a typed
/// offline/error sentinel (or a boolean/`None`) on transport failure;
/// nothing errors across this boundary.
pub trait CommandChannel: Send + Sync + 'static {
	fn buddy_status(
		&self,
		target: BuddyTarget,
		timeout: Duration,
	) -> impl Future<Output = BuddyStatus> + Send;

	/// Names of the apps the game-stream server exposes; `None` when it
	/// could not be reached.
	fn gamestream_app_names(
		&self,
		target: BuddyTarget,
		timeout: Duration,
	) -> impl Future<Output = Option<Vec<String>>> + Send;

	fn scan_hosts(&self, timeout: Duration) -> impl Future<Output = Vec<GameStreamHost>> + Send;

	fn find_host(
		&self,
		host_id: String,
		timeout: Duration,
	) -> impl Future<Output = Option<GameStreamHost>> + Send;

	fn start_pairing(
		&self,
		target: BuddyTarget,
		pin: u32,
		timeout: Duration,
	) -> impl Future<Output = PairingStartStatus> + Send;

	fn abort_pairing(&self, target: BuddyTarget, timeout: Duration)
	-> impl Future<Output = ()> + Send;

	fn change_pc_state(
		&self,
		target: BuddyTarget,
		state: PcStateChange,
		timeout: Duration,
	) -> impl Future<Output = bool> + Send;

	fn close_steam(
		&self,
		target: BuddyTarget,
		timeout: Duration,
	) -> impl Future<Output = bool> + Send;

	fn wake_on_lan(
		&self,
		mac: String,
		address: String,
		port: u16,
	) -> impl Future<Output = bool> + Send;
}
