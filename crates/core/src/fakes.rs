//! In-memory collaborator implementations.
//!
//! These back the crate's own tests and let embedders drive the full
//! stack without a real device or a reachable host. Each fake exposes
//! a controller surface for scripting failures and inspecting calls.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use castway_protocol::{BuddyStatus, GameStreamHost, PairingStartStatus, PcStateChange};
use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::catalog::{AppId, AppRecord, CatalogStore, MemoryCatalog};
use crate::config::BuddyTarget;
use crate::connectivity::CommandChannel;
use crate::host::{
	DisplayMode, LifetimeEvent, PowerEvent, RunnerBridge, ShortcutHost, SystemEvents, SystemInfo,
};

/// Shortcut store backed by a [`MemoryCatalog`]. Ids are allocated from
/// 500 upwards so they never collide with the source app ids tests use.
pub struct FakeShortcutHost {
	catalog: Arc<MemoryCatalog>,
	next_id: AtomicU32,
	fail_create: AtomicBool,
	fail_writes: AtomicBool,
	/// Report removals as successful but leave the record in place,
	/// simulating the corrupted-store failure mode.
	ghost_removals: AtomicBool,
	calls: Mutex<Vec<String>>,
}

impl FakeShortcutHost {
	pub fn new(catalog: Arc<MemoryCatalog>) -> Self {
		Self {
			catalog,
			next_id: AtomicU32::new(500),
			fail_create: AtomicBool::new(false),
			fail_writes: AtomicBool::new(false),
			ghost_removals: AtomicBool::new(false),
			calls: Mutex::new(Vec::new()),
		}
	}

	pub fn set_fail_create(&self, fail: bool) {
		self.fail_create.store(fail, Ordering::SeqCst);
	}

	pub fn set_fail_writes(&self, fail: bool) {
		self.fail_writes.store(fail, Ordering::SeqCst);
	}

	pub fn set_ghost_removals(&self, ghost: bool) {
		self.ghost_removals.store(ghost, Ordering::SeqCst);
	}

	pub fn calls(&self) -> Vec<String> {
		self.calls.lock().clone()
	}

	fn log(&self, call: String) {
		self.calls.lock().push(call);
	}

	fn edit(&self, id: AppId, apply: impl FnOnce(&mut AppRecord)) -> bool {
		if self.fail_writes.load(Ordering::SeqCst) {
			return false;
		}
		match self.catalog.get(id) {
			Some(mut record) => {
				apply(&mut record);
				self.catalog.set(record);
				true
			}
			None => false,
		}
	}
}

impl ShortcutHost for FakeShortcutHost {
	async fn create_shortcut(&self, name: &str, exec_path: &str) -> Option<AppId> {
		self.log(format!("create({name})"));
		if self.fail_create.load(Ordering::SeqCst) {
			return None;
		}
		let id = AppId(self.next_id.fetch_add(1, Ordering::SeqCst));
		let mut record = AppRecord::new(id, name);
		record.launch.exe = exec_path.to_string();
		self.catalog.set(record);
		Some(id)
	}

	async fn remove_shortcut(&self, id: AppId) -> bool {
		self.log(format!("remove({id})"));
		if self.ghost_removals.load(Ordering::SeqCst) {
			return true;
		}
		self.catalog.remove(id)
	}

	async fn set_name(&self, id: AppId, name: &str) -> bool {
		self.log(format!("set_name({id}, {name})"));
		self.edit(id, |record| record.display_name = name.to_string())
	}

	async fn set_launch_options(&self, id: AppId, options: &str) -> bool {
		self.log(format!("set_launch_options({id})"));
		self.edit(id, |record| record.launch.launch_options = options.to_string())
	}

	async fn set_hidden_state(&self, id: AppId, hidden: bool) -> bool {
		self.log(format!("set_hidden_state({id}, {hidden})"));
		self.edit(id, |record| record.launch.hidden = hidden)
	}

	async fn set_resolution_override(&self, id: AppId, value: &str) -> bool {
		self.log(format!("set_resolution_override({id}, {value})"));
		self.edit(id, |record| record.launch.resolution_override = value.to_string())
	}
}

/// Device facts plus the notification streams, with injection handles.
pub struct FakeSystem {
	network: AtomicBool,
	display_mode: Mutex<Option<DisplayMode>>,
	displays: Mutex<Vec<String>>,
	lifetime_tx: broadcast::Sender<LifetimeEvent>,
	power_tx: broadcast::Sender<PowerEvent>,
}

impl Default for FakeSystem {
	fn default() -> Self {
		Self {
			network: AtomicBool::new(true),
			display_mode: Mutex::new(None),
			displays: Mutex::new(Vec::new()),
			lifetime_tx: broadcast::channel(64).0,
			power_tx: broadcast::channel(64).0,
		}
	}
}

impl FakeSystem {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn set_network(&self, up: bool) {
		self.network.store(up, Ordering::SeqCst);
	}

	pub fn set_display_mode(&self, mode: Option<DisplayMode>) {
		*self.display_mode.lock() = mode;
	}

	pub fn set_connected_displays(&self, displays: Vec<String>) {
		*self.displays.lock() = displays;
	}

	pub fn emit_lifetime(&self, app_id: AppId, running: bool) {
		let _ = self.lifetime_tx.send(LifetimeEvent { app_id, running });
	}

	pub fn emit_power(&self, event: PowerEvent) {
		let _ = self.power_tx.send(event);
	}
}

impl SystemInfo for FakeSystem {
	async fn has_network_connection(&self) -> bool {
		self.network.load(Ordering::SeqCst)
	}

	async fn current_display_mode(&self) -> Option<DisplayMode> {
		*self.display_mode.lock()
	}

	async fn connected_display_ids(&self) -> Vec<String> {
		self.displays.lock().clone()
	}
}

impl SystemEvents for FakeSystem {
	fn lifetime_events(&self) -> broadcast::Receiver<LifetimeEvent> {
		self.lifetime_tx.subscribe()
	}

	fn power_events(&self) -> broadcast::Receiver<PowerEvent> {
		self.power_tx.subscribe()
	}
}

/// Process control wired to a [`FakeSystem`] so starts and stops show
/// up on the lifetime stream like the real host's do.
pub struct FakeRunner {
	system: Arc<FakeSystem>,
	running: Mutex<HashSet<AppId>>,
	accept_run: AtomicBool,
	/// When set, `run_app` immediately reports the process up.
	auto_start: AtomicBool,
	/// When set, graceful termination is acknowledged but ignored.
	ignore_terminate: AtomicBool,
	run_result: Mutex<Option<String>>,
}

impl FakeRunner {
	pub fn new(system: Arc<FakeSystem>) -> Self {
		Self {
			system,
			running: Mutex::new(HashSet::new()),
			accept_run: AtomicBool::new(true),
			auto_start: AtomicBool::new(true),
			ignore_terminate: AtomicBool::new(false),
			run_result: Mutex::new(None),
		}
	}

	pub fn set_accept_run(&self, accept: bool) {
		self.accept_run.store(accept, Ordering::SeqCst);
	}

	pub fn set_auto_start(&self, auto: bool) {
		self.auto_start.store(auto, Ordering::SeqCst);
	}

	pub fn set_ignore_terminate(&self, ignore: bool) {
		self.ignore_terminate.store(ignore, Ordering::SeqCst);
	}

	pub fn set_run_result(&self, result: Option<String>) {
		*self.run_result.lock() = result;
	}

	pub fn mark_running(&self, id: AppId) {
		self.running.lock().insert(id);
		self.system.emit_lifetime(id, true);
	}

	pub fn mark_stopped(&self, id: AppId) {
		if self.running.lock().remove(&id) {
			self.system.emit_lifetime(id, false);
		}
	}
}

impl RunnerBridge for FakeRunner {
	async fn run_app(&self, id: AppId) -> bool {
		if !self.accept_run.load(Ordering::SeqCst) {
			return false;
		}
		if self.auto_start.load(Ordering::SeqCst) {
			self.mark_running(id);
		}
		true
	}

	async fn is_running(&self, id: AppId) -> bool {
		self.running.lock().contains(&id)
	}

	async fn terminate(&self, id: AppId) -> bool {
		if self.ignore_terminate.load(Ordering::SeqCst) {
			return true;
		}
		self.mark_stopped(id);
		true
	}

	async fn kill(&self, id: AppId) -> bool {
		self.mark_stopped(id);
		true
	}

	async fn take_run_result(&self) -> Option<String> {
		self.run_result.lock().take()
	}

	async fn clear_run_result(&self) {
		*self.run_result.lock() = None;
	}
}

/// Scriptable command channel.
#[derive(Default)]
pub struct FakeChannel {
	buddy: Mutex<BuddyStatus>,
	hosts: Mutex<Vec<GameStreamHost>>,
	app_names: Mutex<Option<Vec<String>>>,
	pairing_reply: Mutex<PairingStartStatus>,
	reject_pc_state: AtomicBool,
	/// Artificial latency for reachability probes, for testing probe
	/// coalescing and stale-result discard.
	probe_delay: Mutex<Duration>,
	probes: AtomicU32,
	wol_packets: AtomicU32,
	pc_state_calls: Mutex<Vec<PcStateChange>>,
}

impl FakeChannel {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn set_buddy_status(&self, status: BuddyStatus) {
		*self.buddy.lock() = status;
	}

	pub fn set_hosts(&self, hosts: Vec<GameStreamHost>) {
		*self.hosts.lock() = hosts;
	}

	pub fn set_app_names(&self, names: Option<Vec<String>>) {
		*self.app_names.lock() = names;
	}

	pub fn set_pairing_reply(&self, reply: PairingStartStatus) {
		*self.pairing_reply.lock() = reply;
	}

	pub fn set_reject_pc_state(&self, reject: bool) {
		self.reject_pc_state.store(reject, Ordering::SeqCst);
	}

	pub fn set_probe_delay(&self, delay: Duration) {
		*self.probe_delay.lock() = delay;
	}

	pub fn probes(&self) -> u32 {
		self.probes.load(Ordering::SeqCst)
	}

	pub fn wol_packets(&self) -> u32 {
		self.wol_packets.load(Ordering::SeqCst)
	}

	pub fn pc_state_calls(&self) -> Vec<PcStateChange> {
		self.pc_state_calls.lock().clone()
	}

	async fn probe_latency(&self) {
		let delay = *self.probe_delay.lock();
		if !delay.is_zero() {
			tokio::time::sleep(delay).await;
		}
	}
}

impl CommandChannel for FakeChannel {
	async fn buddy_status(&self, _target: BuddyTarget, _timeout: Duration) -> BuddyStatus {
		self.probes.fetch_add(1, Ordering::SeqCst);
		self.probe_latency().await;
		*self.buddy.lock()
	}

	async fn gamestream_app_names(
		&self,
		_target: BuddyTarget,
		_timeout: Duration,
	) -> Option<Vec<String>> {
		self.app_names.lock().clone()
	}

	async fn scan_hosts(&self, _timeout: Duration) -> Vec<GameStreamHost> {
		self.hosts.lock().clone()
	}

	async fn find_host(&self, host_id: String, _timeout: Duration) -> Option<GameStreamHost> {
		self.probes.fetch_add(1, Ordering::SeqCst);
		self.probe_latency().await;
		self.hosts.lock().iter().find(|host| host.unique_id == host_id).cloned()
	}

	async fn start_pairing(
		&self,
		_target: BuddyTarget,
		_pin: u32,
		_timeout: Duration,
	) -> PairingStartStatus {
		*self.pairing_reply.lock()
	}

	async fn abort_pairing(&self, _target: BuddyTarget, _timeout: Duration) {}

	async fn change_pc_state(
		&self,
		_target: BuddyTarget,
		state: PcStateChange,
		_timeout: Duration,
	) -> bool {
		self.pc_state_calls.lock().push(state);
		!self.reject_pc_state.load(Ordering::SeqCst)
	}

	async fn close_steam(&self, _target: BuddyTarget, _timeout: Duration) -> bool {
		true
	}

	async fn wake_on_lan(&self, _mac: String, _address: String, _port: u16) -> bool {
		self.wol_packets.fetch_add(1, Ordering::SeqCst);
		true
	}
}
