//! Runtime settings consumed by the orchestrator and connectivity layers.
//!
//! On-disk persistence and schema migration are owned by the embedding
//! host code; this module only models the shapes and hands out
//! consistent snapshots.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// One streamable display dimension, optionally linked to displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimension {
	pub width: u32,
	pub height: u32,
	#[serde(default)]
	pub linked_displays: Vec<String>,
}

impl Dimension {
	pub fn mode_string(&self) -> String {
		format!("{}x{}", self.width, self.height)
	}
}

/// Which resolution-override strategy the shadow shortcut gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AppResolutionOverride {
	CustomResolution,
	DisplayResolution,
	Native,
	#[default]
	Default,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionSettings {
	/// Pass the current display mode to the runner for automatic
	/// stream resolution.
	#[serde(default)]
	pub automatic: bool,
	#[serde(default)]
	pub use_custom_dimensions: bool,
	#[serde(default = "default_dimension_index")]
	pub selected_dimension_index: i32,
	#[serde(default)]
	pub dimensions: Vec<Dimension>,
	#[serde(default)]
	pub app_resolution_override: AppResolutionOverride,
	#[serde(default)]
	pub use_linked_displays: bool,
}

impl Default for ResolutionSettings {
	fn default() -> Self {
		Self {
			automatic: false,
			use_custom_dimensions: false,
			selected_dimension_index: default_dimension_index(),
			dimensions: Vec::new(),
			app_resolution_override: AppResolutionOverride::default(),
			use_linked_displays: false,
		}
	}
}

fn default_dimension_index() -> i32 {
	-1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WolSettings {
	#[serde(default = "default_wol_port")]
	pub port: u16,
}

impl Default for WolSettings {
	fn default() -> Self {
		Self { port: default_wol_port() }
	}
}

fn default_wol_port() -> u16 {
	9
}

/// Per-host configuration, keyed by the host's unique id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostConfig {
	pub address: String,
	#[serde(default = "default_buddy_port")]
	pub buddy_port: u16,
	pub host_name: String,
	pub mac: String,
	#[serde(default)]
	pub resolution: ResolutionSettings,
	#[serde(default)]
	pub wol: WolSettings,
}

fn default_buddy_port() -> u16 {
	59999
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSessionConfig {
	/// Relaunch the streamed app after the device resumes from suspend.
	#[serde(default)]
	pub resume_after_suspend: bool,
	/// Replace the visible shortcut title with the numeric app id right
	/// after launch.
	#[serde(default)]
	pub auto_apply_app_id: bool,
	#[serde(default = "default_launch_timeout_secs")]
	pub launch_timeout_secs: u64,
	#[serde(default = "default_suspend_relaunch_timeout_secs")]
	pub suspend_relaunch_timeout_secs: u64,
	#[serde(default = "default_resume_network_timeout_secs")]
	pub resume_network_timeout_secs: u64,
}

impl Default for GameSessionConfig {
	fn default() -> Self {
		Self {
			resume_after_suspend: false,
			auto_apply_app_id: false,
			launch_timeout_secs: default_launch_timeout_secs(),
			suspend_relaunch_timeout_secs: default_suspend_relaunch_timeout_secs(),
			resume_network_timeout_secs: default_resume_network_timeout_secs(),
		}
	}
}

impl GameSessionConfig {
	pub fn launch_timeout(&self) -> Duration {
		Duration::from_secs(self.launch_timeout_secs)
	}

	pub fn suspend_relaunch_timeout(&self) -> Duration {
		Duration::from_secs(self.suspend_relaunch_timeout_secs)
	}

	pub fn resume_network_timeout(&self) -> Duration {
		Duration::from_secs(self.resume_network_timeout_secs)
	}
}

fn default_launch_timeout_secs() -> u64 {
	5
}

fn default_suspend_relaunch_timeout_secs() -> u64 {
	30
}

fn default_resume_network_timeout_secs() -> u64 {
	5
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
	#[serde(default)]
	pub client_id: Option<String>,
	#[serde(default)]
	pub current_host_id: Option<String>,
	#[serde(default)]
	pub host_settings: HashMap<String, HostConfig>,
	#[serde(default)]
	pub game_session: GameSessionConfig,
	/// Interpreter path embedded into launch markers for the runner.
	#[serde(default)]
	pub interpreter_path: Option<String>,
}

/// Everything a buddy RPC needs to address the companion service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuddyTarget {
	pub address: String,
	pub port: u16,
	pub client_id: String,
}

/// Shared, lock-guarded settings handle.
#[derive(Debug, Default)]
pub struct SettingsManager {
	inner: RwLock<Settings>,
}

impl SettingsManager {
	pub fn new(settings: Settings) -> Self {
		Self { inner: RwLock::new(settings) }
	}

	pub fn snapshot(&self) -> Settings {
		self.inner.read().clone()
	}

	pub fn update(&self, apply: impl FnOnce(&mut Settings)) {
		apply(&mut self.inner.write());
	}

	pub fn current_host_id(&self) -> Option<String> {
		self.inner.read().current_host_id.clone()
	}

	/// Configuration of the currently selected host, if any.
	pub fn host_config(&self) -> Option<HostConfig> {
		let settings = self.inner.read();
		let host_id = settings.current_host_id.as_ref()?;
		settings.host_settings.get(host_id).cloned()
	}

	pub fn game_session(&self) -> GameSessionConfig {
		self.inner.read().game_session.clone()
	}

	pub fn interpreter_path(&self) -> Option<String> {
		self.inner.read().interpreter_path.clone()
	}

	/// Resolves the RPC target for the selected host, along with the
	/// host id the target was derived from (for stale-result checks).
	pub fn buddy_target(&self) -> Option<(String, BuddyTarget)> {
		let settings = self.inner.read();
		let host_id = settings.current_host_id.clone()?;
		let host = settings.host_settings.get(&host_id)?;
		let client_id = settings.client_id.clone()?;
		Some((
			host_id,
			BuddyTarget {
				address: host.address.clone(),
				port: host.buddy_port,
				client_id,
			},
		))
	}
}
