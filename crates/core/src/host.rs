//! Boundary traits for the device-side collaborators.
//!
//! The embedding host implements these against the real device APIs;
//! the fakes in [`crate::fakes`] implement them in memory. Every call
//! that crosses into the host may transiently fail, so the mutating
//! operations report plain booleans and leave retry policy to callers.

use std::future::Future;

use tokio::sync::broadcast;

use crate::catalog::AppId;

/// Current mode of a physical display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayMode {
	pub width: u32,
	pub height: u32,
}

impl DisplayMode {
	pub fn mode_string(&self) -> String {
		format!("{}x{}", self.width, self.height)
	}
}

/// An application process started or stopped on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifetimeEvent {
	pub app_id: AppId,
	pub running: bool,
}

/// Device power transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerEvent {
	SuspendBegin,
	ResumeComplete,
}

/// The host's shortcut store. Writes are eventually consistent: a
/// successful call does not guarantee the catalog reflects it yet, and
/// after heavy churn the store can corrupt to the point where only a
/// host restart helps.
pub trait ShortcutHost: Send + Sync + 'static {
	/// Creates a shortcut entry; `None` when the host refused.
	fn create_shortcut(
		&self,
		name: &str,
		exec_path: &str,
	) -> impl Future<Output = Option<AppId>> + Send;

	fn remove_shortcut(&self, id: AppId) -> impl Future<Output = bool> + Send;

	fn set_name(&self, id: AppId, name: &str) -> impl Future<Output = bool> + Send;

	fn set_launch_options(&self, id: AppId, options: &str) -> impl Future<Output = bool> + Send;

	fn set_hidden_state(&self, id: AppId, hidden: bool) -> impl Future<Output = bool> + Send;

	fn set_resolution_override(&self, id: AppId, value: &str) -> impl Future<Output = bool> + Send;
}

/// Process control for a launched shortcut plus the runner script's
/// structured result.
pub trait RunnerBridge: Send + Sync + 'static {
	/// Asks the host to run the shortcut. `true` means the request was
	/// accepted, not that the process is up; callers watch the lifetime
	/// stream for that.
	fn run_app(&self, id: AppId) -> impl Future<Output = bool> + Send;

	/// Whether the shortcut's process is currently alive. Idempotent.
	fn is_running(&self, id: AppId) -> impl Future<Output = bool> + Send;

	/// Graceful termination request.
	fn terminate(&self, id: AppId) -> impl Future<Output = bool> + Send;

	/// Forceful kill, for when graceful termination stalls.
	fn kill(&self, id: AppId) -> impl Future<Output = bool> + Send;

	/// Fetches and clears the runner's result; `None` means the run
	/// ended cleanly (or no result was recorded).
	fn take_run_result(&self) -> impl Future<Output = Option<String>> + Send;

	/// Drops a stale result left over from a previous run.
	fn clear_run_result(&self) -> impl Future<Output = ()> + Send;
}

/// Device notification streams. Dropping a receiver unsubscribes.
pub trait SystemEvents: Send + Sync + 'static {
	fn lifetime_events(&self) -> broadcast::Receiver<LifetimeEvent>;

	fn power_events(&self) -> broadcast::Receiver<PowerEvent>;
}

/// Read-only device facts.
pub trait SystemInfo: Send + Sync + 'static {
	fn has_network_connection(&self) -> impl Future<Output = bool> + Send;

	fn current_display_mode(&self) -> impl Future<Output = Option<DisplayMode>> + Send;

	/// Identifiers of the currently connected displays.
	fn connected_display_ids(&self) -> impl Future<Output = Vec<String>> + Send;
}
