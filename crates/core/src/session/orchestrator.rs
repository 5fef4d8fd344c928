//! The session orchestrator: drives one streaming session end-to-end.
//!
//! Launch runs behind a non-blocking lock so rapid double-activation
//! cannot duplicate shortcut preparation; the losing call is dropped
//! silently. A background monitor watches the host's lifetime and
//! power streams to surface run results, clear state when the process
//! stops, and handle device suspend/resume.

use std::sync::Arc;
use std::time::Duration;

use castway_protocol::markers;
use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::catalog::AppId;
use crate::config::{HostConfig, SettingsManager};
use crate::error::Error;
use crate::host::{LifetimeEvent, PowerEvent, RunnerBridge, ShortcutHost, SystemEvents, SystemInfo};
use crate::mirror::RecordMirror;
use crate::notify::Notifier;

use super::registry::ShortcutRegistry;
use super::resolution::{self, ResolutionPlan};
use super::state::{SessionOptions, SessionTracker};

/// How long a graceful termination may take before the forceful kill.
const KILL_GRACE: Duration = Duration::from_secs(2);
/// Poll interval while waiting for network or process exit.
const POLL_DELAY: Duration = Duration::from_millis(250);

/// Everything the orchestrator is wired to.
pub struct OrchestratorParts<S, R, E, I>
where
	S: ShortcutHost,
	R: RunnerBridge,
	E: SystemEvents,
	I: SystemInfo,
{
	pub registry: Arc<ShortcutRegistry<S>>,
	pub shortcuts: Arc<S>,
	pub runner: Arc<R>,
	pub events: Arc<E>,
	pub system: Arc<I>,
	pub mirror: Arc<RecordMirror>,
	pub tracker: Arc<SessionTracker>,
	pub settings: Arc<SettingsManager>,
	pub notifier: Notifier,
}

pub struct SessionOrchestrator<S, R, E, I>
where
	S: ShortcutHost,
	R: RunnerBridge,
	E: SystemEvents,
	I: SystemInfo,
{
	registry: Arc<ShortcutRegistry<S>>,
	shortcuts: Arc<S>,
	runner: Arc<R>,
	events: Arc<E>,
	system: Arc<I>,
	mirror: Arc<RecordMirror>,
	tracker: Arc<SessionTracker>,
	settings: Arc<SettingsManager>,
	notifier: Notifier,
	launch_lock: AsyncMutex<()>,
	monitor: Mutex<Option<JoinHandle<()>>>,
}

impl<S, R, E, I> SessionOrchestrator<S, R, E, I>
where
	S: ShortcutHost,
	R: RunnerBridge,
	E: SystemEvents,
	I: SystemInfo,
{
	pub fn new(parts: OrchestratorParts<S, R, E, I>) -> Self {
		Self {
			registry: parts.registry,
			shortcuts: parts.shortcuts,
			runner: parts.runner,
			events: parts.events,
			system: parts.system,
			mirror: parts.mirror,
			tracker: parts.tracker,
			settings: parts.settings,
			notifier: parts.notifier,
			launch_lock: AsyncMutex::new(()),
			monitor: Mutex::new(None),
		}
	}

	pub fn tracker(&self) -> &Arc<SessionTracker> {
		&self.tracker
	}

	/// Starts the background lifetime/power monitor. Idempotent.
	pub fn init(self: &Arc<Self>) {
		let mut monitor = self.monitor.lock();
		if monitor.is_some() {
			return;
		}

		let weak = Arc::downgrade(self);
		let mut lifetime = self.events.lifetime_events();
		let mut power = self.events.power_events();
		*monitor = Some(tokio::spawn(async move {
			loop {
				tokio::select! {
					event = lifetime.recv() => match event {
						Ok(event) => {
							let Some(this) = weak.upgrade() else { break };
							this.handle_lifetime(event).await;
						}
						Err(broadcast::error::RecvError::Lagged(_)) => continue,
						Err(broadcast::error::RecvError::Closed) => break,
					},
					event = power.recv() => match event {
						Ok(event) => {
							let Some(this) = weak.upgrade() else { break };
							this.handle_power(event).await;
						}
						Err(broadcast::error::RecvError::Lagged(_)) => continue,
						Err(broadcast::error::RecvError::Closed) => break,
					},
				}
			}
		}));
	}

	pub fn deinit(&self) {
		if let Some(handle) = self.monitor.lock().take() {
			handle.abort();
		}
	}

	/// Whether a session is currently tracked (running or suspended).
	pub fn is_still_running(&self) -> bool {
		self.tracker.is_active()
	}

	/// Launches a streaming session for `source`. Every rejected
	/// precondition surfaces a toast and leaves state untouched; a
	/// launch already in flight drops this call silently.
	pub async fn launch_app(&self, source: AppId, display_name: &str) {
		let run_timeout = self.settings.game_session().launch_timeout();
		self.launch_with_timeout(source, display_name, run_timeout).await;
	}

	async fn launch_with_timeout(&self, source: AppId, display_name: &str, run_timeout: Duration) {
		if !self.registry.is_ready() {
			self.notifier.toast("Shortcuts are still being prepared, try again shortly");
			return;
		}
		let Some(host) = self.settings.host_config() else {
			self.notifier.toast("No streaming host is selected");
			return;
		};
		if self.is_still_running() {
			self.notifier.toast("A streaming session is already in progress");
			return;
		}
		if !self.system.has_network_connection().await {
			self.notifier.toast("No network connection");
			return;
		}

		let Ok(_guard) = self.launch_lock.try_lock() else {
			debug!(target: "castway.session", %source, "launch already in flight, dropping call");
			return;
		};
		self.prepare_and_run(&host, source, display_name, run_timeout).await;
	}

	async fn prepare_and_run(
		&self,
		host: &HostConfig,
		source: AppId,
		display_name: &str,
		run_timeout: Duration,
	) {
		let shadow = match self.registry.ensure_shadow(source, display_name).await {
			Ok(shadow) => shadow,
			Err(Error::RestartRequired) => {
				self.notifier.error("Shortcut store is corrupted; restart the host client");
				return;
			}
			Err(error) => {
				error!(target: "castway.session", %source, %error, "shortcut preparation failed");
				self.notifier.error(format!("{display_name}: failed to prepare shortcut"));
				return;
			}
		};
		self.mirror.add_pair(shadow, source);

		let plan = resolution::plan_resolution(&host.resolution, self.system.as_ref()).await;
		let options = self.launch_options(source, &plan);
		let configured = self.shortcuts.set_hidden_state(shadow, true).await
			&& self.shortcuts.set_name(shadow, display_name).await
			&& self.shortcuts.set_resolution_override(shadow, &plan.override_value).await
			&& self.shortcuts.set_launch_options(shadow, &options).await;
		if !configured {
			self.notifier.error(format!("{display_name}: failed to configure shortcut"));
			return;
		}

		self.tracker.begin(source, shadow, display_name);
		self.runner.clear_run_result().await;

		// Subscribe before running so the start notification cannot be
		// missed.
		let mut lifetime = self.events.lifetime_events();
		if !self.runner.run_app(shadow).await {
			self.notifier.error(format!("{display_name}: host refused to run the app"));
			self.tracker.clear();
			return;
		}

		let started = tokio::time::timeout(run_timeout, async {
			loop {
				match lifetime.recv().await {
					Ok(event) if event.app_id == shadow && event.running => break true,
					Ok(_) => {}
					Err(broadcast::error::RecvError::Lagged(_)) => {
						if self.runner.is_running(shadow).await {
							break true;
						}
					}
					Err(broadcast::error::RecvError::Closed) => break false,
				}
			}
		})
		.await
		.unwrap_or(false);

		if !started {
			warn!(target: "castway.session", %source, "app did not start in time, killing");
			let _ = self.runner.kill(shadow).await;
			self.tracker.clear();
			self.notifier.error(format!("{display_name} did not start in time"));
			return;
		}

		info!(target: "castway.session", %source, %shadow, "session launched");
		if self.settings.game_session().auto_apply_app_id {
			self.apply_session_options(SessionOptions { name_set_to_app_id: true }).await;
		}
	}

	fn launch_options(&self, source: AppId, plan: &ResolutionPlan) -> String {
		let mut parts = vec![
			markers::encode_pair(markers::MANAGED_KEY, "1"),
			markers::encode_pair(markers::APP_ID_KEY, &source.to_string()),
		];
		if let Some(mode) = &plan.auto_mode {
			parts.push(markers::encode_pair(markers::AUTO_RES_KEY, mode));
		}
		if let Some(display) = &plan.linked_display {
			parts.push(markers::encode_pair(markers::LINKED_DISPLAY_KEY, display));
		}
		if let Some(interpreter) = self.settings.interpreter_path() {
			parts.push(markers::encode_pair(markers::INTERPRETER_KEY, &interpreter));
		}
		parts.push("%command%".to_string());
		parts.join(" ")
	}

	/// Explicit user-triggered termination: graceful first, forceful
	/// when the process lingers past the grace period.
	pub async fn kill_app(&self) {
		let Some(state) = self.tracker.current() else {
			return;
		};
		self.tracker.update(|session| session.being_killed = true);

		let shadow = state.shadow_app_id;
		let _ = self.runner.terminate(shadow).await;
		let stopped = tokio::time::timeout(KILL_GRACE, async {
			while self.runner.is_running(shadow).await {
				tokio::time::sleep(POLL_DELAY).await;
			}
		})
		.await
		.is_ok();

		if !stopped {
			warn!(target: "castway.session", %shadow, "graceful termination stalled, killing");
			if !self.runner.kill(shadow).await {
				self.notifier.error(format!("{}: failed to stop", state.display_name));
			}
		}
		self.tracker.clear();
	}

	/// Applies post-launch options, renaming the shortcut to the numeric
	/// app id (or back) when that toggle changed.
	pub async fn apply_session_options(&self, options: SessionOptions) {
		let Some(state) = self.tracker.current() else {
			return;
		};
		if state.options == options {
			return;
		}
		if state.options.name_set_to_app_id != options.name_set_to_app_id {
			let name = if options.name_set_to_app_id {
				state.source_app_id.to_string()
			} else {
				state.display_name.clone()
			};
			if !self.shortcuts.set_name(state.shadow_app_id, &name).await {
				self.notifier.error(format!("{}: failed to rename shortcut", state.display_name));
				return;
			}
		}
		self.tracker.update(|session| session.options = options);
	}

	async fn handle_lifetime(&self, event: LifetimeEvent) {
		if event.running {
			return;
		}
		let Some(state) = self.tracker.current() else {
			return;
		};
		if state.shadow_app_id != event.app_id {
			return;
		}
		// Confirm it really stopped: unrelated stop notifications for a
		// live session are ignored.
		if self.runner.is_running(event.app_id).await {
			return;
		}

		if !state.being_suspended && !state.being_killed {
			if let Some(message) = self.runner.take_run_result().await {
				self.notifier.error(format!("{}: {message}", state.display_name));
			}
		}
		if state.being_suspended {
			debug!(target: "castway.session", app_id = %state.source_app_id, "stopped for suspend, keeping session");
			return;
		}

		info!(target: "castway.session", app_id = %state.source_app_id, "session ended");
		if self.mirror.is_paired(state.shadow_app_id) {
			self.mirror.try_update(state.shadow_app_id);
		}
		self.tracker.clear();
	}

	async fn handle_power(&self, event: PowerEvent) {
		match event {
			PowerEvent::SuspendBegin => self.on_suspend().await,
			PowerEvent::ResumeComplete => self.on_resume().await,
		}
	}

	async fn on_suspend(&self) {
		let Some(state) = self.tracker.current() else {
			return;
		};
		info!(target: "castway.session", app_id = %state.source_app_id, "device suspending, stopping session quietly");
		self.tracker.update(|session| session.being_suspended = true);
		let _ = self.runner.terminate(state.shadow_app_id).await;
	}

	async fn on_resume(&self) {
		let Some(state) = self.tracker.current() else {
			return;
		};
		if !state.being_suspended {
			return;
		}

		let session = self.settings.game_session();
		if !session.resume_after_suspend {
			info!(target: "castway.session", app_id = %state.source_app_id, "resume-after-suspend disabled, ending session");
			self.tracker.clear();
			return;
		}

		let network = tokio::time::timeout(session.resume_network_timeout(), async {
			while !self.system.has_network_connection().await {
				tokio::time::sleep(POLL_DELAY).await;
			}
		})
		.await
		.is_ok();

		self.tracker.clear();
		if !network {
			self.notifier.warn(format!(
				"{}: network did not come back after resume",
				state.display_name
			));
			return;
		}

		info!(target: "castway.session", app_id = %state.source_app_id, "relaunching after resume");
		self.launch_with_timeout(
			state.source_app_id,
			&state.display_name,
			session.suspend_relaunch_timeout(),
		)
		.await;
	}
}
