//! The single in-flight session, as an explicit owned singleton.

use parking_lot::Mutex;

use crate::catalog::AppId;

/// Per-session toggles applied after launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionOptions {
	/// Visible shortcut title replaced by the numeric app id.
	pub name_set_to_app_id: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
	pub source_app_id: AppId,
	pub shadow_app_id: AppId,
	pub display_name: String,
	/// One-shot latch suppressing a duplicate UI navigation right after
	/// launch; consumed through [`SessionTracker::consume_redirect`].
	pub redirected: bool,
	pub being_killed: bool,
	pub being_suspended: bool,
	pub options: SessionOptions,
}

/// Holds at most one [`SessionState`] system-wide.
#[derive(Debug, Default)]
pub struct SessionTracker {
	current: Mutex<Option<SessionState>>,
}

impl SessionTracker {
	pub fn new() -> Self {
		Self::default()
	}

	/// Starts tracking a session, replacing any previous one.
	pub fn begin(&self, source_app_id: AppId, shadow_app_id: AppId, display_name: impl Into<String>) {
		*self.current.lock() = Some(SessionState {
			source_app_id,
			shadow_app_id,
			display_name: display_name.into(),
			redirected: false,
			being_killed: false,
			being_suspended: false,
			options: SessionOptions::default(),
		});
	}

	pub fn current(&self) -> Option<SessionState> {
		self.current.lock().clone()
	}

	pub fn is_active(&self) -> bool {
		self.current.lock().is_some()
	}

	pub fn clear(&self) {
		*self.current.lock() = None;
	}

	/// Mutates the tracked session in place; returns false when idle.
	pub fn update(&self, apply: impl FnOnce(&mut SessionState)) -> bool {
		match self.current.lock().as_mut() {
			Some(state) => {
				apply(state);
				true
			}
			None => false,
		}
	}

	/// Returns true exactly once per tracked session.
	pub fn consume_redirect(&self) -> bool {
		match self.current.lock().as_mut() {
			Some(state) if !state.redirected => {
				state.redirected = true;
				true
			}
			_ => false,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn begin_replaces_the_previous_session() {
		let tracker = SessionTracker::new();
		tracker.begin(AppId(42), AppId(500), "one");
		tracker.begin(AppId(43), AppId(501), "two");

		let state = tracker.current().unwrap();
		assert_eq!(state.source_app_id, AppId(43));
		assert_eq!(state.shadow_app_id, AppId(501));
	}

	#[test]
	fn redirect_is_consumed_exactly_once() {
		let tracker = SessionTracker::new();
		assert!(!tracker.consume_redirect(), "no session, nothing to consume");

		tracker.begin(AppId(42), AppId(500), "game");
		assert!(tracker.consume_redirect());
		assert!(!tracker.consume_redirect());

		tracker.begin(AppId(42), AppId(500), "game");
		assert!(tracker.consume_redirect(), "a fresh session re-arms the latch");
	}

	#[test]
	fn update_on_idle_tracker_reports_false() {
		let tracker = SessionTracker::new();
		assert!(!tracker.update(|state| state.being_killed = true));

		tracker.begin(AppId(42), AppId(500), "game");
		assert!(tracker.update(|state| state.being_suspended = true));
		assert!(tracker.current().unwrap().being_suspended);
	}
}
