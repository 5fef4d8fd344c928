//! Device suspend/resume behavior for an active session.

mod common;

use std::time::Duration;

use castway::catalog::AppId;
use castway::host::{PowerEvent, RunnerBridge};
use castway::notify::NoticeLevel;
use common::rig;

#[tokio::test]
async fn suspend_keeps_the_session_and_stops_quietly() {
	let mut rig = rig().await;
	rig.orchestrator.launch_app(AppId(42), "Half-Life 3").await;
	let shadow = rig.orchestrator.tracker().current().unwrap().shadow_app_id;

	rig.system.emit_power(PowerEvent::SuspendBegin);
	tokio::time::sleep(Duration::from_millis(20)).await;

	let state = rig.orchestrator.tracker().current().expect("session survives suspend");
	assert!(state.being_suspended);
	assert!(!rig.runner.is_running(shadow).await);
	assert!(rig.drain_notices().is_empty(), "suspend must not toast");
}

#[tokio::test]
async fn resume_relaunches_when_connectivity_is_back() {
	let mut rig = rig().await;
	rig.settings.update(|settings| settings.game_session.resume_after_suspend = true);
	rig.orchestrator.launch_app(AppId(42), "Half-Life 3").await;

	rig.system.emit_power(PowerEvent::SuspendBegin);
	tokio::time::sleep(Duration::from_millis(20)).await;

	rig.system.emit_power(PowerEvent::ResumeComplete);
	tokio::time::sleep(Duration::from_millis(50)).await;

	let state = rig.orchestrator.tracker().current().expect("session relaunched");
	assert_eq!(state.source_app_id, AppId(42));
	assert!(!state.being_suspended, "the relaunched session is fresh");
	assert_eq!(rig.created_shortcuts(), 1, "relaunch must reuse the shadow");
	assert!(rig.drain_notices().is_empty());
}

#[tokio::test]
async fn resume_clears_the_session_when_disabled() {
	let mut rig = rig().await;
	rig.orchestrator.launch_app(AppId(42), "Half-Life 3").await;

	rig.system.emit_power(PowerEvent::SuspendBegin);
	tokio::time::sleep(Duration::from_millis(20)).await;
	rig.system.emit_power(PowerEvent::ResumeComplete);
	tokio::time::sleep(Duration::from_millis(20)).await;

	assert!(!rig.orchestrator.is_still_running());
	assert!(rig.drain_notices().is_empty());
}

#[tokio::test(start_paused = true)]
async fn resume_without_connectivity_warns_and_clears() {
	let mut rig = rig().await;
	rig.settings.update(|settings| settings.game_session.resume_after_suspend = true);
	rig.orchestrator.launch_app(AppId(42), "Half-Life 3").await;

	rig.system.emit_power(PowerEvent::SuspendBegin);
	tokio::time::sleep(Duration::from_millis(20)).await;

	rig.system.set_network(false);
	rig.system.emit_power(PowerEvent::ResumeComplete);
	// The bounded network wait (5s by default) runs out.
	tokio::time::sleep(Duration::from_secs(6)).await;

	assert!(!rig.orchestrator.is_still_running());
	let notices = rig.drain_notices();
	assert!(
		notices
			.iter()
			.any(|notice| notice.level == NoticeLevel::Warn
				&& notice.message.contains("network did not come back"))
	);
	assert_eq!(rig.created_shortcuts(), 1, "no relaunch without network");
}

#[tokio::test]
async fn power_events_without_a_session_are_ignored() {
	let mut rig = rig().await;

	rig.system.emit_power(PowerEvent::SuspendBegin);
	rig.system.emit_power(PowerEvent::ResumeComplete);
	tokio::time::sleep(Duration::from_millis(20)).await;

	assert!(!rig.orchestrator.is_still_running());
	assert!(rig.drain_notices().is_empty());
	assert_eq!(rig.created_shortcuts(), 0);
}
