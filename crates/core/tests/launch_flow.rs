//! End-to-end launch behavior against the in-memory fakes.

mod common;

use std::sync::Arc;
use std::time::Duration;

use castway::catalog::{AppId, CatalogStore};
use castway::host::RunnerBridge;
use castway::notify::NoticeLevel;
use castway_protocol::markers;
use common::rig;

#[tokio::test]
async fn launch_prepares_and_tracks_a_session() {
	let mut rig = rig().await;
	rig.orchestrator.launch_app(AppId(42), "Half-Life 3").await;

	let state = rig.orchestrator.tracker().current().expect("session tracked");
	assert_eq!(state.source_app_id, AppId(42));
	assert!(rig.orchestrator.is_still_running());

	let record = rig.catalog.get(state.shadow_app_id).expect("shadow record");
	assert!(record.launch.hidden);
	assert_eq!(record.display_name, "Half-Life 3");
	assert_eq!(
		markers::unique_number_of(&record.launch.launch_options, markers::APP_ID_KEY),
		Some(42)
	);
	assert!(record.launch.launch_options.ends_with("%command%"));
	assert_eq!(record.launch.resolution_override, "Default");

	// The redirect latch fires exactly once for the new session.
	assert!(rig.orchestrator.tracker().consume_redirect());
	assert!(!rig.orchestrator.tracker().consume_redirect());

	assert!(rig.drain_notices().is_empty(), "a clean launch must not toast");
}

#[tokio::test]
async fn relaunch_reuses_the_shadow_shortcut() {
	let mut rig = rig().await;
	rig.orchestrator.launch_app(AppId(42), "Half-Life 3").await;
	let shadow = rig.orchestrator.tracker().current().unwrap().shadow_app_id;

	rig.runner.mark_stopped(shadow);
	tokio::time::sleep(Duration::from_millis(20)).await;
	assert!(!rig.orchestrator.is_still_running());

	rig.orchestrator.launch_app(AppId(42), "Half-Life 3").await;
	assert_eq!(
		rig.orchestrator.tracker().current().unwrap().shadow_app_id,
		shadow
	);
	assert_eq!(rig.created_shortcuts(), 1, "the shadow must be reused");
	let _ = rig.drain_notices();
}

#[tokio::test(start_paused = true)]
async fn launch_during_preparation_is_dropped_silently() {
	let rig = rig().await;
	rig.runner.set_auto_start(false);

	let orchestrator = Arc::clone(&rig.orchestrator);
	let first = tokio::spawn(async move {
		orchestrator.launch_app(AppId(42), "Half-Life 3").await;
	});
	// Let the first launch reach its start-notification wait, holding
	// the launch lock.
	tokio::time::sleep(Duration::from_millis(10)).await;

	// Even with the session slot free, the in-flight launch drops the
	// second call at the lock.
	rig.orchestrator.tracker().clear();
	rig.orchestrator.launch_app(AppId(43), "Other Game").await;
	assert_eq!(rig.created_shortcuts(), 1);

	first.await.unwrap();
}

#[tokio::test]
async fn rejected_preconditions_toast_without_side_effects() {
	let mut rig = rig().await;

	rig.settings.update(|settings| settings.current_host_id = None);
	rig.orchestrator.launch_app(AppId(42), "Half-Life 3").await;
	rig.settings.update(|settings| settings.current_host_id = Some("host-1".into()));

	rig.system.set_network(false);
	rig.orchestrator.launch_app(AppId(42), "Half-Life 3").await;
	rig.system.set_network(true);

	rig.orchestrator.tracker().begin(AppId(1), AppId(2), "phantom");
	rig.orchestrator.launch_app(AppId(42), "Half-Life 3").await;
	rig.orchestrator.tracker().clear();

	assert_eq!(rig.created_shortcuts(), 0);
	let notices = rig.drain_notices();
	assert_eq!(notices.len(), 3);
	assert!(notices.iter().all(|notice| notice.level == NoticeLevel::Info));
}

#[tokio::test(start_paused = true)]
async fn launch_timeout_kills_and_clears() {
	let mut rig = rig().await;
	rig.runner.set_auto_start(false);

	rig.orchestrator.launch_app(AppId(42), "Half-Life 3").await;

	assert!(!rig.orchestrator.is_still_running());
	let notices = rig.drain_notices();
	assert!(
		notices
			.iter()
			.any(|notice| notice.level == NoticeLevel::Error
				&& notice.message.contains("did not start in time"))
	);
}

#[tokio::test]
async fn run_result_is_surfaced_when_the_session_ends() {
	let mut rig = rig().await;
	rig.orchestrator.launch_app(AppId(42), "Half-Life 3").await;
	let shadow = rig.orchestrator.tracker().current().unwrap().shadow_app_id;

	rig.runner.set_run_result(Some("stream crashed".into()));
	rig.runner.mark_stopped(shadow);
	tokio::time::sleep(Duration::from_millis(20)).await;

	assert!(!rig.orchestrator.is_still_running());
	let notices = rig.drain_notices();
	assert!(
		notices
			.iter()
			.any(|notice| notice.level == NoticeLevel::Error
				&& notice.message.contains("stream crashed"))
	);
}

#[tokio::test]
async fn unrelated_stop_events_are_ignored() {
	let mut rig = rig().await;
	rig.orchestrator.launch_app(AppId(42), "Half-Life 3").await;
	let shadow = rig.orchestrator.tracker().current().unwrap().shadow_app_id;

	// A stop notification for some other app.
	rig.system.emit_lifetime(AppId(999), false);
	// A stale stop notification for our shadow while the process is
	// demonstrably still alive.
	rig.system.emit_lifetime(shadow, false);
	tokio::time::sleep(Duration::from_millis(20)).await;

	assert!(rig.orchestrator.is_still_running());
	assert!(rig.drain_notices().is_empty());
}

#[tokio::test(start_paused = true)]
async fn kill_app_falls_back_to_the_forceful_path() {
	let mut rig = rig().await;
	rig.orchestrator.launch_app(AppId(42), "Half-Life 3").await;
	let shadow = rig.orchestrator.tracker().current().unwrap().shadow_app_id;

	rig.runner.set_run_result(Some("leftover".into()));
	rig.runner.set_ignore_terminate(true);
	rig.orchestrator.kill_app().await;

	assert!(!rig.orchestrator.is_still_running());
	assert!(!rig.runner.is_running(shadow).await);
	// An explicit kill must not surface the run result as an error.
	tokio::time::sleep(Duration::from_millis(20)).await;
	assert!(rig.drain_notices().is_empty());
}

#[tokio::test]
async fn launch_mirrors_recency_onto_the_shadow() {
	let mut rig = rig().await;
	rig.orchestrator.launch_app(AppId(42), "Half-Life 3").await;
	let shadow = rig.orchestrator.tracker().current().unwrap().shadow_app_id;

	let mut source = rig.catalog.get(AppId(42)).unwrap();
	source.last_played = 1_700_000_000;
	rig.catalog.set(source);

	assert_eq!(
		rig.catalog.get(shadow).unwrap().last_played,
		1_700_000_000,
		"source recency must flow onto the shadow"
	);
	let _ = rig.drain_notices();
}
