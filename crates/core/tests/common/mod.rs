//! Shared rig wiring the full stack against the in-memory fakes.
#![allow(dead_code)]

use std::sync::Arc;

use castway::catalog::{AppId, AppRecord, CatalogStore, MemoryCatalog};
use castway::config::{HostConfig, ResolutionSettings, Settings, SettingsManager, WolSettings};
use castway::fakes::{FakeRunner, FakeShortcutHost, FakeSystem};
use castway::mirror::{Attr, MirroredAttr, RecordMirror, newer_stamp};
use castway::notify::{Notice, Notifier};
use castway::session::{OrchestratorParts, SessionOrchestrator, SessionTracker, ShortcutRegistry};
use tokio::sync::mpsc::UnboundedReceiver;

pub type Orchestrator = SessionOrchestrator<FakeShortcutHost, FakeRunner, FakeSystem, FakeSystem>;

pub struct Rig {
	pub catalog: Arc<MemoryCatalog>,
	pub shortcuts: Arc<FakeShortcutHost>,
	pub runner: Arc<FakeRunner>,
	pub system: Arc<FakeSystem>,
	pub settings: Arc<SettingsManager>,
	pub orchestrator: Arc<Orchestrator>,
	pub notices: UnboundedReceiver<Notice>,
}

impl Rig {
	pub fn created_shortcuts(&self) -> usize {
		self.shortcuts
			.calls()
			.iter()
			.filter(|call| call.starts_with("create("))
			.count()
	}

	pub fn drain_notices(&mut self) -> Vec<Notice> {
		let mut notices = Vec::new();
		while let Ok(notice) = self.notices.try_recv() {
			notices.push(notice);
		}
		notices
	}
}

pub fn configured_settings() -> Settings {
	let mut settings = Settings::default();
	settings.client_id = Some("client-1".into());
	settings.current_host_id = Some("host-1".into());
	settings.host_settings.insert(
		"host-1".into(),
		HostConfig {
			address: "10.0.0.2".into(),
			buddy_port: 59999,
			host_name: "tower".into(),
			mac: "aa:bb:cc:dd:ee:ff".into(),
			resolution: ResolutionSettings::default(),
			wol: WolSettings::default(),
		},
	);
	settings
}

pub async fn rig() -> Rig {
	let catalog = MemoryCatalog::new();
	let store: Arc<dyn CatalogStore> = Arc::clone(&catalog) as Arc<dyn CatalogStore>;
	let weak = Arc::downgrade(&store);

	let shortcuts = Arc::new(FakeShortcutHost::new(Arc::clone(&catalog)));
	let system = Arc::new(FakeSystem::new());
	let runner = Arc::new(FakeRunner::new(Arc::clone(&system)));
	let settings = Arc::new(SettingsManager::new(configured_settings()));

	let registry = Arc::new(ShortcutRegistry::new(
		Arc::clone(&shortcuts),
		weak.clone(),
		"/opt/castway/runner.sh",
	));
	registry.init().await.expect("registry scan");

	let mirror = Arc::new(RecordMirror::new(
		weak,
		vec![MirroredAttr {
			attr: Attr::LastPlayed,
			predicate: newer_stamp,
		}],
	));
	mirror.init();

	let (notifier, notices) = Notifier::new();
	let orchestrator = Arc::new(SessionOrchestrator::new(OrchestratorParts {
		registry,
		shortcuts: Arc::clone(&shortcuts),
		runner: Arc::clone(&runner),
		events: Arc::clone(&system),
		system: Arc::clone(&system),
		mirror,
		tracker: Arc::new(SessionTracker::new()),
		settings: Arc::clone(&settings),
		notifier,
	}));
	orchestrator.init();

	// The real application the sessions in these tests stream.
	catalog.set(AppRecord::new(AppId(42), "Half-Life 3"));

	Rig {
		catalog,
		shortcuts,
		runner,
		system,
		settings,
		orchestrator,
		notices,
	}
}
