//! Shortcut identity registry.
//!
//! Tracks which catalog shortcut (shadow) stands in for which real
//! application (source). Managed shortcuts are recognized by the
//! markers in their launch options, so the registry can rebuild its
//! mapping from a cold catalog scan; entries with ambiguous or missing
//! markers are orphans and get discarded.
//!
//! The shortcut store is eventually consistent, so every mutation is
//! verified against the catalog with a bounded poll before it counts.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use castway_protocol::markers;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::catalog::{AppId, CatalogStore};
use crate::error::{Error, Result};
use crate::host::ShortcutHost;
use crate::sync::wait_for;

const VERIFY_RETRIES: u32 = 20;
const VERIFY_DELAY: Duration = Duration::from_millis(250);

pub struct ShortcutRegistry<S: ShortcutHost> {
	shortcuts: Arc<S>,
	store: Weak<dyn CatalogStore>,
	/// Executable every managed shortcut points at (the runner script).
	exec_path: String,
	mapping: Mutex<HashMap<AppId, AppId>>,
	ready: watch::Sender<bool>,
}

impl<S: ShortcutHost> ShortcutRegistry<S> {
	pub fn new(shortcuts: Arc<S>, store: Weak<dyn CatalogStore>, exec_path: impl Into<String>) -> Self {
		Self {
			shortcuts,
			store,
			exec_path: exec_path.into(),
			mapping: Mutex::new(HashMap::new()),
			ready: watch::Sender::new(false),
		}
	}

	pub fn is_ready(&self) -> bool {
		*self.ready.borrow()
	}

	pub fn ready_changes(&self) -> watch::Receiver<bool> {
		self.ready.subscribe()
	}

	pub fn shadow_for(&self, source: AppId) -> Option<AppId> {
		self.mapping.lock().get(&source).copied()
	}

	pub fn source_for(&self, shadow: AppId) -> Option<AppId> {
		self.mapping
			.lock()
			.iter()
			.find_map(|(source, mapped)| (*mapped == shadow).then_some(*source))
	}

	/// Rebuilds the mapping from the catalog and discards orphaned
	/// managed shortcuts. Marks the registry ready on success.
	pub async fn init(&self) -> Result<()> {
		let store = self.store()?;

		let mut mapping = HashMap::new();
		let mut orphans = Vec::new();
		for id in store.ids() {
			let Some(record) = store.get(id) else {
				continue;
			};
			let options = &record.launch.launch_options;
			if markers::value_of(options, markers::MANAGED_KEY).is_none() {
				continue;
			}
			let source = markers::unique_number_of(options, markers::APP_ID_KEY)
				.and_then(|raw| u32::try_from(raw).ok())
				.map(AppId);
			match source {
				Some(source) if !mapping.contains_key(&source) => {
					mapping.insert(source, id);
				}
				_ => orphans.push(id),
			}
		}

		for orphan in orphans {
			warn!(target: "castway.registry", id = %orphan, "discarding orphaned managed shortcut");
			if let Err(error) = self.discard(orphan).await {
				warn!(target: "castway.registry", id = %orphan, %error, "orphan cleanup failed");
			}
		}

		info!(target: "castway.registry", shortcuts = mapping.len(), "registry scan complete");
		*self.mapping.lock() = mapping;
		let _ = self.ready.send_replace(true);
		Ok(())
	}

	/// Resolves the shadow shortcut for `source`, reusing the cached id
	/// when it still resolves in the catalog and recreating it when it
	/// does not.
	pub async fn ensure_shadow(&self, source: AppId, name: &str) -> Result<AppId> {
		if !self.is_ready() {
			return Err(Error::NotReady);
		}
		let store = self.store()?;

		if let Some(shadow) = self.shadow_for(source) {
			if store.get(shadow).is_some() {
				return Ok(shadow);
			}
			debug!(target: "castway.registry", %source, %shadow, "cached shadow is stale, recreating");
			self.mapping.lock().remove(&source);
		}

		let Some(shadow) = self.shortcuts.create_shortcut(name, &self.exec_path).await else {
			return Err(Error::ShortcutOp { op: "create", app_id: source.0 });
		};
		let appeared = wait_for(VERIFY_RETRIES, VERIFY_DELAY, || store.get(shadow).is_some()).await;
		if !appeared {
			return Err(Error::RetryExhausted {
				op: "shortcut creation",
				attempts: VERIFY_RETRIES + 1,
			});
		}

		let base_options = format!(
			"{} {} %command%",
			markers::encode_pair(markers::MANAGED_KEY, "1"),
			markers::encode_pair(markers::APP_ID_KEY, &source.to_string()),
		);
		if !self.shortcuts.set_launch_options(shadow, &base_options).await {
			return Err(Error::ShortcutOp { op: "set launch options", app_id: shadow.0 });
		}

		self.mapping.lock().insert(source, shadow);
		Ok(shadow)
	}

	/// Removes the shadow shortcut mapped for `source`, if any.
	pub async fn remove(&self, source: AppId) -> Result<()> {
		let Some(shadow) = self.mapping.lock().remove(&source) else {
			return Ok(());
		};
		self.discard(shadow).await
	}

	/// Removes every managed shortcut. If any removal fails to take
	/// effect the store is considered corrupted and only a host restart
	/// recovers it.
	pub async fn purge_all(&self) -> Result<()> {
		let shadows: Vec<AppId> = self.mapping.lock().drain().map(|(_, shadow)| shadow).collect();

		let mut corrupted = false;
		for shadow in shadows {
			if let Err(error) = self.discard(shadow).await {
				warn!(target: "castway.registry", %shadow, %error, "purge left a shortcut behind");
				corrupted = true;
			}
		}
		if corrupted {
			return Err(Error::RestartRequired);
		}
		Ok(())
	}

	async fn discard(&self, shadow: AppId) -> Result<()> {
		let store = self.store()?;
		if !self.shortcuts.remove_shortcut(shadow).await {
			return Err(Error::ShortcutOp { op: "remove", app_id: shadow.0 });
		}
		let gone = wait_for(VERIFY_RETRIES, VERIFY_DELAY, || store.get(shadow).is_none()).await;
		if !gone {
			return Err(Error::RetryExhausted {
				op: "shortcut removal",
				attempts: VERIFY_RETRIES + 1,
			});
		}
		Ok(())
	}

	fn store(&self) -> Result<Arc<dyn CatalogStore>> {
		self.store.upgrade().ok_or(Error::StoreUnavailable)
	}
}
