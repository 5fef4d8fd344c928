//! In-memory catalog used by tests and as the host-adapter backing
//! store.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use super::{
	AppId, AppRecord, CatalogEvent, CatalogStore, ChangeListener, Subscription, WriteInterceptor,
};

type HookRegistry<T> = Arc<RwLock<BTreeMap<u64, T>>>;

/// Observable in-memory record map.
///
/// Interceptors and listeners are snapshotted before being invoked, so
/// callbacks may freely re-enter the store (the mirror does exactly
/// that when it pushes mirrored attributes onto a shadow record).
#[derive(Default)]
pub struct MemoryCatalog {
	records: RwLock<HashMap<AppId, AppRecord>>,
	next_hook_id: AtomicU64,
	listeners: HookRegistry<ChangeListener>,
	interceptors: HookRegistry<WriteInterceptor>,
}

impl MemoryCatalog {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	fn emit(&self, event: CatalogEvent) {
		let snapshot: Vec<ChangeListener> = self.listeners.read().values().cloned().collect();
		for listener in snapshot {
			listener(event);
		}
	}

	fn register<T>(&self, registry: &HookRegistry<T>, hook: T) -> Subscription
	where
		T: Send + Sync + 'static,
	{
		let id = self.next_hook_id.fetch_add(1, Ordering::Relaxed);
		registry.write().insert(id, hook);

		// The subscription must not keep the catalog alive.
		let registry: Weak<RwLock<BTreeMap<u64, T>>> = Arc::downgrade(registry);
		Subscription::new(move || {
			if let Some(registry) = registry.upgrade() {
				registry.write().remove(&id);
			}
		})
	}
}

impl CatalogStore for MemoryCatalog {
	fn get(&self, id: AppId) -> Option<AppRecord> {
		self.records.read().get(&id).cloned()
	}

	fn set(&self, record: AppRecord) {
		let id = record.id;
		let current = self.records.read().get(&id).cloned();

		let mut incoming = record;
		let snapshot: Vec<WriteInterceptor> = self.interceptors.read().values().cloned().collect();
		for interceptor in snapshot {
			interceptor(current.as_ref(), &mut incoming);
		}

		let existed = self.records.write().insert(id, incoming).is_some();
		self.emit(if existed {
			CatalogEvent::Updated(id)
		} else {
			CatalogEvent::Added(id)
		});
	}

	fn remove(&self, id: AppId) -> bool {
		let removed = self.records.write().remove(&id).is_some();
		if removed {
			self.emit(CatalogEvent::Removed(id));
		}
		removed
	}

	fn ids(&self) -> Vec<AppId> {
		let mut ids: Vec<AppId> = self.records.read().keys().copied().collect();
		ids.sort();
		ids
	}

	fn on_change(&self, listener: ChangeListener) -> Subscription {
		self.register(&self.listeners, listener)
	}

	fn on_will_change(&self, interceptor: WriteInterceptor) -> Subscription {
		self.register(&self.interceptors, interceptor)
	}
}
