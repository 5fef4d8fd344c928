//! Record mirror: keeps selected attributes of a shadow record in sync
//! with its paired source record.
//!
//! The shadow is the shortcut castway owns; the source is the real
//! catalog entry it fronts. While paired, source-side changes to a
//! mirrored attribute flow onto the shadow (through the merge gate),
//! and host-side writes to the shadow are captured as the new
//! host-native value without clobbering the patched view. Unpairing
//! restores the shadow's attributes to the last host-native values.
//!
//! Sync direction is strictly source to shadow. The mirror's own
//! pushes are flagged so the write interceptor does not mistake them
//! for host writes.

mod overlay;
mod pairing;

pub use overlay::{always, newer_stamp, Attr, AttrValue, MergePredicate, MirroredAttr};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, error, warn};

use crate::catalog::{AppId, AppRecord, CatalogEvent, CatalogStore, Subscription};
use overlay::{AttributeOverlay, OverlayEntry};
use pairing::PairingTable;

#[derive(Default)]
struct MirrorState {
	pairs: PairingTable,
	overlay: AttributeOverlay,
}

struct MirrorCore {
	store: Weak<dyn CatalogStore>,
	attrs: Vec<MirroredAttr>,
	state: Mutex<MirrorState>,
	/// Set while the mirror writes its own patched records back, so the
	/// interceptor does not capture those pushes as host-native values.
	forwarding: AtomicBool,
}

impl MirrorCore {
	fn store(&self) -> Option<Arc<dyn CatalogStore>> {
		let store = self.store.upgrade();
		if store.is_none() {
			error!(target: "castway.mirror", "catalog handle is gone");
		}
		store
	}

	/// Write-interceptor body: routes host writes to a paired shadow
	/// through its overlay entries.
	fn intercept(&self, incoming: &mut AppRecord) {
		if self.forwarding.load(Ordering::SeqCst) {
			return;
		}
		let mut state = self.state.lock();
		if state.pairs.source_for(incoming.id).is_none() {
			return;
		}
		let shadow = incoming.id;
		for mirrored in &self.attrs {
			let value = mirrored.attr.read(incoming);
			if let Some(entry) = state.overlay.entry_mut(shadow, mirrored.attr) {
				entry.external_write(value);
				mirrored.attr.write(incoming, &entry.patched);
			}
		}
	}

	/// Change-listener body: reacts to source-side updates and removals.
	fn handle_event(&self, event: CatalogEvent) {
		match event {
			CatalogEvent::Added(id) | CatalogEvent::Updated(id) => {
				let paired = self.state.lock().pairs.shadow_for(id).is_some();
				if paired {
					self.sync_from_source(id);
				}
			}
			CatalogEvent::Removed(id) => {
				let shadow = self.state.lock().pairs.shadow_for(id);
				if let Some(shadow) = shadow {
					debug!(target: "castway.mirror", source = %id, %shadow, "source removed, unpairing");
					self.remove_pair(shadow);
				}
			}
		}
	}

	fn sync_from_source(&self, source: AppId) {
		let Some(store) = self.store() else {
			return;
		};
		let push = {
			let mut state = self.state.lock();
			let Some(shadow) = state.pairs.shadow_for(source) else {
				return;
			};
			let Some(source_record) = store.get(source) else {
				return;
			};
			let mut moved = false;
			for mirrored in &self.attrs {
				let incoming = mirrored.attr.read(&source_record);
				if let Some(entry) = state.overlay.entry_mut(shadow, mirrored.attr) {
					moved |= entry.merge_from_source(incoming);
				}
			}
			if !moved {
				return;
			}
			self.patched_record(&state, store.as_ref(), shadow)
		};
		if let Some(record) = push {
			self.push(store.as_ref(), record);
		}
	}

	/// The shadow's committed record with all patched values applied.
	fn patched_record(
		&self,
		state: &MirrorState,
		store: &dyn CatalogStore,
		shadow: AppId,
	) -> Option<AppRecord> {
		let mut record = store.get(shadow)?;
		for mirrored in &self.attrs {
			if let Some(patched) = state.overlay.read(shadow, mirrored.attr) {
				mirrored.attr.write(&mut record, patched);
			}
		}
		Some(record)
	}

	/// Commits a mirror-owned record. Must be called with the state
	/// lock released: the write re-enters the store's hook dispatch.
	fn push(&self, store: &dyn CatalogStore, record: AppRecord) {
		self.forwarding.store(true, Ordering::SeqCst);
		store.set(record);
		self.forwarding.store(false, Ordering::SeqCst);
	}

	fn add_pair(&self, shadow: AppId, source: AppId) {
		if shadow == source {
			warn!(target: "castway.mirror", id = %shadow, "refusing to pair a record with itself");
			return;
		}
		let Some(store) = self.store() else {
			return;
		};

		// Existing pairings on either side are torn down (restoring
		// their shadows) before the new one lands.
		let displaced = self.state.lock().pairs.displaced_by(shadow, source);
		for old in displaced {
			self.remove_pair(old);
		}

		let push = {
			let mut state = self.state.lock();
			state.pairs.insert(shadow, source);
			let Some(shadow_record) = store.get(shadow) else {
				warn!(target: "castway.mirror", %shadow, "shadow record missing at pairing time");
				return;
			};
			let source_record = store.get(source);
			for mirrored in &self.attrs {
				let original = mirrored.attr.read(&shadow_record);
				let incoming = source_record
					.as_ref()
					.map(|record| mirrored.attr.read(record));
				state.overlay.insert(
					shadow,
					mirrored.attr,
					OverlayEntry::new(original, incoming, mirrored.predicate),
				);
			}
			self.patched_record(&state, store.as_ref(), shadow)
		};
		if let Some(record) = push {
			self.push(store.as_ref(), record);
		}
	}

	fn remove_pair(&self, shadow: AppId) {
		let restore = {
			let mut state = self.state.lock();
			if state.pairs.remove_shadow(shadow).is_none() {
				// Already unpaired.
				return;
			}
			state.overlay.take_record(shadow)
		};
		let Some(store) = self.store() else {
			return;
		};
		let Some(mut record) = store.get(shadow) else {
			return;
		};
		for (attr, entry) in restore {
			attr.write(&mut record, &entry.original);
		}
		self.push(store.as_ref(), record);
	}

	/// Re-asserts the patched view onto the committed shadow record,
	/// e.g. after the shortcut backing it was recreated by the host.
	fn try_update(&self, shadow: AppId) {
		let Some(store) = self.store() else {
			return;
		};
		let push = {
			let state = self.state.lock();
			if state.pairs.source_for(shadow).is_none() {
				warn!(target: "castway.mirror", %shadow, "update requested for an unpaired record");
				return;
			}
			self.patched_record(&state, store.as_ref(), shadow)
		};
		if let Some(record) = push {
			self.push(store.as_ref(), record);
		}
	}
}

/// Public face of the mirror. Holds the store hooks; all pairing state
/// lives in the shared core so the hooks stay valid while subscribed.
pub struct RecordMirror {
	core: Arc<MirrorCore>,
	subscriptions: Mutex<Vec<Subscription>>,
}

impl RecordMirror {
	pub fn new(store: Weak<dyn CatalogStore>, attrs: Vec<MirroredAttr>) -> Self {
		Self {
			core: Arc::new(MirrorCore {
				store,
				attrs,
				state: Mutex::default(),
				forwarding: AtomicBool::new(false),
			}),
			subscriptions: Mutex::new(Vec::new()),
		}
	}

	/// Hooks the store. Safe to call once; later calls are no-ops.
	pub fn init(&self) {
		let Some(store) = self.core.store() else {
			return;
		};
		let mut subscriptions = self.subscriptions.lock();
		if !subscriptions.is_empty() {
			return;
		}
		let core = Arc::clone(&self.core);
		subscriptions
			.push(store.on_will_change(Arc::new(move |_current, incoming| core.intercept(incoming))));
		let core = Arc::clone(&self.core);
		subscriptions.push(store.on_change(Arc::new(move |event| core.handle_event(event))));
	}

	/// Unhooks the store and restores every paired shadow.
	pub fn deinit(&self) {
		self.subscriptions.lock().clear();
		let shadows = self.core.state.lock().pairs.shadows();
		for shadow in shadows {
			self.core.remove_pair(shadow);
		}
	}

	pub fn add_pair(&self, shadow: AppId, source: AppId) {
		self.core.add_pair(shadow, source);
	}

	/// Unpairs `shadow` and restores its mirrored attributes to their
	/// last host-native values. Unpairing an unpaired id is a no-op.
	pub fn remove_pair(&self, shadow: AppId) {
		self.core.remove_pair(shadow);
	}

	pub fn try_update(&self, shadow: AppId) {
		self.core.try_update(shadow);
	}

	pub fn is_paired(&self, shadow: AppId) -> bool {
		self.core.state.lock().pairs.source_for(shadow).is_some()
	}

	/// Patched view of a mirrored attribute, if `shadow` is paired.
	pub fn patched_value(&self, shadow: AppId, attr: Attr) -> Option<AttrValue> {
		self.core.state.lock().overlay.read(shadow, attr).cloned()
	}
}
