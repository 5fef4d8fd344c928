//! The host's observable application catalog, at the boundary castway
//! actually needs: read/write records by id and hook the change stream.
//!
//! The host owns the real store and mutates it from many uncoordinated
//! places; castway never assumes exclusive ownership of a record, only
//! of the shadow/source mapping and the attributes it explicitly
//! mirrors. Components depend on the [`CatalogStore`] trait so tests
//! (and the host adapter) can run against [`MemoryCatalog`].

mod memory;

pub use memory::MemoryCatalog;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Stable integer key of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppId(pub u32);

impl fmt::Display for AppId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

/// Opaque launch configuration carried by a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchConfig {
	pub exe: String,
	pub launch_options: String,
	pub resolution_override: String,
	pub hidden: bool,
}

/// One entry in the host's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppRecord {
	pub id: AppId,
	pub display_name: String,
	/// Monotonic recency hint used by the host for sorting.
	pub last_played: u64,
	pub launch: LaunchConfig,
}

impl AppRecord {
	pub fn new(id: AppId, display_name: impl Into<String>) -> Self {
		Self {
			id,
			display_name: display_name.into(),
			last_played: 0,
			launch: LaunchConfig::default(),
		}
	}
}

/// Committed catalog mutation, delivered in commit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogEvent {
	Added(AppId),
	Updated(AppId),
	Removed(AppId),
}

impl CatalogEvent {
	pub fn app_id(self) -> AppId {
		match self {
			CatalogEvent::Added(id) | CatalogEvent::Updated(id) | CatalogEvent::Removed(id) => id,
		}
	}
}

/// Callback observing committed mutations.
pub type ChangeListener = Arc<dyn Fn(CatalogEvent) + Send + Sync>;

/// Callback running before a write commits; receives the current record
/// (if any) and may rewrite the incoming one in place.
pub type WriteInterceptor = Arc<dyn Fn(Option<&AppRecord>, &mut AppRecord) + Send + Sync>;

/// Handle to the host's shared catalog.
pub trait CatalogStore: Send + Sync {
	fn get(&self, id: AppId) -> Option<AppRecord>;
	fn set(&self, record: AppRecord);
	fn remove(&self, id: AppId) -> bool;
	fn ids(&self) -> Vec<AppId>;
	fn on_change(&self, listener: ChangeListener) -> Subscription;
	fn on_will_change(&self, interceptor: WriteInterceptor) -> Subscription;
}

/// Active store subscription; dropping it (or calling
/// [`Subscription::unsubscribe`]) detaches the callback.
pub struct Subscription(Option<Box<dyn FnOnce() + Send>>);

impl Subscription {
	pub fn new(unsubscribe: impl FnOnce() + Send + 'static) -> Self {
		Self(Some(Box::new(unsubscribe)))
	}

	pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(detach) = self.0.take() {
			detach();
		}
	}
}

impl fmt::Debug for Subscription {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Subscription")
			.field("active", &self.0.is_some())
			.finish()
	}
}
