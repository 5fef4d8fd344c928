//! Attribute overlay table.
//!
//! Replaces runtime accessor patching on host-owned objects with an
//! explicit decorator: a map from `(record id, attribute)` to the
//! patched value, the last host-native value and the merge predicate
//! gating promotion. Reads of a patched attribute go through
//! [`AttributeOverlay::read`]; writes are routed through
//! [`OverlayEntry::external_write`] by the mirror's store interceptor.

use std::collections::HashMap;

use crate::catalog::{AppId, AppRecord};

/// Mirrorable attribute of a catalog record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attr {
	DisplayName,
	LastPlayed,
}

/// Dynamically-typed attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
	Text(String),
	Stamp(u64),
}

impl Attr {
	pub fn read(self, record: &AppRecord) -> AttrValue {
		match self {
			Attr::DisplayName => AttrValue::Text(record.display_name.clone()),
			Attr::LastPlayed => AttrValue::Stamp(record.last_played),
		}
	}

	/// Writes `value` into `record`; a type mismatch is ignored.
	pub fn write(self, record: &mut AppRecord, value: &AttrValue) {
		match (self, value) {
			(Attr::DisplayName, AttrValue::Text(text)) => record.display_name = text.clone(),
			(Attr::LastPlayed, AttrValue::Stamp(stamp)) => record.last_played = *stamp,
			_ => {}
		}
	}
}

/// Decides whether `incoming` may overwrite the current patched value.
pub type MergePredicate = fn(current: &AttrValue, incoming: &AttrValue) -> bool;

/// Accepts only strictly newer timestamps; a current value of an
/// unexpected shape is treated as absent and always overwritten.
pub fn newer_stamp(current: &AttrValue, incoming: &AttrValue) -> bool {
	match (current, incoming) {
		(AttrValue::Stamp(current), AttrValue::Stamp(incoming)) => incoming > current,
		(AttrValue::Stamp(_), _) => false,
		_ => true,
	}
}

/// Accepts every write; used for attributes mirrored verbatim.
pub fn always(_current: &AttrValue, _incoming: &AttrValue) -> bool {
	true
}

/// One attribute selected for mirroring, with its gate.
#[derive(Debug, Clone, Copy)]
pub struct MirroredAttr {
	pub attr: Attr,
	pub predicate: MergePredicate,
}

/// Per-attribute patch state for one shadow record.
#[derive(Debug, Clone)]
pub struct OverlayEntry {
	pub patched: AttrValue,
	pub original: AttrValue,
	predicate: MergePredicate,
}

impl OverlayEntry {
	/// Seeds an entry from the shadow's current (host-native) value and
	/// the source's value, which is promoted only if the gate accepts.
	pub fn new(original: AttrValue, incoming: Option<AttrValue>, predicate: MergePredicate) -> Self {
		let patched = match incoming {
			Some(incoming) if predicate(&original, &incoming) => incoming,
			_ => original.clone(),
		};
		Self { patched, original, predicate }
	}

	/// An external write is always captured as the new host-native
	/// value, but only promoted to the patched value when accepted.
	pub fn external_write(&mut self, incoming: AttrValue) {
		self.original = incoming.clone();
		if (self.predicate)(&self.patched, &incoming) {
			self.patched = incoming;
		}
	}

	/// Applies a value mirrored from the source. Returns whether the
	/// patched value changed.
	pub fn merge_from_source(&mut self, incoming: AttrValue) -> bool {
		if (self.predicate)(&self.patched, &incoming) {
			self.patched = incoming;
			true
		} else {
			false
		}
	}
}

/// The overlay table proper.
#[derive(Debug, Default)]
pub struct AttributeOverlay {
	entries: HashMap<(AppId, Attr), OverlayEntry>,
}

impl AttributeOverlay {
	pub fn insert(&mut self, id: AppId, attr: Attr, entry: OverlayEntry) {
		self.entries.insert((id, attr), entry);
	}

	pub fn entry_mut(&mut self, id: AppId, attr: Attr) -> Option<&mut OverlayEntry> {
		self.entries.get_mut(&(id, attr))
	}

	/// Patched view of an attribute, if it is overlaid.
	pub fn read(&self, id: AppId, attr: Attr) -> Option<&AttrValue> {
		self.entries.get(&(id, attr)).map(|entry| &entry.patched)
	}

	/// Removes and returns every entry for `id`, for restoration.
	pub fn take_record(&mut self, id: AppId) -> Vec<(Attr, OverlayEntry)> {
		let attrs: Vec<Attr> = self
			.entries
			.keys()
			.filter(|(entry_id, _)| *entry_id == id)
			.map(|(_, attr)| *attr)
			.collect();
		attrs
			.into_iter()
			.filter_map(|attr| self.entries.remove(&(id, attr)).map(|entry| (attr, entry)))
			.collect()
	}
}
