//! Shadow/source pairing table.
//!
//! A pairing links a shadow record (castway-owned shortcut) to a source
//! record (the real catalog entry it fronts). Both sides are unique: a
//! record participates in at most one pairing, and never as both roles.

use std::collections::HashMap;

use crate::catalog::AppId;

#[derive(Debug, Default)]
pub struct PairingTable {
	shadow_to_source: HashMap<AppId, AppId>,
	source_to_shadow: HashMap<AppId, AppId>,
}

impl PairingTable {
	/// Shadow pairings that `insert(shadow, source)` would tear down.
	///
	/// Re-pairing an already-paired shadow counts: its old pairing must
	/// be torn down (and the shadow restored) before the new one lands.
	pub fn displaced_by(&self, shadow: AppId, source: AppId) -> Vec<AppId> {
		let mut displaced = Vec::new();
		if self.shadow_to_source.contains_key(&shadow) {
			displaced.push(shadow);
		}
		if let Some(&existing) = self.source_to_shadow.get(&source) {
			if existing != shadow {
				displaced.push(existing);
			}
		}
		displaced
	}

	/// Registers a pairing. Callers resolve displacements first via
	/// [`PairingTable::displaced_by`]; any leftover conflicting entries
	/// are dropped here so uniqueness always holds.
	pub fn insert(&mut self, shadow: AppId, source: AppId) {
		if let Some(old_source) = self.shadow_to_source.remove(&shadow) {
			self.source_to_shadow.remove(&old_source);
		}
		if let Some(old_shadow) = self.source_to_shadow.remove(&source) {
			self.shadow_to_source.remove(&old_shadow);
		}
		self.shadow_to_source.insert(shadow, source);
		self.source_to_shadow.insert(source, shadow);
	}

	/// Unregisters a shadow; returns the source it fronted, if paired.
	pub fn remove_shadow(&mut self, shadow: AppId) -> Option<AppId> {
		let source = self.shadow_to_source.remove(&shadow)?;
		self.source_to_shadow.remove(&source);
		Some(source)
	}

	pub fn source_for(&self, shadow: AppId) -> Option<AppId> {
		self.shadow_to_source.get(&shadow).copied()
	}

	pub fn shadow_for(&self, source: AppId) -> Option<AppId> {
		self.source_to_shadow.get(&source).copied()
	}

	pub fn shadows(&self) -> Vec<AppId> {
		self.shadow_to_source.keys().copied().collect()
	}

	pub fn is_empty(&self) -> bool {
		self.shadow_to_source.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn pairing_is_unique_on_both_sides() {
		let mut table = PairingTable::default();
		table.insert(AppId(500), AppId(42));
		table.insert(AppId(501), AppId(42));

		assert_eq!(table.source_for(AppId(500)), None);
		assert_eq!(table.source_for(AppId(501)), Some(AppId(42)));
		assert_eq!(table.shadow_for(AppId(42)), Some(AppId(501)));
	}

	#[test]
	fn displacement_reports_both_conflict_kinds() {
		let mut table = PairingTable::default();
		table.insert(AppId(500), AppId(42));
		table.insert(AppId(501), AppId(43));

		// 500 is re-paired, and 43's shadow 501 loses its source.
		let mut displaced = table.displaced_by(AppId(500), AppId(43));
		displaced.sort();
		assert_eq!(displaced, vec![AppId(500), AppId(501)]);
	}

	#[test]
	fn remove_returns_the_fronted_source() {
		let mut table = PairingTable::default();
		table.insert(AppId(500), AppId(42));

		assert_eq!(table.remove_shadow(AppId(500)), Some(AppId(42)));
		assert_eq!(table.remove_shadow(AppId(500)), None);
		assert!(table.is_empty());
	}
}
