//! Host descriptors returned by discovery and lookup RPCs.

use serde::{Deserialize, Serialize};

/// A game-streaming host as reported by discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStreamHost {
	pub address: String,
	pub host_name: String,
	pub mac: String,
	pub unique_id: String,
	/// Id of the game currently streamed by the host, `0` when idle.
	#[serde(default)]
	pub current_game: u32,
}
