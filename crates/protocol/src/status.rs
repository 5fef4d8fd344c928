//! Typed status sentinels for the remote host and its companion service.
//!
//! Every RPC across the command channel resolves to one of these values
//! instead of erroring; transport failure maps to the offline sentinel.

use serde::{Deserialize, Serialize};

/// Reachability and pairing state of the companion service on the host PC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BuddyStatus {
	VersionMismatch,
	Restarting,
	ShuttingDown,
	Suspending,
	NoClientId,
	NotPaired,
	Pairing,
	SslVerificationFailed,
	Exception,
	#[default]
	Offline,
	Online,
}

impl BuddyStatus {
	pub fn is_online(self) -> bool {
		self == BuddyStatus::Online
	}
}

/// Reachability of the game-streaming server itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HostStatus {
	#[default]
	Offline,
	Online,
}

impl HostStatus {
	pub fn is_online(self) -> bool {
		self == HostStatus::Online
	}
}

/// Outcome of asking the companion service to begin pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PairingStartStatus {
	AlreadyPaired,
	VersionMismatch,
	NoClientId,
	Pairing,
	#[default]
	Offline,
	Failed,
	PairingStarted,
}

/// Power-state transition requested on the host PC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PcStateChange {
	Restart,
	Shutdown,
	Suspend,
}
