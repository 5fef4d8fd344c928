//! Error types for castway-core.

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
	/// The host's catalog handle has been dropped; callers treat the
	/// operation as a logged no-op.
	#[error("host catalog is unavailable")]
	StoreUnavailable,

	/// The shortcut registry has not finished its initial scan.
	#[error("shortcut registry is not ready")]
	NotReady,

	/// A host-side write did not take effect within the bounded retry
	/// budget.
	#[error("{op} did not take effect after {attempts} attempts")]
	RetryExhausted { op: &'static str, attempts: u32 },

	/// The shortcut host rejected an operation outright.
	#[error("shortcut host rejected {op} for app {app_id}")]
	ShortcutOp { op: &'static str, app_id: u32 },

	/// The host catalog is corrupted beyond what retries can fix; the
	/// only recovery is restarting the host client.
	#[error("host catalog requires a restart")]
	RestartRequired,
}
