//! User-facing notices ("toasts").
//!
//! The core never renders anything; it pushes notices into an unbounded
//! channel that presentation code drains. Every notice is also logged.

use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
	Info,
	Warn,
	Error,
}

/// One user-visible notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
	pub level: NoticeLevel,
	pub message: String,
}

/// Cloneable sender half for surfacing notices.
#[derive(Debug, Clone)]
pub struct Notifier {
	tx: mpsc::UnboundedSender<Notice>,
}

impl Notifier {
	pub fn new() -> (Self, mpsc::UnboundedReceiver<Notice>) {
		let (tx, rx) = mpsc::unbounded_channel();
		(Self { tx }, rx)
	}

	pub fn toast(&self, message: impl Into<String>) {
		self.push(NoticeLevel::Info, message.into());
	}

	pub fn warn(&self, message: impl Into<String>) {
		self.push(NoticeLevel::Warn, message.into());
	}

	pub fn error(&self, message: impl Into<String>) {
		self.push(NoticeLevel::Error, message.into());
	}

	fn push(&self, level: NoticeLevel, message: String) {
		match level {
			NoticeLevel::Info => info!(target: "castway.notify", %message, "toast"),
			NoticeLevel::Warn => warn!(target: "castway.notify", %message, "toast"),
			NoticeLevel::Error => error!(target: "castway.notify", %message, "toast"),
		}
		// Nobody listening is fine; notices are best effort.
		let _ = self.tx.send(Notice { level, message });
	}
}
