//! Cancellation signal for long-running retrievals.
//!
//! The retry loop checks the token before every query and every delay, so
//! a caller can abandon a retrieval between attempts without waiting out
//! the remaining budget.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Write side of a cancellation signal.
#[derive(Debug, Clone)]
pub struct CancelHandle {
	tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
	pub fn new() -> Self {
		let (tx, _rx) = watch::channel(false);
		Self { tx: Arc::new(tx) }
	}

	pub fn token(&self) -> CancelToken {
		CancelToken {
			rx: Some(self.tx.subscribe()),
		}
	}

	pub fn cancel(&self) {
		let _ = self.tx.send(true);
	}

	/// Fires the signal after `deadline`, turning the token into an
	/// overall-deadline guard.
	pub fn arm_deadline(&self, deadline: Duration) {
		let tx = self.tx.clone();
		tokio::spawn(async move {
			tokio::time::sleep(deadline).await;
			let _ = tx.send(true);
		});
	}
}

impl Default for CancelHandle {
	fn default() -> Self {
		Self::new()
	}
}

/// Read side of a cancellation signal.
#[derive(Debug, Clone)]
pub struct CancelToken {
	rx: Option<watch::Receiver<bool>>,
}

impl CancelToken {
	/// A token that can never fire, for callers without a deadline.
	pub fn never() -> Self {
		Self { rx: None }
	}

	pub fn is_cancelled(&self) -> bool {
		match &self.rx {
			Some(rx) => *rx.borrow(),
			None => false,
		}
	}

	/// Resolves once the signal fires. Pends forever for `never` tokens
	/// and for tokens whose handle was dropped without cancelling.
	pub async fn cancelled(&self) {
		let Some(rx) = &self.rx else {
			return std::future::pending().await;
		};
		let mut rx = rx.clone();
		if rx.wait_for(|cancelled| *cancelled).await.is_err() {
			std::future::pending::<()>().await;
		}
	}
}
