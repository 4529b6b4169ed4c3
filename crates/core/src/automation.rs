//! Exclusive ownership of the one live automation engine.
//!
//! All automation runs through a single engine with a single persistent
//! profile, so every operation is serialized behind one lock. That keeps
//! resource usage bounded to one visible browser surface and rules out
//! concurrent sessions racing on the profile directory.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::driver::{AutomationEngine, PageDriver};
use crate::error::Result;

/// Serializing wrapper around the one engine instance.
pub struct AutomationHandle<E: AutomationEngine> {
	engine: E,
	gate: Mutex<()>,
}

impl<E: AutomationEngine> AutomationHandle<E> {
	pub fn new(engine: E) -> Self {
		Self {
			engine,
			gate: Mutex::new(()),
		}
	}

	pub fn engine(&self) -> &E {
		&self.engine
	}

	/// Starts the engine if it is not running yet.
	pub async fn ensure_started(&self) -> Result<()> {
		let _guard = self.gate.lock().await;
		self.engine.start().await?;
		Ok(())
	}

	/// Runs `work` against a fresh page under the automation lock.
	///
	/// The engine is started lazily, the page is closed on every exit path
	/// (normal return, typed failure, or fault), and the lock is held for
	/// the whole scope so no second page can open before this one closes.
	pub async fn with_page<T, F, Fut>(&self, work: F) -> Result<T>
	where
		F: FnOnce(Arc<E::Page>) -> Fut,
		Fut: Future<Output = Result<T>>,
	{
		let _guard = self.gate.lock().await;
		self.engine.start().await?;

		let page = Arc::new(self.engine.open_page().await?);
		let result = work(Arc::clone(&page)).await;

		if let Err(err) = page.close().await {
			warn!(target = "arl.automation", error = %err, "failed to close page");
		}
		result
	}

	/// Stops the engine. Teardown-tolerant: a shutdown failure is logged
	/// and swallowed, and the engine clears its handles either way so a
	/// later start can recover.
	pub async fn stop(&self) {
		let _guard = self.gate.lock().await;
		if let Err(err) = self.engine.shutdown().await {
			warn!(target = "arl.automation", error = %err, "engine shutdown reported an error");
		} else {
			debug!(target = "arl.automation", "engine stopped");
		}
	}
}
