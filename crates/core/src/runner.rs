//! Sequential batch refresh over the accounts that need a new token.
//!
//! Accounts are processed strictly one at a time, in store order. A token
//! for one account is persisted before the next account begins, so partial
//! batch progress survives a later crash. A randomized pause separates
//! consecutive accounts to avoid a mechanical request cadence.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, error, info, warn};

use crate::automation::AutomationHandle;
use crate::config::{FlowTimeouts, Pacing};
use crate::diag::DiagnosticSink;
use crate::driver::AutomationEngine;
use crate::error::Result;
use crate::flow::{FlowOutcome, LoginFlow};
use crate::logging::AccountLog;
use crate::store::{RecordUpdate, RefreshPolicy, SessionRecord, SessionStore};
use crate::workspace::Workspace;

/// Result for one processed account.
#[derive(Debug, Clone)]
pub struct AccountOutcome {
	pub email: String,
	/// Export grouping tag carried from the record.
	pub kind: Option<String>,
	pub token: Option<String>,
	/// Reason when no token was obtained.
	pub failure: Option<String>,
}

impl AccountOutcome {
	pub fn succeeded(&self) -> bool {
		self.token.is_some()
	}
}

/// Tally of a completed or interrupted batch.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
	pub attempted: usize,
	pub succeeded: usize,
	pub failed: usize,
	pub interrupted: bool,
	pub outcomes: Vec<AccountOutcome>,
}

/// Sequences login attempts through the shared automation handle.
pub struct AcquisitionRunner<E: AutomationEngine> {
	handle: AutomationHandle<E>,
	workspace: Workspace,
	timeouts: FlowTimeouts,
	pacing: Pacing,
	policy: RefreshPolicy,
}

impl<E: AutomationEngine> AcquisitionRunner<E> {
	pub fn new(handle: AutomationHandle<E>, workspace: Workspace) -> Self {
		Self {
			handle,
			workspace,
			timeouts: FlowTimeouts::default(),
			pacing: Pacing::default(),
			policy: RefreshPolicy::default(),
		}
	}

	pub fn with_timeouts(mut self, timeouts: FlowTimeouts) -> Self {
		self.timeouts = timeouts;
		self
	}

	pub fn with_pacing(mut self, pacing: Pacing) -> Self {
		self.pacing = pacing;
		self
	}

	pub fn with_policy(mut self, policy: RefreshPolicy) -> Self {
		self.policy = policy;
		self
	}

	/// Runs the batch over the needs-refresh set. `interrupt` is observed
	/// between accounts; the engine is stopped before returning on every
	/// path.
	pub async fn run(&self, store: &mut SessionStore, interrupt: &AtomicBool) -> Result<BatchSummary> {
		let result = self.run_batch(store, interrupt).await;
		self.handle.stop().await;
		result
	}

	async fn run_batch(
		&self,
		store: &mut SessionStore,
		interrupt: &AtomicBool,
	) -> Result<BatchSummary> {
		let batch = store.needs_refresh(self.policy);
		let total = batch.len();
		info!(target = "arl.runner", total, "starting refresh batch");

		let mut summary = BatchSummary::default();
		for (index, account) in batch.iter().enumerate() {
			if interrupt.load(Ordering::SeqCst) {
				warn!(target = "arl.runner", "interrupt requested, skipping remaining accounts");
				summary.interrupted = true;
				break;
			}

			info!(
				target = "arl.runner",
				account = %account.email,
				position = index + 1,
				total,
				"processing account"
			);
			let outcome = self.refresh_account(store, account).await?;
			summary.outcomes.push(outcome);

			if index + 1 < total {
				let pause = self.pacing.sample();
				debug!(
					target = "arl.runner",
					ms = pause.as_millis() as u64,
					"pacing before next account"
				);
				tokio::time::sleep(pause).await;
			}
		}

		summary.attempted = summary.outcomes.len();
		summary.succeeded = summary.outcomes.iter().filter(|outcome| outcome.succeeded()).count();
		summary.failed = summary.attempted - summary.succeeded;
		Ok(summary)
	}

	/// One account end to end: flow through the handle, then an immediate
	/// store write on success. Negative outcomes and faults leave the
	/// store untouched; only a failed persist aborts the batch.
	async fn refresh_account(
		&self,
		store: &mut SessionStore,
		account: &SessionRecord,
	) -> Result<AccountOutcome> {
		let log = AccountLog::open(&self.workspace.logs_dir(), &account.email)?;
		let diag = DiagnosticSink::for_account(&self.workspace.screenshots_dir(), &account.email)?;
		log.info("starting session acquisition");

		let log_ref = &log;
		let diag_ref = &diag;
		let timeouts = &self.timeouts;
		let flow_result = self
			.handle
			.with_page(|page| async move {
				LoginFlow::new(page.as_ref(), account, log_ref, diag_ref, timeouts)
					.run()
					.await
			})
			.await;

		let outcome = match flow_result {
			Ok(FlowOutcome::Token(token)) => {
				store.upsert(
					RecordUpdate::new(&account.email)
						.arl(&token)
						.enabled(account.enabled),
				)?;
				log.info("token stored");
				AccountOutcome {
					email: account.email.clone(),
					kind: account.kind.clone(),
					token: Some(token),
					failure: None,
				}
			}
			Ok(negative) => {
				let reason = negative.failure_reason().unwrap_or("unknown failure");
				log.error(&format!("no token obtained: {reason}"));
				AccountOutcome {
					email: account.email.clone(),
					kind: account.kind.clone(),
					token: None,
					failure: Some(reason.to_string()),
				}
			}
			Err(err) => {
				error!(
					target = "arl.runner",
					account = %account.email,
					error = %err,
					"critical fault during acquisition"
				);
				AccountOutcome {
					email: account.email.clone(),
					kind: account.kind.clone(),
					token: None,
					failure: Some(format!("critical error: {err}")),
				}
			}
		};
		Ok(outcome)
	}
}
