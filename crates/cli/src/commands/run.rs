//! The refresh batch: drive every stale account through the login flow,
//! then export the collected tokens.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arl::store::RefreshPolicy;
use arl::{AcquisitionRunner, AutomationHandle, SessionStore, Workspace};
use colored::Colorize;

use crate::driver::ChromiumEngine;
use crate::{export, output};

pub async fn execute(root: &Path, headless: bool, skip_disabled: bool) -> arl::Result<()> {
	let workspace = Workspace::at(root);
	workspace.ensure()?;

	let mut store = SessionStore::open(workspace.sessions_file())?;
	if store.records().is_empty() {
		println!("{}", "No accounts in data/sessions.json.".yellow());
		println!("Add one with: arl add <email> <password>");
		return Ok(());
	}

	let policy = if skip_disabled {
		RefreshPolicy::SkipDisabled
	} else {
		RefreshPolicy::IncludeDisabled
	};
	let engine = ChromiumEngine::new(workspace.profile_dir(), headless);
	let runner =
		AcquisitionRunner::new(AutomationHandle::new(engine), workspace.clone()).with_policy(policy);

	// Ctrl-C stops the batch between accounts; the one in flight finishes
	// and teardown still runs.
	let interrupt = Arc::new(AtomicBool::new(false));
	{
		let interrupt = Arc::clone(&interrupt);
		tokio::spawn(async move {
			if tokio::signal::ctrl_c().await.is_ok() {
				interrupt.store(true, Ordering::SeqCst);
				eprintln!("\ninterrupt received, finishing the current account before teardown");
				if tokio::signal::ctrl_c().await.is_ok() {
					eprintln!("second interrupt, exiting now");
					std::process::exit(130);
				}
			}
		});
	}

	let summary = runner.run(&mut store, &interrupt).await?;
	output::print_summary(&summary);

	let written = export::write_exports(&workspace, &store, &summary.outcomes)?;
	for (kind, count, path) in &written {
		println!("Wrote {} ({count} tokens for type '{kind}')", path.display());
	}
	Ok(())
}
