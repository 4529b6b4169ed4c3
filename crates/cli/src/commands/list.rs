//! Table of stored accounts and token freshness.

use std::path::Path;

use arl::store::now_ts;
use arl::{SessionStore, Workspace};

pub fn execute(root: &Path) -> arl::Result<()> {
	let workspace = Workspace::at(root);
	let store = SessionStore::open(workspace.sessions_file())?;

	if store.records().is_empty() {
		println!("No accounts stored.");
		return Ok(());
	}

	println!("{:<32} {:<8} {:<10} {:<14} {}", "EMAIL", "ENABLED", "TYPE", "TOKEN", "AGE");
	println!("{}", "-".repeat(74));

	let now = now_ts();
	for record in store.records() {
		let token = record
			.arl_preview(10)
			.map(|preview| format!("{preview}..."))
			.unwrap_or_else(|| "-".to_string());
		let age = record
			.token_age_days(now)
			.map(|age| format!("{age:.1}d"))
			.unwrap_or_else(|| "-".to_string());
		let kind = record.kind.as_deref().unwrap_or("-");
		println!(
			"{:<32} {:<8} {:<10} {:<14} {}",
			record.email, record.enabled, kind, token, age
		);
	}

	println!();
	println!("Total: {} accounts", store.records().len());
	Ok(())
}
