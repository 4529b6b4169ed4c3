//! Regenerate the per-type token files from stored valid tokens.

use std::path::Path;

use arl::{SessionStore, Workspace};

pub fn execute(root: &Path, max_age_days: f64) -> arl::Result<()> {
	let workspace = Workspace::at(root);
	workspace.ensure()?;
	let store = SessionStore::open(workspace.sessions_file())?;

	let written = crate::export::write_valid(&workspace, &store, max_age_days)?;
	if written.is_empty() {
		println!("No valid tokens to export.");
	}
	for (kind, count, path) in &written {
		println!("Wrote {} ({count} tokens for type '{kind}')", path.display());
	}
	Ok(())
}
