//! Create or update one account record.

use std::path::Path;

use arl::{RecordUpdate, SessionStore, Workspace};
use colored::Colorize;

pub fn execute(
	root: &Path,
	email: &str,
	password: &str,
	kind: Option<&str>,
	disabled: bool,
) -> arl::Result<()> {
	let workspace = Workspace::at(root);
	workspace.ensure()?;
	let mut store = SessionStore::open(workspace.sessions_file())?;

	let existed = store.find(email).is_some();
	store.upsert(
		RecordUpdate::new(email)
			.password(password)
			.enabled(!disabled)
			.kind(kind),
	)?;

	let verb = if existed { "Updated" } else { "Added" };
	println!("{} {email}", verb.green());
	Ok(())
}
