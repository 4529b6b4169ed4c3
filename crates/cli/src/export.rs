//! Per-type token export files.
//!
//! Successful tokens are grouped by the record's opaque `type` tag and
//! written comma-joined, one `data/arls_<type>.txt` per tag. Records
//! without a tag land in the `unknown` group.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use arl::runner::AccountOutcome;
use arl::store::EXPORT_MAX_AGE_DAYS;
use arl::{SessionStore, Workspace};

const UNKNOWN_KIND: &str = "unknown";

/// `(kind, token count, file path)` per written export file.
pub type Written = Vec<(String, usize, PathBuf)>;

/// Exports this run's fresh tokens. A run that yielded none falls back to
/// stored tokens still inside the export freshness bound, so downstream
/// consumers always see the best available set.
pub fn write_exports(
	workspace: &Workspace,
	store: &SessionStore,
	outcomes: &[AccountOutcome],
) -> arl::Result<Written> {
	let mut by_kind: BTreeMap<String, Vec<String>> = BTreeMap::new();
	for outcome in outcomes {
		let Some(token) = &outcome.token else {
			continue;
		};
		let kind = outcome
			.kind
			.clone()
			.or_else(|| store.find(&outcome.email).and_then(|record| record.kind.clone()))
			.unwrap_or_else(|| UNKNOWN_KIND.to_string());
		by_kind.entry(kind).or_default().push(token.clone());
	}

	if by_kind.is_empty() {
		return write_valid(workspace, store, EXPORT_MAX_AGE_DAYS);
	}
	write_groups(workspace, by_kind)
}

/// Exports stored tokens no older than `max_age_days`, grouped by tag.
pub fn write_valid(
	workspace: &Workspace,
	store: &SessionStore,
	max_age_days: f64,
) -> arl::Result<Written> {
	let mut by_kind: BTreeMap<String, Vec<String>> = BTreeMap::new();
	for record in store.valid_within_days(max_age_days) {
		let Some(arl) = record.arl.clone() else {
			continue;
		};
		let kind = record.kind.clone().unwrap_or_else(|| UNKNOWN_KIND.to_string());
		by_kind.entry(kind).or_default().push(arl);
	}
	write_groups(workspace, by_kind)
}

fn write_groups(workspace: &Workspace, by_kind: BTreeMap<String, Vec<String>>) -> arl::Result<Written> {
	let mut written = Vec::new();
	for (kind, tokens) in by_kind {
		let path = workspace.export_file(&kind);
		fs::write(&path, tokens.join(","))?;
		written.push((kind, tokens.len(), path));
	}
	Ok(written)
}

#[cfg(test)]
mod tests {
	use arl::RecordUpdate;
	use tempfile::TempDir;

	use super::*;

	fn workspace_with_store(temp: &TempDir) -> (Workspace, SessionStore) {
		let workspace = Workspace::at(temp.path());
		workspace.ensure().unwrap();
		let store = SessionStore::open(workspace.sessions_file()).unwrap();
		(workspace, store)
	}

	fn outcome(email: &str, kind: Option<&str>, token: &str) -> AccountOutcome {
		AccountOutcome {
			email: email.to_string(),
			kind: kind.map(String::from),
			token: Some(token.to_string()),
			failure: None,
		}
	}

	#[test]
	fn fresh_tokens_are_grouped_by_kind() {
		let temp = TempDir::new().unwrap();
		let (workspace, store) = workspace_with_store(&temp);

		let outcomes = [
			outcome("a@x.com", Some("premium"), "ARL-A"),
			outcome("b@x.com", Some("premium"), "ARL-B"),
			outcome("c@x.com", None, "ARL-C"),
		];
		let written = write_exports(&workspace, &store, &outcomes).unwrap();

		assert_eq!(written.len(), 2);
		let premium = fs::read_to_string(workspace.export_file("premium")).unwrap();
		assert_eq!(premium, "ARL-A,ARL-B");
		let unknown = fs::read_to_string(workspace.export_file("unknown")).unwrap();
		assert_eq!(unknown, "ARL-C");
	}

	#[test]
	fn missing_outcome_kind_falls_back_to_the_stored_record() {
		let temp = TempDir::new().unwrap();
		let (workspace, mut store) = workspace_with_store(&temp);
		store
			.upsert(RecordUpdate::new("a@x.com").password("p").kind(Some("free")))
			.unwrap();

		let outcomes = [outcome("a@x.com", None, "ARL-A")];
		write_exports(&workspace, &store, &outcomes).unwrap();

		let free = fs::read_to_string(workspace.export_file("free")).unwrap();
		assert_eq!(free, "ARL-A");
	}

	#[test]
	fn empty_run_falls_back_to_stored_valid_tokens() {
		let temp = TempDir::new().unwrap();
		let (workspace, mut store) = workspace_with_store(&temp);
		store
			.upsert(
				RecordUpdate::new("a@x.com")
					.password("p")
					.arl("ARL-OLD")
					.kind(Some("premium")),
			)
			.unwrap();

		let written = write_exports(&workspace, &store, &[]).unwrap();
		assert_eq!(written.len(), 1);

		let premium = fs::read_to_string(workspace.export_file("premium")).unwrap();
		assert_eq!(premium, "ARL-OLD");
	}

	#[test]
	fn failed_outcomes_contribute_nothing() {
		let temp = TempDir::new().unwrap();
		let (workspace, store) = workspace_with_store(&temp);

		let outcomes = [AccountOutcome {
			email: "a@x.com".to_string(),
			kind: Some("premium".to_string()),
			token: None,
			failure: Some("captcha unresolved".to_string()),
		}];
		let written = write_exports(&workspace, &store, &outcomes).unwrap();
		assert!(written.is_empty());
		assert!(!workspace.export_file("premium").exists());
	}
}
