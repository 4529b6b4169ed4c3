//! On-disk layout for the store, diagnostic artifacts, and the browser
//! profile, rooted at one working directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Directory layout under a single root.
#[derive(Debug, Clone)]
pub struct Workspace {
	root: PathBuf,
}

impl Workspace {
	pub fn at(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	/// Creates the directory tree. Idempotent.
	pub fn ensure(&self) -> Result<()> {
		for dir in [
			self.data_dir(),
			self.screenshots_dir(),
			self.logs_dir(),
			self.profile_dir(),
		] {
			fs::create_dir_all(dir)?;
		}
		Ok(())
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn data_dir(&self) -> PathBuf {
		self.root.join("data")
	}

	/// The JSON document backing the session store.
	pub fn sessions_file(&self) -> PathBuf {
		self.data_dir().join("sessions.json")
	}

	pub fn screenshots_dir(&self) -> PathBuf {
		self.root.join("screenshots")
	}

	pub fn logs_dir(&self) -> PathBuf {
		self.root.join("logs")
	}

	/// Persistent browser profile; cookies and local storage survive runs.
	pub fn profile_dir(&self) -> PathBuf {
		self.root.join("user_data")
	}

	/// Per-type token export file (`data/arls_<kind>.txt`).
	pub fn export_file(&self, kind: &str) -> PathBuf {
		self.data_dir().join(format!("arls_{kind}.txt"))
	}
}

/// Directory-safe name for an account (`a@x.com` -> `a_x.com`).
pub fn account_dir_name(email: &str) -> String {
	email.replace('@', "_")
}

#[cfg(test)]
mod tests {
	use tempfile::TempDir;

	use super::*;

	#[test]
	fn ensure_creates_the_full_tree() {
		let temp = TempDir::new().unwrap();
		let workspace = Workspace::at(temp.path());
		workspace.ensure().unwrap();

		assert!(workspace.data_dir().is_dir());
		assert!(workspace.screenshots_dir().is_dir());
		assert!(workspace.logs_dir().is_dir());
		assert!(workspace.profile_dir().is_dir());
	}

	#[test]
	fn export_file_is_keyed_by_kind() {
		let workspace = Workspace::at("/tmp/w");
		assert!(workspace.export_file("premium").ends_with("data/arls_premium.txt"));
	}

	#[test]
	fn account_dir_name_replaces_at_sign() {
		assert_eq!(account_dir_name("a@x.com"), "a_x.com");
	}
}
