//! Step-tagged diagnostic screenshots, scoped per account.
//!
//! Purely observational: artifacts are written for offline debugging of
//! automation drift and never read back.

use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::debug;

use crate::driver::PageDriver;
use crate::error::Result;
use crate::workspace::account_dir_name;

/// Screenshot sink for one account.
#[derive(Debug, Clone)]
pub struct DiagnosticSink {
	dir: PathBuf,
}

impl DiagnosticSink {
	pub fn for_account(screenshots_root: &Path, email: &str) -> Result<Self> {
		let dir = screenshots_root.join(account_dir_name(email));
		std::fs::create_dir_all(&dir)?;
		Ok(Self { dir })
	}

	/// Path for a new `<tag>_<timestamp>.png` artifact.
	pub fn shot_path(&self, tag: &str) -> PathBuf {
		let stamp = Local::now().format("%Y%m%d_%H%M%S");
		self.dir.join(format!("{tag}_{stamp}.png"))
	}

	/// Captures a screenshot tagged with the current step. Capture errors
	/// are swallowed after a debug event; a failed screenshot must not turn
	/// a recoverable step into a failure.
	pub async fn capture<P: PageDriver + ?Sized>(&self, page: &P, tag: &str) {
		let path = self.shot_path(tag);
		if let Err(err) = page.screenshot(&path).await {
			debug!(target = "arl.diag", tag, error = %err, "screenshot capture failed");
		}
	}
}

#[cfg(test)]
mod tests {
	use tempfile::TempDir;

	use super::*;

	#[test]
	fn shot_paths_are_tagged_and_account_scoped() {
		let temp = TempDir::new().unwrap();
		let sink = DiagnosticSink::for_account(temp.path(), "a@x.com").unwrap();

		let path = sink.shot_path("captcha_detected");
		let name = path.file_name().unwrap().to_string_lossy().to_string();
		assert!(name.starts_with("captcha_detected_"));
		assert!(name.ends_with(".png"));
		assert!(path.parent().unwrap().ends_with("a_x.com"));
	}
}
