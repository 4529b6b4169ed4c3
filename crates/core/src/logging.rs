//! Per-account append-only log streams.
//!
//! Each account gets its own `logs.txt` under `logs/<account>/` so the
//! history of one account's attempts reads linearly, independent of every
//! other account's. Lines are mirrored to stdout prefixed with the account
//! so interactive runs show progress inline.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::debug;

use crate::error::Result;
use crate::workspace::account_dir_name;

/// Severity of an account log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
	Info,
	Warn,
	Error,
}

impl LogLevel {
	fn label(self) -> &'static str {
		match self {
			Self::Info => "INFO",
			Self::Warn => "WARNING",
			Self::Error => "ERROR",
		}
	}
}

/// Append-only, timestamped log stream for one account.
#[derive(Debug)]
pub struct AccountLog {
	email: String,
	path: PathBuf,
}

impl AccountLog {
	/// Opens the stream for `email`, creating its directory as needed.
	pub fn open(logs_root: &Path, email: &str) -> Result<Self> {
		let dir = logs_root.join(account_dir_name(email));
		std::fs::create_dir_all(&dir)?;
		Ok(Self {
			email: email.to_string(),
			path: dir.join("logs.txt"),
		})
	}

	pub fn info(&self, message: &str) {
		self.log(LogLevel::Info, message);
	}

	pub fn warn(&self, message: &str) {
		self.log(LogLevel::Warn, message);
	}

	pub fn error(&self, message: &str) {
		self.log(LogLevel::Error, message);
	}

	/// Writes one line at `level`. File errors are swallowed after a debug
	/// event; diagnostics must never abort an acquisition.
	pub fn log(&self, level: LogLevel, message: &str) {
		let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
		let line = format!("{stamp} - {} - {message}\n", level.label());
		let appended = OpenOptions::new()
			.create(true)
			.append(true)
			.open(&self.path)
			.and_then(|mut file| file.write_all(line.as_bytes()));
		if let Err(err) = appended {
			debug!(
				target = "arl.log",
				path = %self.path.display(),
				error = %err,
				"failed to append account log line"
			);
		}

		println!("[{}] {message}", self.email);
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

#[cfg(test)]
mod tests {
	use tempfile::TempDir;

	use super::*;

	#[test]
	fn lines_accumulate_with_level_labels() {
		let temp = TempDir::new().unwrap();
		let log = AccountLog::open(temp.path(), "a@x.com").unwrap();

		log.info("first");
		log.warn("second");
		log.error("third");

		let content = std::fs::read_to_string(log.path()).unwrap();
		let lines: Vec<&str> = content.lines().collect();
		assert_eq!(lines.len(), 3);
		assert!(lines[0].contains(" - INFO - first"));
		assert!(lines[1].contains(" - WARNING - second"));
		assert!(lines[2].contains(" - ERROR - third"));
	}

	#[test]
	fn stream_lives_under_the_sanitized_account_dir() {
		let temp = TempDir::new().unwrap();
		let log = AccountLog::open(temp.path(), "a@x.com").unwrap();
		assert!(log.path().ends_with("a_x.com/logs.txt"));
	}
}
