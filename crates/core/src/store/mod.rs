//! File-backed registry of accounts and their acquired session tokens.
//!
//! One JSON array document backs the whole registry: loaded fully on open,
//! rewritten fully (pretty-printed) on every mutation. A missing or corrupt
//! file degrades to an empty store and is recreated; a failed rewrite
//! propagates, since silently losing a just-acquired token is unacceptable.
//!
//! The file is single-writer by design. Nothing locks it against external
//! writers; a concurrent editor would cause a lost update.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ArlError, Result};

#[cfg(test)]
mod tests;

const SECS_PER_DAY: u64 = 24 * 3600;

/// Tokens older than this are considered stale and re-acquired.
pub const REFRESH_AFTER_DAYS: u64 = 15;
/// Freshness bound for the low-level validity query.
pub const VALID_MAX_AGE_DAYS: f64 = 1.0;
/// Freshness bound applied when grouping tokens for export.
pub const EXPORT_MAX_AGE_DAYS: f64 = 30.0;

fn default_enabled() -> bool {
	true
}

/// One account's credentials and acquired token.
///
/// Instances handed out by the store are clones; changes are persisted by
/// calling back into [`SessionStore::upsert`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
	pub email: String,
	pub password: String,
	#[serde(default)]
	pub arl: Option<String>,
	#[serde(default)]
	pub last_updated: Option<u64>,
	#[serde(default = "default_enabled", rename = "enable")]
	pub enabled: bool,
	/// Opaque grouping tag consumed by the token export; no semantics here.
	#[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
	pub kind: Option<String>,
}

impl SessionRecord {
	/// True when a non-empty token is present.
	pub fn has_token(&self) -> bool {
		self.arl.as_deref().is_some_and(|arl| !arl.is_empty())
	}

	/// Token age in fractional days, when both token and timestamp exist.
	pub fn token_age_days(&self, now: u64) -> Option<f64> {
		let updated = self.last_updated?;
		Some(now.saturating_sub(updated) as f64 / SECS_PER_DAY as f64)
	}

	/// Leading characters of the token for display; the full value is a
	/// secret and never logged or printed.
	pub fn arl_preview(&self, len: usize) -> Option<String> {
		self.arl
			.as_deref()
			.filter(|arl| !arl.is_empty())
			.map(|arl| arl.chars().take(len).collect())
	}

	fn needs_refresh(&self, now: u64) -> bool {
		let expired = self.last_updated.unwrap_or(0) < now.saturating_sub(REFRESH_AFTER_DAYS * SECS_PER_DAY);
		!self.has_token() || expired
	}
}

/// Whether disabled records participate in a refresh batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefreshPolicy {
	#[default]
	IncludeDisabled,
	SkipDisabled,
}

/// Field set applied by [`SessionStore::upsert`].
///
/// Absent fields are left untouched on an existing record; `enabled` is
/// always applied.
#[derive(Debug, Clone)]
pub struct RecordUpdate<'a> {
	pub email: &'a str,
	pub password: Option<&'a str>,
	pub arl: Option<&'a str>,
	pub enabled: bool,
	pub kind: Option<&'a str>,
}

impl<'a> RecordUpdate<'a> {
	pub fn new(email: &'a str) -> Self {
		Self {
			email,
			password: None,
			arl: None,
			enabled: true,
			kind: None,
		}
	}

	pub fn password(mut self, password: &'a str) -> Self {
		self.password = Some(password);
		self
	}

	pub fn arl(mut self, arl: &'a str) -> Self {
		self.arl = Some(arl);
		self
	}

	pub fn enabled(mut self, enabled: bool) -> Self {
		self.enabled = enabled;
		self
	}

	pub fn kind(mut self, kind: Option<&'a str>) -> Self {
		self.kind = kind;
		self
	}
}

/// The process-wide account registry. Constructed once and injected into
/// callers; there is no hidden global instance.
#[derive(Debug)]
pub struct SessionStore {
	path: PathBuf,
	records: Vec<SessionRecord>,
}

impl SessionStore {
	/// Opens the store at `path`. A missing or unparsable file starts the
	/// store empty and recreates the file; only the recreation write can
	/// fail.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
		let path = path.into();
		let loaded: Option<Vec<SessionRecord>> = fs::read_to_string(&path)
			.ok()
			.and_then(|content| serde_json::from_str(&content).ok());
		let degraded = loaded.is_none();

		let store = Self {
			records: loaded.unwrap_or_default(),
			path,
		};
		if degraded {
			warn!(
				target = "arl.store",
				path = %store.path.display(),
				"session file missing or unparsable; starting empty"
			);
			store.save()?;
		} else {
			debug!(
				target = "arl.store",
				path = %store.path.display(),
				records = store.records.len(),
				"sessions loaded"
			);
		}
		Ok(store)
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn records(&self) -> &[SessionRecord] {
		&self.records
	}

	/// Rewrites the backing file from the in-memory collection.
	pub fn save(&self) -> Result<()> {
		if let Some(parent) = self.path.parent() {
			if !parent.as_os_str().is_empty() {
				fs::create_dir_all(parent)?;
			}
		}
		let json = serde_json::to_string_pretty(&self.records)?;
		fs::write(&self.path, json).map_err(|source| ArlError::StorePersist {
			path: self.path.clone(),
			source,
		})?;
		debug!(
			target = "arl.store",
			path = %self.path.display(),
			records = self.records.len(),
			"sessions saved"
		);
		Ok(())
	}

	pub fn find(&self, email: &str) -> Option<&SessionRecord> {
		self.records.iter().find(|record| record.email == email)
	}

	/// Merges `update` into an existing record or creates a new one, then
	/// saves. Creation without a password fails with
	/// [`ArlError::MissingCredential`]; `lastUpdated` is bumped on every
	/// call.
	pub fn upsert(&mut self, update: RecordUpdate<'_>) -> Result<()> {
		let now = now_ts();
		match self.records.iter_mut().find(|record| record.email == update.email) {
			Some(record) => {
				if let Some(password) = update.password {
					record.password = password.to_string();
				}
				if let Some(arl) = update.arl {
					record.arl = Some(arl.to_string());
				}
				if let Some(kind) = update.kind {
					record.kind = Some(kind.to_string());
				}
				record.enabled = update.enabled;
				record.last_updated = Some(now);
			}
			None => {
				let Some(password) = update.password else {
					return Err(ArlError::MissingCredential {
						email: update.email.to_string(),
					});
				};
				self.records.push(SessionRecord {
					email: update.email.to_string(),
					password: password.to_string(),
					arl: update.arl.map(String::from),
					last_updated: Some(now),
					enabled: update.enabled,
					kind: update.kind.map(String::from),
				});
			}
		}
		self.save()
	}

	/// Records whose token is missing, empty, or older than
	/// [`REFRESH_AFTER_DAYS`], in store order.
	pub fn needs_refresh(&self, policy: RefreshPolicy) -> Vec<SessionRecord> {
		let now = now_ts();
		self.records
			.iter()
			.filter(|record| policy == RefreshPolicy::IncludeDisabled || record.enabled)
			.filter(|record| record.needs_refresh(now))
			.cloned()
			.collect()
	}

	/// Records with a token no older than `max_age_days` (inclusive bound).
	/// Records lacking a token or timestamp are excluded.
	pub fn valid_within_days(&self, max_age_days: f64) -> Vec<SessionRecord> {
		let now = now_ts();
		self.records
			.iter()
			.filter(|record| record.has_token())
			.filter(|record| {
				record
					.token_age_days(now)
					.is_some_and(|age| age <= max_age_days)
			})
			.cloned()
			.collect()
	}

	/// The export-facing validity query with its own, wider bound.
	pub fn valid_for_export(&self) -> Vec<SessionRecord> {
		self.valid_within_days(EXPORT_MAX_AGE_DAYS)
	}
}

/// Current time as epoch seconds.
pub fn now_ts() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.unwrap_or_default()
		.as_secs()
}
