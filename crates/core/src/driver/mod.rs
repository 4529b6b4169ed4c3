//! Browser capability surface consumed by the login flow.
//!
//! The engine behind these traits is an external collaborator: a real
//! Chromium driven over CDP in the CLI, or the in-memory
//! [`scripted`] driver in tests. The core only consumes the surface —
//! navigation, element waits, cookie access, screenshots — and never
//! reaches into an engine directly.

pub mod scripted;

use std::fmt;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// Failures surfaced by an engine or page.
///
/// Timeouts are ordinary outcomes for the flow (it maps them to typed
/// negative results); everything else is treated as an engine fault.
#[derive(Debug, Error)]
pub enum DriverError {
	#[error("timed out after {ms}ms waiting for {what}")]
	Timeout { ms: u128, what: String },

	#[error("no element matched {0}")]
	NotFound(String),

	#[error("engine fault: {0}")]
	Engine(String),
}

impl DriverError {
	pub fn timeout(bound: Duration, what: impl Into<String>) -> Self {
		Self::Timeout {
			ms: bound.as_millis(),
			what: what.into(),
		}
	}

	pub fn is_timeout(&self) -> bool {
		matches!(self, Self::Timeout { .. })
	}
}

/// How the flow addresses an element on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
	/// Value of a `data-testid` attribute.
	TestId(&'static str),
	/// Raw CSS selector.
	Css(&'static str),
	/// Element whose text content equals the given string.
	Text(&'static str),
}

impl fmt::Display for Locator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::TestId(id) => write!(f, "testid={id}"),
			Self::Css(css) => write!(f, "css={css}"),
			Self::Text(text) => write!(f, "text={text}"),
		}
	}
}

/// Per-page operations the flow needs.
///
/// Every wait takes an explicit bound; exceeding it yields
/// [`DriverError::Timeout`], never an unbounded hang.
#[async_trait]
pub trait PageDriver: Send + Sync {
	/// Loads `url` and waits for the load to finish, within `timeout`.
	async fn navigate(&self, url: &str, timeout: Duration) -> DriverResult<()>;

	async fn current_url(&self) -> DriverResult<String>;

	/// Non-waiting presence probe.
	async fn is_present(&self, locator: &Locator) -> DriverResult<bool>;

	/// Clicks the element once it is actionable, within `timeout`.
	async fn click(&self, locator: &Locator, timeout: Duration) -> DriverResult<()>;

	/// Types `text` into the element one character at a time, pausing
	/// `keystroke_delay` between characters to mirror human input pacing.
	async fn type_text(
		&self,
		locator: &Locator,
		text: &str,
		keystroke_delay: Duration,
	) -> DriverResult<()>;

	async fn wait_for_url_prefix(&self, prefix: &str, timeout: Duration) -> DriverResult<()>;

	async fn wait_for_visible(&self, locator: &Locator, timeout: Duration) -> DriverResult<()>;

	/// Waits for a previously present element to leave the DOM.
	async fn wait_for_detached(&self, locator: &Locator, timeout: Duration) -> DriverResult<()>;

	/// Value of the named cookie in the browsing context, if set.
	async fn cookie(&self, name: &str) -> DriverResult<Option<String>>;

	/// Drops every cookie in the browsing context.
	async fn clear_cookies(&self) -> DriverResult<()>;

	/// Captures a PNG screenshot of the current viewport to `path`.
	async fn screenshot(&self, path: &Path) -> DriverResult<()>;

	/// Releases the page. Further calls on the page are undefined.
	async fn close(&self) -> DriverResult<()>;
}

/// Lifecycle of the one engine instance behind the automation handle.
#[async_trait]
pub trait AutomationEngine: Send + Sync + 'static {
	type Page: PageDriver + Send + Sync + 'static;

	/// Starts the engine if it is not already running. Idempotent.
	async fn start(&self) -> DriverResult<()>;

	/// Opens a fresh page in the running engine.
	async fn open_page(&self) -> DriverResult<Self::Page>;

	/// Stops the engine and releases its resources, clearing internal
	/// handles so a later [`start`](Self::start) can recover. Idempotent.
	async fn shutdown(&self) -> DriverResult<()>;
}
