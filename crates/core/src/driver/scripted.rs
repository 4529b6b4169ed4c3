//! Scripted in-memory driver for exercising the flow and runner without a
//! browser.
//!
//! A [`PageScript`] declares what each step should pretend happened; the
//! page records what the caller actually did so tests can assert on
//! ordering and cleanup. [`ScriptedEngine`] hands out one script per opened
//! page and tracks page lifetimes for serialization assertions.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{AutomationEngine, DriverError, DriverResult, Locator, PageDriver};
use crate::flow;

/// Challenge behavior for one scripted login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptchaScript {
	Absent,
	Resolves,
	NeverResolves,
}

/// What the scripted page pretends happened at each step.
#[derive(Debug, Clone)]
pub struct PageScript {
	/// URL reported after the first navigation; later navigations report
	/// the requested URL.
	pub landing_url: String,
	pub consent_present: bool,
	/// The submit click fails with an engine fault.
	pub submit_fails: bool,
	pub captcha: CaptchaScript,
	/// The post-login redirect into the authenticated area happens.
	pub redirects: bool,
	pub marker_visible: bool,
	/// Session cookie readable from the context, if any.
	pub arl_cookie: Option<String>,
}

impl Default for PageScript {
	/// A clean, successful login yielding the `ARL123` token.
	fn default() -> Self {
		Self {
			landing_url: flow::LOGIN_URL.to_string(),
			consent_present: true,
			submit_fails: false,
			captcha: CaptchaScript::Absent,
			redirects: true,
			marker_visible: true,
			arl_cookie: Some("ARL123".to_string()),
		}
	}
}

/// What a caller did to a scripted page, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
	Navigated(String),
	CookiesCleared,
	Clicked(Locator),
	Typed { locator: Locator, text: String },
	WaitedForUrl(String),
	Screenshot(String),
	Closed,
}

/// Engine-level lifecycle record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
	Started,
	PageOpened(usize),
	PageClosed(usize),
	ShutDown,
}

#[derive(Debug, Default)]
struct EngineState {
	events: Mutex<Vec<EngineEvent>>,
	open_pages: AtomicUsize,
	max_open_pages: AtomicUsize,
	started: AtomicBool,
	next_page_id: AtomicUsize,
}

/// One scripted page.
#[derive(Debug)]
pub struct ScriptedPage {
	script: PageScript,
	id: usize,
	navigations: AtomicUsize,
	current_url: Mutex<String>,
	events: Mutex<Vec<PageEvent>>,
	closed: AtomicBool,
	engine: Option<Arc<EngineState>>,
}

impl ScriptedPage {
	/// Standalone page for flow tests, detached from any engine.
	pub fn new(script: PageScript) -> Self {
		Self::attached(script, 0, None)
	}

	fn attached(script: PageScript, id: usize, engine: Option<Arc<EngineState>>) -> Self {
		Self {
			script,
			id,
			navigations: AtomicUsize::new(0),
			current_url: Mutex::new(String::new()),
			events: Mutex::new(Vec::new()),
			closed: AtomicBool::new(false),
			engine,
		}
	}

	/// Everything the caller did to this page so far.
	pub fn events(&self) -> Vec<PageEvent> {
		self.events.lock().clone()
	}

	pub fn is_closed(&self) -> bool {
		self.closed.load(Ordering::SeqCst)
	}

	fn record(&self, event: PageEvent) {
		self.events.lock().push(event);
	}
}

#[async_trait]
impl PageDriver for ScriptedPage {
	async fn navigate(&self, url: &str, _timeout: Duration) -> DriverResult<()> {
		self.record(PageEvent::Navigated(url.to_string()));
		let first = self.navigations.fetch_add(1, Ordering::SeqCst) == 0;
		*self.current_url.lock() = if first {
			self.script.landing_url.clone()
		} else {
			url.to_string()
		};
		Ok(())
	}

	async fn current_url(&self) -> DriverResult<String> {
		Ok(self.current_url.lock().clone())
	}

	async fn is_present(&self, locator: &Locator) -> DriverResult<bool> {
		if *locator == flow::CONSENT_ACCEPT {
			return Ok(self.script.consent_present);
		}
		if *locator == flow::CAPTCHA_FRAME {
			return Ok(self.script.captcha != CaptchaScript::Absent);
		}
		Ok(true)
	}

	async fn click(&self, locator: &Locator, _timeout: Duration) -> DriverResult<()> {
		if *locator == flow::LOGIN_BUTTON && self.script.submit_fails {
			return Err(DriverError::Engine("submit click rejected".into()));
		}
		self.record(PageEvent::Clicked(locator.clone()));
		Ok(())
	}

	async fn type_text(
		&self,
		locator: &Locator,
		text: &str,
		_keystroke_delay: Duration,
	) -> DriverResult<()> {
		self.record(PageEvent::Typed {
			locator: locator.clone(),
			text: text.to_string(),
		});
		Ok(())
	}

	async fn wait_for_url_prefix(&self, prefix: &str, timeout: Duration) -> DriverResult<()> {
		if !self.script.redirects {
			return Err(DriverError::timeout(timeout, format!("url prefix {prefix}")));
		}
		*self.current_url.lock() = format!("{prefix}/");
		self.record(PageEvent::WaitedForUrl(prefix.to_string()));
		Ok(())
	}

	async fn wait_for_visible(&self, locator: &Locator, timeout: Duration) -> DriverResult<()> {
		if *locator == flow::HOME_MARKER && !self.script.marker_visible {
			return Err(DriverError::timeout(timeout, format!("visible {locator}")));
		}
		Ok(())
	}

	async fn wait_for_detached(&self, locator: &Locator, timeout: Duration) -> DriverResult<()> {
		if *locator == flow::CAPTCHA_FRAME && self.script.captcha == CaptchaScript::NeverResolves {
			return Err(DriverError::timeout(timeout, format!("detached {locator}")));
		}
		Ok(())
	}

	async fn cookie(&self, name: &str) -> DriverResult<Option<String>> {
		if name == flow::ARL_COOKIE {
			return Ok(self.script.arl_cookie.clone());
		}
		Ok(None)
	}

	async fn clear_cookies(&self) -> DriverResult<()> {
		self.record(PageEvent::CookiesCleared);
		Ok(())
	}

	async fn screenshot(&self, path: &Path) -> DriverResult<()> {
		let name = path
			.file_name()
			.map(|name| name.to_string_lossy().to_string())
			.unwrap_or_default();
		self.record(PageEvent::Screenshot(name));
		Ok(())
	}

	async fn close(&self) -> DriverResult<()> {
		if self.closed.swap(true, Ordering::SeqCst) {
			return Ok(());
		}
		self.record(PageEvent::Closed);
		if let Some(engine) = &self.engine {
			engine.open_pages.fetch_sub(1, Ordering::SeqCst);
			engine.events.lock().push(EngineEvent::PageClosed(self.id));
		}
		Ok(())
	}
}

/// Scripted engine handing out one [`PageScript`] per opened page.
///
/// Clones share the script queue and the recorded state, so a test can
/// keep one clone for inspection after handing the other to a runner.
#[derive(Debug, Clone)]
pub struct ScriptedEngine {
	scripts: Arc<Mutex<VecDeque<PageScript>>>,
	state: Arc<EngineState>,
}

impl ScriptedEngine {
	/// Engine whose pages all follow the default successful script.
	pub fn new() -> Self {
		Self::with_scripts([])
	}

	/// Engine that hands out `scripts` in order, falling back to the
	/// default script when they run out.
	pub fn with_scripts(scripts: impl IntoIterator<Item = PageScript>) -> Self {
		Self {
			scripts: Arc::new(Mutex::new(scripts.into_iter().collect())),
			state: Arc::new(EngineState::default()),
		}
	}

	pub fn events(&self) -> Vec<EngineEvent> {
		self.state.events.lock().clone()
	}

	/// Highest number of pages open at any instant.
	pub fn max_open_pages(&self) -> usize {
		self.state.max_open_pages.load(Ordering::SeqCst)
	}

	pub fn is_started(&self) -> bool {
		self.state.started.load(Ordering::SeqCst)
	}
}

impl Default for ScriptedEngine {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl AutomationEngine for ScriptedEngine {
	type Page = ScriptedPage;

	async fn start(&self) -> DriverResult<()> {
		if !self.state.started.swap(true, Ordering::SeqCst) {
			self.state.events.lock().push(EngineEvent::Started);
		}
		Ok(())
	}

	async fn open_page(&self) -> DriverResult<ScriptedPage> {
		if !self.state.started.load(Ordering::SeqCst) {
			return Err(DriverError::Engine("engine not started".into()));
		}
		let script = self.scripts.lock().pop_front().unwrap_or_default();
		let id = self.state.next_page_id.fetch_add(1, Ordering::SeqCst) + 1;
		let open = self.state.open_pages.fetch_add(1, Ordering::SeqCst) + 1;
		self.state.max_open_pages.fetch_max(open, Ordering::SeqCst);
		self.state.events.lock().push(EngineEvent::PageOpened(id));
		Ok(ScriptedPage::attached(script, id, Some(Arc::clone(&self.state))))
	}

	async fn shutdown(&self) -> DriverResult<()> {
		if self.state.started.swap(false, Ordering::SeqCst) {
			self.state.events.lock().push(EngineEvent::ShutDown);
		}
		Ok(())
	}
}
