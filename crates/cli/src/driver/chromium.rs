//! Chromium implementation of the automation capability surface.
//!
//! Drives a real browser over CDP with a persistent profile directory so
//! cookies and local storage survive across runs. CDP has no built-in
//! URL, visibility, or detachment waits, so those are bounded polls here.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use arl::driver::{AutomationEngine, DriverError, DriverResult, Locator, PageDriver};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::ClearBrowserCookiesParams;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Element, Page};
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(250);
const WINDOW_WIDTH: u32 = 1200;
const WINDOW_HEIGHT: u32 = 700;

fn engine_fault(err: impl std::fmt::Display) -> DriverError {
	DriverError::Engine(err.to_string())
}

struct Running {
	browser: Browser,
	handler: JoinHandle<()>,
}

/// One Chromium process bound to a persistent profile.
pub struct ChromiumEngine {
	profile_dir: PathBuf,
	headless: bool,
	running: Mutex<Option<Running>>,
}

impl ChromiumEngine {
	pub fn new(profile_dir: impl Into<PathBuf>, headless: bool) -> Self {
		Self {
			profile_dir: profile_dir.into(),
			headless,
			running: Mutex::new(None),
		}
	}
}

#[async_trait]
impl AutomationEngine for ChromiumEngine {
	type Page = ChromiumPage;

	async fn start(&self) -> DriverResult<()> {
		let mut running = self.running.lock().await;
		if running.is_some() {
			return Ok(());
		}

		let mut builder = BrowserConfig::builder()
			.user_data_dir(&self.profile_dir)
			.window_size(WINDOW_WIDTH, WINDOW_HEIGHT)
			.viewport(None)
			.arg("--no-first-run")
			.arg("--no-default-browser-check");
		if !self.headless {
			builder = builder.with_head();
		}
		let config = builder.build().map_err(DriverError::Engine)?;

		let (browser, mut handler) = Browser::launch(config).await.map_err(engine_fault)?;
		let handler = tokio::spawn(async move { while handler.next().await.is_some() {} });
		debug!(
			target = "arl.driver",
			profile = %self.profile_dir.display(),
			headless = self.headless,
			"chromium started"
		);

		*running = Some(Running { browser, handler });
		Ok(())
	}

	async fn open_page(&self) -> DriverResult<ChromiumPage> {
		let running = self.running.lock().await;
		let Some(running) = running.as_ref() else {
			return Err(DriverError::Engine("engine not started".into()));
		};
		let page = running
			.browser
			.new_page("about:blank")
			.await
			.map_err(engine_fault)?;
		Ok(ChromiumPage { page })
	}

	async fn shutdown(&self) -> DriverResult<()> {
		let mut slot = self.running.lock().await;
		let Some(mut running) = slot.take() else {
			return Ok(());
		};
		let closed = running.browser.close().await.map(|_| ()).map_err(engine_fault);
		running.handler.abort();
		debug!(target = "arl.driver", "chromium stopped");
		closed
	}
}

/// One live tab.
pub struct ChromiumPage {
	page: Page,
}

impl ChromiumPage {
	async fn find(&self, locator: &Locator) -> DriverResult<Element> {
		let found = match locator {
			Locator::TestId(id) => {
				self.page
					.find_element(format!("[data-testid=\"{id}\"]"))
					.await
			}
			Locator::Css(css) => self.page.find_element(*css).await,
			Locator::Text(text) => {
				self.page
					.find_xpath(format!("//*[normalize-space(text())=\"{text}\"]"))
					.await
			}
		};
		found.map_err(|_| DriverError::NotFound(locator.to_string()))
	}

	async fn url_string(&self) -> DriverResult<String> {
		Ok(self.page.url().await.map_err(engine_fault)?.unwrap_or_default())
	}
}

#[async_trait]
impl PageDriver for ChromiumPage {
	async fn navigate(&self, url: &str, timeout: Duration) -> DriverResult<()> {
		match tokio::time::timeout(timeout, self.page.goto(url)).await {
			Ok(Ok(_)) => Ok(()),
			Ok(Err(err)) => Err(engine_fault(err)),
			Err(_) => Err(DriverError::timeout(timeout, format!("navigation to {url}"))),
		}
	}

	async fn current_url(&self) -> DriverResult<String> {
		self.url_string().await
	}

	async fn is_present(&self, locator: &Locator) -> DriverResult<bool> {
		Ok(self.find(locator).await.is_ok())
	}

	async fn click(&self, locator: &Locator, timeout: Duration) -> DriverResult<()> {
		let deadline = Instant::now() + timeout;
		loop {
			if let Ok(element) = self.find(locator).await {
				match element.click().await {
					Ok(_) => return Ok(()),
					Err(err) => {
						debug!(target = "arl.driver", %locator, error = %err, "click not accepted yet");
					}
				}
			}
			if Instant::now() >= deadline {
				return Err(DriverError::timeout(timeout, format!("clickable {locator}")));
			}
			tokio::time::sleep(POLL_INTERVAL).await;
		}
	}

	async fn type_text(
		&self,
		locator: &Locator,
		text: &str,
		keystroke_delay: Duration,
	) -> DriverResult<()> {
		let element = self.find(locator).await?;
		element.click().await.map_err(engine_fault)?;
		for ch in text.chars() {
			element
				.type_str(ch.to_string())
				.await
				.map_err(engine_fault)?;
			tokio::time::sleep(keystroke_delay).await;
		}
		Ok(())
	}

	async fn wait_for_url_prefix(&self, prefix: &str, timeout: Duration) -> DriverResult<()> {
		let deadline = Instant::now() + timeout;
		loop {
			if self.url_string().await?.starts_with(prefix) {
				return Ok(());
			}
			if Instant::now() >= deadline {
				return Err(DriverError::timeout(timeout, format!("url prefix {prefix}")));
			}
			tokio::time::sleep(POLL_INTERVAL).await;
		}
	}

	async fn wait_for_visible(&self, locator: &Locator, timeout: Duration) -> DriverResult<()> {
		let deadline = Instant::now() + timeout;
		loop {
			if self.find(locator).await.is_ok() {
				return Ok(());
			}
			if Instant::now() >= deadline {
				return Err(DriverError::timeout(timeout, format!("visible {locator}")));
			}
			tokio::time::sleep(POLL_INTERVAL).await;
		}
	}

	async fn wait_for_detached(&self, locator: &Locator, timeout: Duration) -> DriverResult<()> {
		let deadline = Instant::now() + timeout;
		loop {
			if self.find(locator).await.is_err() {
				return Ok(());
			}
			if Instant::now() >= deadline {
				return Err(DriverError::timeout(timeout, format!("detached {locator}")));
			}
			tokio::time::sleep(POLL_INTERVAL).await;
		}
	}

	async fn cookie(&self, name: &str) -> DriverResult<Option<String>> {
		let cookies = self.page.get_cookies().await.map_err(engine_fault)?;
		Ok(cookies
			.into_iter()
			.find(|cookie| cookie.name == name)
			.map(|cookie| cookie.value))
	}

	async fn clear_cookies(&self) -> DriverResult<()> {
		self.page
			.execute(ClearBrowserCookiesParams::default())
			.await
			.map_err(engine_fault)?;
		Ok(())
	}

	async fn screenshot(&self, path: &Path) -> DriverResult<()> {
		let params = ScreenshotParams::builder()
			.format(CaptureScreenshotFormat::Png)
			.build();
		self.page
			.save_screenshot(params, path)
			.await
			.map_err(engine_fault)?;
		Ok(())
	}

	async fn close(&self) -> DriverResult<()> {
		self.page.clone().close().await.map_err(engine_fault)
	}
}
