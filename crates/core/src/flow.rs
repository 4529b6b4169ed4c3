//! Login state machine for one account over one live page.
//!
//! The sequence is consent handling, credential entry, CAPTCHA escalation,
//! success verification, and token extraction. Expected negative outcomes
//! (unresolved challenge, failed verification, missing cookie) are ordinary
//! [`FlowOutcome`] values; only unexpected faults surface as errors from
//! [`LoginFlow::run`]. Every failing transition captures a screenshot
//! tagged with the step name for offline debugging of automation drift.

use tracing::debug;

use crate::config::FlowTimeouts;
use crate::diag::DiagnosticSink;
use crate::driver::{DriverError, Locator, PageDriver};
use crate::error::Result;
use crate::logging::AccountLog;
use crate::store::SessionRecord;

/// Login entry point for the service.
pub const LOGIN_URL: &str = "https://account.deezer.com/en/login/";
/// URL prefix that marks an authenticated session.
pub const AUTHENTICATED_URL_PREFIX: &str = "https://www.deezer.com/en";
/// Name of the long-lived session cookie.
pub const ARL_COOKIE: &str = "arl";

pub const CONSENT_ACCEPT: Locator = Locator::TestId("gdpr-btn-accept-all");
pub const EMAIL_FIELD: Locator = Locator::TestId("email-field");
pub const PASSWORD_FIELD: Locator = Locator::TestId("password-field");
pub const LOGIN_BUTTON: Locator = Locator::TestId("login-button");
pub const CAPTCHA_FRAME: Locator = Locator::Css("iframe[src*='recaptcha']");
pub const HOME_MARKER: Locator = Locator::Text("Home");

/// Terminal result of one login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
	/// Login verified and the session cookie extracted.
	Token(String),
	/// The challenge was not resolved within the escalation window.
	CaptchaBlocked,
	/// The post-login redirect or the authenticated-area marker never
	/// appeared.
	LoginFailed,
	/// The UI reported success but the session cookie was absent.
	CookieMissing,
}

impl FlowOutcome {
	pub fn token(&self) -> Option<&str> {
		match self {
			Self::Token(token) => Some(token),
			_ => None,
		}
	}

	pub fn is_success(&self) -> bool {
		matches!(self, Self::Token(_))
	}

	/// Short reason for the negative outcomes, `None` on success.
	pub fn failure_reason(&self) -> Option<&'static str> {
		match self {
			Self::Token(_) => None,
			Self::CaptchaBlocked => Some("captcha unresolved"),
			Self::LoginFailed => Some("login verification failed"),
			Self::CookieMissing => Some("session cookie missing"),
		}
	}
}

/// Drives one account's login over a live page.
pub struct LoginFlow<'a, P: PageDriver + ?Sized> {
	page: &'a P,
	account: &'a SessionRecord,
	log: &'a AccountLog,
	diag: &'a DiagnosticSink,
	timeouts: &'a FlowTimeouts,
}

impl<'a, P: PageDriver + ?Sized> LoginFlow<'a, P> {
	pub fn new(
		page: &'a P,
		account: &'a SessionRecord,
		log: &'a AccountLog,
		diag: &'a DiagnosticSink,
		timeouts: &'a FlowTimeouts,
	) -> Self {
		Self {
			page,
			account,
			log,
			diag,
			timeouts,
		}
	}

	/// Runs the flow to a terminal state. On an unexpected fault a final
	/// diagnostic screenshot is captured before the error propagates.
	pub async fn run(&self) -> Result<FlowOutcome> {
		match self.attempt().await {
			Ok(outcome) => Ok(outcome),
			Err(err) => {
				self.log.error(&format!("critical error: {err}"));
				self.diag.capture(self.page, "critical_error").await;
				Err(err)
			}
		}
	}

	async fn attempt(&self) -> Result<FlowOutcome> {
		self.open_login_page().await?;
		self.accept_consent().await;
		self.submit_credentials().await?;
		if !self.captcha_cleared().await? {
			return Ok(FlowOutcome::CaptchaBlocked);
		}
		if !self.verify_login().await? {
			return Ok(FlowOutcome::LoginFailed);
		}
		self.extract_token().await
	}

	/// Loads the login page. A landing URL inside the authenticated area
	/// means a stale session is still live; it must not short-circuit the
	/// flow, so cookies are cleared and the page reloaded once.
	async fn open_login_page(&self) -> Result<()> {
		self.page.navigate(LOGIN_URL, self.timeouts.navigation).await?;

		let current = self.page.current_url().await?;
		if current.starts_with(AUTHENTICATED_URL_PREFIX) {
			self.log.info("existing session detected, clearing cookies");
			self.page.clear_cookies().await?;
			self.page.navigate(LOGIN_URL, self.timeouts.navigation).await?;
		}

		self.diag.capture(self.page, "initial_page").await;
		self.log.info("login page loaded");
		Ok(())
	}

	/// Clicks the consent control when present. The banner does not always
	/// appear, so absence or a failed click is logged and the flow
	/// continues.
	async fn accept_consent(&self) {
		match self.page.is_present(&CONSENT_ACCEPT).await {
			Ok(true) => {
				self.diag.capture(self.page, "cookies").await;
				match self.page.click(&CONSENT_ACCEPT, self.timeouts.consent_click).await {
					Ok(()) => self.log.info("cookie banner accepted"),
					Err(err) => {
						self.log.warn(&format!("cookie banner click failed: {err}"));
						self.diag.capture(self.page, "error_cookies").await;
					}
				}
			}
			Ok(false) => {
				self.log.warn("cookie banner not found");
				self.diag.capture(self.page, "error_cookies").await;
			}
			Err(err) => {
				self.log.warn(&format!("cookie banner probe failed: {err}"));
				self.diag.capture(self.page, "error_cookies").await;
			}
		}
	}

	/// Types the credentials and submits. Any failure here is fatal for
	/// this account's attempt.
	async fn submit_credentials(&self) -> Result<()> {
		let submitted: std::result::Result<(), DriverError> = async {
			self.page
				.type_text(&EMAIL_FIELD, &self.account.email, self.timeouts.keystroke_delay)
				.await?;
			self.log.info("email entered");

			self.page
				.type_text(&PASSWORD_FIELD, &self.account.password, self.timeouts.keystroke_delay)
				.await?;
			self.log.info("password entered");

			self.diag.capture(self.page, "login_form").await;
			self.page.click(&LOGIN_BUTTON, self.timeouts.submit_click).await?;
			Ok(())
		}
		.await;

		match submitted {
			Ok(()) => {
				self.log.info("credentials submitted");
				Ok(())
			}
			Err(err) => {
				self.log.error(&format!("credential entry failed: {err}"));
				self.diag.capture(self.page, "error_login_form").await;
				Err(err.into())
			}
		}
	}

	/// Probes for the challenge iframe after a settle delay. A detected
	/// challenge is escalated to a human: the flow waits for the iframe to
	/// detach within the resolution window.
	async fn captcha_cleared(&self) -> Result<bool> {
		tokio::time::sleep(self.timeouts.captcha_settle).await;

		if !self.page.is_present(&CAPTCHA_FRAME).await? {
			debug!(target = "arl.flow", account = %self.account.email, "no captcha present");
			return Ok(true);
		}

		self.log.info("captcha detected, manual intervention required");
		self.diag.capture(self.page, "captcha_detected").await;
		self.log.info("waiting for manual resolution");

		match self
			.page
			.wait_for_detached(&CAPTCHA_FRAME, self.timeouts.captcha_resolve)
			.await
		{
			Ok(()) => {
				self.log.info("captcha resolved");
				self.diag.capture(self.page, "captcha_solved").await;
				Ok(true)
			}
			Err(err) if err.is_timeout() => {
				self.log.error("captcha not resolved within the escalation window");
				Ok(false)
			}
			Err(err) => Err(err.into()),
		}
	}

	/// Requires the redirect into the authenticated area and the marker
	/// element, in that order; either timing out fails the verification.
	async fn verify_login(&self) -> Result<bool> {
		match self
			.page
			.wait_for_url_prefix(AUTHENTICATED_URL_PREFIX, self.timeouts.redirect)
			.await
		{
			Ok(()) => {}
			Err(err) if err.is_timeout() => {
				self.log.error(&format!("login redirect did not complete: {err}"));
				self.diag.capture(self.page, "error_login_verification").await;
				return Ok(false);
			}
			Err(err) => return Err(err.into()),
		}
		self.log.info("login redirect completed");

		match self.page.wait_for_visible(&HOME_MARKER, self.timeouts.marker).await {
			Ok(()) => {
				self.log.info("authenticated-area marker found");
				self.diag.capture(self.page, "login_success").await;
				Ok(true)
			}
			Err(err) if err.is_timeout() => {
				self.log.error(&format!("authenticated-area marker missing: {err}"));
				self.diag.capture(self.page, "error_login_verification").await;
				Ok(false)
			}
			Err(err) => Err(err.into()),
		}
	}

	/// Reads the session cookie. A verified UI state without the cookie is
	/// not a success.
	async fn extract_token(&self) -> Result<FlowOutcome> {
		match self.page.cookie(ARL_COOKIE).await? {
			Some(token) if !token.is_empty() => {
				let preview: String = token.chars().take(15).collect();
				self.log.info(&format!("arl obtained: {preview}..."));
				self.diag.capture(self.page, "successful_session").await;
				Ok(FlowOutcome::Token(token))
			}
			_ => {
				self.log.error("arl cookie not found after verified login");
				Ok(FlowOutcome::CookieMissing)
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use tempfile::TempDir;

	use super::*;
	use crate::driver::scripted::{CaptchaScript, PageEvent, PageScript, ScriptedPage};
	use crate::error::ArlError;

	struct Fixture {
		_temp: TempDir,
		account: SessionRecord,
		log: AccountLog,
		diag: DiagnosticSink,
		timeouts: FlowTimeouts,
	}

	impl Fixture {
		fn new() -> Self {
			let temp = TempDir::new().unwrap();
			let account = SessionRecord {
				email: "a@x.com".to_string(),
				password: "p".to_string(),
				arl: None,
				last_updated: None,
				enabled: true,
				kind: None,
			};
			let log = AccountLog::open(&temp.path().join("logs"), &account.email).unwrap();
			let diag =
				DiagnosticSink::for_account(&temp.path().join("screenshots"), &account.email).unwrap();
			Self {
				_temp: temp,
				account,
				log,
				diag,
				timeouts: FlowTimeouts::immediate(),
			}
		}

		async fn run(&self, page: &ScriptedPage) -> Result<FlowOutcome> {
			LoginFlow::new(page, &self.account, &self.log, &self.diag, &self.timeouts)
				.run()
				.await
		}
	}

	#[tokio::test]
	async fn clean_login_yields_the_token() {
		let fixture = Fixture::new();
		let page = ScriptedPage::new(PageScript::default());

		let outcome = fixture.run(&page).await.unwrap();
		assert_eq!(outcome, FlowOutcome::Token("ARL123".to_string()));

		let events = page.events();
		assert!(events.contains(&PageEvent::Clicked(CONSENT_ACCEPT)));
		assert!(events.contains(&PageEvent::Typed {
			locator: EMAIL_FIELD,
			text: "a@x.com".to_string(),
		}));
		assert!(events.contains(&PageEvent::Clicked(LOGIN_BUTTON)));
	}

	#[tokio::test]
	async fn stale_session_clears_cookies_and_renavigates_once() {
		let fixture = Fixture::new();
		let page = ScriptedPage::new(PageScript {
			landing_url: format!("{AUTHENTICATED_URL_PREFIX}/"),
			..PageScript::default()
		});

		let outcome = fixture.run(&page).await.unwrap();
		assert!(outcome.is_success());

		let events = page.events();
		let navigations = events
			.iter()
			.filter(|event| matches!(event, PageEvent::Navigated(_)))
			.count();
		assert_eq!(navigations, 2);
		assert!(events.contains(&PageEvent::CookiesCleared));
	}

	#[tokio::test]
	async fn missing_consent_banner_is_not_fatal() {
		let fixture = Fixture::new();
		let page = ScriptedPage::new(PageScript {
			consent_present: false,
			..PageScript::default()
		});

		let outcome = fixture.run(&page).await.unwrap();
		assert!(outcome.is_success());
		assert!(!page.events().contains(&PageEvent::Clicked(CONSENT_ACCEPT)));
	}

	#[tokio::test]
	async fn unresolved_captcha_blocks_the_account() {
		let fixture = Fixture::new();
		let page = ScriptedPage::new(PageScript {
			captcha: CaptchaScript::NeverResolves,
			..PageScript::default()
		});

		let outcome = fixture.run(&page).await.unwrap();
		assert_eq!(outcome, FlowOutcome::CaptchaBlocked);
	}

	#[tokio::test]
	async fn resolved_captcha_continues_to_success() {
		let fixture = Fixture::new();
		let page = ScriptedPage::new(PageScript {
			captcha: CaptchaScript::Resolves,
			..PageScript::default()
		});

		let outcome = fixture.run(&page).await.unwrap();
		assert!(outcome.is_success());

		let shots: Vec<String> = page
			.events()
			.into_iter()
			.filter_map(|event| match event {
				PageEvent::Screenshot(name) => Some(name),
				_ => None,
			})
			.collect();
		assert!(shots.iter().any(|name| name.starts_with("captcha_detected")));
		assert!(shots.iter().any(|name| name.starts_with("captcha_solved")));
	}

	#[tokio::test]
	async fn missing_redirect_fails_verification() {
		let fixture = Fixture::new();
		let page = ScriptedPage::new(PageScript {
			redirects: false,
			..PageScript::default()
		});

		let outcome = fixture.run(&page).await.unwrap();
		assert_eq!(outcome, FlowOutcome::LoginFailed);
	}

	#[tokio::test]
	async fn missing_marker_fails_verification() {
		let fixture = Fixture::new();
		let page = ScriptedPage::new(PageScript {
			marker_visible: false,
			..PageScript::default()
		});

		let outcome = fixture.run(&page).await.unwrap();
		assert_eq!(outcome, FlowOutcome::LoginFailed);
	}

	#[tokio::test]
	async fn verified_login_without_cookie_is_not_a_success() {
		let fixture = Fixture::new();
		let page = ScriptedPage::new(PageScript {
			arl_cookie: None,
			..PageScript::default()
		});

		let outcome = fixture.run(&page).await.unwrap();
		assert_eq!(outcome, FlowOutcome::CookieMissing);
	}

	#[tokio::test]
	async fn submit_fault_propagates_with_a_diagnostic_capture() {
		let fixture = Fixture::new();
		let page = ScriptedPage::new(PageScript {
			submit_fails: true,
			..PageScript::default()
		});

		let err = fixture.run(&page).await.unwrap_err();
		assert!(matches!(err, ArlError::Driver(_)));

		let shots: Vec<String> = page
			.events()
			.into_iter()
			.filter_map(|event| match event {
				PageEvent::Screenshot(name) => Some(name),
				_ => None,
			})
			.collect();
		assert!(shots.iter().any(|name| name.starts_with("error_login_form")));
		assert!(shots.iter().any(|name| name.starts_with("critical_error")));
	}

	#[tokio::test]
	async fn terminal_states_are_mutually_exclusive() {
		// One invocation produces exactly one terminal state: a token or a
		// single failure reason, never both.
		let fixture = Fixture::new();
		let scripts = [
			PageScript::default(),
			PageScript {
				captcha: CaptchaScript::NeverResolves,
				..PageScript::default()
			},
			PageScript {
				redirects: false,
				..PageScript::default()
			},
			PageScript {
				arl_cookie: None,
				..PageScript::default()
			},
		];

		for script in scripts {
			let page = ScriptedPage::new(script);
			let outcome = fixture.run(&page).await.unwrap();
			assert_eq!(outcome.is_success(), outcome.failure_reason().is_none());
		}
	}
}
