//! Named durations for flow steps and batch pacing.
//!
//! Every wall-clock wait in the flow and the runner reads from these
//! structs so tests can inject near-zero values.

use std::time::Duration;

use rand::Rng;

/// Bounds for every wait inside one login attempt.
#[derive(Debug, Clone)]
pub struct FlowTimeouts {
	/// Page load, including the initial re-navigation after a cookie clear.
	pub navigation: Duration,
	/// Click on the cookie-consent control.
	pub consent_click: Duration,
	/// Click on the credential submit button.
	pub submit_click: Duration,
	/// Settle delay before probing for a challenge iframe.
	pub captcha_settle: Duration,
	/// Window granted to a human to resolve the challenge.
	pub captcha_resolve: Duration,
	/// Redirect into the authenticated area.
	pub redirect: Duration,
	/// Appearance of the authenticated-area marker element.
	pub marker: Duration,
	/// Gap between simulated keystrokes during credential entry.
	pub keystroke_delay: Duration,
}

impl Default for FlowTimeouts {
	fn default() -> Self {
		Self {
			navigation: Duration::from_secs(15),
			consent_click: Duration::from_secs(10),
			submit_click: Duration::from_secs(15),
			captcha_settle: Duration::from_secs(3),
			captcha_resolve: Duration::from_secs(180),
			redirect: Duration::from_secs(20),
			marker: Duration::from_secs(25),
			keystroke_delay: Duration::from_millis(100),
		}
	}
}

impl FlowTimeouts {
	/// Near-zero bounds for driving the flow against a scripted page.
	pub fn immediate() -> Self {
		Self {
			navigation: Duration::from_millis(10),
			consent_click: Duration::from_millis(10),
			submit_click: Duration::from_millis(10),
			captcha_settle: Duration::ZERO,
			captcha_resolve: Duration::from_millis(10),
			redirect: Duration::from_millis(10),
			marker: Duration::from_millis(10),
			keystroke_delay: Duration::ZERO,
		}
	}
}

/// Randomized gap between accounts in a batch, to avoid a mechanical
/// request cadence.
#[derive(Debug, Clone)]
pub struct Pacing {
	pub min: Duration,
	pub max: Duration,
}

impl Default for Pacing {
	fn default() -> Self {
		Self {
			min: Duration::from_secs(2),
			max: Duration::from_secs(5),
		}
	}
}

impl Pacing {
	/// No pause at all; batch tests use this.
	pub fn none() -> Self {
		Self {
			min: Duration::ZERO,
			max: Duration::ZERO,
		}
	}

	/// Uniform sample from the configured interval.
	pub fn sample(&self) -> Duration {
		if self.max <= self.min {
			return self.min;
		}
		rand::rng().random_range(self.min..=self.max)
	}
}
