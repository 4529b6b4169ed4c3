//! Console rendering of batch results.

use arl::runner::BatchSummary;
use colored::Colorize;

const TOKEN_PREVIEW_CHARS: usize = 10;

/// Leading characters of a token for display; the full value is a secret
/// and never printed.
pub(crate) fn token_preview(token: &str) -> String {
	token.chars().take(TOKEN_PREVIEW_CHARS).collect()
}

pub fn print_summary(summary: &BatchSummary) {
	println!();
	println!("{}", "BATCH RESULTS".bold());
	for outcome in &summary.outcomes {
		match &outcome.token {
			Some(token) => {
				println!(
					"{:>6}  {}  arl: {}...",
					"ok".green().bold(),
					outcome.email,
					token_preview(token)
				);
			}
			None => {
				let reason = outcome.failure.as_deref().unwrap_or("no token");
				println!("{:>6}  {}  {reason}", "failed".red().bold(), outcome.email);
			}
		}
	}

	println!();
	println!(
		"Attempted: {}  Succeeded: {}  Failed: {}",
		summary.attempted, summary.succeeded, summary.failed
	);
	if summary.interrupted {
		println!(
			"{}",
			"Interrupted before the batch completed; results above were collected first.".yellow()
		);
	}
}
