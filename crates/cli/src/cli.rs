use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "arl")]
#[command(about = "Acquire and refresh arl session tokens for stored accounts")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Workspace root holding data/, logs/, screenshots/, and the browser profile
	#[arg(long, global = true, default_value = ".")]
	pub root: PathBuf,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Refresh every account whose token is missing or stale, then export
	Run {
		/// Run the browser without a visible window
		#[arg(long)]
		headless: bool,

		/// Leave disabled accounts out of the batch
		#[arg(long)]
		skip_disabled: bool,
	},

	/// Add an account or update its credentials
	Add {
		email: String,
		password: String,

		/// Export grouping tag
		#[arg(long = "type")]
		kind: Option<String>,

		/// Create the record disabled
		#[arg(long)]
		disabled: bool,
	},

	/// List stored accounts and token freshness
	#[command(alias = "ls")]
	List,

	/// Rewrite the per-type token files from stored valid tokens
	Export {
		/// Maximum token age to include, in days
		#[arg(long, default_value_t = 30.0)]
		max_age_days: f64,
	},
}

#[cfg(test)]
mod tests {
	use clap::CommandFactory;

	use super::*;

	#[test]
	fn cli_definition_is_consistent() {
		Cli::command().debug_assert();
	}

	#[test]
	fn run_flags_parse() {
		let cli = Cli::parse_from(["arl", "run", "--headless", "--skip-disabled"]);
		match cli.command {
			Commands::Run {
				headless,
				skip_disabled,
			} => {
				assert!(headless);
				assert!(skip_disabled);
			}
			other => panic!("unexpected command: {other:?}"),
		}
	}

	#[test]
	fn add_accepts_a_type_tag() {
		let cli = Cli::parse_from(["arl", "add", "a@x.com", "pw", "--type", "premium"]);
		match cli.command {
			Commands::Add { email, kind, disabled, .. } => {
				assert_eq!(email, "a@x.com");
				assert_eq!(kind.as_deref(), Some("premium"));
				assert!(!disabled);
			}
			other => panic!("unexpected command: {other:?}"),
		}
	}
}
