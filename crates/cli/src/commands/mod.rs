//! Command dispatch.

mod add;
mod export;
mod list;
mod run;

use arl::Result;

use crate::cli::{Cli, Commands};

pub async fn dispatch(cli: Cli) -> Result<()> {
	match cli.command {
		Commands::Run {
			headless,
			skip_disabled,
		} => run::execute(&cli.root, headless, skip_disabled).await,
		Commands::Add {
			email,
			password,
			kind,
			disabled,
		} => add::execute(&cli.root, &email, &password, kind.as_deref(), disabled),
		Commands::List => list::execute(&cli.root),
		Commands::Export { max_age_days } => export::execute(&cli.root, max_age_days),
	}
}
