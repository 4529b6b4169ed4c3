//! Error taxonomy shared across the crate.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ArlError>;

#[derive(Debug, Error)]
pub enum ArlError {
	/// Creating a store record without the mandatory credential.
	#[error("password is required to create a record for {email}")]
	MissingCredential { email: String },

	/// The store could not be rewritten. Surfaced to the caller because a
	/// silent failure here would lose a freshly acquired token.
	#[error("failed to persist session store at {path}")]
	StorePersist {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// Unexpected fault in the automation engine or page.
	#[error("browser automation fault: {0}")]
	Driver(#[from] crate::driver::DriverError),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}
