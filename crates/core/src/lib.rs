//! Core engine for acquiring and refreshing `arl` session tokens.
//!
//! The pieces compose bottom-up: [`store`] owns the on-disk account
//! registry, [`driver`] defines the browser capability surface, [`flow`]
//! drives one login attempt over a page, and [`runner`] sequences a batch
//! through the single shared [`automation::AutomationHandle`].

pub mod automation;
pub mod config;
pub mod diag;
pub mod driver;
pub mod error;
pub mod flow;
pub mod logging;
pub mod runner;
pub mod store;
pub mod workspace;

pub use automation::AutomationHandle;
pub use config::{FlowTimeouts, Pacing};
pub use error::{ArlError, Result};
pub use flow::{FlowOutcome, LoginFlow};
pub use runner::{AccountOutcome, AcquisitionRunner, BatchSummary};
pub use store::{RecordUpdate, RefreshPolicy, SessionRecord, SessionStore};
pub use workspace::Workspace;
