//! Real engine adapters behind the core's capability traits.

mod chromium;

pub use chromium::{ChromiumEngine, ChromiumPage};
