pub mod cli;
pub mod commands;
pub mod driver;
pub mod export;
pub mod logging;
pub mod output;
