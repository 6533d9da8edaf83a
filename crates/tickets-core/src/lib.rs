pub mod config;
pub mod conflict;
pub mod daemon;
pub mod error;
pub mod io;
pub mod jira;
pub mod paths;
pub mod processor;
pub mod secrets;
pub mod task_line;
pub mod tracker;

pub use error::{Result, TicketsError};
