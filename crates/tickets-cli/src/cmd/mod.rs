pub mod config;
pub mod control;
pub mod init;
pub mod preview;
pub mod process;
pub mod run;
