pub mod control;
pub mod status;
