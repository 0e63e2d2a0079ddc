//! Port traits for external dependencies.

pub mod config_port;
pub mod data_port;
