//! CLI command implementations for node-metrics-sampler.
//!
//! - `check`: host counter, configuration and sink validation
//! - `test`: snapshot capture without writing
//! - `config`: configuration file generation

pub mod check;
pub mod config;
pub mod test;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use test::command_test;
