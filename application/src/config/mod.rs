//! Application configuration

pub mod run_options;

pub use run_options::RunOptions;
