//! Command implementations for the toyland CLI

pub mod serve;

pub use serve::run_serve;
