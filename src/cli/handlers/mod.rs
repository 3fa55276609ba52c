//! Command handlers, separated from parsing and validation.

pub mod serve;

pub use serve::ServeCommandHandler;
