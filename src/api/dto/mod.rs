//! Data transfer objects for API responses.

mod error;

pub use error::ErrorResponse;
