//! Middleware for request processing.

mod error_handler;
mod local_only;
mod logging;
mod request_id;

pub use error_handler::{error_to_code, error_to_status_code, global_error_handler};
pub use local_only::{is_local_address, local_only_middleware, remote_address};
pub use logging::logging_middleware;
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
