//! HTTP layer exposing the job runner status.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
