//! Restricts a route to callers on the loopback interface.

use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::AppError;
use crate::state::AppState;

pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Rejects the request with 403 `"<addr> is not local"` unless the caller
/// address is a loopback address. With `status.accept_proxy_address` the
/// first `X-Forwarded-For` entry replaces the peer address.
pub async fn local_only_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let remote = remote_address(
        peer,
        request.headers(),
        state.status.accept_proxy_address,
    );

    if !is_local_address(&remote) {
        tracing::warn!(remote = %remote, path = %request.uri().path(), "Rejected non-local status request");
        return AppError::Forbidden {
            message: format!("{} is not local", remote),
        }
        .into_response();
    }

    next.run(request).await
}

/// Address the guard judges: the peer address, or the first forwarded
/// address when proxies are trusted and the header is present.
pub fn remote_address(peer: Option<SocketAddr>, headers: &HeaderMap, accept_proxy: bool) -> String {
    if accept_proxy {
        let forwarded = headers
            .get(FORWARDED_FOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(forwarded) = forwarded {
            return forwarded.to_string();
        }
    }

    peer.map(|addr| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Accepts `127.0.0.1`, `::1` and their `host:port` / `[host]:port` forms,
/// plus any other loopback address.
pub fn is_local_address(address: &str) -> bool {
    if address.starts_with("127.0.0.1") || address.starts_with("::1") {
        return true;
    }

    let ip = address
        .parse::<SocketAddr>()
        .map(|addr| addr.ip())
        .or_else(|_| address.parse::<IpAddr>());

    match ip {
        Ok(IpAddr::V6(v6)) => v6.is_loopback() || v6.to_ipv4_mapped().is_some_and(|v4| v4.is_loopback()),
        Ok(ip) => ip.is_loopback(),
        Err(_) => false,
    }
}
