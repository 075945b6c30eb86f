//! Client identity for audit records and throttling.

use std::convert::Infallible;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::header::{REFERER, USER_AGENT};
use axum::http::request::Parts;
use axum::http::{Extensions, HeaderMap};
use serde_json::json;

use crate::state::AppState;

/// Who is making the request, as recorded on sessions and login attempts.
#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub ip: IpAddr,
    pub user_agent: Option<String>,
    pub method: String,
    /// Path and query of the request.
    pub url: String,
    pub referer: Option<String>,
    /// The `x-request-id` assigned by the request-id layer.
    pub request_id: Option<String>,
}

impl ClientInfo {
    pub fn ip_string(&self) -> String {
        self.ip.to_string()
    }

    /// Structured metadata stored with each login attempt.
    pub fn audit_metadata(&self) -> serde_json::Value {
        json!({
            "method": self.method,
            "url": self.url,
            "referer": self.referer,
            "request_id": self.request_id,
        })
    }
}

impl FromRequestParts<AppState> for ClientInfo {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let ip = resolve_client_ip(
            &parts.headers,
            &parts.extensions,
            state.config.trust_proxy_headers,
        );

        Ok(ClientInfo {
            ip,
            user_agent: header_string(&parts.headers, USER_AGENT.as_str()),
            method: parts.method.to_string(),
            url: parts
                .uri
                .path_and_query()
                .map(|pq| pq.to_string())
                .unwrap_or_else(|| parts.uri.path().to_string()),
            referer: header_string(&parts.headers, REFERER.as_str()),
            request_id: header_string(&parts.headers, "x-request-id"),
        })
    }
}

/// Resolve the client IP.
///
/// With `trust_proxy_headers`, the first `X-Forwarded-For` entry wins, then
/// `X-Real-IP`. Otherwise (or when neither parses) the peer address from
/// [`ConnectInfo`] is used, falling back to loopback when the server was not
/// started with connect info.
pub fn resolve_client_ip(
    headers: &HeaderMap,
    extensions: &Extensions,
    trust_proxy_headers: bool,
) -> IpAddr {
    if trust_proxy_headers {
        if let Some(ip) = header_string(headers, "x-forwarded-for")
            .and_then(|v| v.split(',').next().and_then(|s| s.trim().parse().ok()))
        {
            return ip;
        }
        if let Some(ip) = header_string(headers, "x-real-ip").and_then(|v| v.trim().parse().ok()) {
            return ip;
        }
    }

    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
