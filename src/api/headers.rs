//! Headers stamped on every outgoing response

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, Method, header},
    middleware::Next,
    response::Response,
};

use crate::upstream::ProxyMode;

const NO_CACHE: &str = "no-cache, no-store, must-revalidate, max-age=0, s-maxage=0";
const PUBLIC_FALLBACK: &str = "public, max-age=60";

/// CORS allow-all plus the cache directives for the active [`ProxyMode`]
///
/// Preflight answers never advertise a public cache lifetime, so in cached mode they
/// carry the CORS headers alone.
#[derive(Debug, Clone)]
pub struct ResponseHeaders {
    headers: HeaderMap,
    preflight: HeaderMap,
}

impl ResponseHeaders {
    pub fn for_mode(mode: ProxyMode, client_max_age: Duration) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, OPTIONS"),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        );

        let mut preflight = headers.clone();

        match mode {
            ProxyMode::Uncached => {
                headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(NO_CACHE));
                headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
                headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
                preflight = headers.clone();
            }
            ProxyMode::Cached => {
                let directive = format!("public, max-age={}", client_max_age.as_secs());
                let value = HeaderValue::from_str(&directive)
                    .unwrap_or_else(|_| HeaderValue::from_static(PUBLIC_FALLBACK));
                headers.insert(header::CACHE_CONTROL, value);
            }
        }

        Self { headers, preflight }
    }

    /// Overwrite the policy headers on `target`, leaving everything else alone
    pub fn apply(&self, target: &mut HeaderMap) {
        for (name, value) in &self.headers {
            target.insert(name.clone(), value.clone());
        }
        // Relayed upstream responses may carry their own directives
        if !self.headers.contains_key(header::PRAGMA) {
            target.remove(header::PRAGMA);
            target.remove(header::EXPIRES);
        }
    }

    pub fn apply_preflight(&self, target: &mut HeaderMap) {
        for (name, value) in &self.preflight {
            target.insert(name.clone(), value.clone());
        }
    }

    pub fn get(&self, name: &HeaderName) -> Option<&HeaderValue> {
        self.headers.get(name)
    }

    pub fn preflight(&self) -> &HeaderMap {
        &self.preflight
    }
}

/// `from_fn_with_state` middleware stamping the policy on every response
pub async fn apply_policy(
    State(policy): State<Arc<ResponseHeaders>>,
    request: Request,
    next: Next,
) -> Response {
    let is_preflight = request.method() == Method::OPTIONS;
    let mut response = next.run(request).await;

    if is_preflight {
        policy.apply_preflight(response.headers_mut());
    } else {
        policy.apply(response.headers_mut());
    }
    response
}
