//! Request guards: bearer-session authentication, admin gate and login
//! rate limiting.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::{
    collections::HashMap,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use crate::db::Database;
use crate::models::User;

/// The signed-in user and the token they presented.
///
/// Inserted into request extensions by [`require_auth`].
#[derive(Clone, Debug)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

/// Per-IP sliding-window limiter for sign-in attempts.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    requests: Arc<Mutex<HashMap<IpAddr, Vec<Instant>>>>,
    trust_proxy: bool,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            requests: Arc::new(Mutex::new(HashMap::new())),
            trust_proxy: false,
        }
    }

    /// Keys attempts by the proxy-reported client IP instead of the peer.
    pub fn trusting_proxy(mut self, trust_proxy: bool) -> Self {
        self.trust_proxy = trust_proxy;
        self
    }

    /// Records an attempt from `ip`.
    ///
    /// Returns `Err(retry_after)` when the window is full; rejected attempts
    /// are not recorded.
    pub fn check(&self, ip: IpAddr) -> Result<(), Duration> {
        let now = Instant::now();
        let mut requests = self.requests.lock().expect("rate limiter lock poisoned");

        // Drop idle IPs so the map does not grow without bound.
        requests.retain(|_, attempts| {
            attempts.retain(|&t| now.duration_since(t) < self.window);
            !attempts.is_empty()
        });

        let attempts = requests.entry(ip).or_default();
        if attempts.len() < self.max_requests as usize {
            attempts.push(now);
            return Ok(());
        }

        let oldest = attempts.first().copied().unwrap_or(now);
        Err(self.window.saturating_sub(now.duration_since(oldest)))
    }
}

/// Resolves `Authorization: Bearer <token>` to a user, or rejects with 401.
pub async fn require_auth(
    State(db): State<Database>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string());

    let Some(token) = token.filter(|t| !t.is_empty()) else {
        tracing::warn!("Missing or malformed Authorization header");
        return Err(StatusCode::UNAUTHORIZED);
    };

    let user = db.get_session_user(&token).map_err(|e| {
        tracing::error!("Session lookup failed: {:#}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    match user {
        Some(user) => {
            request
                .extensions_mut()
                .insert(AuthSession { user, token });
            Ok(next.run(request).await)
        }
        None => {
            tracing::warn!("Unknown or expired session token");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

/// Lets only admins through. Must run after [`require_auth`].
pub async fn require_admin(request: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    match request.extensions().get::<AuthSession>() {
        Some(session) if session.user.is_admin => Ok(next.run(request).await),
        Some(session) => {
            tracing::warn!("Non-admin {} tried to reach admin route", session.user.email);
            Err(StatusCode::FORBIDDEN)
        }
        None => Err(StatusCode::UNAUTHORIZED),
    }
}

pub async fn rate_limit_middleware(
    State(rate_limiter): State<RateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let ip = extract_client_ip(&request, rate_limiter.trust_proxy);

    match rate_limiter.check(ip) {
        Ok(()) => next.run(request).await,
        Err(retry_after) => {
            tracing::warn!("Login rate limit exceeded for IP: {}", ip);
            let mut response =
                (StatusCode::TOO_MANY_REQUESTS, "Too many login attempts").into_response();
            if let Ok(value) = HeaderValue::from_str(&retry_after.as_secs().max(1).to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
            response
        }
    }
}

/// Client IP for rate limiting.
///
/// Proxy headers are client-controlled, so they are only read when
/// `trust_proxy` is set. Otherwise the socket peer is used, falling back to
/// localhost when no connection info is attached.
fn extract_client_ip(request: &Request<Body>, trust_proxy: bool) -> IpAddr {
    let peer = || {
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
    };

    if !trust_proxy {
        return peer().unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));
    }

    let forwarded = request
        .headers()
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|ip| ip.trim().parse().ok());

    let real_ip = || {
        request
            .headers()
            .get("X-Real-IP")
            .and_then(|v| v.to_str().ok())
            .and_then(|ip| ip.trim().parse().ok())
    };

    forwarded
        .or_else(real_ip)
        .or_else(peer)
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}
