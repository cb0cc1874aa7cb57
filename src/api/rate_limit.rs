//! Per-address admission control for password reset requests.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::{HashMap, VecDeque};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::{ApiError, AppState};
use crate::config::SecurityConfig;

/// Sliding window limiter keyed by client address.
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    trusted_proxies: Vec<IpAddr>,
    hits: Mutex<HashMap<IpAddr, VecDeque<Instant>>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration, trusted_proxies: Vec<IpAddr>) -> Self {
        Self {
            max_requests,
            window,
            trusted_proxies,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Limiter for reset requests. Unparseable proxy entries are skipped.
    #[must_use]
    pub fn for_password_reset(security: &SecurityConfig) -> Self {
        let trusted = security
            .trusted_proxy_ips
            .iter()
            .filter_map(|ip| match ip.parse::<IpAddr>() {
                Ok(ip) => Some(ip),
                Err(_) => {
                    tracing::warn!(entry = %ip, "Ignoring invalid trusted proxy address");
                    None
                }
            })
            .collect();

        Self::new(
            usize::try_from(security.password_reset.max_requests).unwrap_or(usize::MAX),
            Duration::from_secs(security.password_reset.window_seconds),
            trusted,
        )
    }

    /// Records a hit for `ip` unless its window is already full.
    pub async fn check(&self, ip: IpAddr, now: Instant) -> bool {
        let mut hits = self.hits.lock().await;

        if hits.len() > 1024 {
            hits.retain(|_, stamps| {
                stamps
                    .back()
                    .is_some_and(|&last| now.saturating_duration_since(last) < self.window)
            });
        }

        let stamps = hits.entry(ip).or_default();
        while stamps
            .front()
            .is_some_and(|&first| now.saturating_duration_since(first) >= self.window)
        {
            stamps.pop_front();
        }

        if stamps.len() < self.max_requests {
            stamps.push_back(now);
            true
        } else {
            false
        }
    }

    /// `X-Forwarded-For` only counts when the peer is a trusted proxy.
    #[must_use]
    pub fn client_ip(&self, peer: Option<IpAddr>, headers: &HeaderMap) -> IpAddr {
        let from_trusted_proxy = peer.is_some_and(|ip| self.trusted_proxies.contains(&ip));

        if from_trusted_proxy
            && let Some(forwarded) = headers.get("x-forwarded-for")
            && let Ok(forwarded) = forwarded.to_str()
            && let Some(first) = forwarded.split(',').next()
            && let Ok(ip) = first.trim().parse()
        {
            return ip;
        }

        peer.unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
    }
}

pub async fn reset_rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let limiter = &state.reset_limiter;
    let ip = limiter.client_ip(peer, request.headers());

    if limiter.check(ip, Instant::now()).await {
        next.run(request).await
    } else {
        tracing::warn!(client_ip = %ip, "Password reset rate limit hit");
        ApiError::TooManyRequests("Too many reset requests, try again later".to_string())
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn fourth_request_in_window_is_rejected() {
        let limiter = RateLimiter::new(3, Duration::from_secs(900), Vec::new());
        let start = Instant::now();
        let client = ip("10.0.0.1");

        for i in 0..3 {
            assert!(limiter.check(client, start + Duration::from_secs(i)).await);
        }
        assert!(!limiter.check(client, start + Duration::from_secs(10)).await);

        // Other addresses are counted separately.
        assert!(limiter.check(ip("10.0.0.2"), start).await);
    }

    #[tokio::test]
    async fn window_slides() {
        let limiter = RateLimiter::new(3, Duration::from_secs(900), Vec::new());
        let start = Instant::now();
        let client = ip("10.0.0.1");

        assert!(limiter.check(client, start).await);
        assert!(limiter.check(client, start + Duration::from_secs(100)).await);
        assert!(limiter.check(client, start + Duration::from_secs(200)).await);
        assert!(!limiter.check(client, start + Duration::from_secs(899)).await);

        // The first hit has left the window, the other two have not.
        assert!(limiter.check(client, start + Duration::from_secs(900)).await);
        assert!(!limiter.check(client, start + Duration::from_secs(901)).await);
    }

    #[test]
    fn forwarded_for_needs_trusted_peer() {
        let limiter = RateLimiter::new(3, Duration::from_secs(900), vec![ip("127.0.0.1")]);
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));

        assert_eq!(
            limiter.client_ip(Some(ip("127.0.0.1")), &headers),
            ip("203.0.113.7")
        );
        assert_eq!(
            limiter.client_ip(Some(ip("198.51.100.2")), &headers),
            ip("198.51.100.2")
        );
        assert_eq!(limiter.client_ip(None, &HeaderMap::new()), ip("127.0.0.1"));
    }
}
