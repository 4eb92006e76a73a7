//! # Access Control
//!
//! One request layer for the session service, configured from `[server]`
//! (or `LEDGERGRID_API_KEY` / `LEDGERGRID_RATE_LIMIT`).
//!
//! ## API key
//!
//! When a key is configured every route needs
//! `Authorization: Bearer <key>` (the bare key is accepted too), except the
//! public catalog routes `GET /health` and `GET /grids`, which never expose
//! rows.
//!
//! ## Quotas
//!
//! Requests under `/sessions/{id}/` draw from that session's own quota, so a
//! client streaming resize or drag events only throttles itself. All other
//! routes share one quota.

use crate::config::ServerConfig;
use crate::error::AppError;
use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, header},
    middleware::Next,
    response::Response,
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Which quota a request draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuotaKey {
    Shared,
    Session(u64),
}

impl QuotaKey {
    /// `/sessions/{id}/...` maps to the session; anything else is shared.
    #[must_use]
    pub fn for_path(path: &str) -> Self {
        path.strip_prefix("/sessions/")
            .and_then(|rest| rest.split('/').next())
            .and_then(|id| id.parse().ok())
            .map_or(Self::Shared, Self::Session)
    }
}

fn is_public(method: &Method, path: &str) -> bool {
    method == Method::GET && matches!(path, "/health" | "/grids")
}

// =============================================================================
// POLICY
// =============================================================================

/// API key plus per-session request quotas. The default policy is open.
#[derive(Default)]
pub struct AccessPolicy {
    api_key: Option<String>,
    limiter: Option<DefaultKeyedRateLimiter<QuotaKey>>,
}

impl AccessPolicy {
    /// `rate_limit` is requests per second per quota; 0 disables limiting.
    #[must_use]
    pub fn new(api_key: Option<String>, rate_limit: u32) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.is_empty()),
            limiter: NonZeroU32::new(rate_limit)
                .map(|rps| RateLimiter::keyed(Quota::per_second(rps))),
        }
    }

    #[must_use]
    pub fn from_config(server: &ServerConfig) -> Self {
        Self::new(server.api_key.clone(), server.rate_limit)
    }

    pub fn requires_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn is_rate_limited(&self) -> bool {
        self.limiter.is_some()
    }

    /// Neither a key nor quotas: the layer can be left out.
    pub fn is_open(&self) -> bool {
        !self.requires_key() && !self.is_rate_limited()
    }

    /// Check the `Authorization` header value of a request.
    pub fn authorize(
        &self,
        method: &Method,
        path: &str,
        authorization: Option<&str>,
    ) -> Result<(), AppError> {
        let Some(expected) = &self.api_key else {
            return Ok(());
        };
        if is_public(method, path) {
            return Ok(());
        }
        let provided = authorization.ok_or(AppError::Unauthorized("missing API key"))?;
        let provided = provided.strip_prefix("Bearer ").unwrap_or(provided);
        // Slices of different lengths compare unequal without a content scan.
        if bool::from(provided.as_bytes().ct_eq(expected.as_bytes())) {
            Ok(())
        } else {
            Err(AppError::Unauthorized("invalid API key"))
        }
    }

    /// Take one request from the quota `path` draws from.
    pub fn admit(&self, path: &str) -> Result<(), AppError> {
        let Some(limiter) = &self.limiter else {
            return Ok(());
        };
        let key = QuotaKey::for_path(path);
        limiter.check_key(&key).map_err(|_| {
            tracing::warn!(?key, path, "request quota spent");
            AppError::RateLimited
        })
    }

    /// Drop quota state of sessions that have been idle long enough to be
    /// full again.
    pub fn forget_idle_sessions(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.retain_recent();
        }
    }
}

// =============================================================================
// MIDDLEWARE
// =============================================================================

/// Authorize, then admit, every request.
pub async fn access_middleware(
    State(policy): State<Arc<AccessPolicy>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if let Err(e) = policy.authorize(request.method(), request.uri().path(), authorization) {
        tracing::warn!(path = %request.uri().path(), error = %e, "request rejected");
        return Err(e);
    }
    policy.admit(request.uri().path())?;
    Ok(next.run(request).await)
}
