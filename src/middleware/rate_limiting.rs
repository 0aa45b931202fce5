use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
};
use dashmap::DashMap;
use futures_util::future::{Ready, ok};
use log::{debug, warn};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use crate::error::AppError;

/// Fixed value advertised on 429 responses; not derived from the
/// remaining window.
const RETRY_AFTER_SECS: u64 = 60;

/// Parse a limit spec of the form "N/period", e.g. "60/minute".
pub fn parse_rate_limit_spec(spec: &str) -> Result<(u64, Duration), AppError> {
    let (count, period) = spec
        .split_once('/')
        .ok_or_else(|| AppError::Configuration(format!("Invalid rate limit spec '{}'", spec)))?;

    let max_requests = count
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| {
            AppError::Configuration(format!("Invalid rate limit count in '{}'", spec))
        })?;

    let window = match period.trim() {
        "second" => Duration::from_secs(1),
        "minute" => Duration::from_secs(60),
        "hour" => Duration::from_secs(3600),
        "day" => Duration::from_secs(86400),
        other => {
            return Err(AppError::Configuration(format!(
                "Unknown rate limit period '{}'",
                other
            )));
        }
    };

    Ok((max_requests, window))
}

/// Rate limiter entry for tracking requests within a fixed window.
#[derive(Debug, Clone)]
struct RateLimitEntry {
    count: u64,
    window_start: Instant,
}

impl RateLimitEntry {
    fn new() -> Self {
        Self {
            count: 1,
            window_start: Instant::now(),
        }
    }

    fn is_window_expired(&self, window: Duration) -> bool {
        self.window_start.elapsed() > window
    }

    fn increment_if_valid(&mut self, max_requests: u64, window: Duration) -> bool {
        if self.is_window_expired(window) {
            // Reset window
            self.count = 1;
            self.window_start = Instant::now();
            true
        } else if self.count < max_requests {
            self.count += 1;
            true
        } else {
            false
        }
    }
}

/// Rate limiting middleware keyed by client IP, with one global limit
/// applied uniformly to every route. Counters are shared across all
/// worker threads through the cloned `DashMap`.
#[derive(Clone)]
pub struct RateLimitMiddleware {
    max_requests: u64,
    window: Duration,
    storage: Arc<DashMap<String, RateLimitEntry>>,
}

impl RateLimitMiddleware {
    pub fn new(max_requests: u64, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            storage: Arc::new(DashMap::new()),
        }
    }

    pub fn from_spec(spec: &str) -> Result<Self, AppError> {
        let (max_requests, window) = parse_rate_limit_spec(spec)?;
        Ok(Self::new(max_requests, window))
    }

    // Extracts the client IP address. Relies on the immediate upstream proxy
    // correctly setting X-Forwarded-For or X-Real-IP; the first IP in
    // X-Forwarded-For is the original client.
    fn extract_client_ip(req: &ServiceRequest) -> String {
        if let Some(forwarded_for) = req.headers().get("x-forwarded-for") {
            if let Ok(forwarded_str) = forwarded_for.to_str() {
                if let Some(first_ip) = forwarded_str.split(',').next() {
                    return first_ip.trim().to_string();
                }
            }
        }

        if let Some(real_ip) = req.headers().get("x-real-ip") {
            if let Ok(real_ip_str) = real_ip.to_str() {
                return real_ip_str.to_string();
            }
        }

        if let Some(peer_addr) = req.peer_addr() {
            peer_addr.ip().to_string()
        } else {
            "unknown".to_string()
        }
    }

    fn is_request_allowed(&self, key: &str) -> bool {
        // Decide under the entry lock so concurrent requests from one
        // client cannot both claim the same slot.
        let mut allowed = true;
        self.storage
            .entry(key.to_string())
            .and_modify(|entry| {
                allowed = entry.increment_if_valid(self.max_requests, self.window);
            })
            .or_insert_with(RateLimitEntry::new);
        allowed
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RateLimitService {
            service: Arc::new(service),
            middleware: self.clone(),
        })
    }
}

pub struct RateLimitService<S> {
    service: Arc<S>,
    middleware: RateLimitMiddleware,
}

impl<S, B> Service<ServiceRequest> for RateLimitService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // Skip rate limiting for OPTIONS requests (CORS preflight)
        if req.method() == actix_web::http::Method::OPTIONS {
            let fut = self.service.call(req);
            return Box::pin(async move { fut.await.map(|res| res.map_into_left_body()) });
        }

        let client_ip = RateLimitMiddleware::extract_client_ip(&req);
        debug!("Rate limiting check for {} from IP: {}", req.path(), client_ip);

        if !self.middleware.is_request_allowed(&client_ip) {
            warn!(
                "Rate limit exceeded for {} from IP: {}",
                req.path(),
                client_ip
            );
            let (request, _payload) = req.into_parts();
            let response = HttpResponse::TooManyRequests()
                .insert_header((header::RETRY_AFTER, RETRY_AFTER_SECS.to_string()))
                .body("Rate limit exceeded");
            return Box::pin(futures_util::future::ready(Ok(
                ServiceResponse::new(request, response).map_into_right_body(),
            )));
        }

        let fut = self.service.call(req);
        Box::pin(async move { fut.await.map(|res| res.map_into_left_body()) })
    }
}
