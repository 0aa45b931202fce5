//! Request-processing pipeline stages.
//!
//! Inbound order: host filter → CORS → body-size guard → rate limiter →
//! handler. Security headers are applied on the way out and decorate every
//! response, including guard short-circuits and handler error paths.

pub mod body_limit;
pub mod host_filter;
pub mod rate_limiting;
pub mod security_headers;

pub use body_limit::MaxBodySize;
pub use host_filter::HostFilter;
pub use rate_limiting::{RateLimitMiddleware, parse_rate_limit_spec};
pub use security_headers::SecurityHeaders;
