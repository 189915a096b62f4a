/// HTTP middleware
///
/// Cross-cutting request/response processing: rate limiting and security
/// headers. JWT extraction lives in the router module since it needs the
/// application state.

pub mod rate_limit;
pub mod security;
