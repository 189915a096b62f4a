/// Rate limiting middleware
///
/// Token bucket rate limiting with Redis-backed state, so limits hold
/// across multiple API instances. Two buckets exist:
///
/// - **Login**: 5 requests/minute per client IP, protecting the password
///   verification path from online guessing
/// - **API**: 100 requests/minute per authenticated user
///
/// # Algorithm
///
/// Token bucket: tokens refill at a constant rate, each request consumes
/// one, and the request is rejected when the bucket is empty. The
/// read-modify-write is a single Lua script so concurrent requests cannot
/// race.
///
/// # Storage
///
/// Keys: `ratelimit:ip:{addr}` and `ratelimit:user:{uuid}`, TTL 2 minutes
/// for auto-cleanup. When no Redis connection is configured the limiter is
/// disabled and requests pass through (development mode).
///
/// # Headers
///
/// Responses carry `X-RateLimit-Limit`, `X-RateLimit-Remaining`, and
/// `X-RateLimit-Reset`; 429 responses also carry `Retry-After`.

use crate::app::AppState;
use crate::error::ApiError;
use axum::{
    extract::{Extension, Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use redis::aio::ConnectionManager;
use std::time::{SystemTime, UNIX_EPOCH};
use taskpad_shared::auth::middleware::AuthUser;

/// Rate limit configuration for one bucket class
#[derive(Debug, Clone, Copy)]
pub struct RateLimit {
    /// Maximum requests per minute
    pub requests_per_minute: u32,

    /// Token refill rate (tokens per second)
    pub refill_rate: f64,

    /// Maximum tokens in bucket (burst capacity)
    pub bucket_capacity: u32,
}

impl RateLimit {
    /// Login limit: 5 attempts per minute per IP
    pub fn login() -> Self {
        RateLimit {
            requests_per_minute: 5,
            refill_rate: 5.0 / 60.0,
            bucket_capacity: 5,
        }
    }

    /// General API limit: 100 requests per minute per user
    pub fn api() -> Self {
        RateLimit {
            requests_per_minute: 100,
            refill_rate: 100.0 / 60.0,
            bucket_capacity: 100,
        }
    }
}

/// Result of a rate limit check
#[derive(Debug)]
pub struct RateLimitResult {
    /// Whether the request is allowed
    pub ok: bool,

    /// Tokens remaining
    pub remaining: u32,

    /// Seconds until the next token (429) or until full replenish (2xx)
    pub reset_after: u64,
}

/// Per-IP rate limit for the login endpoint
///
/// The client address is taken from the first `X-Forwarded-For` hop, which
/// is what the reverse proxy in front of the server sets. Requests without
/// the header share one bucket.
pub async fn login_rate_limit_layer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let addr = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let key = format!("ratelimit:ip:{}", addr);
    check_and_run(state, key, RateLimit::login(), request, next).await
}

/// Per-user rate limit for authenticated API routes
///
/// Runs after JWT validation, so the `AuthUser` extension is present.
pub async fn user_rate_limit_layer(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let key = format!("ratelimit:user:{}", auth.user_id);
    check_and_run(state, key, RateLimit::api(), request, next).await
}

/// Checks the bucket, rejects with 429 when empty, and stamps rate limit
/// headers on the response.
async fn check_and_run(
    state: AppState,
    key: String,
    rate_limit: RateLimit,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(redis) = state.redis.clone() else {
        // No Redis configured: limiter disabled.
        tracing::debug!("Rate limiting disabled (no Redis connection)");
        return Ok(next.run(request).await);
    };

    let result = check_rate_limit(redis, &key, rate_limit).await?;

    if !result.ok {
        tracing::warn!(key = %key, "Rate limit exceeded");
        return Err(ApiError::RateLimitExceeded {
            retry_after: result.reset_after,
            message: format!(
                "Rate limit exceeded. Try again in {} seconds",
                result.reset_after
            ),
        });
    }

    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&rate_limit.requests_per_minute.to_string()) {
        headers.insert("X-RateLimit-Limit", value);
    }
    if let Ok(value) = HeaderValue::from_str(&result.remaining.to_string()) {
        headers.insert("X-RateLimit-Remaining", value);
    }
    if let Ok(value) = HeaderValue::from_str(&(unix_now() + result.reset_after).to_string()) {
        headers.insert("X-RateLimit-Reset", value);
    }

    Ok(response)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Checks a rate limit bucket in Redis
///
/// The Lua script performs the whole token bucket step atomically:
/// load state, refill by elapsed time, try to consume one token, store.
///
/// # Errors
///
/// Returns 500 if the Redis call fails; the limiter never fails open once
/// it is configured.
async fn check_rate_limit(
    mut conn: ConnectionManager,
    key: &str,
    rate_limit: RateLimit,
) -> Result<RateLimitResult, ApiError> {
    let script = redis::Script::new(
        r#"
        local key = KEYS[1]
        local capacity = tonumber(ARGV[1])
        local refill_rate = tonumber(ARGV[2])
        local now = tonumber(ARGV[3])

        local bucket = redis.call('HMGET', key, 'tokens', 'last_refill')
        local tokens = tonumber(bucket[1])
        local last_refill = tonumber(bucket[2])

        if not tokens then
            tokens = capacity
            last_refill = now
        end

        local elapsed = now - last_refill
        tokens = math.min(capacity, tokens + (elapsed * refill_rate))

        if tokens >= 1 then
            tokens = tokens - 1
            redis.call('HMSET', key, 'tokens', tokens, 'last_refill', now)
            redis.call('EXPIRE', key, 120)
            return {1, math.floor(tokens), 60}
        else
            return {0, 0, math.ceil((1 - tokens) / refill_rate)}
        end
        "#,
    );

    let result: Vec<i64> = script
        .key(key)
        .arg(rate_limit.bucket_capacity)
        .arg(rate_limit.refill_rate)
        .arg(unix_now())
        .invoke_async(&mut conn)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Rate limit script failed");
            ApiError::InternalError("Rate limit check failed".to_string())
        })?;

    if result.len() < 3 {
        return Err(ApiError::InternalError(
            "Rate limit script returned unexpected shape".to_string(),
        ));
    }

    Ok(RateLimitResult {
        ok: result[0] == 1,
        remaining: result[1] as u32,
        reset_after: result[2] as u64,
    })
}
