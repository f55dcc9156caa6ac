use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation id for one request, available to handlers as an extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl RequestId {
    /// Reuses a caller-supplied `x-request-id` when it is printable and
    /// non-blank, otherwise mints a `UUIDv4`.
    fn from_headers(headers: &HeaderMap) -> Self {
        let supplied = headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        Self(supplied.map_or_else(|| Uuid::new_v4().to_string(), ToOwned::to_owned))
    }
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    refilled_at: Instant,
}

/// Token bucket shared by every request passing through the layer.
///
/// Holds up to `capacity` tokens and regains all of them over `period`, so a
/// burst of `capacity` expansions is allowed and the sustained rate is
/// `capacity / period`.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    capacity: f64,
    per_second: f64,
    bucket: Arc<Mutex<Bucket>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(capacity: u32, period: Duration) -> Self {
        let capacity = f64::from(capacity);
        let per_second = if period.is_zero() {
            f64::INFINITY
        } else {
            capacity / period.as_secs_f64()
        };
        Self {
            capacity,
            per_second,
            bucket: Arc::new(Mutex::new(Bucket {
                tokens: capacity,
                refilled_at: Instant::now(),
            })),
        }
    }

    async fn try_acquire(&self) -> bool {
        let mut bucket = self.bucket.lock().await;
        let now = Instant::now();
        let earned = now.duration_since(bucket.refilled_at).as_secs_f64() * self.per_second;
        bucket.tokens = (bucket.tokens + earned).min(self.capacity);
        bucket.refilled_at = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Serialize)]
struct RejectionBody {
    error: Rejection,
}

#[derive(Debug, Serialize)]
struct Rejection {
    code: &'static str,
    message: &'static str,
}

/// Tags the request with a [`RequestId`] and echoes it on the response.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = RequestId::from_headers(req.headers());
    let header = HeaderValue::from_str(&id.0).ok();
    req.extensions_mut().insert(id);

    let mut res = next.run(req).await;
    if let Some(val) = header {
        res.headers_mut().insert(REQUEST_ID_HEADER, val);
    }
    res
}

/// Answers 429 once the bucket is empty.
pub async fn enforce_rate_limit(
    State(limiter): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    if limiter.try_acquire().await {
        return next.run(req).await;
    }

    tracing::warn!(
        capacity = limiter.capacity,
        path = %req.uri().path(),
        "rate limit exceeded"
    );
    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(RejectionBody {
            error: Rejection {
                code: "rate_limited",
                message: "rate limit exceeded",
            },
        }),
    )
        .into_response()
}
