//! # Throttling
//!
//! Per-user request limits for write endpoints.
//!
//! ## Rates
//! Rates are written `<requests>/<period>`, where the period is read from
//! its first letter: `s`econd, `m`inute, `h`our, `d`ay. So `20/hour`,
//! `20/h` and `20/hours` are the same rate.
//!
//! ## Counters
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  memory cache ──► governor keyed limiter per scope, keyed by user id   │
//! │                   20/hour = burst of 20, one request back every 3 min  │
//! │                   idle users are swept once many are tracked          │
//! │                                                                         │
//! │  redis cache  ──► fixed window shared by every instance                │
//! │                   MULTI  INCR throttle_review_42                       │
//! │                          EXPIRE throttle_review_42 3600 NX             │
//! │                          TTL throttle_review_42                        │
//! │                   EXEC   count > 20 → 429, Retry-After = TTL           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use redis::aio::ConnectionManager;
use tracing::{debug, warn};

use crate::cache::Cache;
use crate::error::{ApiError, ApiResult};

/// Tracked users per scope before idle ones are swept.
const SWEEP_THRESHOLD: usize = 10_000;

type UserLimiter = RateLimiter<i64, DefaultKeyedStateStore<i64>, DefaultClock>;

/// Named rate limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThrottleScope {
    /// Creating reviews
    Review,
    /// Creating or changing reactions
    ReviewReact,
}

impl ThrottleScope {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ThrottleScope::Review => "review",
            ThrottleScope::ReviewReact => "review_react",
        }
    }
}

impl fmt::Display for ThrottleScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Allowed requests per period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rate {
    pub requests: NonZeroU32,
    pub period: Duration,
}

impl Rate {
    /// Token-bucket form: the whole allowance as a burst, refilled evenly
    /// over the period.
    fn quota(&self) -> Quota {
        let interval = self.period / self.requests.get();
        Quota::with_period(interval)
            .unwrap_or_else(|| Quota::per_second(self.requests))
            .allow_burst(self.requests)
    }
}

/// Rate string that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid rate '{0}', expected e.g. '20/hour'")]
pub struct InvalidRate(pub String);

impl FromStr for Rate {
    type Err = InvalidRate;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidRate(s.to_string());

        let (requests, period) = s.trim().split_once('/').ok_or_else(invalid)?;
        let requests: NonZeroU32 = requests.trim().parse().map_err(|_| invalid())?;

        let secs = match period.trim().chars().next() {
            Some('s') => 1,
            Some('m') => 60,
            Some('h') => 3_600,
            Some('d') => 86_400,
            _ => return Err(invalid()),
        };

        Ok(Rate {
            requests,
            period: Duration::from_secs(secs),
        })
    }
}

#[derive(Clone)]
enum Counters {
    Local {
        review: Arc<UserLimiter>,
        review_react: Arc<UserLimiter>,
    },
    Shared(ConnectionManager),
}

/// Enforces the configured rates.
#[derive(Clone)]
pub struct Throttle {
    review: Rate,
    review_react: Rate,
    counters: Counters,
}

impl fmt::Debug for Throttle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Throttle")
            .field("review", &self.review)
            .field("review_react", &self.review_react)
            .finish()
    }
}

impl Throttle {
    /// Counts in Redis when the cache is Redis-backed, in process otherwise.
    pub fn new(cache: Cache, review: Rate, review_react: Rate) -> Self {
        let counters = match cache.redis_connection() {
            Some(conn) => Counters::Shared(conn),
            None => Counters::Local {
                review: Arc::new(RateLimiter::keyed(review.quota())),
                review_react: Arc::new(RateLimiter::keyed(review_react.quota())),
            },
        };

        Throttle {
            review,
            review_react,
            counters,
        }
    }

    /// Rate for a scope.
    pub fn rate(&self, scope: ThrottleScope) -> Rate {
        match scope {
            ThrottleScope::Review => self.review,
            ThrottleScope::ReviewReact => self.review_react,
        }
    }

    /// Counts a request by `user_id` against `scope`.
    ///
    /// ## Returns
    /// * `Ok(())` - Request allowed
    /// * `Err(ApiError)` - 429 with the seconds until the next request is allowed
    ///
    /// A Redis outage lets the request through.
    pub async fn check(&self, scope: ThrottleScope, user_id: i64) -> ApiResult<()> {
        let wait = match &self.counters {
            Counters::Local { review, review_react } => {
                let limiter = match scope {
                    ThrottleScope::Review => review,
                    ThrottleScope::ReviewReact => review_react,
                };
                check_local(limiter, user_id)
            }
            Counters::Shared(conn) => {
                let rate = self.rate(scope);
                match check_shared(conn.clone(), scope, user_id, rate).await {
                    Ok(wait) => wait,
                    Err(e) => {
                        warn!(error = %e, %scope, "Throttle counter unavailable, allowing request");
                        None
                    }
                }
            }
        };

        match wait {
            Some(wait) => {
                let secs = wait.as_secs_f64().ceil().max(1.0) as u64;
                debug!(%scope, user_id, wait = secs, "Request throttled");
                Err(ApiError::throttled(secs))
            }
            None => Ok(()),
        }
    }

    /// Users tracked in process, across scopes.
    pub fn tracked_users(&self) -> usize {
        match &self.counters {
            Counters::Local { review, review_react } => review.len() + review_react.len(),
            Counters::Shared(_) => 0,
        }
    }

    /// Forgets users whose allowance has fully refilled.
    pub fn sweep(&self) {
        if let Counters::Local { review, review_react } = &self.counters {
            for limiter in [review, review_react] {
                limiter.retain_recent();
                limiter.shrink_to_fit();
            }
        }
    }
}

/// Returns the wait before `user_id` may retry, if over the limit.
fn check_local(limiter: &UserLimiter, user_id: i64) -> Option<Duration> {
    let result = limiter.check_key(&user_id);

    if limiter.len() > SWEEP_THRESHOLD {
        limiter.retain_recent();
    }

    result
        .err()
        .map(|not_until| not_until.wait_time_from(DefaultClock::default().now()))
}

/// Fixed-window count in Redis. The window TTL is only set by the request
/// that opens it, in the same transaction as the increment.
async fn check_shared(
    mut conn: ConnectionManager,
    scope: ThrottleScope,
    user_id: i64,
    rate: Rate,
) -> redis::RedisResult<Option<Duration>> {
    let key = format!("throttle_{}_{}", scope, user_id);
    let window = rate.period.as_secs().max(1);

    let (count, ttl): (u64, i64) = redis::pipe()
        .atomic()
        .incr(&key, 1)
        .cmd("EXPIRE")
        .arg(&key)
        .arg(window)
        .arg("NX")
        .ignore()
        .ttl(&key)
        .query_async(&mut conn)
        .await?;

    if count > u64::from(rate.requests.get()) {
        Ok(Some(Duration::from_secs(ttl.max(1) as u64)))
    } else {
        Ok(None)
    }
}
