//! Rate limiting primitives for auth flows.
//!
//! Policies are selected by configuration and injected as a capability
//! (`Arc<dyn RateLimiter>`) rather than subclassed per endpoint.

use std::collections::{HashMap, VecDeque};
use std::str::FromStr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug)]
pub enum RateLimitAction {
    SignUp,
    SignIn,
    Refresh,
    VerifyEmail,
    ResendVerification,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Limited,
}

/// Window/limit presets mirroring the default/strict/rigid throttler tiers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ThrottlePolicy {
    #[default]
    Default,
    Strict,
    Rigid,
}

impl ThrottlePolicy {
    /// Maximum hits per tracker key within the window.
    #[must_use]
    pub fn limit(self) -> usize {
        match self {
            Self::Default => 100,
            Self::Strict => 10,
            Self::Rigid => 3,
        }
    }

    #[must_use]
    pub fn window(self) -> Duration {
        match self {
            Self::Default | Self::Strict => Duration::from_secs(60),
            Self::Rigid => Duration::from_secs(60 * 60),
        }
    }
}

impl FromStr for ThrottlePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "strict" => Ok(Self::Strict),
            "rigid" => Ok(Self::Rigid),
            other => Err(format!("unknown throttle policy: {other}")),
        }
    }
}

pub trait RateLimiter: Send + Sync {
    fn check_ip(&self, ip: Option<&str>, action: RateLimitAction) -> RateLimitDecision;
    fn check_email(&self, email: &str, action: RateLimitAction) -> RateLimitDecision;
}

#[derive(Clone, Debug)]
pub struct NoopRateLimiter;

impl RateLimiter for NoopRateLimiter {
    fn check_ip(&self, _ip: Option<&str>, _action: RateLimitAction) -> RateLimitDecision {
        RateLimitDecision::Allowed
    }

    fn check_email(&self, _email: &str, _action: RateLimitAction) -> RateLimitDecision {
        RateLimitDecision::Allowed
    }
}

/// In-process sliding-window limiter.
///
/// Hit timestamps are tracked per tracker key (action + identity); a hit is
/// only recorded when it is allowed, so a limited caller stays limited until
/// the window slides past earlier hits. Keys whose hits have all left the
/// window are swept, so the map is bounded by the keys active within one
/// window rather than every identity ever seen.
pub struct SlidingWindowLimiter {
    policy: ThrottlePolicy,
    state: Mutex<WindowState>,
}

struct WindowState {
    hits: HashMap<String, VecDeque<Instant>>,
    last_sweep: Instant,
}

impl SlidingWindowLimiter {
    #[must_use]
    pub fn new(policy: ThrottlePolicy) -> Self {
        Self {
            policy,
            state: Mutex::new(WindowState {
                hits: HashMap::new(),
                last_sweep: Instant::now(),
            }),
        }
    }

    fn check(&self, key: String) -> RateLimitDecision {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: String, now: Instant) -> RateLimitDecision {
        let window = self.policy.window();
        let limit = self.policy.limit();

        let mut state = match self.state.lock() {
            Ok(state) => state,
            // A poisoned lock means a panic elsewhere; fail open rather than
            // locking every caller out.
            Err(poisoned) => poisoned.into_inner(),
        };

        // At most once per window, drop every bucket whose newest hit has
        // left the window; those keys can never influence a decision again.
        if now.duration_since(state.last_sweep) >= window {
            state
                .hits
                .retain(|_, bucket| {
                    bucket
                        .back()
                        .is_some_and(|hit| now.duration_since(*hit) < window)
                });
            state.last_sweep = now;
        }

        let bucket = state.hits.entry(key).or_default();
        while bucket
            .front()
            .is_some_and(|hit| now.duration_since(*hit) >= window)
        {
            bucket.pop_front();
        }

        if bucket.len() >= limit {
            return RateLimitDecision::Limited;
        }

        bucket.push_back(now);
        RateLimitDecision::Allowed
    }
}

impl RateLimiter for SlidingWindowLimiter {
    fn check_ip(&self, ip: Option<&str>, action: RateLimitAction) -> RateLimitDecision {
        // Without a client address there is nothing meaningful to key on.
        match ip {
            Some(ip) => self.check(format!("{action:?}:ip:{ip}")),
            None => RateLimitDecision::Allowed,
        }
    }

    fn check_email(&self, email: &str, action: RateLimitAction) -> RateLimitDecision {
        self.check(format!("{action:?}:email:{email}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_rate_limiter_allows() {
        let limiter = NoopRateLimiter;
        assert_eq!(
            limiter.check_ip(None, RateLimitAction::SignUp),
            RateLimitDecision::Allowed
        );
        assert_eq!(
            limiter.check_email("user@example.com", RateLimitAction::SignIn),
            RateLimitDecision::Allowed
        );
    }

    #[test]
    fn policy_presets() {
        assert_eq!(ThrottlePolicy::Default.limit(), 100);
        assert_eq!(ThrottlePolicy::Strict.limit(), 10);
        assert_eq!(ThrottlePolicy::Rigid.limit(), 3);
        assert_eq!(ThrottlePolicy::Strict.window(), Duration::from_secs(60));
        assert_eq!(ThrottlePolicy::Rigid.window(), Duration::from_secs(3600));
    }

    #[test]
    fn policy_parses_from_str() {
        assert_eq!("default".parse(), Ok(ThrottlePolicy::Default));
        assert_eq!("STRICT".parse(), Ok(ThrottlePolicy::Strict));
        assert_eq!("rigid".parse(), Ok(ThrottlePolicy::Rigid));
        assert!("lenient".parse::<ThrottlePolicy>().is_err());
    }

    #[test]
    fn strict_policy_limits_eleventh_attempt() {
        let limiter = SlidingWindowLimiter::new(ThrottlePolicy::Strict);
        for _ in 0..10 {
            assert_eq!(
                limiter.check_email("alice@example.com", RateLimitAction::SignIn),
                RateLimitDecision::Allowed
            );
        }
        assert_eq!(
            limiter.check_email("alice@example.com", RateLimitAction::SignIn),
            RateLimitDecision::Limited
        );
    }

    #[test]
    fn tracker_keys_are_independent() {
        let limiter = SlidingWindowLimiter::new(ThrottlePolicy::Rigid);
        for _ in 0..3 {
            assert_eq!(
                limiter.check_email("alice@example.com", RateLimitAction::SignIn),
                RateLimitDecision::Allowed
            );
        }
        // Same email, different action: separate bucket.
        assert_eq!(
            limiter.check_email("alice@example.com", RateLimitAction::Refresh),
            RateLimitDecision::Allowed
        );
        // Different email, same action: separate bucket.
        assert_eq!(
            limiter.check_email("bob@example.com", RateLimitAction::SignIn),
            RateLimitDecision::Allowed
        );
        assert_eq!(
            limiter.check_email("alice@example.com", RateLimitAction::SignIn),
            RateLimitDecision::Limited
        );
    }

    #[test]
    fn window_slides_past_old_hits() {
        let limiter = SlidingWindowLimiter::new(ThrottlePolicy::Rigid);
        let key = || "SignIn:email:alice@example.com".to_string();
        let start = Instant::now();
        let half = ThrottlePolicy::Rigid.window() / 2;

        assert_eq!(limiter.check_at(key(), start), RateLimitDecision::Allowed);
        assert_eq!(limiter.check_at(key(), start), RateLimitDecision::Allowed);
        assert_eq!(
            limiter.check_at(key(), start + half),
            RateLimitDecision::Allowed
        );
        assert_eq!(
            limiter.check_at(key(), start + half),
            RateLimitDecision::Limited
        );

        // A full window after the first two hits only the mid-window hit
        // still counts, so two more attempts fit before the cap.
        let later = start + ThrottlePolicy::Rigid.window();
        assert_eq!(limiter.check_at(key(), later), RateLimitDecision::Allowed);
        assert_eq!(limiter.check_at(key(), later), RateLimitDecision::Allowed);
        assert_eq!(limiter.check_at(key(), later), RateLimitDecision::Limited);
    }

    #[test]
    fn stale_tracker_keys_are_swept() {
        let limiter = SlidingWindowLimiter::new(ThrottlePolicy::Strict);
        let start = Instant::now();

        for n in 0..50 {
            let key = format!("SignIn:email:user{n}@example.com");
            assert_eq!(limiter.check_at(key, start), RateLimitDecision::Allowed);
        }

        // Once the window has passed, the next check sweeps every stale key
        // instead of letting one entry per address accumulate forever.
        let later = start + ThrottlePolicy::Strict.window() + Duration::from_secs(1);
        limiter.check_at("SignIn:email:fresh@example.com".to_string(), later);

        let state = limiter.state.lock().expect("state lock");
        assert_eq!(state.hits.len(), 1);
        assert!(state.hits.contains_key("SignIn:email:fresh@example.com"));
    }

    #[test]
    fn missing_ip_is_allowed() {
        let limiter = SlidingWindowLimiter::new(ThrottlePolicy::Rigid);
        for _ in 0..10 {
            assert_eq!(
                limiter.check_ip(None, RateLimitAction::SignIn),
                RateLimitDecision::Allowed
            );
        }
    }
}
