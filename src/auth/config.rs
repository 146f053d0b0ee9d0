//! Auth configuration shared by the codec, registries, and handlers.

use super::rate_limit::ThrottlePolicy;

const DEFAULT_ACCESS_TTL_SECONDS: i64 = 15 * 60;
const DEFAULT_REFRESH_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;
const DEFAULT_MAX_SESSIONS: usize = 5;
const DEFAULT_VERIFICATION_TTL_SECONDS: i64 = 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_base_url: String,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
    max_sessions: usize,
    verification_ttl_seconds: i64,
    throttle_policy: ThrottlePolicy,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_base_url: String) -> Self {
        Self {
            frontend_base_url,
            access_ttl_seconds: DEFAULT_ACCESS_TTL_SECONDS,
            refresh_ttl_seconds: DEFAULT_REFRESH_TTL_SECONDS,
            max_sessions: DEFAULT_MAX_SESSIONS,
            verification_ttl_seconds: DEFAULT_VERIFICATION_TTL_SECONDS,
            throttle_policy: ThrottlePolicy::Default,
        }
    }

    #[must_use]
    pub fn with_access_ttl_seconds(mut self, seconds: i64) -> Self {
        self.access_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_refresh_ttl_seconds(mut self, seconds: i64) -> Self {
        self.refresh_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions;
        self
    }

    #[must_use]
    pub fn with_verification_ttl_seconds(mut self, seconds: i64) -> Self {
        self.verification_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_throttle_policy(mut self, policy: ThrottlePolicy) -> Self {
        self.throttle_policy = policy;
        self
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    #[must_use]
    pub fn access_ttl_seconds(&self) -> i64 {
        self.access_ttl_seconds
    }

    #[must_use]
    pub fn refresh_ttl_seconds(&self) -> i64 {
        self.refresh_ttl_seconds
    }

    #[must_use]
    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    #[must_use]
    pub fn verification_ttl_seconds(&self) -> i64 {
        self.verification_ttl_seconds
    }

    #[must_use]
    pub fn throttle_policy(&self) -> ThrottlePolicy {
        self.throttle_policy
    }

    /// Only mark the refresh cookie secure when the frontend is served over HTTPS.
    pub(crate) fn refresh_cookie_secure(&self) -> bool {
        self.frontend_base_url.starts_with("https://")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_overrides() {
        let config = AuthConfig::new("https://pordisto.dev".to_string());

        assert_eq!(config.frontend_base_url(), "https://pordisto.dev");
        assert_eq!(config.access_ttl_seconds(), DEFAULT_ACCESS_TTL_SECONDS);
        assert_eq!(config.refresh_ttl_seconds(), DEFAULT_REFRESH_TTL_SECONDS);
        assert_eq!(config.max_sessions(), DEFAULT_MAX_SESSIONS);
        assert_eq!(
            config.verification_ttl_seconds(),
            DEFAULT_VERIFICATION_TTL_SECONDS
        );
        assert_eq!(config.throttle_policy(), ThrottlePolicy::Default);
        assert!(config.refresh_cookie_secure());

        let config = config
            .with_access_ttl_seconds(60)
            .with_refresh_ttl_seconds(120)
            .with_max_sessions(2)
            .with_verification_ttl_seconds(300)
            .with_throttle_policy(ThrottlePolicy::Strict);

        assert_eq!(config.access_ttl_seconds(), 60);
        assert_eq!(config.refresh_ttl_seconds(), 120);
        assert_eq!(config.max_sessions(), 2);
        assert_eq!(config.verification_ttl_seconds(), 300);
        assert_eq!(config.throttle_policy(), ThrottlePolicy::Strict);
    }

    #[test]
    fn plain_http_frontend_disables_secure_cookie() {
        let config = AuthConfig::new("http://localhost:5173".to_string());
        assert!(!config.refresh_cookie_secure());
    }
}
