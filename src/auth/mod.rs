//! Authentication core: token codec, session registry, email verification,
//! rate limiting, and the orchestrator tying them to the credential store.

pub mod claims;
pub mod config;
pub mod error;
pub mod password;
pub mod rate_limit;
pub mod registry;
pub mod service;
pub mod users;
mod utils;
pub mod verification;

pub use claims::{Claims, IssuedToken, TokenCodec, TokenKind};
pub use config::AuthConfig;
pub use error::AuthError;
pub use rate_limit::{
    NoopRateLimiter, RateLimitAction, RateLimitDecision, RateLimiter, SlidingWindowLimiter,
    ThrottlePolicy,
};
pub use registry::{MemorySessionRegistry, RedisSessionRegistry, SessionRegistry};
pub use service::{AuthService, Refreshed, SignedIn, SignedUp, TokenPair};
pub use users::{User, UserRole};
pub use verification::{MemoryVerificationStore, RedisVerificationStore, VerificationStore};
