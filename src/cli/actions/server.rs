use crate::api;
use crate::auth::{AuthConfig, ThrottlePolicy};
use anyhow::Result;
use secrecy::SecretString;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub redis_url: Option<String>,
    pub signing_secret: SecretString,
    pub access_ttl_seconds: i64,
    pub refresh_ttl_seconds: i64,
    pub verification_ttl_seconds: i64,
    pub max_sessions: usize,
    pub throttle_policy: ThrottlePolicy,
    pub frontend_base_url: String,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the store connections or the server fail to start.
pub async fn execute(args: Args) -> Result<()> {
    let config = AuthConfig::new(args.frontend_base_url)
        .with_access_ttl_seconds(args.access_ttl_seconds)
        .with_refresh_ttl_seconds(args.refresh_ttl_seconds)
        .with_verification_ttl_seconds(args.verification_ttl_seconds)
        .with_max_sessions(args.max_sessions)
        .with_throttle_policy(args.throttle_policy);

    api::new(
        args.port,
        args.dsn,
        args.redis_url,
        args.signing_secret,
        config,
    )
    .await
}
