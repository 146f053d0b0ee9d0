use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

use crate::auth::ThrottlePolicy;

pub const ARG_SIGNING_SECRET: &str = "signing-secret";

pub fn with_args(command: Command) -> Command {
    let command = with_token_args(command);
    let command = with_session_args(command);
    with_frontend_args(command)
}

fn with_token_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SIGNING_SECRET)
                .long(ARG_SIGNING_SECRET)
                .help("Symmetric secret for signing access and refresh tokens")
                .env("PORDISTO_SIGNING_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new("access-ttl-seconds")
                .long("access-ttl-seconds")
                .help("Access token TTL in seconds")
                .env("PORDISTO_ACCESS_TTL_SECONDS")
                .default_value("900")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("refresh-ttl-seconds")
                .long("refresh-ttl-seconds")
                .help("Refresh token TTL in seconds")
                .env("PORDISTO_REFRESH_TTL_SECONDS")
                .default_value("604800")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("verification-ttl-seconds")
                .long("verification-ttl-seconds")
                .help("Email verification token TTL in seconds")
                .env("PORDISTO_VERIFICATION_TTL_SECONDS")
                .default_value("86400")
                .value_parser(clap::value_parser!(i64)),
        )
}

fn with_session_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("max-sessions")
                .long("max-sessions")
                .help("Maximum concurrent refresh sessions per user")
                .env("PORDISTO_MAX_SESSIONS")
                .default_value("5")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("throttle-policy")
                .long("throttle-policy")
                .help("Rate limit preset: default, strict or rigid")
                .env("PORDISTO_THROTTLE_POLICY")
                .default_value("default")
                .value_parser(["default", "strict", "rigid"]),
        )
}

fn with_frontend_args(command: Command) -> Command {
    command.arg(
        Arg::new("frontend-base-url")
            .long("frontend-base-url")
            .help("Frontend base URL used for verification links and CORS")
            .env("PORDISTO_FRONTEND_BASE_URL")
            .default_value("https://pordisto.dev"),
    )
}

#[derive(Debug)]
pub struct Options {
    pub signing_secret: SecretString,
    pub access_ttl_seconds: i64,
    pub refresh_ttl_seconds: i64,
    pub verification_ttl_seconds: i64,
    pub max_sessions: usize,
    pub throttle_policy: ThrottlePolicy,
    pub frontend_base_url: String,
}

impl Options {
    /// Collect the auth options from parsed matches.
    ///
    /// # Errors
    /// Returns an error if a required argument is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let signing_secret = matches
            .get_one::<String>(ARG_SIGNING_SECRET)
            .cloned()
            .context("missing required argument: --signing-secret")?;
        let throttle_policy = matches
            .get_one::<String>("throttle-policy")
            .map(String::as_str)
            .unwrap_or("default")
            .parse::<ThrottlePolicy>()
            .map_err(|err| anyhow::anyhow!(err))?;

        Ok(Self {
            signing_secret: SecretString::from(signing_secret),
            access_ttl_seconds: matches
                .get_one::<i64>("access-ttl-seconds")
                .copied()
                .unwrap_or(900),
            refresh_ttl_seconds: matches
                .get_one::<i64>("refresh-ttl-seconds")
                .copied()
                .unwrap_or(604_800),
            verification_ttl_seconds: matches
                .get_one::<i64>("verification-ttl-seconds")
                .copied()
                .unwrap_or(86_400),
            max_sessions: matches.get_one::<usize>("max-sessions").copied().unwrap_or(5),
            throttle_policy,
            frontend_base_url: matches
                .get_one::<String>("frontend-base-url")
                .cloned()
                .unwrap_or_else(|| "https://pordisto.dev".to_string()),
        })
    }
}
