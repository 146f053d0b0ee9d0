//! Command-line argument dispatch and server initialization.
//!
//! This module parses validated CLI arguments and maps them to the appropriate
//! action, such as starting the API server with its full configuration state.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::auth;
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;
    let redis_url = matches.get_one::<String>("redis-url").cloned();

    let auth_opts = auth::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        redis_url,
        signing_secret: auth_opts.signing_secret,
        access_ttl_seconds: auth_opts.access_ttl_seconds,
        refresh_ttl_seconds: auth_opts.refresh_ttl_seconds,
        verification_ttl_seconds: auth_opts.verification_ttl_seconds,
        max_sessions: auth_opts.max_sessions,
        throttle_policy: auth_opts.throttle_policy,
        frontend_base_url: auth_opts.frontend_base_url,
    }))
}
