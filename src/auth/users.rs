//! Credential store: user records in Postgres.
//!
//! Users are never physically deleted; registration, verification, and
//! profile updates only mutate rows.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use std::fmt;
use std::str::FromStr;
use tracing::Instrument;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(anyhow::anyhow!("unknown user role: {other}")),
        }
    }
}

/// Identity record owned by the credential store.
#[derive(Clone, Debug)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub name: Option<String>,
    pub settings: serde_json::Value,
    pub email_verified: bool,
}

/// Outcome when attempting to create a new user record.
#[derive(Debug)]
pub(crate) enum InsertOutcome {
    Created(Uuid),
    Conflict,
}

pub(crate) async fn insert_user(
    pool: &PgPool,
    email: &str,
    password_hash: &str,
    name: Option<&str>,
) -> Result<InsertOutcome> {
    let query = r"
        INSERT INTO users
            (email, password_hash, role, name, settings)
        VALUES ($1, $2, 'user', $3, '{}'::jsonb)
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .bind(password_hash)
        .bind(name)
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(row) => Ok(InsertOutcome::Created(row.get("id"))),
        Err(err) if is_unique_violation(&err) => Ok(InsertOutcome::Conflict),
        Err(err) => Err(err).context("failed to insert user"),
    }
}

pub(crate) async fn lookup_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>> {
    let query = r"
        SELECT id, email, password_hash, role, name, settings::text AS settings, email_verified
        FROM users
        WHERE email = $1
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup user by email")?;

    row.map(user_from_row).transpose()
}

pub(crate) async fn mark_email_verified(pool: &PgPool, user_id: Uuid) -> Result<()> {
    let query = r"
        UPDATE users
        SET email_verified = TRUE,
            updated_at = NOW()
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to mark email verified")?;
    Ok(())
}

fn user_from_row(row: sqlx::postgres::PgRow) -> Result<User> {
    let role: String = row.get("role");
    let settings: String = row.get("settings");
    Ok(User {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role: role.parse()?,
        name: row.get("name"),
        settings: serde_json::from_str(&settings).context("failed to parse user settings")?,
        email_verified: row.get("email_verified"),
    })
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}
