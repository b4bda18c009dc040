// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Email/password identity provider.

use crate::db::{self, SharedConnection};
use crate::models::UserProfile;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{Connection, OptionalExtension, params};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{info, warn};

pub const MIN_PASSWORD_LEN: usize = 6;

const SESSION_KEY: &str = "session_uid";

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static email pattern"));

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email address '{0}'")]
    InvalidEmail(String),
    #[error("password must be at least {} characters", MIN_PASSWORD_LEN)]
    WeakPassword,
    #[error("email '{0}' is already registered")]
    EmailInUse(String),
    #[error("wrong email or password")]
    WrongCredentials,
    #[error("identity provider is not configured, use demo mode")]
    NotConfigured,
    #[error("identity storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

pub trait IdentityProvider: Send + Sync {
    fn sign_in(&self, email: &str, password: &str) -> Result<UserProfile, AuthError>;

    fn register(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<UserProfile, AuthError>;

    fn sign_out(&self) -> Result<(), AuthError>;

    /// The signed-in user, if any.
    fn current_user(&self) -> Option<UserProfile>;
}

/// Users and the active session kept in the local SQLite database.
pub struct LocalIdentity {
    conn: SharedConnection,
}

impl LocalIdentity {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    fn set_session(conn: &Connection, uid: &str) -> Result<(), AuthError> {
        conn.execute(
            "INSERT INTO settings(key, value) VALUES(?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value",
            params![SESSION_KEY, uid],
        )?;
        Ok(())
    }

    fn load_user(conn: &Connection, uid: &str) -> Result<Option<UserProfile>, AuthError> {
        let user = conn
            .query_row(
                "SELECT uid, email, display_name FROM users WHERE uid=?1",
                params![uid],
                |r| {
                    Ok(UserProfile {
                        uid: r.get(0)?,
                        email: r.get(1)?,
                        display_name: r.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// Single salted SHA-256: a fast digest, not a password KDF. Local use only.
fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

impl IdentityProvider for LocalIdentity {
    fn sign_in(&self, email: &str, password: &str) -> Result<UserProfile, AuthError> {
        let email = normalize_email(email);
        let conn = db::lock(&self.conn);
        let row: Option<(String, String, String)> = conn
            .query_row(
                "SELECT uid, salt, password_hash FROM users WHERE email=?1",
                params![email],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .optional()?;
        let Some((uid, salt, hash)) = row else {
            return Err(AuthError::WrongCredentials);
        };
        if digest(&salt, password) != hash {
            warn!(%email, "sign-in rejected");
            return Err(AuthError::WrongCredentials);
        }
        Self::set_session(&conn, &uid)?;
        let user = Self::load_user(&conn, &uid)?.ok_or(AuthError::WrongCredentials)?;
        info!(uid = %user.uid, "signed in");
        Ok(user)
    }

    fn register(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<UserProfile, AuthError> {
        let email = normalize_email(email);
        if !EMAIL_RE.is_match(&email) {
            return Err(AuthError::InvalidEmail(email));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }
        let conn = db::lock(&self.conn);
        let taken: Option<i64> = conn
            .query_row("SELECT 1 FROM users WHERE email=?1", params![email], |r| {
                r.get(0)
            })
            .optional()?;
        if taken.is_some() {
            return Err(AuthError::EmailInUse(email));
        }

        let uid = uuid::Uuid::new_v4().simple().to_string();
        let salt = uuid::Uuid::new_v4().simple().to_string();
        let display_name = display_name
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        conn.execute(
            "INSERT INTO users(uid, email, display_name, salt, password_hash)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![uid, email, display_name, salt, digest(&salt, password)],
        )?;
        Self::set_session(&conn, &uid)?;
        info!(%uid, "registered");
        Ok(UserProfile {
            uid,
            email,
            display_name,
        })
    }

    fn sign_out(&self) -> Result<(), AuthError> {
        db::lock(&self.conn).execute("DELETE FROM settings WHERE key=?1", params![SESSION_KEY])?;
        info!("signed out");
        Ok(())
    }

    fn current_user(&self) -> Option<UserProfile> {
        let conn = db::lock(&self.conn);
        let lookup = || -> Result<Option<UserProfile>, AuthError> {
            let uid: Option<String> = conn
                .query_row(
                    "SELECT value FROM settings WHERE key=?1",
                    params![SESSION_KEY],
                    |r| r.get(0),
                )
                .optional()?;
            match uid {
                Some(uid) => Self::load_user(&conn, &uid),
                None => Ok(None),
            }
        };
        lookup().unwrap_or_else(|err| {
            warn!(error = %err, "could not read the current session");
            None
        })
    }
}
