use crate::models::{NewSession, User};
use crate::schema::{sessions, users};
use chrono::{Duration, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::crypto::{generate_token, hash_token};

/// Access tokens authenticate requests; refresh tokens only mint new access tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    Access,
    Refresh,
}

impl SessionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionKind::Access => "access",
            SessionKind::Refresh => "refresh",
        }
    }
}

/// A freshly issued access/refresh pair, in plaintext.
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

pub fn create_session(
    conn: &mut PgConnection,
    user_id: Uuid,
    kind: SessionKind,
    ttl: Duration,
) -> Result<String, diesel::result::Error> {
    let token = generate_token();
    let token_hash = hash_token(&token);

    let new_session = NewSession {
        user_id,
        token_hash: &token_hash,
        kind: kind.as_str(),
        expires_at: Utc::now() + ttl,
    };

    diesel::insert_into(sessions::table)
        .values(&new_session)
        .execute(conn)?;

    Ok(token)
}

pub fn issue_token_pair(
    conn: &mut PgConnection,
    user_id: Uuid,
    access_ttl: Duration,
    refresh_ttl: Duration,
) -> Result<TokenPair, diesel::result::Error> {
    Ok(TokenPair {
        access: create_session(conn, user_id, SessionKind::Access, access_ttl)?,
        refresh: create_session(conn, user_id, SessionKind::Refresh, refresh_ttl)?,
    })
}

fn find_user(
    conn: &mut PgConnection,
    token: &str,
    kind: SessionKind,
) -> Result<Option<User>, diesel::result::Error> {
    let token_hash = hash_token(token);

    sessions::table
        .inner_join(users::table)
        .filter(sessions::token_hash.eq(&token_hash))
        .filter(sessions::kind.eq(kind.as_str()))
        .filter(sessions::expires_at.gt(Utc::now()))
        .select(User::as_select())
        .first(conn)
        .optional()
}

pub fn get_user_from_token(
    conn: &mut PgConnection,
    token: &str,
) -> Result<Option<User>, diesel::result::Error> {
    find_user(conn, token, SessionKind::Access)
}

pub fn get_user_from_refresh_token(
    conn: &mut PgConnection,
    token: &str,
) -> Result<Option<User>, diesel::result::Error> {
    find_user(conn, token, SessionKind::Refresh)
}
