//! In-process session store
//!
//! Sessions are held in a DashMap keyed by an opaque random token carried in
//! a cookie. The stored value is a typed snapshot of the user row, not a
//! dynamically-keyed map, so handlers get field access checked at compile
//! time.

use axum::http::HeaderMap;
use dashmap::DashMap;
use rand::{distributions::Alphanumeric, Rng};
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::constants::SESSION_TTL_SECS;
use crate::db::UserRecord;

pub const SESSION_COOKIE: &str = "session_id";

const TOKEN_LEN: usize = 32;

/// Per-login session state, mirroring a subset of the user row
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub usage_count: i64,
    pub is_admin: bool,
    created_at: Instant,
}

impl Session {
    fn from_user(user: &UserRecord) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            usage_count: user.usage_count,
            is_admin: user.is_admin,
            created_at: Instant::now(),
        }
    }
}

/// Shared session store. Expired entries are evicted lazily on lookup.
pub struct SessionStore {
    sessions: DashMap<String, Session>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(SESSION_TTL_SECS))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    /// Create a session for a freshly authenticated user and return its token
    pub fn create(&self, user: &UserRecord) -> String {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LEN)
            .map(char::from)
            .collect();
        self.sessions.insert(token.clone(), Session::from_user(user));
        token
    }

    /// Look up a session by token, evicting it first if expired
    pub fn get(&self, token: &str) -> Option<Session> {
        let expired = match self.sessions.get(token) {
            Some(entry) => entry.created_at.elapsed() > self.ttl,
            None => return None,
        };
        if expired {
            self.sessions.remove(token);
            return None;
        }
        self.sessions.get(token).map(|entry| entry.clone())
    }

    /// Destroy a session (logout)
    pub fn destroy(&self, token: &str) {
        self.sessions.remove(token);
    }

    /// Apply an in-place update to a live session, if it still exists
    pub fn update<F>(&self, token: &str, f: F)
    where
        F: FnOnce(&mut Session),
    {
        if let Some(mut entry) = self.sessions.get_mut(token) {
            f(entry.value_mut());
        }
    }
}

/// Extract the session token from the request's Cookie header
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let cookie_header = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
    cookie_value(cookie_header, SESSION_COOKIE)
}

/// Find a named cookie inside a Cookie header value
pub fn cookie_value(cookie_header: &str, name: &str) -> Option<String> {
    cookie_header
        .split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix(name)?.strip_prefix('='))
        .map(|v| v.to_string())
}

/// Set-Cookie value establishing a session
pub fn set_cookie(token: &str) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, token)
}

/// Set-Cookie value clearing the session cookie
pub fn clear_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; Max-Age=0", SESSION_COOKIE)
}
