//! One-shot flash notices carried across a redirect in a cookie.
//!
//! The value is `level|message`, percent-encoded. The page that renders the
//! notice clears the cookie in the same response.

use axum::http::HeaderMap;

use crate::session::cookie_value;

pub const FLASH_COOKIE: &str = "flash";

/// Notice severity, mapped straight onto the rendered CSS class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Info,
    Warning,
    Danger,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Success => "success",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Danger => "danger",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Level::Success),
            "info" => Some(Level::Info),
            "warning" => Some(Level::Warning),
            "danger" => Some(Level::Danger),
            _ => None,
        }
    }
}

/// A user-visible notice queued for the next rendered page
#[derive(Debug, Clone)]
pub struct Flash {
    pub level: Level,
    pub message: String,
}

/// Set-Cookie value queueing a notice
pub fn set_cookie(level: Level, message: &str) -> String {
    let value = urlencoding::encode(&format!("{}|{}", level.as_str(), message)).into_owned();
    format!("{}={}; Path=/", FLASH_COOKIE, value)
}

/// Set-Cookie value clearing the notice after it has been rendered
pub fn clear_cookie() -> String {
    format!("{}=; Path=/; Max-Age=0", FLASH_COOKIE)
}

/// Read a queued notice from the request's Cookie header
pub fn from_headers(headers: &HeaderMap) -> Option<Flash> {
    let cookie_header = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
    let raw = cookie_value(cookie_header, FLASH_COOKIE)?;
    let decoded = urlencoding::decode(&raw).ok()?;
    let (level, message) = decoded.split_once('|')?;
    Some(Flash {
        level: Level::parse(level)?,
        message: message.to_string(),
    })
}
