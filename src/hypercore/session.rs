//! HyperCore sessions
//!
//! Login exchanges credentials for a `sessionID` cookie that stays valid on
//! the cluster for roughly 100 days unless it is explicitly logged out. Every
//! caller that logs in is responsible for calling [`logout`].

use super::error::{Error, Result};
use super::http::HyperCoreHttp;
use reqwest::header::{HeaderMap, SET_COOKIE};
use reqwest::Method;
use serde_json::{json, Value};
use std::fmt;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "sessionID";

/// Username and password used to open a session
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An authenticated session token
#[derive(Clone, PartialEq, Eq)]
pub struct Session(String);

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Raw token value
    pub fn id(&self) -> &str {
        &self.0
    }

    /// Value for the `Cookie` request header
    pub fn cookie(&self) -> String {
        format!("{}={}", SESSION_COOKIE, self.0)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Session(<redacted>)")
    }
}

/// Find the session token in `Set-Cookie` response headers
fn session_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|cookie| cookie.split(';').next())
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

/// Find the session token in a login response body
fn session_from_body(body: &Value) -> Option<String> {
    body.get(SESSION_COOKIE)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Log in and return a session
///
/// 401 maps to [`Error::Authentication`], 500 to [`Error::Server`], and any
/// other non-success status to [`Error::Api`]. A success response that
/// carries no session token is treated as an authentication failure.
pub async fn login(http: &HyperCoreHttp, credentials: &Credentials) -> Result<Session> {
    let payload = json!({
        "username": credentials.username,
        "password": credentials.password,
        "useOIDC": false,
    });

    let response = http
        .execute(Method::POST, "login", None, Some(&payload))
        .await?;

    let from_cookie = session_from_headers(response.headers());
    let body = response.text().await?;

    let id = match from_cookie {
        Some(id) => id,
        None => serde_json::from_str::<Value>(&body)
            .ok()
            .as_ref()
            .and_then(session_from_body)
            .ok_or_else(|| Error::Authentication("login response carried no session".to_string()))?,
    };

    tracing::info!("Logged in as {}", credentials.username);
    Ok(Session::new(id))
}

/// Invalidate a session on the cluster
///
/// Returns `false` when the cluster refused the logout; transport failures
/// are returned as errors.
pub async fn logout(http: &HyperCoreHttp, session: &Session) -> Result<bool> {
    match http.post("logout", session, None).await {
        Ok(_) => {
            tracing::info!("Logged out");
            Ok(true)
        }
        Err(err @ Error::Transport(_)) => Err(err),
        Err(err) => {
            tracing::warn!("Logout was not accepted: {}", err);
            Ok(false)
        }
    }
}
