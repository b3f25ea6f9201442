//! HTTP utilities for HyperCore REST API calls

use super::error::{Error, Result};
use super::session::Session;
use reqwest::header::{CONTENT_TYPE, COOKIE};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Path prefix of every REST endpoint, relative to the cluster base URL
pub const REST_PREFIX: &str = "rest/v1/";

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let cut = (0..=MAX_LOG_BODY_LENGTH)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Decode a response body, treating an empty body as `null`
fn parse_body(body: &str) -> Result<Value> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(body)?)
}

/// Decode a JSON array of records, accepting a single object as a one-item list
pub(crate) fn decode_list<T: DeserializeOwned>(value: Value) -> Result<Vec<T>> {
    match value {
        Value::Array(_) => Ok(serde_json::from_value(value)?),
        Value::Null => Ok(Vec::new()),
        other => Ok(vec![serde_json::from_value(other)?]),
    }
}

/// HTTP client wrapper for HyperCore API calls
#[derive(Clone)]
pub struct HyperCoreHttp {
    client: Client,
    rest_root: Url,
}

impl HyperCoreHttp {
    /// Create a new HTTP client rooted at `base` (the cluster URL, without the REST prefix)
    pub fn new(base: &Url, insecure: bool) -> Result<Self> {
        if insecure {
            tracing::warn!("TLS certificate validation is disabled for {}", base);
        }

        let client = Client::builder()
            .user_agent(concat!("hcctl/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(insecure)
            .build()?;

        Ok(Self {
            client,
            rest_root: base.join(REST_PREFIX)?,
        })
    }

    /// Resolve an endpoint path (e.g. `VirDomain/<uuid>`) against the REST root
    pub fn url(&self, path: &str) -> Result<Url> {
        Ok(self.rest_root.join(path)?)
    }

    /// Send a request and map non-success statuses onto [`Error`]
    ///
    /// The session, when given, is attached as the `sessionID` cookie.
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        session: Option<&Session>,
        body: Option<&Value>,
    ) -> Result<Response> {
        let url = self.url(path)?;
        tracing::debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method, url)
            .header(CONTENT_TYPE, "application/json");

        if let Some(session) = session {
            request = request.header(COOKIE, session.cookie());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("API error on {}: {} - {}", path, status, sanitize_for_log(&body));
            return Err(Error::from_status(status, path));
        }

        Ok(response)
    }

    /// Make a GET request and decode the JSON body
    pub async fn get(&self, path: &str, session: &Session) -> Result<Value> {
        let response = self.execute(Method::GET, path, Some(session), None).await?;
        parse_body(&response.text().await?)
    }

    /// Make a POST request and decode the JSON body (`null` when empty)
    pub async fn post(&self, path: &str, session: &Session, body: Option<&Value>) -> Result<Value> {
        let response = self.execute(Method::POST, path, Some(session), body).await?;
        parse_body(&response.text().await?)
    }
}

/// Percent-encode a single path segment (uuid, task tag)
pub fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}
