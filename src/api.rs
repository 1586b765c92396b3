// API client module: a small blocking HTTP client for the package
// registry. Every command makes at most one request, so there is no
// connection reuse or retry logic here.

use anyhow::{Context, Result};
use crossterm::style::Stylize;
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Holds a reqwest blocking client and the registry base URL.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

/// Payload for `POST /users`. The repeated password is forwarded as-is;
/// the registry decides whether the two match.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RegistrationRequest {
    pub email: String,
    pub organization_name: String,
    pub password: String,
    pub repeat_password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Organization {
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Membership {
    pub organization: Organization,
}

/// The newly created user as returned by the registry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RegistrationResult {
    pub email: String,
    pub memberships: Vec<Membership>,
    pub created_at: String,
}

impl RegistrationResult {
    /// Name of the organization created alongside the account.
    pub fn username(&self) -> Option<&str> {
        self.memberships
            .first()
            .map(|membership| membership.organization.name.as_str())
    }
}

/// Payload for `POST /auth`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub expires_at: Option<String>,
}

/// Error body sent by the registry on any non-200 response.
#[derive(Deserialize, Debug)]
struct ApiErrorPayload {
    error: ApiErrorBody,
}

#[derive(Deserialize, Debug)]
struct ApiErrorBody {
    message: String,
    #[serde(default)]
    details: Option<Map<String, Value>>,
}

/// A non-200 answer from the registry.
#[derive(Debug, Error, Clone, PartialEq)]
pub struct RemoteError {
    pub status: u16,
    pub message: String,
    /// Per-field problems, in the order the registry listed them.
    pub details: Vec<(String, String)>,
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(|field| field.to_string()))
    }
}

impl RemoteError {
    /// Terminal rendering: same text as `Display` with field names in bold.
    pub fn styled(&self) -> String {
        self.render(|field| field.bold().to_string())
    }

    fn render(&self, field_name: impl Fn(&str) -> String) -> String {
        let mut out = self.message.clone();
        if !self.details.is_empty() {
            out.push('\n');
            for (field, message) in &self.details {
                out.push_str(&format!("\n- {}: {}", field_name(field), message));
            }
        }
        out
    }

    /// Build the error from a response status and raw body. Bodies that
    /// don't follow the registry's error shape are reported verbatim.
    fn from_body(status: StatusCode, body: &str) -> Self {
        match serde_json::from_str::<ApiErrorPayload>(body) {
            Ok(payload) => {
                let details = payload
                    .error
                    .details
                    .unwrap_or_default()
                    .into_iter()
                    .map(|(field, detail)| {
                        let message = detail
                            .get("message")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string();
                        (field, message)
                    })
                    .collect();
                RemoteError {
                    status: status.as_u16(),
                    message: payload.error.message,
                    details,
                }
            }
            Err(_) => RemoteError {
                status: status.as_u16(),
                message: format!("Request failed: {} - {}", status, body),
                details: Vec::new(),
            },
        }
    }
}

impl ApiClient {
    /// Create a client for the registry at `base_url` (scheme included).
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create an account (and its organization) by POSTing to /users.
    pub fn register(&self, req: &RegistrationRequest) -> Result<RegistrationResult> {
        let url = format!("{}/users", &self.base_url);
        debug!(%url, email = %req.email, "submitting registration");
        let res = self
            .client
            .post(&url)
            .json(req)
            .send()
            .context("Failed to send register request")?;
        let res = ensure_ok(res)?;
        let user: RegistrationResult = res.json().context("Parsing register response json")?;
        Ok(user)
    }

    /// Exchange credentials for an access token by POSTing to /auth.
    pub fn login(&self, req: &LoginRequest) -> Result<AccessToken> {
        let url = format!("{}/auth", &self.base_url);
        debug!(%url, email = %req.email, "submitting login");
        let res = self
            .client
            .post(&url)
            .json(req)
            .send()
            .context("Failed to send auth request")?;
        let res = ensure_ok(res)?;
        let token: AccessToken = res.json().context("Parsing auth response json")?;
        Ok(token)
    }
}

/// Only 200 counts as success; anything else becomes a [`RemoteError`].
fn ensure_ok(res: Response) -> Result<Response> {
    let status = res.status();
    if status == StatusCode::OK {
        return Ok(res);
    }
    let body = res.text().unwrap_or_default();
    debug!(%status, "registry returned an error");
    Err(RemoteError::from_body(status, &body).into())
}
