//! Cloudflare API client for deleting Pages deployments.
//!
//! Every response is the standard Cloudflare envelope:
//!
//! ```text
//! { "success": bool, "errors": [{ "code": 8000007, "message": "..." }], ... }
//! ```
//!
//! Errors never carry the request URL (it embeds the account id) or the token.

use std::fmt;

use reqwest::blocking::Client;
use serde::Deserialize;

use crate::config::{ApiToken, Config};
use crate::model::DeploymentId;

#[derive(Debug, thiserror::Error)]
pub enum DeleteError {
    #[error("request failed: {0}")]
    Transport(reqwest::Error),

    #[error("unreadable response (HTTP {status}): {source}")]
    Decode {
        status: u16,
        source: serde_json::Error,
    },

    #[error("refused (HTTP {status}): {}", ApiMessages(.errors))]
    Refused { status: u16, errors: Vec<ApiMessage> },
}

impl DeleteError {
    /// Wrap a reqwest error with its URL stripped.
    fn transport(e: reqwest::Error) -> Self {
        Self::Transport(e.without_url())
    }
}

/// One entry of the envelope's `errors` array.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: String,
}

struct ApiMessages<'a>(&'a [ApiMessage]);

impl fmt::Display for ApiMessages<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("no error details");
        }
        for (i, m) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            match m.code {
                Some(code) => write!(f, "[{code}] {}", m.message)?,
                None => f.write_str(&m.message)?,
            }
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    errors: Option<Vec<ApiMessage>>,
}

/// Deletes a single deployment. The reaper loop drives this seam.
pub trait DeleteDeployment {
    fn delete(&self, id: &DeploymentId) -> Result<(), DeleteError>;
}

/// Blocking client for one account and project.
pub struct CloudflareClient {
    http: Client,
    api_base: String,
    account_id: String,
    project: String,
    token: ApiToken,
}

impl CloudflareClient {
    /// Build a client from resolved config.
    ///
    /// Without `request-timeout-secs` the reqwest default applies.
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let mut builder =
            Client::builder().user_agent(concat!("pages-reaper/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            api_base: config.api_base.clone(),
            account_id: config.credentials.account_id.clone(),
            project: config.project.clone(),
            token: config.credentials.api_token.clone(),
        })
    }

    fn deployment_url(&self, id: &DeploymentId) -> String {
        format!(
            "{}/accounts/{}/pages/projects/{}/deployments/{id}",
            self.api_base, self.account_id, self.project
        )
    }
}

impl DeleteDeployment for CloudflareClient {
    fn delete(&self, id: &DeploymentId) -> Result<(), DeleteError> {
        let response = self
            .http
            .delete(self.deployment_url(id))
            .bearer_auth(self.token.expose())
            .send()
            .map_err(DeleteError::transport)?;

        let status = response.status().as_u16();
        let body = response.text().map_err(DeleteError::transport)?;
        tracing::debug!(deployment = %id, status, "delete response");

        let envelope: Envelope =
            serde_json::from_str(&body).map_err(|source| DeleteError::Decode { status, source })?;

        if envelope.success {
            Ok(())
        } else {
            Err(DeleteError::Refused {
                status,
                errors: envelope.errors.unwrap_or_default(),
            })
        }
    }
}
