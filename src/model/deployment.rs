//! Deployment identifiers.

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

/// Length of the hyphenated `8-4-4-4-12` form.
const HYPHENATED_LEN: usize = 36;

/// A Cloudflare Pages deployment identifier.
///
/// Always the canonical hyphenated `8-4-4-4-12` hexadecimal form. The original
/// text is kept as-is so it round-trips into API paths and output unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct DeploymentId(String);

#[derive(Debug, thiserror::Error)]
#[error("not a deployment id: {0:?}")]
pub struct InvalidDeploymentId(String);

impl DeploymentId {
    /// Parse an identifier, rejecting anything but the hyphenated hex form.
    ///
    /// `Uuid::try_parse` also accepts simple, braced, and URN forms; the
    /// length check narrows it down to hyphenated only.
    pub fn parse(text: &str) -> Result<Self, InvalidDeploymentId> {
        if text.len() == HYPHENATED_LEN && Uuid::try_parse(text).is_ok() {
            Ok(Self(text.to_string()))
        } else {
            Err(InvalidDeploymentId(text.to_string()))
        }
    }
}

impl fmt::Display for DeploymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<DeploymentId> for String {
    fn from(id: DeploymentId) -> Self {
        id.0
    }
}
