//! Reaper configuration.
//!
//! Resolved once at startup from three layers, highest priority first:
//!
//! 1. Command-line flags (`--project`, `--wrangler`).
//! 2. Environment: `CF_PAGES_PROJECT_NAME`, `CF_ACCOUNT_ID`, `CF_API_TOKEN`.
//! 3. `~/.pages-reaper/config.toml`, optional. A missing file means defaults.
//!
//! Credentials only ever come from the environment.

use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

pub const PROJECT_VAR: &str = "CF_PAGES_PROJECT_NAME";
pub const ACCOUNT_ID_VAR: &str = "CF_ACCOUNT_ID";
pub const API_TOKEN_VAR: &str = "CF_API_TOKEN";

/// Project reaped when nothing else names one. Overridable at build time.
pub const DEFAULT_PROJECT: &str = match option_env!("PAGES_REAPER_DEFAULT_PROJECT") {
    Some(project) => project,
    None => "manuscript-platform",
};

pub const DEFAULT_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Gap between successive deletions.
const PAUSE_MS: u64 = 500;
const PROGRESS_EVERY: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(
        "missing required environment variable(s): {missing}\n\
         Both CF_ACCOUNT_ID and CF_API_TOKEN must be set."
    )]
    MissingCredentials { missing: String },

    #[error("project name is empty")]
    EmptyProject,

    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("invalid config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Bearer credential for the Cloudflare API.
///
/// Deliberately has no `Display`; `Debug` is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken(String);

impl ApiToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for the `Authorization` header and the child process env.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiToken([redacted])")
    }
}

/// Account id and API token. Never printed or logged.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub account_id: String,
    pub api_token: ApiToken,
}

/// Contents of `~/.pages-reaper/config.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub project: Option<String>,
    pub api_base: Option<String>,
    pub wrangler: Option<Vec<String>>,
    pub request_timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Load the config file, or defaults if it does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::path() {
            Some(path) => Self::load_from(path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: PathBuf) -> Result<Self, ConfigError> {
        let contents = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => return Err(ConfigError::Read { path, source }),
        };

        toml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
    }

    /// The config file path: `~/.pages-reaper/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".pages-reaper").join("config.toml"))
    }
}

/// Values given on the command line.
#[derive(Debug, Default)]
pub struct Overrides {
    pub project: Option<String>,
    pub wrangler: Option<String>,
}

/// Fully resolved configuration for one run.
#[derive(Debug, Clone)]
pub struct Config {
    pub project: String,
    pub credentials: Credentials,
    pub api_base: String,

    /// Program and leading arguments that launch wrangler.
    pub wrangler: Vec<String>,

    /// Gap between successive deletions.
    pub pause: Duration,

    pub progress_every: usize,

    /// Per-request deadline. `None` keeps the HTTP client's default.
    pub request_timeout: Option<Duration>,
}

impl Config {
    /// Resolve from the process environment and the config file.
    pub fn load(overrides: &Overrides) -> Result<Self, ConfigError> {
        // Credentials are checked first so a bad config file can't mask them.
        let credentials = credentials_from(|key| std::env::var(key).ok())?;
        let file = FileConfig::load()?;
        Self::resolve(credentials, file, |key| std::env::var(key).ok(), overrides)
    }

    /// Resolve from explicit layers. `env` looks up a variable by name.
    pub fn resolve(
        credentials: Credentials,
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
        overrides: &Overrides,
    ) -> Result<Self, ConfigError> {
        let project = overrides
            .project
            .clone()
            .or_else(|| env(PROJECT_VAR).filter(|p| !p.is_empty()))
            .or(file.project)
            .unwrap_or_else(|| DEFAULT_PROJECT.to_string());
        let project = project.trim().to_string();
        if project.is_empty() {
            return Err(ConfigError::EmptyProject);
        }

        let wrangler = match (&overrides.wrangler, file.wrangler) {
            (Some(program), _) => vec![program.clone()],
            (None, Some(cmd)) => cmd,
            (None, None) => vec!["npx".to_string(), "wrangler".to_string()],
        };
        if wrangler.first().is_none_or(|p| p.trim().is_empty()) {
            return Err(ConfigError::Invalid("wrangler command is empty".to_string()));
        }

        let api_base = file
            .api_base
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            project,
            credentials,
            api_base,
            wrangler,
            pause: Duration::from_millis(PAUSE_MS),
            progress_every: PROGRESS_EVERY,
            request_timeout: file.request_timeout_secs.map(Duration::from_secs),
        })
    }
}

/// Read both credentials, reporting every missing one at once.
pub fn credentials_from(
    env: impl Fn(&str) -> Option<String>,
) -> Result<Credentials, ConfigError> {
    let account_id = env(ACCOUNT_ID_VAR).filter(|v| !v.trim().is_empty());
    let api_token = env(API_TOKEN_VAR).filter(|v| !v.trim().is_empty());

    match (account_id, api_token) {
        (Some(account_id), Some(token)) => Ok(Credentials {
            account_id,
            api_token: ApiToken::new(token),
        }),
        (account_id, token) => {
            let mut missing = Vec::new();
            if account_id.is_none() {
                missing.push(ACCOUNT_ID_VAR);
            }
            if token.is_none() {
                missing.push(API_TOKEN_VAR);
            }
            Err(ConfigError::MissingCredentials {
                missing: missing.join(", "),
            })
        }
    }
}
