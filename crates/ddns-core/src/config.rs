//! Configuration types for the DDNS system
//!
//! The on-disk format is the YAML `ddns.conf` document:
//!
//! ```yaml
//! Domains:
//!   - example.com
//!   - example2.com
//! DdnsUrl: "https://dyndns.example.net/nic/update?hostname="
//! Username: "user"
//! Password: "secret"
//! Frequency: 60   # seconds between checks
//! Debug: false
//! ```
//!
//! [`DdnsConfig`] is the validated, normalised form handed to the engine.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

/// Poll interval used when `Frequency` is absent or not positive
pub const DEFAULT_FREQUENCY_SECS: u64 = 60;

/// Per-call network timeout used when `Timeout` is absent
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Main DDNS configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DdnsConfig {
    /// Domains to keep up to date (a single domain is a list of one)
    pub domains: Vec<String>,

    /// Provider update endpoint template
    pub ddns_url: String,

    /// HTTP Basic credentials for the provider
    pub credentials: Credentials,

    /// Time between two poll cycles
    pub frequency: Duration,

    /// Log transient failures
    pub debug: bool,

    /// Also update the `*.domain` wildcard entry
    pub wildcard: bool,

    /// Timeout applied to each DNS exchange, lookup and HTTP request
    pub timeout: Option<Duration>,
}

impl DdnsConfig {
    /// Create a configuration with defaults for everything but domains and URL
    pub fn new(domains: Vec<String>, ddns_url: impl Into<String>) -> Self {
        Self {
            domains,
            ddns_url: ddns_url.into(),
            credentials: Credentials::default(),
            frequency: Duration::from_secs(DEFAULT_FREQUENCY_SECS),
            debug: false,
            wildcard: false,
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        }
    }

    /// Set the provider credentials
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Credentials::new(username, password);
        self
    }

    /// Set the poll interval
    pub fn with_frequency(mut self, frequency: Duration) -> Self {
        self.frequency = frequency;
        self
    }

    /// Enable or disable debug logging of transient failures
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Enable or disable the wildcard update
    pub fn with_wildcard(mut self, wildcard: bool) -> Self {
        self.wildcard = wildcard;
        self
    }

    /// Set the per-call network timeout (`None` waits forever)
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Apply the command-line verbosity override
    ///
    /// `-1` keeps the value from the file, `0` turns debug off and any other
    /// value turns it on.
    pub fn with_verbosity(mut self, verbosity: i8) -> Self {
        match verbosity {
            -1 => {}
            0 => self.debug = false,
            _ => self.debug = true,
        }
        self
    }

    /// Parse and normalise a YAML configuration document
    pub fn from_yaml_str(document: &str) -> Result<Self> {
        let raw: RawConfig = serde_yaml::from_str(document)?;
        Ok(raw.into_config())
    }

    /// Read and parse a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&document)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.domains.is_empty() {
            return Err(Error::config("No domains in config file"));
        }

        if let Some(position) = self.domains.iter().position(|d| d.trim().is_empty()) {
            return Err(Error::config(format!(
                "Domain #{} is empty",
                position + 1
            )));
        }

        if self.ddns_url.trim().is_empty() {
            return Err(Error::config("DdnsUrl cannot be empty"));
        }

        if self.frequency.is_zero() {
            return Err(Error::config("Frequency must be > 0"));
        }

        Ok(())
    }
}

/// HTTP Basic credentials
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// User name
    pub username: String,
    /// Password, never logged
    pub password: String,
}

impl Credentials {
    /// Create a credential pair
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

// Custom Debug implementation that hides the password
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .finish()
    }
}

/// A scalar or a list of domain names
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DomainList {
    One(String),
    Many(Vec<String>),
}

impl DomainList {
    fn into_vec(self) -> Vec<String> {
        match self {
            DomainList::One(domain) => vec![domain],
            DomainList::Many(domains) => domains,
        }
    }
}

/// The document exactly as written on disk
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawConfig {
    domain: Option<DomainList>,
    domains: Option<DomainList>,
    ddns_url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    frequency: Option<i64>,
    debug: Option<bool>,
    wildcard: Option<bool>,
    timeout: Option<u64>,
}

impl RawConfig {
    fn into_config(self) -> DdnsConfig {
        let domains = self
            .domain
            .into_iter()
            .chain(self.domains)
            .flat_map(DomainList::into_vec)
            .map(|d| d.trim().to_string())
            .collect();

        DdnsConfig {
            domains,
            ddns_url: self.ddns_url.unwrap_or_default(),
            credentials: Credentials::new(
                self.username.unwrap_or_default(),
                self.password.unwrap_or_default(),
            ),
            frequency: normalize_frequency(self.frequency),
            debug: self.debug.unwrap_or(false),
            wildcard: self.wildcard.unwrap_or(false),
            timeout: match self.timeout {
                None => Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
                Some(0) => None,
                Some(secs) => Some(Duration::from_secs(secs)),
            },
        }
    }
}

/// Map the raw `Frequency` value to a poll interval
pub fn normalize_frequency(seconds: Option<i64>) -> Duration {
    match seconds {
        Some(secs) if secs > 0 => Duration::from_secs(secs as u64),
        _ => Duration::from_secs(DEFAULT_FREQUENCY_SECS),
    }
}
