// # Templated DynDNS Update Dispatcher
//
// This crate sends dyndns2-style update requests: one authenticated GET per
// host name against a provider endpoint built from a URL template.
//
// ## URL template
//
// - If the template contains `{domain}`, every occurrence is replaced by the
//   host name: `https://dyn.example.net/update?host={domain}`
// - Otherwise the host name is appended, which fits the common
//   `https://dyndns.example.net/nic/update?hostname=` form
// - `{ip}` is replaced by the external IP in both modes, for providers
//   that want it spelled out (`&myip={ip}`)
//
// ## Behaviour
//
// - HTTP Basic authentication with the configured credentials
// - The response body is always read to the end so the connection is released
// - Non-2xx statuses are errors carrying the status and body
// - No retries: the engine tries again on the next poll cycle
//
// ## Security
//
// The password never appears in logs, errors or `Debug` output.

use async_trait::async_trait;
use ddns_core::config::{Credentials, DdnsConfig};
use ddns_core::traits::{UpdateDispatcher, UpdateResponse};
use ddns_core::{Error, Result};
use std::net::Ipv4Addr;
use std::time::Duration;

/// Placeholder replaced by the host name
pub const DOMAIN_PLACEHOLDER: &str = "{domain}";

/// Placeholder replaced by the external IP
pub const IP_PLACEHOLDER: &str = "{ip}";

/// Provider name used in errors and logs
const PROVIDER_NAME: &str = "dyndns";

/// Dispatcher for templated dyndns2-style endpoints
#[derive(Debug)]
pub struct DynDnsDispatcher {
    /// Update endpoint template
    template: String,

    /// Basic auth credentials (Debug output redacts the password)
    credentials: Credentials,

    /// HTTP client for update requests
    client: reqwest::Client,
}

impl DynDnsDispatcher {
    /// Create a new dispatcher
    ///
    /// # Parameters
    ///
    /// - `template`: Endpoint template (see crate docs)
    /// - `credentials`: Basic auth credentials
    /// - `timeout`: Upper bound for one request (`None` waits forever)
    pub fn new(
        template: impl Into<String>,
        credentials: Credentials,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            template: template.into(),
            credentials,
            client,
        })
    }

    /// Create a dispatcher from the daemon configuration
    pub fn from_config(config: &DdnsConfig) -> Result<Self> {
        Self::new(
            config.ddns_url.clone(),
            config.credentials.clone(),
            config.timeout,
        )
    }

    /// Build the update URL for `hostname`
    pub fn update_url(&self, hostname: &str, ip: Ipv4Addr) -> String {
        let url = if self.template.contains(DOMAIN_PLACEHOLDER) {
            self.template.replace(DOMAIN_PLACEHOLDER, hostname)
        } else {
            format!("{}{}", self.template, hostname)
        };

        url.replace(IP_PLACEHOLDER, &ip.to_string())
    }
}

#[async_trait]
impl UpdateDispatcher for DynDnsDispatcher {
    async fn dispatch_update(&self, hostname: &str, ip: Ipv4Addr) -> Result<UpdateResponse> {
        let url = self.update_url(hostname, ip);

        let request = self
            .client
            .get(&url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .build()
            .map_err(|e| {
                Error::invalid_input(format!(
                    "Error while constructing request for {}: {}",
                    hostname, e
                ))
            })?;

        tracing::debug!(
            "Sending update for {} to {}",
            hostname,
            request.url().host_str().unwrap_or("?")
        );

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| Error::http(format!("Update request for {} failed: {}", hostname, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read response for {}: {}", hostname, e)))?;

        if !status.is_success() {
            return Err(Error::provider(
                PROVIDER_NAME,
                format!("{} - {}", status, body.trim()),
            ));
        }

        Ok(UpdateResponse {
            status: status.as_u16(),
            body,
        })
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}
