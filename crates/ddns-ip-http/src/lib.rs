// # HTTP Address Source
//
// This crate provides the production address source for the DDNS updater:
// a plain `GET` against an echo service that answers with the caller's
// public address as text.
//
// ## Services
//
// - IPv4: `https://checkip.amazonaws.com`
// - IPv6: `https://v6.ident.me` (must not publish A records, or a dual-stack
//   host could answer over IPv4)
//
// Both URLs can be overridden through `DDNS_IPV4_URL` / `DDNS_IPV6_URL`.
//
// ## Error Classification
//
// Each `fetch` is a single attempt. Failures are classified so the core
// resolver can decide whether to retry:
//
// | failure                          | error                 | resolver     |
// |----------------------------------|-----------------------|--------------|
// | request exceeded the timeout     | `Error::Timeout`      | retry now    |
// | connect / send failure           | `Error::Network`      | sleep, retry |
// | malformed request (bad URL)      | `Error::InvalidInput` | fail         |
// | response body could not be read  | `Error::IpSource`     | fail         |
//
// The body is returned untrimmed and unvalidated. A non-2xx status is logged
// but does not fail the lookup.

use ddns_core::config::ResolverConfig;
use ddns_core::traits::{AddressFamily, AddressSource};
use ddns_core::{Error, Result};

use std::time::Duration;

use tracing::warn;

/// HTTP echo-service address source
pub struct HttpAddressSource {
    /// Echo service for IPv4
    ipv4_url: String,

    /// Echo service for IPv6
    ipv6_url: String,

    /// HTTP client, carrying the per-request timeout
    client: reqwest::Client,
}

impl HttpAddressSource {
    /// Create a source from explicit URLs
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(
        ipv4_url: impl Into<String>,
        ipv6_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            ipv4_url: ipv4_url.into(),
            ipv6_url: ipv6_url.into(),
            client,
        })
    }

    /// Create a source from the resolver configuration
    pub fn from_config(config: &ResolverConfig) -> Result<Self> {
        Self::new(
            config.ipv4_url.clone(),
            config.ipv6_url.clone(),
            config.timeout,
        )
    }

    fn url(&self, family: AddressFamily) -> &str {
        match family {
            AddressFamily::V4 => &self.ipv4_url,
            AddressFamily::V6 => &self.ipv6_url,
        }
    }
}

/// Map a failed send to the resolver's error classes
fn classify_send_error(url: &str, e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::timeout(format!("GET {}: {}", url, e))
    } else if e.is_builder() {
        Error::invalid_input(format!("GET {}: {}", url, e))
    } else {
        Error::network(format!("GET {}: {}", url, e))
    }
}

#[async_trait::async_trait]
impl AddressSource for HttpAddressSource {
    async fn fetch(&self, family: AddressFamily) -> Result<String> {
        let url = self.url(family);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_send_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%family, url, "Echo service answered with HTTP {}", status);
        }

        response
            .text()
            .await
            .map_err(|e| Error::ip_source(format!("Failed to read response from {}: {}", url, e)))
    }

    fn endpoint(&self, family: AddressFamily) -> &str {
        self.url(family)
    }
}
