// # Cloudflare DNS Provider
//
// This crate provides a Cloudflare DNS provider implementation for the DDNS updater.
//
// ## Behavior
//
// - Points one existing A/AAAA record (`CLOUDFLARE_HOST`) at the given address
// - One update = zone lookup (unless `CLOUDFLARE_ZONE_ID` is set), record
//   lookup, then a single PUT
// - The PUT is skipped if the record already holds the address
// - Dry-run mode (`DDNS_MODE=dry-run`) performs the lookups and logs the PUT
// - NO retry logic: any failure is returned and ends the run
//
// ## Configuration
//
// | variable               | required | meaning                                   |
// |------------------------|----------|-------------------------------------------|
// | `CLOUDFLARE_API_TOKEN` | yes      | token with Zone:DNS:Edit permission       |
// | `CLOUDFLARE_HOST`      | yes      | fully qualified record name               |
// | `CLOUDFLARE_ZONE_ID`   | no       | skip the zone lookup                      |
// | `CLOUDFLARE_ZONE`      | no       | zone name, derived from the host if unset |
//
// ## Security Requirements
//
// - API token NEVER appears in logs
// - Provider MUST fail fast if token is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`
// - List DNS Records: GET `/zones/:zone_id/dns_records?name=...&type=...`
// - List Zones: GET `/zones?name=...`

use async_trait::async_trait;
use ddns_core::config::ProviderConfig;
use ddns_core::traits::{DnsProvider, DnsProviderFactory};
use ddns_core::{Error, Result};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

/// Cloudflare API base URL
const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Provider name, used for registration and error reporting
const PROVIDER_NAME: &str = "cloudflare";

/// API token variable
pub const API_TOKEN_VAR: &str = "CLOUDFLARE_API_TOKEN";

/// Record name variable
pub const HOST_VAR: &str = "CLOUDFLARE_HOST";

/// Zone ID variable
pub const ZONE_ID_VAR: &str = "CLOUDFLARE_ZONE_ID";

/// Zone name variable
pub const ZONE_VAR: &str = "CLOUDFLARE_ZONE";

/// Cloudflare DNS provider
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform all GET requests (zone lookup, record lookup)
/// - Log the intended PUT payload
/// - **NOT** actually modify DNS records
///
/// # Security
///
/// The Debug implementation does NOT expose the API token.
pub struct CloudflareProvider {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// Record to keep up to date (e.g. "home.example.com")
    host: String,

    /// Zone ID (optional, looked up by zone name otherwise)
    zone_id: Option<String>,

    /// Zone name (optional, derived from `host` otherwise)
    zone_name: Option<String>,

    /// API base URL, overridable for tests
    api_base: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform GET requests but skip PUT updates
    dry_run: bool,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("host", &self.host)
            .field("zone_id", &self.zone_id)
            .field("zone_name", &self.zone_name)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:DNS:Edit permissions
    /// - `host`: Fully qualified name of the record to update
    /// - `dry_run`: If true, perform GET requests but skip PUT updates
    ///
    /// # Errors
    ///
    /// A configuration error if the token or host is empty, or the HTTP
    /// client cannot be built. The token never appears in the message.
    pub fn new(api_token: impl Into<String>, host: impl Into<String>, dry_run: bool) -> Result<Self> {
        let api_token = api_token.into();
        let host = host.into();

        if api_token.is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }
        if host.is_empty() {
            return Err(Error::config("Cloudflare record host cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            host,
            zone_id: None,
            zone_name: None,
            api_base: CLOUDFLARE_API_BASE.to_string(),
            client,
            dry_run,
        })
    }

    /// Create a provider from the `CLOUDFLARE_*` variables
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let provider = Self::new(
            config.require(API_TOKEN_VAR)?,
            config.require(HOST_VAR)?,
            config.dry_run(),
        )?
        .with_zone_id(config.optional(ZONE_ID_VAR))
        .with_zone_name(config.optional(ZONE_VAR));

        Ok(provider)
    }

    /// Use a known zone ID instead of looking it up
    pub fn with_zone_id(mut self, zone_id: Option<String>) -> Self {
        self.zone_id = zone_id;
        self
    }

    /// Look the zone up by this name instead of deriving it from the host
    pub fn with_zone_name(mut self, zone_name: Option<String>) -> Self {
        self.zone_name = zone_name;
        self
    }

    /// Talk to a different API endpoint (mock servers in tests)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Record name this provider updates
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Zone name to look up: the configured one, else the host's last two labels
    fn zone_name(&self) -> Result<String> {
        if let Some(ref zone_name) = self.zone_name {
            return Ok(zone_name.clone());
        }

        let labels: Vec<&str> = self
            .host
            .trim_end_matches('.')
            .split('.')
            .filter(|label| !label.is_empty())
            .collect();

        match labels.as_slice() {
            [.., domain, tld] => Ok(format!("{}.{}", domain, tld)),
            _ => Err(Error::config(format!(
                "Cannot derive zone from host '{}', set {}",
                self.host, ZONE_VAR
            ))),
        }
    }

    /// Get the zone ID
    ///
    /// If zone_id is set, returns it directly. Otherwise, queries Cloudflare API
    /// to find the zone ID by name.
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /zones?name=example.com
    /// Authorization: Bearer <token>
    /// ```
    async fn get_zone_id(&self) -> Result<String> {
        if let Some(ref zone_id) = self.zone_id {
            tracing::debug!("Using pre-configured zone ID");
            return Ok(zone_id.clone());
        }

        let zone_name = self.zone_name()?;
        tracing::debug!("Looking up zone ID for zone: {}", zone_name);

        let json = self
            .get_json(
                &format!("{}/zones", self.api_base),
                &[("name", zone_name.as_str())],
                &format!("Zone lookup for {}", zone_name),
            )
            .await?;

        let zone = first_result(&json)?
            .ok_or_else(|| Error::not_found(format!("Zone not found: {}", zone_name)))?;

        let zone_id = zone["id"]
            .as_str()
            .ok_or_else(|| invalid_response("zone.id is not a string"))?;

        tracing::debug!("Found zone ID: {}", zone_id);
        Ok(zone_id.to_string())
    }

    /// Find the record of `record_type` named `self.host`
    ///
    /// Returns the record ID and its current content.
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records?name=home.example.com&type=A
    /// Authorization: Bearer <token>
    /// ```
    async fn get_record(&self, zone_id: &str, record_type: &str) -> Result<(String, String)> {
        tracing::debug!("Looking up record ID: {} (type: {})", self.host, record_type);

        let json = self
            .get_json(
                &format!("{}/zones/{}/dns_records", self.api_base, zone_id),
                &[("name", self.host.as_str()), ("type", record_type)],
                &format!("Record lookup for {} ({})", self.host, record_type),
            )
            .await?;

        let record = first_result(&json)?.ok_or_else(|| {
            Error::not_found(format!(
                "DNS record not found: {} (type: {})",
                self.host, record_type
            ))
        })?;

        let record_id = record["id"]
            .as_str()
            .ok_or_else(|| invalid_response("record.id is not a string"))?;
        let content = record["content"].as_str().unwrap_or_default();

        tracing::debug!("Found record ID: {}", record_id);
        Ok((record_id.to_string(), content.to_string()))
    }

    /// Authenticated GET returning the parsed JSON body
    async fn get_json(&self, url: &str, query: &[(&str, &str)], context: &str) -> Result<Value> {
        let response = self
            .client
            .get(url)
            .query(query)
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER_NAME, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(status_error(status, &error_text, context));
        }

        response
            .json()
            .await
            .map_err(|e| Error::provider(PROVIDER_NAME, format!("Failed to parse response: {}", e)))
    }

    /// Point the `record_type` record at `content`
    ///
    /// # API Calls
    ///
    /// ```http
    /// # Update if content differs (skipped in dry-run mode)
    /// PUT /zones/:zone_id/dns_records/:record_id
    /// {
    ///   "type": "A" or "AAAA",
    ///   "name": "home.example.com",
    ///   "content": "203.0.113.7"
    /// }
    /// ```
    async fn update(&self, record_type: &str, content: &str) -> Result<()> {
        tracing::info!(
            "Updating Cloudflare DNS record: {} -> {} ({}) [mode: {}]",
            self.host,
            content,
            record_type,
            if self.dry_run { "DRY-RUN" } else { "LIVE" }
        );

        let zone_id = self.get_zone_id().await?;
        let (record_id, current) = self.get_record(&zone_id, record_type).await?;

        if current == content {
            tracing::info!("DNS record already has correct content: {} -> {}", self.host, content);
            return Ok(());
        }

        let url = format!("{}/zones/{}/dns_records/{}", self.api_base, zone_id, record_id);
        let payload = serde_json::json!({
            "type": record_type,
            "name": self.host,
            "content": content,
        });

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send PUT request to {} with payload: {} (was: {})",
                url,
                payload,
                current
            );
            return Ok(());
        }

        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER_NAME, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(status_error(status, &error_text, "Record update"));
        }

        tracing::info!(
            "DNS record updated successfully: {} -> {} (was: {})",
            self.host,
            content,
            current
        );
        Ok(())
    }
}

/// First element of the `result` array, if any
fn first_result(json: &Value) -> Result<Option<&Value>> {
    let results = json["result"]
        .as_array()
        .ok_or_else(|| invalid_response("result is not an array"))?;
    Ok(results.first())
}

fn invalid_response(detail: &str) -> Error {
    Error::provider(PROVIDER_NAME, format!("Invalid response format: {}", detail))
}

/// Map a non-success API status to an error
fn status_error(status: StatusCode, error_text: &str, context: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "Invalid API token or insufficient permissions. Status: {}",
            status
        )),
        404 => Error::not_found(format!("{}: {}", context, status)),
        409 => Error::provider(
            PROVIDER_NAME,
            format!("Conflict: Record is being updated by another process. Status: {}", status),
        ),
        429 => Error::rate_limited(format!("Cloudflare API. Status: {}", status)),
        500..=599 => Error::provider(
            PROVIDER_NAME,
            format!("Cloudflare server error: {} - {}", status, error_text),
        ),
        _ => Error::provider(
            PROVIDER_NAME,
            format!("{} failed: {} - {}", context, status, error_text),
        ),
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    async fn update_record(&self, ipv4: &str) -> Result<()> {
        self.update("A", ipv4).await
    }

    async fn update_record6(&self, ipv6: &str) -> Result<()> {
        self.update("AAAA", ipv6).await
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Factory for creating Cloudflare providers
pub struct CloudflareFactory;

impl DnsProviderFactory for CloudflareFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        let provider = CloudflareProvider::from_config(config)?;

        if provider.dry_run {
            tracing::warn!("Cloudflare provider running in DRY-RUN mode - no changes will be made");
        }

        Ok(Box::new(provider))
    }
}

/// Register the Cloudflare provider with a registry
///
/// This function should be called during initialization to make the
/// Cloudflare provider available.
///
/// # Example
///
/// ```rust
/// use ddns_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// ddns_provider_cloudflare::register(&registry);
/// assert!(registry.has_provider("cloudflare"));
/// ```
pub fn register(registry: &ddns_core::ProviderRegistry) {
    registry.register_provider(PROVIDER_NAME, Box::new(CloudflareFactory));
}
