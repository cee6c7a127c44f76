// # DigitalOcean DNS Provider
//
// This crate provides a DigitalOcean DNS provider implementation for the DDNS updater.
//
// ## Behavior
//
// - Keeps one A/AAAA record of a DigitalOcean-hosted domain up to date
// - One update = record lookup, then a PUT (record exists) or POST (it doesn't)
// - The PUT is skipped if the record already holds the address
// - Dry-run mode (`DDNS_MODE=dry-run`) performs the lookup and logs the write
// - NO retry logic: any failure is returned and ends the run
//
// ## Configuration
//
// | variable              | required | meaning                              |
// |-----------------------|----------|--------------------------------------|
// | `DIGITALOCEAN_TOKEN`  | yes      | personal access token (write scope)  |
// | `DIGITALOCEAN_DOMAIN` | yes      | domain as registered, `example.com`  |
// | `DIGITALOCEAN_RECORD` | yes      | record name, `@` for the apex        |
// | `DIGITALOCEAN_TTL`    | no       | TTL for created records, default 300 |
//
// ## API Reference
//
// - DigitalOcean API v2: https://docs.digitalocean.com/reference/api/
// - List records: GET `/v2/domains/:domain/records?type=A&name=home.example.com`
// - Update record: PUT `/v2/domains/:domain/records/:id`
// - Create record: POST `/v2/domains/:domain/records`

use async_trait::async_trait;
use ddns_core::config::ProviderConfig;
use ddns_core::traits::DnsProvider;
use ddns_core::{Error, Result};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DIGITALOCEAN_API_BASE: &str = "https://api.digitalocean.com";

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// TTL for records created by this provider
pub const DEFAULT_TTL: u32 = 300;

const PROVIDER_NAME: &str = "digitalocean";

pub const TOKEN_VAR: &str = "DIGITALOCEAN_TOKEN";
pub const DOMAIN_VAR: &str = "DIGITALOCEAN_DOMAIN";
pub const RECORD_VAR: &str = "DIGITALOCEAN_RECORD";
pub const TTL_VAR: &str = "DIGITALOCEAN_TTL";

/// A domain record as returned by the API
#[derive(Debug, Clone, Deserialize)]
struct DomainRecord {
    id: u64,
    #[serde(default)]
    data: String,
}

#[derive(Debug, Deserialize)]
struct DomainRecordList {
    #[serde(default)]
    domain_records: Vec<DomainRecord>,
}

/// PUT body
#[derive(Debug, Serialize)]
struct RecordUpdate<'a> {
    #[serde(rename = "type")]
    record_type: &'a str,
    data: &'a str,
}

/// POST body
#[derive(Debug, Serialize)]
struct RecordCreate<'a> {
    #[serde(rename = "type")]
    record_type: &'a str,
    name: &'a str,
    data: &'a str,
    ttl: u32,
}

/// DigitalOcean DNS provider
///
/// The Debug implementation does NOT expose the API token.
pub struct DigitalOceanProvider {
    /// ⚠️ NEVER log this value
    token: String,

    /// Domain the record belongs to
    domain: String,

    /// Record name relative to `domain`, `@` for the apex
    record: String,

    /// TTL used when the record has to be created
    ttl: u32,

    api_base: String,

    client: reqwest::Client,

    dry_run: bool,
}

impl std::fmt::Debug for DigitalOceanProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigitalOceanProvider")
            .field("token", &"<REDACTED>")
            .field("domain", &self.domain)
            .field("record", &self.record)
            .field("ttl", &self.ttl)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl DigitalOceanProvider {
    /// Create a new DigitalOcean provider
    ///
    /// # Errors
    ///
    /// A configuration error if any argument is empty or the HTTP client
    /// cannot be built.
    pub fn new(
        token: impl Into<String>,
        domain: impl Into<String>,
        record: impl Into<String>,
        dry_run: bool,
    ) -> Result<Self> {
        let token = token.into();
        let domain = domain.into().trim_end_matches('.').to_string();
        let record = record.into();

        if token.is_empty() {
            return Err(Error::config("DigitalOcean token cannot be empty"));
        }
        if domain.is_empty() || record.is_empty() {
            return Err(Error::config("DigitalOcean domain and record cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            token,
            domain,
            record,
            ttl: DEFAULT_TTL,
            api_base: DIGITALOCEAN_API_BASE.to_string(),
            client,
            dry_run,
        })
    }

    /// Create a provider from the `DIGITALOCEAN_*` variables
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let ttl = match config.optional(TTL_VAR) {
            Some(raw) => raw
                .parse()
                .map_err(|_| Error::config(format!("{} must be a number of seconds, got '{}'", TTL_VAR, raw)))?,
            None => DEFAULT_TTL,
        };

        Ok(Self::new(
            config.require(TOKEN_VAR)?,
            config.require(DOMAIN_VAR)?,
            config.require(RECORD_VAR)?,
            config.dry_run(),
        )?
        .with_ttl(ttl))
    }

    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Talk to a different API endpoint (mock servers in tests)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Fully qualified record name, as the list filter expects it
    pub fn fqdn(&self) -> String {
        if self.record == "@" {
            self.domain.clone()
        } else {
            format!("{}.{}", self.record, self.domain)
        }
    }

    fn records_url(&self) -> String {
        format!("{}/v2/domains/{}/records", self.api_base, self.domain)
    }

    async fn find_record(&self, record_type: &str) -> Result<Option<DomainRecord>> {
        let fqdn = self.fqdn();
        tracing::debug!("Looking up record: {} (type: {})", fqdn, record_type);

        let response = self
            .client
            .get(self.records_url())
            .query(&[("type", record_type), ("name", fqdn.as_str())])
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER_NAME, format!("HTTP request failed: {}", e)))?;

        let response = check_status(response, "Record lookup").await?;
        let list: DomainRecordList = response
            .json()
            .await
            .map_err(|e| Error::provider(PROVIDER_NAME, format!("Failed to parse response: {}", e)))?;

        Ok(list.domain_records.into_iter().next())
    }

    async fn update(&self, record_type: &str, data: &str) -> Result<()> {
        tracing::info!(
            "Updating DigitalOcean DNS record: {} -> {} ({}) [mode: {}]",
            self.fqdn(),
            data,
            record_type,
            if self.dry_run { "DRY-RUN" } else { "LIVE" }
        );

        let request = match self.find_record(record_type).await? {
            Some(existing) if existing.data == data => {
                tracing::info!("DNS record already has correct data: {} -> {}", self.fqdn(), data);
                return Ok(());
            }
            Some(existing) => {
                let url = format!("{}/{}", self.records_url(), existing.id);
                if self.dry_run {
                    tracing::info!("[DRY-RUN] Would PUT {} with data {} (was: {})", url, data, existing.data);
                    return Ok(());
                }
                self.client
                    .put(url)
                    .json(&RecordUpdate { record_type, data })
            }
            None => {
                if self.dry_run {
                    tracing::info!("[DRY-RUN] Would create {} record {} -> {}", record_type, self.fqdn(), data);
                    return Ok(());
                }
                tracing::info!("No {} record for {}, creating it", record_type, self.fqdn());
                self.client.post(self.records_url()).json(&RecordCreate {
                    record_type,
                    name: &self.record,
                    data,
                    ttl: self.ttl,
                })
            }
        };

        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER_NAME, format!("HTTP request failed: {}", e)))?;
        check_status(response, "Record write").await?;

        tracing::info!("DNS record updated successfully: {} -> {}", self.fqdn(), data);
        Ok(())
    }
}

/// Pass successful responses through, map the rest to errors
async fn check_status(response: reqwest::Response, context: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error response".to_string());
    Err(status_error(status, &error_text, context))
}

fn status_error(status: StatusCode, error_text: &str, context: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "Invalid DigitalOcean token or missing write scope. Status: {}",
            status
        )),
        404 => Error::not_found(format!("{}: domain not found. Status: {}", context, status)),
        429 => Error::rate_limited(format!("DigitalOcean API. Status: {}", status)),
        _ => Error::provider(
            PROVIDER_NAME,
            format!("{} failed: {} - {}", context, status, error_text),
        ),
    }
}

#[async_trait]
impl DnsProvider for DigitalOceanProvider {
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

/// Build a DigitalOcean provider from configuration
pub fn create(config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
    let provider = DigitalOceanProvider::from_config(config)?;

    if provider.dry_run {
        tracing::warn!("DigitalOcean provider running in DRY-RUN mode - no changes will be made");
    }

    Ok(Box::new(provider))
}

/// Register the DigitalOcean provider with a registry
pub fn register(registry: &ddns_core::ProviderRegistry) {
    registry.register_provider(PROVIDER_NAME, Box::new(create));
}
