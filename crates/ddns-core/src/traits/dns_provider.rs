// # DNS Provider Trait
//
// Defines the interface for updating A/AAAA records via provider APIs.
//
// ## Implementations
//
// - Cloudflare: `ddns-provider-cloudflare` crate
// - DigitalOcean: `ddns-provider-digitalocean` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::DnsProvider;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     provider.update_record("203.0.113.7").await?;
//     provider.update_record6("2001:db8::7").await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::config::ProviderConfig;

/// Trait for DNS provider implementations
///
/// A provider knows which record it manages (from its own environment
/// variables) and exposes one operation per address family. Addresses are
/// passed through exactly as the lookup service returned them.
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform HTTP/HTTPS API calls to their endpoints only
/// - ✅ Parse provider-specific responses
/// - ✅ Return success or failure
///
/// ## Forbidden Capabilities
/// - ❌ Retry or back off (a failed update is fatal for the run)
/// - ❌ Decide whether an update is needed (owned by `ChangeDetector`)
/// - ❌ Spawn tasks or threads
///
/// ## Examples
///
/// ✅ **CORRECT**: Stateless single-shot API call
/// ```rust,ignore
/// async fn update_record(&self, ipv4: &str) -> Result<()> {
///     let response = self.http_client
///         .put(format!("/zones/{}/dns_records/{}", self.zone_id, self.record_id))
///         .json(&serde_json::json!({ "content": ipv4 }))
///         .send()
///         .await?;
///
///     if response.status().is_success() {
///         Ok(())
///     } else {
///         Err(Error::provider("example", "API call failed"))
///     }
/// }
/// ```
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Point the A record at `ipv4`
    async fn update_record(&self, ipv4: &str) -> Result<(), crate::Error>;

    /// Point the AAAA record at `ipv6`
    async fn update_record6(&self, ipv6: &str) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    ///
    /// # Returns
    ///
    /// A static string identifying the provider (e.g., "cloudflare")
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing DNS providers from configuration
pub trait DnsProviderFactory: Send + Sync {
    /// Create a DnsProvider instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Provider name plus the environment it reads credentials from
    ///
    /// # Returns
    ///
    /// A boxed DnsProvider trait object
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>, crate::Error>;
}

/// Plain constructor functions and closures are factories too
impl<F> DnsProviderFactory for F
where
    F: Fn(&ProviderConfig) -> Result<Box<dyn DnsProvider>, crate::Error> + Send + Sync,
{
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>, crate::Error> {
        self(config)
    }
}
