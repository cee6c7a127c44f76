//! Update dispatch
//!
//! Routes a changed address to the provider operation for its family.
//! Failures are returned as [`Error::Provider`] and never retried here.

use tracing::info;

use crate::error::{Error, Result};
use crate::traits::{AddressFamily, DnsProvider};

/// Push `address` to the provider's record for `family`
///
/// - [`AddressFamily::V4`] → [`DnsProvider::update_record`]
/// - [`AddressFamily::V6`] → [`DnsProvider::update_record6`]
pub async fn update_record(
    provider: &dyn DnsProvider,
    family: AddressFamily,
    address: &str,
) -> Result<()> {
    let provider_name = provider.provider_name();
    info!(
        provider = provider_name,
        %family,
        address,
        "Updating {} record to {}", family.record_type(), address
    );

    let result = match family {
        AddressFamily::V4 => provider.update_record(address).await,
        AddressFamily::V6 => provider.update_record6(address).await,
    };

    result.map_err(|e| match e {
        Error::Provider { .. } => e,
        other => Error::provider(provider_name, other.to_string()),
    })
}
