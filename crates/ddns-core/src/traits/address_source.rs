// # Address Source Trait
//
// Defines the interface for looking up the caller's public address.
//
// ## Implementations
//
// - HTTP echo services: `ddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::{AddressFamily, AddressSource};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* AddressSource implementation */;
//
//     // One lookup attempt, raw response body
//     let body = source.fetch(AddressFamily::V4).await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::fmt;

/// Address family of a DNS record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    /// IPv4, published as an A record
    V4,
    /// IPv6, published as an AAAA record
    V6,
}

impl AddressFamily {
    /// DNS record type carrying addresses of this family
    pub fn record_type(self) -> &'static str {
        match self {
            AddressFamily::V4 => "A",
            AddressFamily::V6 => "AAAA",
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::V4 => f.write_str("IPv4"),
            AddressFamily::V6 => f.write_str("IPv6"),
        }
    }
}

/// Trait for public address lookup implementations
///
/// A source performs exactly **one** lookup per call. Retrying is owned by
/// [`AddressResolver`](crate::AddressResolver), which relies on the error
/// classification below to decide what happens next:
///
/// - [`Error::Timeout`](crate::Error::Timeout): the request timed out
/// - [`Error::Network`](crate::Error::Network): connection-level failure
/// - anything else: fatal, surfaced to the caller
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait AddressSource: Send + Sync {
    /// Perform one lookup for the given family
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The raw response body (the resolver trims it)
    /// - `Err(Error)`: A classified failure
    async fn fetch(&self, family: AddressFamily) -> Result<String, crate::Error>;

    /// Human-readable endpoint queried for the family (for progress output)
    fn endpoint(&self, family: AddressFamily) -> &str;
}
