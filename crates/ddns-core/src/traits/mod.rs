//! Core traits for the DDNS updater
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`AddressSource`]: Look up the current public address
//! - [`DnsProvider`]: Update DNS records via provider APIs

pub mod address_source;
pub mod dns_provider;

pub use address_source::{AddressFamily, AddressSource};
pub use dns_provider::{DnsProvider, DnsProviderFactory};
