// # ddns-core
//
// Core library for the polling DDNS updater.
//
// ## Architecture Overview
//
// One cycle of the updater walks this pipeline for every enabled address family:
//
// ```text
// Schedule ─► AddressResolver ─► ChangeDetector ─► dispatcher ─► DnsProvider
//             (retry loop)       (last known IP)   (A / AAAA)    (external API)
// ```
//
// - **AddressSource**: Trait for a single public-address lookup attempt
// - **AddressResolver**: Retries network failures until a lookup succeeds
// - **ChangeDetector**: Remembers the last address pushed per family
// - **DnsProvider**: Trait for updating A/AAAA records via provider APIs
// - **ProviderRegistry**: Name → factory mapping for DNS providers
// - **DdnsEngine**: Owns the state above and runs cycles on a `Schedule`
//
// ## Design Principles
//
// 1. **Separation of Concerns**: HTTP lookups and provider APIs live in their own crates
// 2. **Explicit Errors**: Every failure is returned to the caller, nothing panics
// 3. **Plugin-Based**: Providers are registered by name, no hard-coded if-else
// 4. **Library-First**: The binary is only flag parsing and wiring

pub mod traits;
pub mod config;
pub mod detector;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod registry;
pub mod resolver;

// Re-export core types for convenience
pub use traits::{AddressFamily, AddressSource, DnsProvider, DnsProviderFactory};
pub use config::{DdnsConfig, EnvFile, Environment, Families, ProviderConfig, ResolverConfig, Schedule};
pub use detector::ChangeDetector;
pub use engine::{CycleReport, DdnsEngine, FamilyOutcome};
pub use error::{Error, Result};
pub use registry::ProviderRegistry;
pub use resolver::AddressResolver;
