//! Core DDNS engine
//!
//! The DdnsEngine is responsible for:
//! - Running check-and-update cycles on a [`Schedule`]
//! - Resolving the public address per enabled family via [`AddressResolver`]
//! - Comparing it against the last pushed address ([`ChangeDetector`])
//! - Dispatching changed addresses to the configured [`DnsProvider`]
//!
//! ## Architecture
//!
//! ```text
//!                    ┌──────────────┐
//!   Schedule ──────► │  DdnsEngine  │
//!  (once / every)    └──────────────┘
//!                           │ per cycle: create provider, then IPv4 → IPv6
//!         ┌─────────────────┼──────────────────┐
//!         ▼                 ▼                  ▼
//! ┌───────────────┐ ┌────────────────┐ ┌──────────────┐
//! │AddressResolver│ │ ChangeDetector │ │ DnsProvider  │
//! │ (retry loop)  │ │ (last known)   │ │ (update)     │
//! └───────────────┘ └────────────────┘ └──────────────┘
//! ```
//!
//! ## Cycle Flow
//!
//! 1. Create the provider from the registry (unknown name → config error)
//! 2. For each enabled family, IPv4 first: resolve the address
//! 3. If it differs from the last pushed one, call the provider
//! 4. On success, remember the address; on failure, return the error
//!
//! Any error ends the run, including in periodic mode. The stored address is
//! not advanced for a failed update, so a later run tries again.

use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::time::MissedTickBehavior;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;
use tracing::{debug, info, warn};

use crate::config::{DdnsConfig, Families, ProviderConfig, Schedule};
use crate::detector::ChangeDetector;
use crate::dispatcher;
use crate::error::{Error, Result};
use crate::registry::ProviderRegistry;
use crate::resolver::AddressResolver;
use crate::traits::{AddressFamily, DnsProvider};

/// What a cycle did for one address family
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FamilyOutcome {
    /// The resolved address matched the last pushed one, no provider call
    Unchanged {
        family: AddressFamily,
        address: String,
    },

    /// The provider accepted the new address
    Updated {
        family: AddressFamily,
        previous: String,
        address: String,
    },
}

impl FamilyOutcome {
    /// Family this outcome belongs to
    pub fn family(&self) -> AddressFamily {
        match self {
            FamilyOutcome::Unchanged { family, .. } | FamilyOutcome::Updated { family, .. } => {
                *family
            }
        }
    }

    /// True if a provider update happened
    pub fn is_updated(&self) -> bool {
        matches!(self, FamilyOutcome::Updated { .. })
    }
}

/// Summary of one completed cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Per-family outcomes in processing order
    pub outcomes: Vec<FamilyOutcome>,
}

impl CycleReport {
    /// Number of provider updates performed
    pub fn updated_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_updated()).count()
    }
}

/// Core DDNS engine
///
/// The engine owns every piece of mutable state of the updater: the last
/// pushed address per family lives in its [`ChangeDetector`].
///
/// ## Lifecycle
///
/// 1. Create with [`DdnsEngine::new()`]
/// 2. Start with [`DdnsEngine::run()`]
/// 3. `Schedule::Once` returns after one cycle; `Schedule::Every` runs until
///    an error occurs or the process is killed
///
/// ## Threading
///
/// Cycles run sequentially on the caller's task and never overlap.
pub struct DdnsEngine {
    /// Public address lookup with retry
    resolver: AddressResolver,

    /// Provider factories by name
    registry: Arc<ProviderRegistry>,

    /// Selected provider and its environment
    provider_config: ProviderConfig,

    /// Records to keep up to date
    families: Families,

    /// Cycle timing
    schedule: Schedule,

    /// Last pushed addresses
    detector: ChangeDetector,
}

impl DdnsEngine {
    /// Create a new DDNS engine
    ///
    /// # Parameters
    ///
    /// - `resolver`: Address resolver
    /// - `registry`: Registry holding the provider named by `provider_config`
    /// - `provider_config`: Selected provider and its environment
    /// - `config`: DDNS configuration
    ///
    /// # Errors
    ///
    /// A configuration error if `config` is invalid or the provider name is
    /// not registered.
    pub fn new(
        resolver: AddressResolver,
        registry: Arc<ProviderRegistry>,
        provider_config: ProviderConfig,
        config: DdnsConfig,
    ) -> Result<Self> {
        config.validate()?;

        if !registry.has_provider(provider_config.type_name()) {
            return Err(Error::config(format!(
                "Unknown provider type: '{}'. Supported providers: {}",
                provider_config.type_name(),
                registry.list_providers().join(", ")
            )));
        }

        if config.families.is_empty() {
            warn!("Neither IPv4 nor IPv6 is enabled, cycles will not update anything");
        }

        Ok(Self {
            resolver,
            registry,
            provider_config,
            families: config.families,
            schedule: config.schedule,
            detector: ChangeDetector::new(),
        })
    }

    /// Configured schedule
    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    /// Last address pushed for `family`, empty if none yet
    pub fn last_known(&self, family: AddressFamily) -> &str {
        self.detector.last_known(family)
    }

    /// Run the engine on its configured schedule
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The single cycle of `Schedule::Once` completed
    /// - `Err(Error)`: A cycle failed; periodic mode never returns otherwise
    pub async fn run(&mut self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Internal run implementation that accepts an optional shutdown signal
    async fn run_internal(&mut self, shutdown_rx: Option<oneshot::Receiver<()>>) -> Result<()> {
        let interval = match self.schedule {
            Schedule::Once => {
                info!(provider = self.provider_config.type_name(), "Running a single update cycle");
                self.run_cycle().await?;
                return Ok(());
            }
            Schedule::Every(interval) => interval,
        };

        info!(
            provider = self.provider_config.type_name(),
            "Running update cycles every {:?}", interval
        );

        // First tick completes immediately
        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut ticks = IntervalStream::new(timer);

        let Some(mut rx) = shutdown_rx else {
            while ticks.next().await.is_some() {
                self.run_cycle().await?;
            }
            return Ok(());
        };

        loop {
            tokio::select! {
                Some(_) = ticks.next() => {
                    self.run_cycle().await?;
                }

                _ = &mut rx => {
                    info!("Shutdown signal received");
                    return Ok(());
                }
            }
        }
    }

    /// Run exactly one check-and-update cycle
    ///
    /// # Returns
    ///
    /// - `Ok(CycleReport)`: Every enabled family was checked and, if needed, updated
    /// - `Err(Error)`: Provider creation, a non-network lookup failure or a provider update failed
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        let provider = self.registry.create_provider(&self.provider_config)?;
        let mut report = CycleReport::default();

        for family in self.families.enabled() {
            let outcome = self.check_family(provider.as_ref(), family).await?;
            report.outcomes.push(outcome);
        }

        debug!(updated = report.updated_count(), "Cycle complete");
        Ok(report)
    }

    /// Check one family and update its record if the address changed
    async fn check_family(
        &mut self,
        provider: &dyn DnsProvider,
        family: AddressFamily,
    ) -> Result<FamilyOutcome> {
        let address = self.resolver.resolve(family).await?;

        if !self.detector.has_changed(family, &address) {
            return Ok(FamilyOutcome::Unchanged { family, address });
        }

        dispatcher::update_record(provider, family, &address).await?;

        let previous = self.detector.last_known(family).to_string();
        self.detector.record(family, address.clone());
        info!(%family, "{} record updated: '{}' -> '{}'", family.record_type(), previous, address);

        Ok(FamilyOutcome::Updated {
            family,
            previous,
            address,
        })
    }

    /// Test-only helper to run the engine with a controlled shutdown signal
    ///
    /// # Visibility
    ///
    /// This is `pub` for testing purposes only. The updater itself has no
    /// graceful shutdown: periodic mode ends with the process.
    pub async fn run_with_shutdown(
        &mut self,
        shutdown_rx: Option<oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }
}
