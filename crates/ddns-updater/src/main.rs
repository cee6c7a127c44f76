// # ddns-updater - Dynamic DNS updater
//
// The ddns-updater binary is responsible for:
// 1. Parsing flags and assembling the environment (process + optional config file)
// 2. Initializing logging and the runtime
// 3. Registering the DNS providers compiled into this build
// 4. Running the DDNS engine once or on an interval
//
// All DDNS logic lives in ddns-core; this is a thin integration layer.
//
// ## Flags
//
// - `-duration`: update interval (`15s`, `1m`, `6h`); `0` (default) runs once
// - `-config`: file of `KEY=VALUE` lines overriding environment variables
// - `-ipv4` / `-ipv6`: which records to keep up to date (default: A only)
// - `-timeout`: address lookup timeout (default `2s`)
// - `-v`: debug logging
//
// ## Environment
//
// - `PROVIDER`: DNS provider to use (cloudflare, digitalocean)
// - `DDNS_LOG_LEVEL`: trace, debug, info (default), warn, error
// - `DDNS_IPV4_URL` / `DDNS_IPV6_URL`: address lookup services
// - `DDNS_MODE=dry-run`: look records up but never change them
// - Provider credentials, see the provider crates
//
// ## Example
//
// ```bash
// export PROVIDER=cloudflare
// export CLOUDFLARE_API_TOKEN=your_token
// export CLOUDFLARE_HOST=home.example.com
//
// ddns-updater -duration 5m -ipv6
// ```

mod cli;
mod duration;

use anyhow::{Context, Result};
use cli::Cli;
use ddns_core::config::{DdnsConfig, EnvFile, Environment, Families, ProviderConfig, ResolverConfig, Schedule};
use ddns_core::{AddressResolver, DdnsEngine, ProviderRegistry};
use ddns_ip_http::HttpAddressSource;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

/// Variable selecting the log level
const LOG_LEVEL_VAR: &str = "DDNS_LOG_LEVEL";

/// Exit codes for different termination scenarios
///
/// - 0: Clean completion
/// - 1: Configuration or startup error
/// - 2: Runtime error (provider update or address lookup failed)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DdnsExitCode {
    /// Run-once finished (periodic mode never ends cleanly)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl DdnsExitCode {
    /// Exit code for an error returned by the engine
    ///
    /// Provider construction happens inside each cycle, so missing
    /// credentials surface here as configuration errors.
    fn for_error(e: &ddns_core::Error) -> Self {
        if e.is_config() {
            DdnsExitCode::ConfigError
        } else {
            DdnsExitCode::RuntimeError
        }
    }
}

/// Application configuration
struct Config {
    ddns: DdnsConfig,
    provider: ProviderConfig,
    log_level: Level,
}

impl Config {
    /// Assemble the configuration from flags and the environment snapshot
    fn from_sources(cli: &Cli, env: Environment) -> Result<Self> {
        let log_level = if cli.verbose {
            Level::DEBUG
        } else {
            parse_log_level(env.get(LOG_LEVEL_VAR).unwrap_or("info"))?
        };

        let ddns = DdnsConfig {
            schedule: Schedule::from_interval(cli.duration),
            families: Families {
                ipv4: cli.ipv4,
                ipv6: cli.ipv6,
            },
            resolver: ResolverConfig::from_environment(&env, cli.timeout),
        };
        ddns.validate().context("Invalid configuration")?;

        let provider = ProviderConfig::from_environment(env)?;

        Ok(Self {
            ddns,
            provider,
            log_level,
        })
    }
}

/// Snapshot the process environment and apply the config file on top
fn load_environment(cli: &Cli) -> Result<Environment> {
    let mut env = Environment::from_process();

    if let Some(ref path) = cli.config {
        let file = EnvFile::load(path)?;
        env.overlay(&file);
    }

    Ok(env)
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "{} '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            LOG_LEVEL_VAR,
            level
        ),
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse_args() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version end up here too
            let code = if e.use_stderr() {
                DdnsExitCode::ConfigError
            } else {
                DdnsExitCode::CleanShutdown
            };
            let _ = e.print();
            return code.into();
        }
    };

    let config = match load_environment(&cli).and_then(|env| Config::from_sources(&cli, env)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ddns-updater: {:#}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    info!("Starting ddns-updater");

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        match run_updater(config).await {
            Ok(()) => DdnsExitCode::CleanShutdown,
            Err(e) => {
                error!("Updater error: {}", e);
                DdnsExitCode::for_error(&e)
            }
        }
    });

    result.into()
}

/// Register every provider compiled into this build
fn build_registry() -> ProviderRegistry {
    let registry = ProviderRegistry::new();

    #[cfg(feature = "cloudflare")]
    {
        info!("Registering Cloudflare provider");
        ddns_provider_cloudflare::register(&registry);
    }

    #[cfg(feature = "digitalocean")]
    {
        info!("Registering DigitalOcean provider");
        ddns_provider_digitalocean::register(&registry);
    }

    registry
}

/// Wire the engine together and run it
async fn run_updater(config: Config) -> ddns_core::Result<()> {
    let registry = Arc::new(build_registry());

    let source = HttpAddressSource::from_config(&config.ddns.resolver)?;
    let resolver = AddressResolver::new(Box::new(source), config.ddns.resolver.timeout)
        .with_progress(true);

    info!(
        provider = config.provider.type_name(),
        ipv4 = config.ddns.families.ipv4,
        ipv6 = config.ddns.families.ipv6,
        "Configuration loaded"
    );

    let mut engine = DdnsEngine::new(resolver, registry, config.provider, config.ddns)?;
    engine.run().await
}
