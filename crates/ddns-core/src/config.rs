//! Configuration types for the DDNS updater
//!
//! This module defines all configuration structures used throughout the crate:
//! - [`DdnsConfig`]: schedule, enabled families and resolver settings
//! - [`Environment`] / [`EnvFile`]: the variables providers read credentials from
//! - [`ProviderConfig`]: the selected provider name plus that environment

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::traits::AddressFamily;

/// Default timeout for one address lookup request
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);

/// Echo service answering with the caller's IPv4 address
pub const DEFAULT_IPV4_URL: &str = "https://checkip.amazonaws.com";

/// Echo service answering with the caller's IPv6 address
///
/// Has to be a host without A records, otherwise a dual-stack client may
/// reach it over IPv4 and get the wrong family back.
pub const DEFAULT_IPV6_URL: &str = "https://v6.ident.me";

/// Main DDNS configuration
#[derive(Debug, Clone)]
pub struct DdnsConfig {
    /// When cycles run
    pub schedule: Schedule,

    /// Which records to keep up to date
    pub families: Families,

    /// Address lookup settings
    pub resolver: ResolverConfig,
}

impl DdnsConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            schedule: Schedule::Once,
            families: Families::default(),
            resolver: ResolverConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if let Schedule::Every(interval) = self.schedule
            && interval.is_zero()
        {
            return Err(Error::config("Periodic schedule interval must be > 0"));
        }

        self.resolver.validate()
    }
}

impl Default for DdnsConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// When the check-and-update cycle runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Run a single cycle and stop
    Once,
    /// Run a cycle immediately, then once per interval, forever
    Every(Duration),
}

impl Schedule {
    /// Map an interval to a schedule; the zero duration means "run once"
    pub fn from_interval(interval: Duration) -> Self {
        if interval.is_zero() {
            Schedule::Once
        } else {
            Schedule::Every(interval)
        }
    }
}

/// Address families whose records are kept up to date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Families {
    /// Update the A record
    pub ipv4: bool,
    /// Update the AAAA record
    pub ipv6: bool,
}

impl Families {
    /// Enabled families, IPv4 always first
    pub fn enabled(&self) -> impl Iterator<Item = AddressFamily> + use<> {
        let v4 = self.ipv4.then_some(AddressFamily::V4);
        let v6 = self.ipv6.then_some(AddressFamily::V6);
        v4.into_iter().chain(v6)
    }

    /// True if no family is enabled
    pub fn is_empty(&self) -> bool {
        !self.ipv4 && !self.ipv6
    }
}

impl Default for Families {
    fn default() -> Self {
        Self {
            ipv4: true,
            ipv6: false,
        }
    }
}

/// Address lookup configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Timeout of one lookup request, also the sleep after a network error
    pub timeout: Duration,

    /// URL answering with the IPv4 address
    pub ipv4_url: String,

    /// URL answering with the IPv6 address
    pub ipv6_url: String,
}

impl ResolverConfig {
    /// Environment variable overriding the IPv4 lookup URL
    pub const IPV4_URL_VAR: &'static str = "DDNS_IPV4_URL";

    /// Environment variable overriding the IPv6 lookup URL
    pub const IPV6_URL_VAR: &'static str = "DDNS_IPV6_URL";

    /// Defaults, with URL overrides taken from `env`
    pub fn from_environment(env: &Environment, timeout: Duration) -> Self {
        let defaults = Self::default();
        Self {
            timeout,
            ipv4_url: env
                .get(Self::IPV4_URL_VAR)
                .map(str::to_string)
                .unwrap_or(defaults.ipv4_url),
            ipv6_url: env
                .get(Self::IPV6_URL_VAR)
                .map(str::to_string)
                .unwrap_or(defaults.ipv6_url),
        }
    }

    /// URL queried for the given family
    pub fn url(&self, family: AddressFamily) -> &str {
        match family {
            AddressFamily::V4 => &self.ipv4_url,
            AddressFamily::V6 => &self.ipv6_url,
        }
    }

    /// Validate the resolver configuration
    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(Error::config("Lookup timeout must be > 0"));
        }

        for (var, url) in [
            (Self::IPV4_URL_VAR, &self.ipv4_url),
            (Self::IPV6_URL_VAR, &self.ipv6_url),
        ] {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(Error::config(format!(
                    "{var} must use HTTP or HTTPS scheme. Got: '{url}'"
                )));
            }
        }

        Ok(())
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_LOOKUP_TIMEOUT,
            ipv4_url: DEFAULT_IPV4_URL.to_string(),
            ipv6_url: DEFAULT_IPV6_URL.to_string(),
        }
    }
}

/// Parsed `KEY=VALUE` config file
///
/// Every line containing `=` is split on the first `=`; every other line is
/// ignored. Entries keep file order so later duplicates win when applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvFile {
    entries: Vec<(String, String)>,
}

impl EnvFile {
    /// Parse config file contents
    pub fn parse(contents: &str) -> Self {
        let entries = contents
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .filter_map(|line| line.split_once('='))
            .filter(|(key, _)| !key.is_empty())
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();

        Self { entries }
    }

    /// Read and parse a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        Ok(Self::parse(&contents))
    }

    /// Entries in file order
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// True if the file set nothing
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Snapshot of environment variables
///
/// Built from the process environment and overlaid with config file entries,
/// so the process environment itself is never mutated.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    /// Build from arbitrary key/value pairs
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Snapshot the process environment (non-UTF-8 variables are skipped)
    pub fn from_process() -> Self {
        Self::from_vars(std::env::vars_os().filter_map(|(k, v)| {
            Some((k.into_string().ok()?, v.into_string().ok()?))
        }))
    }

    /// Apply config file entries top-to-bottom, overriding existing values
    pub fn overlay(&mut self, file: &EnvFile) {
        for (key, value) in file.entries() {
            self.vars.insert(key.clone(), value.clone());
        }
    }

    /// Look up a variable
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Look up a variable that must be present and non-empty
    pub fn require(&self, key: &str) -> Result<&str> {
        match self.get(key) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(Error::config(format!("{key} env. variable is required"))),
        }
    }
}

// Values may hold credentials, only keys are shown
impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.vars.keys()).finish()
    }
}

/// DNS provider configuration
///
/// The provider is selected by the `PROVIDER` variable; its credentials and
/// record identifiers are read by the provider itself from [`Environment`].
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    name: String,
    env: Environment,
}

impl ProviderConfig {
    /// Variable selecting the provider
    pub const PROVIDER_VAR: &'static str = "PROVIDER";

    /// Variable switching providers to dry-run (`DDNS_MODE=dry-run`)
    pub const MODE_VAR: &'static str = "DDNS_MODE";

    /// Select the provider named by `PROVIDER` in `env`
    pub fn from_environment(env: Environment) -> Result<Self> {
        let name = env.require(Self::PROVIDER_VAR)?.to_string();
        Ok(Self { name, env })
    }

    /// Explicitly named provider
    pub fn new(name: impl Into<String>, env: Environment) -> Self {
        Self {
            name: name.into(),
            env,
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        &self.name
    }

    /// Environment the provider reads from
    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Shorthand for `self.env().get(key)`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.env.get(key)
    }

    /// Shorthand for `self.env().require(key)`
    pub fn require(&self, key: &str) -> Result<&str> {
        self.env.require(key)
    }

    /// Optional variable, empty values treated as unset
    pub fn optional(&self, key: &str) -> Option<String> {
        self.get(key)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    /// Providers look up records but skip writes in dry-run mode
    pub fn dry_run(&self) -> bool {
        self.get(Self::MODE_VAR)
            .is_some_and(|mode| mode.eq_ignore_ascii_case("dry-run"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_file_splits_on_first_equals() {
        let file = EnvFile::parse("FOO=bar=baz\n");
        assert_eq!(
            file.entries(),
            &[("FOO".to_string(), "bar=baz".to_string())]
        );
    }

    #[test]
    fn test_env_file_ignores_lines_without_equals() {
        let file = EnvFile::parse("# comment\nPROVIDER=cloudflare\njust text\n\n");
        assert_eq!(
            file.entries(),
            &[("PROVIDER".to_string(), "cloudflare".to_string())]
        );
    }

    #[test]
    fn test_env_file_empty() {
        assert!(EnvFile::parse("").is_empty());

        let mut env = Environment::from_vars([("PROVIDER", "cloudflare")]);
        let before = env.clone();
        env.overlay(&EnvFile::parse(""));
        assert_eq!(env, before);
    }

    #[test]
    fn test_env_file_keeps_values_verbatim() {
        let file = EnvFile::parse("KEY= spaced value \r\nEMPTY=\n=orphan\n");
        assert_eq!(
            file.entries(),
            &[
                ("KEY".to_string(), " spaced value ".to_string()),
                ("EMPTY".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_overlay_last_duplicate_wins() {
        let mut env = Environment::from_vars([("PROVIDER", "digitalocean"), ("OTHER", "kept")]);
        env.overlay(&EnvFile::parse("PROVIDER=first\nPROVIDER=cloudflare\n"));

        assert_eq!(env.get("PROVIDER"), Some("cloudflare"));
        assert_eq!(env.get("OTHER"), Some("kept"));
    }

    #[test]
    fn test_env_file_load_missing_is_config_error() {
        let err = EnvFile::load("/nonexistent/ddns/config.env").unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_require_rejects_missing_and_empty() {
        let env = Environment::from_vars([("EMPTY", "")]);
        assert!(env.require("EMPTY").is_err());
        assert!(env.require("MISSING").is_err());
    }

    #[test]
    fn test_provider_config_requires_provider() {
        let err = ProviderConfig::from_environment(Environment::default()).unwrap_err();
        assert!(err.to_string().contains("PROVIDER env. variable is required"));

        let config =
            ProviderConfig::from_environment(Environment::from_vars([("PROVIDER", "cloudflare")]))
                .unwrap();
        assert_eq!(config.type_name(), "cloudflare");
    }

    #[test]
    fn test_environment_debug_hides_values() {
        let env = Environment::from_vars([("CLOUDFLARE_API_TOKEN", "secret_token_12345")]);
        let debug_str = format!("{:?}", env);
        assert!(debug_str.contains("CLOUDFLARE_API_TOKEN"));
        assert!(!debug_str.contains("secret_token_12345"));
    }

    #[test]
    fn test_schedule_from_interval() {
        assert_eq!(Schedule::from_interval(Duration::ZERO), Schedule::Once);
        assert_eq!(
            Schedule::from_interval(Duration::from_secs(15)),
            Schedule::Every(Duration::from_secs(15))
        );
    }

    #[test]
    fn test_families_order() {
        let both = Families { ipv4: true, ipv6: true };
        assert_eq!(
            both.enabled().collect::<Vec<_>>(),
            vec![AddressFamily::V4, AddressFamily::V6]
        );

        let none = Families { ipv4: false, ipv6: false };
        assert!(none.is_empty());
        assert_eq!(none.enabled().count(), 0);

        assert_eq!(
            Families::default().enabled().collect::<Vec<_>>(),
            vec![AddressFamily::V4]
        );
    }

    #[test]
    fn test_resolver_config_overrides() {
        let env = Environment::from_vars([("DDNS_IPV6_URL", "http://127.0.0.1:8080/ip")]);
        let config = ResolverConfig::from_environment(&env, Duration::from_secs(5));

        assert_eq!(config.url(AddressFamily::V4), DEFAULT_IPV4_URL);
        assert_eq!(config.url(AddressFamily::V6), "http://127.0.0.1:8080/ip");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        assert!(DdnsConfig::default().validate().is_ok());

        let mut config = DdnsConfig::default();
        config.resolver.ipv4_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());

        let mut config = DdnsConfig::default();
        config.resolver.timeout = Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = DdnsConfig::default();
        config.schedule = Schedule::Every(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_provider_config_dry_run() {
        let live = ProviderConfig::new("cloudflare", Environment::default());
        assert!(!live.dry_run());

        let dry = ProviderConfig::new(
            "cloudflare",
            Environment::from_vars([("DDNS_MODE", "DRY-RUN"), ("CLOUDFLARE_ZONE_ID", "")]),
        );
        assert!(dry.dry_run());
        assert_eq!(dry.optional("CLOUDFLARE_ZONE_ID"), None);
    }
}
