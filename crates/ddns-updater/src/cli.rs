//! CLI argument parsing using clap.
//!
//! Flags are long-only and may be written Go-style with a single dash
//! (`-duration 15s`, `-ipv6`, `-ipv4=false`); [`normalize_args`] rewrites
//! them to `--flag` before clap sees them.

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};

use crate::duration;

/// Keeps the A/AAAA records of a DNS provider pointed at this host's
/// public address.
#[derive(Debug, Parser)]
#[command(name = "ddns-updater")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Update interval (ex. 15s, 1m, 6h); 0 runs only once and exits
    #[arg(long, value_name = "DURATION", value_parser = duration::parse, default_value = "0")]
    pub duration: Duration,

    /// Optional file of KEY=VALUE lines to load environment variables from
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Update the A record
    #[arg(
        long,
        value_name = "BOOL",
        value_parser = parse_bool,
        num_args = 0..=1,
        default_value = "true",
        default_missing_value = "true",
        action = ArgAction::Set
    )]
    pub ipv4: bool,

    /// Update the AAAA record
    #[arg(
        long,
        value_name = "BOOL",
        value_parser = parse_bool,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true",
        action = ArgAction::Set
    )]
    pub ipv6: bool,

    /// Address lookup timeout, also the delay before retrying after a network error
    #[arg(long, value_name = "DURATION", value_parser = duration::parse, default_value = "2s")]
    pub timeout: Duration,

    /// Enable verbose logging
    #[arg(long, short)]
    pub verbose: bool,
}

impl Cli {
    /// Parses the process arguments, accepting Go-style single-dash flags.
    pub fn try_parse_args() -> Result<Self, clap::Error> {
        Self::try_parse_from_iter(std::env::args_os())
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn try_parse_from_iter<I, T>(iter: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::try_parse_from(normalize_args(iter))
    }
}

/// Rewrite `-name` / `-name=value` to `--name` / `--name=value`
///
/// Single-character flags (`-v`, `-h`), negative numbers and everything
/// after a bare `--` are left alone. The first item is the program name.
pub fn normalize_args<I, T>(iter: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut passthrough = false;

    iter.into_iter()
        .map(Into::into)
        .enumerate()
        .map(|(index, arg)| {
            if index == 0 || passthrough {
                return arg;
            }

            let Some(text) = arg.to_str() else {
                return arg;
            };

            if text == "--" {
                passthrough = true;
                return arg;
            }

            let name = text.split('=').next().unwrap_or(text);
            let is_go_flag = name.len() > 2
                && name.starts_with('-')
                && !name.starts_with("--")
                && !name[1..].starts_with(|c: char| c.is_ascii_digit());

            if is_go_flag {
                OsString::from(format!("-{text}"))
            } else {
                arg
            }
        })
        .collect()
}

/// Boolean flag values, in the forms Go's flag package accepts
fn parse_bool(value: &str) -> Result<bool, String> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        _ => Err(format!("invalid boolean value {value:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["ddns-updater"];
        argv.extend_from_slice(args);
        Cli::try_parse_from_iter(argv).unwrap()
    }

    #[test]
    fn parse_defaults() {
        let cli = parse(&[]);

        assert_eq!(cli.duration, Duration::ZERO);
        assert_eq!(cli.config, None);
        assert!(cli.ipv4);
        assert!(!cli.ipv6);
        assert_eq!(cli.timeout, Duration::from_secs(2));
        assert!(!cli.verbose);
    }

    #[test]
    fn parse_go_style_flags() {
        let cli = parse(&["-duration", "15s", "-config", "/etc/ddns.env", "-ipv6"]);

        assert_eq!(cli.duration, Duration::from_secs(15));
        assert_eq!(cli.config, Some(PathBuf::from("/etc/ddns.env")));
        assert!(cli.ipv4);
        assert!(cli.ipv6);
    }

    #[test]
    fn parse_double_dash_flags() {
        let cli = parse(&["--duration=1h30m", "--timeout", "500ms", "-v"]);

        assert_eq!(cli.duration, Duration::from_secs(5400));
        assert_eq!(cli.timeout, Duration::from_millis(500));
        assert!(cli.verbose);
    }

    #[test]
    fn parse_bool_forms() {
        let cli = parse(&["-ipv4=false", "-ipv6", "true"]);
        assert!(!cli.ipv4);
        assert!(cli.ipv6);

        let cli = parse(&["-ipv4", "0", "-ipv6=T"]);
        assert!(!cli.ipv4);
        assert!(cli.ipv6);

        let cli = parse(&["-ipv6", "-duration", "1m"]);
        assert!(cli.ipv6);
        assert_eq!(cli.duration, Duration::from_secs(60));
    }

    #[test]
    fn reject_bad_values() {
        assert!(Cli::try_parse_from_iter(["ddns-updater", "-duration", "15"]).is_err());
        assert!(Cli::try_parse_from_iter(["ddns-updater", "-duration", "-5s"]).is_err());
        assert!(Cli::try_parse_from_iter(["ddns-updater", "-ipv6=maybe"]).is_err());
        assert!(Cli::try_parse_from_iter(["ddns-updater", "-unknown"]).is_err());
    }

    #[test]
    fn normalize_leaves_short_flags_and_values() {
        let args = normalize_args(["ddns-updater", "-v", "-config", "a=b.env", "--", "-ipv6"]);

        assert_eq!(
            args,
            vec![
                OsString::from("ddns-updater"),
                OsString::from("-v"),
                OsString::from("--config"),
                OsString::from("a=b.env"),
                OsString::from("--"),
                OsString::from("-ipv6"),
            ]
        );
    }
}
