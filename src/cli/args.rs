//! Command line argument parsing

use crate::core::ResolverConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Signature decipher engine - resolve playable stream URLs
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Deadline for one resolver call (e.g., 30s, 1m)
    #[arg(long, global = true, value_name = "DURATION", default_value = "30s")]
    pub timeout: humantime::Duration,

    /// How long an extracted plan stays cached
    #[arg(long, global = true, value_name = "DURATION", default_value = "5m")]
    pub cache_ttl: humantime::Duration,

    /// Override User-Agent header
    #[arg(long, global = true, value_name = "USER_AGENT")]
    pub user_agent: Option<String>,

    /// Proxy URL (http/https/socks)
    #[arg(long, global = true, value_name = "URL")]
    pub proxy: Option<String>,

    /// Fail when an empty operation plan would be applied
    #[arg(long, global = true)]
    pub strict: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet output (only errors)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Decipher a signatureCipher value and print the playable URL
    Resolve {
        /// Video ID or URL
        video: String,

        /// URL-encoded signatureCipher value (s, sp and url fields)
        #[arg(short, long, value_name = "QUERY")]
        cipher: String,
    },

    /// Extract the operation plan and print it as JSON
    Plan {
        /// Video ID or URL whose player release should be fetched
        #[arg(required_unless_present = "player_file", conflicts_with = "player_file")]
        video: Option<String>,

        /// Read player code from a local file instead of fetching it
        #[arg(long, value_name = "PATH")]
        player_file: Option<PathBuf>,
    },

    /// Print the signature timestamp of the player serving a video
    Timestamp {
        /// Video ID or URL
        video: String,
    },
}

impl Args {
    /// Get resolver timeout as Duration
    pub fn timeout_duration(&self) -> Duration {
        self.timeout.into()
    }

    /// Get plan cache TTL as Duration
    pub fn cache_ttl_duration(&self) -> Duration {
        self.cache_ttl.into()
    }

    /// Resolver configuration described by the flags
    pub fn resolver_config(&self) -> ResolverConfig {
        let mut config = ResolverConfig::default()
            .with_timeout(self.timeout_duration())
            .with_cache_ttl(self.cache_ttl_duration())
            .with_strict_anomalies(self.strict);

        if let Some(user_agent) = &self.user_agent {
            config = config.with_user_agent(user_agent);
        }
        if let Some(proxy) = &self.proxy {
            config = config.with_proxy(proxy);
        }
        config
    }

    /// Get output verbosity level
    pub fn verbosity_level(&self) -> VerbosityLevel {
        if self.quiet {
            VerbosityLevel::Quiet
        } else if self.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }
}

/// Output verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbosityLevel {
    /// Quiet (only errors)
    Quiet,
    /// Normal
    Normal,
    /// Verbose (debug info)
    Verbose,
}

impl VerbosityLevel {
    /// Default log filter when `RUST_LOG` is unset
    pub fn log_filter(self) -> &'static str {
        match self {
            VerbosityLevel::Quiet => "error",
            VerbosityLevel::Normal => "info",
            VerbosityLevel::Verbose => "debug",
        }
    }
}
