pub mod lookup;
pub mod scan;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use sonar_common::config::{Config, WordlistSource};
use sonar_common::export::ToolInfo;
use sonar_common::network::domain::Domain;
use sonar_common::network::nameserver::parse_nameserver;

#[derive(Parser)]
#[command(name = "sonar", version)]
#[command(about = "DNS record lookup and subdomain discovery.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Nameserver to query as ip or ip:port (repeatable, tried in order)
    #[arg(short = 'n', long = "nameserver", global = true, value_parser = parse_nameserver)]
    pub nameservers: Vec<SocketAddr>,

    /// Timeout of a single query attempt in milliseconds
    #[arg(long, global = true, default_value_t = 2000)]
    pub timeout: u64,

    /// Overall budget of the operation in seconds
    #[arg(long, global = true, default_value_t = 120)]
    pub deadline: u64,

    /// Print the export document to stdout
    #[arg(long, global = true)]
    pub json: bool,

    /// Write the export document to a file
    #[arg(short = 'o', long, global = true)]
    pub output: Option<PathBuf>,

    /// Reduce output (-q, -qq)
    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Show debug (-v) or trace (-vv) events
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(long, global = true)]
    pub no_banner: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve the A, AAAA, MX, NS, CNAME and TXT records of a domain
    #[command(alias = "l")]
    Lookup { domain: Domain },
    /// Enumerate the subdomains of a domain
    #[command(alias = "s")]
    Scan {
        domain: Domain,

        /// File with one candidate label per line
        #[arg(short = 'w', long)]
        wordlist: Option<PathBuf>,

        /// Timeout of a single service connection in milliseconds
        #[arg(long, default_value_t = 1000)]
        probe_timeout: u64,

        /// Candidates examined at the same time
        #[arg(short = 'c', long, default_value_t = 32)]
        concurrency: usize,

        /// Keep subdomains that only resolve to wildcard addresses
        #[arg(long)]
        no_wildcard_filter: bool,
    },
}

/// Where the export document goes.
pub struct ExportTarget {
    pub stdout: bool,
    pub file: Option<PathBuf>,
}

impl ExportTarget {
    pub fn is_requested(&self) -> bool {
        self.stdout || self.file.is_some()
    }

    pub fn write<T: Serialize>(&self, document: &T) -> anyhow::Result<()> {
        if !self.is_requested() {
            return Ok(());
        }

        let json: String = serde_json::to_string_pretty(document)?;
        if self.stdout {
            println!("{json}");
        }
        if let Some(path) = &self.file {
            std::fs::write(path, &json)
                .with_context(|| format!("writing export to {}", path.display()))?;
            tracing::info!("Export written to {}", path.display());
        }
        Ok(())
    }
}

pub fn tool_info() -> ToolInfo {
    ToolInfo::new("sonar", env!("CARGO_PKG_VERSION"))
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn export(&self) -> ExportTarget {
        ExportTarget {
            stdout: self.json,
            file: self.output.clone(),
        }
    }

    pub fn to_config(&self) -> Config {
        let mut cfg: Config = Config {
            query_timeout: Duration::from_millis(self.timeout),
            deadline: Duration::from_secs(self.deadline),
            quiet: self.quiet,
            no_banner: self.no_banner || self.json,
            ..Config::default()
        };
        if !self.nameservers.is_empty() {
            cfg.nameservers = self.nameservers.clone();
        }

        if let Commands::Scan {
            wordlist,
            probe_timeout,
            concurrency,
            no_wildcard_filter,
            ..
        } = &self.command
        {
            cfg.wordlist = match wordlist {
                Some(path) => WordlistSource::File(path.clone()),
                None => WordlistSource::Builtin,
            };
            cfg.probe_timeout = Duration::from_millis(*probe_timeout);
            cfg.concurrency = *concurrency;
            cfg.filter_wildcard = !no_wildcard_filter;
        }
        cfg
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
