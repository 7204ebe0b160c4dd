use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ReconError;
use crate::network::nameserver;

/// Where the scanner takes its candidate labels from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WordlistSource {
    #[default]
    Builtin,
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Queried in order; later entries are fallbacks.
    pub nameservers: Vec<SocketAddr>,
    /// Time allowed for a single query attempt.
    pub query_timeout: Duration,
    /// Time allowed for a single service connection attempt.
    pub probe_timeout: Duration,
    /// Maximum candidates in flight during a scan.
    pub concurrency: usize,
    /// Overall budget of one lookup or scan. Unsettled work is abandoned.
    pub deadline: Duration,
    pub wordlist: WordlistSource,
    /// Drops candidates that only resolve into the wildcard address set.
    pub filter_wildcard: bool,
    pub quiet: u8,
    pub no_banner: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nameservers: nameserver::default_nameservers(),
            query_timeout: Duration::from_secs(2),
            probe_timeout: Duration::from_secs(1),
            concurrency: 32,
            deadline: Duration::from_secs(120),
            wordlist: WordlistSource::Builtin,
            filter_wildcard: true,
            quiet: 0,
            no_banner: false,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ReconError> {
        if self.nameservers.is_empty() {
            return Err(ReconError::NoNameservers);
        }
        if self.query_timeout.is_zero() {
            return Err(ReconError::InvalidSetting("query timeout must be positive"));
        }
        if self.probe_timeout.is_zero() {
            return Err(ReconError::InvalidSetting("probe timeout must be positive"));
        }
        if self.deadline.is_zero() {
            return Err(ReconError::InvalidSetting("deadline must be positive"));
        }
        if self.concurrency == 0 {
            return Err(ReconError::InvalidSetting("concurrency must be at least 1"));
        }
        Ok(())
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
