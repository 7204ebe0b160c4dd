//! DNS resolution and subdomain discovery engine.
//!
//! The two entry points, [`lookup_all`] and [`scan`], wire the real network
//! collaborators from a [`Config`]. Tests and embedders that need other
//! collaborators build a [`RecordLookup`] or [`SubdomainScanner`] directly.

use std::sync::Arc;

use sonar_common::config::Config;
use sonar_common::error::ReconError;
use sonar_common::network::domain::Domain;
use sonar_common::network::record::DnsResult;
use sonar_common::network::subdomain::SubdomainResult;

pub mod candidates;
pub mod lookup;
pub mod network;
pub mod resolver;
pub mod scanner;

pub use candidates::Wordlist;
pub use lookup::RecordLookup;
pub use network::tcp::TcpProber;
pub use resolver::UdpResolver;
pub use scanner::{ProgressCallback, ScanSettings, SubdomainScanner};

/// Queries all six record types of `domain`.
pub async fn lookup_all(domain: &Domain, cfg: &Config) -> Result<DnsResult, ReconError> {
    cfg.validate()?;
    let resolver: UdpResolver = UdpResolver::from_config(cfg)?;
    RecordLookup::new(Arc::new(resolver), cfg.deadline)
        .lookup_all(domain)
        .await
}

/// Enumerates subdomains of `domain` from the configured wordlist.
pub async fn scan(
    domain: &Domain,
    cfg: &Config,
    on_found: Option<ProgressCallback>,
) -> Result<SubdomainResult, ReconError> {
    cfg.validate()?;
    let wordlist: Wordlist = Wordlist::from_source(&cfg.wordlist)?;
    let resolver: UdpResolver = UdpResolver::from_config(cfg)?;
    let prober: TcpProber = TcpProber::new(cfg.probe_timeout);

    let mut scanner: SubdomainScanner =
        SubdomainScanner::new(Arc::new(resolver), Arc::new(prober), ScanSettings::from(cfg));
    if let Some(on_found) = on_found {
        scanner = scanner.with_progress(on_found);
    }
    scanner.scan(domain, &wordlist).await
}
