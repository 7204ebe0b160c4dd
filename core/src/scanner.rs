//! # Subdomain Scanner
//!
//! Drives resolution and service probing over the candidates of a [`Wordlist`].
//!
//! At most `concurrency` candidates are examined at a time. Every candidate ends
//! up in one of three outcomes:
//!
//! * **Found**: it resolved to an address outside the wildcard set and was probed.
//! * **Dropped**: NXDOMAIN, no address, or only wildcard addresses.
//! * **Failed**: resolution failed with a transient error.
//!
//! Outcomes are merged only after the concurrent phase settles or the deadline
//! fires, so workers share nothing but the read-only settings.

use std::collections::{BTreeSet, HashSet};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use futures::stream::{self, StreamExt};
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, trace, warn};

use sonar_common::config::Config;
use sonar_common::error::{QueryError, ReconError};
use sonar_common::network::domain::Domain;
use sonar_common::network::record::{DnsRecord, RecordType};
use sonar_common::network::subdomain::{
    ServiceTag, SubdomainCandidate, SubdomainRecord, SubdomainResult,
};
use sonar_common::resolving::{Resolver, ServiceProber};

use crate::candidates::Wordlist;

pub mod wildcard;

/// Invoked with the running number of surviving subdomains.
pub type ProgressCallback = Box<dyn Fn(usize) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSettings {
    pub concurrency: usize,
    pub deadline: Duration,
    pub filter_wildcard: bool,
}

impl From<&Config> for ScanSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            concurrency: cfg.concurrency,
            deadline: cfg.deadline,
            filter_wildcard: cfg.filter_wildcard,
        }
    }
}

enum Examined {
    Found(SubdomainRecord),
    Dropped,
    Failed(QueryError),
}

pub struct SubdomainScanner {
    resolver: Arc<dyn Resolver>,
    prober: Arc<dyn ServiceProber>,
    settings: ScanSettings,
    on_found: Option<ProgressCallback>,
}

impl SubdomainScanner {
    pub fn new(resolver: Arc<dyn Resolver>, prober: Arc<dyn ServiceProber>, settings: ScanSettings) -> Self {
        Self {
            resolver,
            prober,
            settings,
            on_found: None,
        }
    }

    pub fn with_progress(mut self, on_found: ProgressCallback) -> Self {
        self.on_found = Some(on_found);
        self
    }

    /// Scans every candidate the wordlist forms under `domain`.
    ///
    /// On deadline expiry the candidates still in flight are abandoned and the
    /// partial result is flagged as truncated. Fails with
    /// [`ReconError::Unreachable`] only when every examined candidate failed
    /// with the same transient error.
    pub async fn scan(&self, domain: &Domain, wordlist: &Wordlist) -> Result<SubdomainResult, ReconError> {
        let deadline: Instant = Instant::now() + self.settings.deadline;
        let mut truncated: bool = false;

        let wildcard_addresses: BTreeSet<IpAddr> = if self.settings.filter_wildcard {
            match timeout_at(deadline, wildcard::detect(self.resolver.as_ref(), domain)).await {
                Ok(addresses) => addresses,
                Err(_elapsed) => {
                    truncated = true;
                    BTreeSet::new()
                }
            }
        } else {
            BTreeSet::new()
        };

        let mut found: Vec<SubdomainRecord> = Vec::new();
        let mut failures: Vec<QueryError> = Vec::new();
        let mut examined_count: usize = 0;

        if !truncated {
            let mut seen: HashSet<Domain> = HashSet::new();
            let candidates = wordlist
                .candidates(domain)
                .filter(move |candidate| seen.insert(candidate.fqdn.clone()));

            let mut examined = stream::iter(candidates)
                .map(|candidate| self.examine(candidate, &wildcard_addresses))
                .buffer_unordered(self.settings.concurrency.max(1));

            loop {
                let next = timeout_at(deadline, examined.next()).await;
                match next {
                    Ok(Some(outcome)) => {
                        examined_count += 1;
                        match outcome {
                            Examined::Found(record) => {
                                found.push(record);
                                if let Some(on_found) = &self.on_found {
                                    on_found(found.len());
                                }
                            }
                            Examined::Dropped => {}
                            Examined::Failed(e) => failures.push(e),
                        }
                    }
                    Ok(None) => break,
                    Err(_elapsed) => {
                        truncated = true;
                        break;
                    }
                }
            }
        }

        if truncated {
            warn!(
                "Scan of {domain} hit the deadline after {examined_count} of {} candidates",
                wordlist.len()
            );
        } else if let Some(reason) = shared_failure(examined_count, &failures) {
            return Err(ReconError::Unreachable { reason });
        }

        let result: SubdomainResult = SubdomainResult::new(domain.clone(), found, wildcard_addresses, truncated);
        info!(
            "Found {} subdomains of {domain} ({} active)",
            result.total_found(),
            result.active_count()
        );
        Ok(result)
    }

    async fn examine(&self, candidate: SubdomainCandidate, wildcard: &BTreeSet<IpAddr>) -> Examined {
        let addresses: Vec<IpAddr> = match self.resolve_addresses(&candidate.fqdn).await {
            Ok(addresses) => addresses,
            Err(QueryError::Nxdomain) => {
                trace!("{} does not exist", candidate.fqdn);
                return Examined::Dropped;
            }
            Err(e) => {
                debug!("Resolving {} failed: {e}", candidate.fqdn);
                return Examined::Failed(e);
            }
        };

        let Some(address) = addresses
            .iter()
            .find(|addr| !wildcard.contains(*addr))
            .copied()
        else {
            trace!("{} has no address outside the wildcard set", candidate.fqdn);
            return Examined::Dropped;
        };

        let services: BTreeSet<ServiceTag> = self.probe_services(address).await;
        Examined::Found(SubdomainRecord::new(candidate.fqdn, Some(address), services))
    }

    /// A addresses, or AAAA addresses when the name has none over IPv4.
    async fn resolve_addresses(&self, fqdn: &Domain) -> Result<Vec<IpAddr>, QueryError> {
        let ipv4: Result<Vec<IpAddr>, QueryError> = self
            .resolver
            .resolve(fqdn, RecordType::A)
            .await
            .map(|records| addresses_of(&records));

        let settled: bool = match &ipv4 {
            Ok(addresses) => !addresses.is_empty(),
            Err(e) => *e == QueryError::Nxdomain,
        };
        if settled {
            return ipv4;
        }

        match self.resolver.resolve(fqdn, RecordType::Aaaa).await {
            Ok(records) => {
                let addresses: Vec<IpAddr> = addresses_of(&records);
                if addresses.is_empty() { ipv4 } else { Ok(addresses) }
            }
            Err(e) => ipv4.and(Err(e)),
        }
    }

    async fn probe_services(&self, addr: IpAddr) -> BTreeSet<ServiceTag> {
        let probes = ServiceTag::ALL
            .into_iter()
            .map(|service| async move { (service, self.prober.probe(addr, service).await) });

        join_all(probes)
            .await
            .into_iter()
            .filter_map(|(service, responsive)| responsive.then_some(service))
            .collect()
    }
}

fn addresses_of(records: &[DnsRecord]) -> Vec<IpAddr> {
    records.iter().filter_map(DnsRecord::ip_addr).collect()
}

/// The common error when every examined candidate failed the same way.
fn shared_failure(examined_count: usize, failures: &[QueryError]) -> Option<QueryError> {
    let first: &QueryError = failures.first()?;
    if failures.len() == examined_count && failures.iter().all(|e| e == first) {
        Some(first.clone())
    } else {
        None
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
