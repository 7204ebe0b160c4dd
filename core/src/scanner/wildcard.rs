use std::collections::BTreeSet;
use std::net::IpAddr;

use rand::Rng;
use rand::distr::Alphanumeric;
use tracing::{debug, warn};

use sonar_common::network::domain::Domain;
use sonar_common::network::record::{DnsRecord, RecordType};
use sonar_common::resolving::Resolver;

const PROBE_LABEL_LEN: usize = 16;

fn random_label() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(PROBE_LABEL_LEN)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect()
}

/// Resolves a label that cannot plausibly exist under `domain`.
///
/// Whatever addresses come back are what the zone hands out for any name,
/// so an empty set means there is no wildcard. Lookup failures are treated
/// the same way.
pub async fn detect(resolver: &dyn Resolver, domain: &Domain) -> BTreeSet<IpAddr> {
    let probe: Domain = match domain.child(&random_label()) {
        Ok(probe) => probe,
        Err(e) => {
            debug!("Wildcard probe for {domain} not possible: {e}");
            return BTreeSet::new();
        }
    };

    let mut addresses: BTreeSet<IpAddr> = BTreeSet::new();
    for record_type in [RecordType::A, RecordType::Aaaa] {
        match resolver.resolve(&probe, record_type).await {
            Ok(records) => addresses.extend(records.iter().filter_map(DnsRecord::ip_addr)),
            Err(e) => debug!("Wildcard probe {probe} ({record_type}): {e}"),
        }
    }

    if !addresses.is_empty() {
        warn!("{domain} answers every name with {} wildcard addresses", addresses.len());
    }
    addresses
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
