//! # Record Aggregator
//!
//! Fans one query per [`RecordType`] out concurrently and merges the answers
//! into a [`DnsResult`]. A failing type never aborts the others.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::time::{Instant, timeout_at};
use tracing::{info, warn};

use sonar_common::error::{QueryError, ReconError};
use sonar_common::network::domain::Domain;
use sonar_common::network::record::{DnsRecord, DnsResult, RecordType};
use sonar_common::resolving::Resolver;

type TypeOutcome = (RecordType, Result<Vec<DnsRecord>, QueryError>);

pub struct RecordLookup {
    resolver: Arc<dyn Resolver>,
    deadline: Duration,
}

impl RecordLookup {
    pub fn new(resolver: Arc<dyn Resolver>, deadline: Duration) -> Self {
        Self { resolver, deadline }
    }

    /// Queries every record type of `domain`.
    ///
    /// Types still in flight when the deadline fires are abandoned and the
    /// result is flagged as truncated. Fails only when every type failed with
    /// a transient error.
    pub async fn lookup_all(&self, domain: &Domain) -> Result<DnsResult, ReconError> {
        let deadline: Instant = Instant::now() + self.deadline;

        let mut pending: FuturesUnordered<_> = RecordType::ALL
            .into_iter()
            .map(|record_type| async move { (record_type, self.resolver.resolve(domain, record_type).await) })
            .collect();

        let mut outcomes: Vec<TypeOutcome> = Vec::with_capacity(RecordType::ALL.len());
        let mut truncated: bool = false;

        loop {
            let next = timeout_at(deadline, pending.next()).await;
            match next {
                Ok(Some(outcome)) => outcomes.push(outcome),
                Ok(None) => break,
                Err(_elapsed) => {
                    warn!(
                        "Lookup of {domain} hit the deadline with {} record types unsettled",
                        pending.len()
                    );
                    truncated = true;
                    break;
                }
            }
        }
        drop(pending);

        if !truncated && let Some(reason) = shared_transient_failure(&outcomes) {
            return Err(ReconError::Unreachable { reason });
        }

        let result: DnsResult = DnsResult::new(domain.clone(), outcomes, truncated);
        info!(
            "Resolved {} records for {domain} ({} record types failed)",
            result.total_records(),
            result.errors().len()
        );
        Ok(result)
    }
}

/// The first error when every outcome is a transient failure.
fn shared_transient_failure(outcomes: &[TypeOutcome]) -> Option<QueryError> {
    let all_transient: bool = outcomes
        .iter()
        .all(|(_, outcome)| matches!(outcome, Err(e) if e.is_transient()));

    if outcomes.is_empty() || !all_transient {
        return None;
    }
    outcomes.iter().find_map(|(_, outcome)| outcome.clone().err())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
