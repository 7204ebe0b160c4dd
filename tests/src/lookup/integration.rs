#![cfg(test)]
use std::sync::Arc;
use std::time::{Duration, Instant};

use sonar_common::error::{QueryError, ReconError};
use sonar_common::export::{LookupExport, ToolInfo};
use sonar_common::network::record::{DnsRecord, DnsResult, RecordType};
use sonar_core::RecordLookup;

use crate::support::{HangingResolver, PartialResolver, StaticResolver, domain};

const DEADLINE: Duration = Duration::from_secs(5);

fn example_com() -> StaticResolver {
    StaticResolver::new()
        .answer("example.com", RecordType::A, &[("93.184.216.34", 3600)])
        .answer(
            "example.com",
            RecordType::Aaaa,
            &[("2606:2800:220:1:248:1893:25c8:1946", 3600)],
        )
        .answer("example.com", RecordType::Mx, &[("10 mail.example.com", 3600)])
        .answer(
            "example.com",
            RecordType::Ns,
            &[("ns1.example.com", 86400), ("ns2.example.com", 86400)],
        )
        .answer("example.com", RecordType::Cname, &[])
        .answer(
            "example.com",
            RecordType::Txt,
            &[("v=spf1 include:_spf.google.com ~all", 3600)],
        )
}

fn values(result: &DnsResult, record_type: RecordType) -> Vec<&str> {
    result
        .records_of(record_type)
        .iter()
        .map(|record| record.value.as_str())
        .collect()
}

#[tokio::test]
async fn lookup_example_com_returns_every_record_type() {
    let lookup = RecordLookup::new(Arc::new(example_com()), DEADLINE);
    let result: DnsResult = lookup.lookup_all(&domain("example.com").unwrap()).await.unwrap();

    assert!(result.errors().is_empty());
    assert!(!result.truncated());
    assert_eq!(values(&result, RecordType::A), vec!["93.184.216.34"]);
    assert_eq!(
        values(&result, RecordType::Aaaa),
        vec!["2606:2800:220:1:248:1893:25c8:1946"]
    );
    assert_eq!(values(&result, RecordType::Mx), vec!["10 mail.example.com"]);
    assert_eq!(
        values(&result, RecordType::Ns),
        vec!["ns1.example.com", "ns2.example.com"]
    );
    assert!(values(&result, RecordType::Cname).is_empty());
    assert_eq!(
        values(&result, RecordType::Txt),
        vec!["v=spf1 include:_spf.google.com ~all"]
    );
    assert_eq!(result.records_of(RecordType::Ns)[1].ttl, Some(86400));
}

#[tokio::test]
async fn lookup_always_reports_all_six_types() {
    let resolver = StaticResolver::new().answer("example.org", RecordType::Txt, &[("hello", 60)]);
    let lookup = RecordLookup::new(Arc::new(resolver), DEADLINE);

    let result = lookup.lookup_all(&domain("example.org").unwrap()).await.unwrap();

    let keys: Vec<RecordType> = result.records().keys().copied().collect();
    assert_eq!(keys, RecordType::ALL.to_vec());
    assert_eq!(result.error_of(RecordType::A), Some(&QueryError::Nxdomain));
    assert_eq!(result.total_records(), 1);
}

#[tokio::test]
async fn failing_mx_does_not_abort_the_other_types() {
    let resolver = example_com().fail("example.com", RecordType::Mx, QueryError::Timeout);
    let lookup = RecordLookup::new(Arc::new(resolver), DEADLINE);

    let result = lookup.lookup_all(&domain("example.com").unwrap()).await.unwrap();

    assert_eq!(result.errors().len(), 1);
    assert_eq!(result.error_of(RecordType::Mx), Some(&QueryError::Timeout));
    assert!(result.records_of(RecordType::Mx).is_empty());
    for record_type in [RecordType::A, RecordType::Aaaa, RecordType::Ns, RecordType::Txt] {
        assert!(!result.records_of(record_type).is_empty(), "{record_type} lost");
    }
}

#[tokio::test]
async fn repeated_lookups_are_identical() {
    let lookup = RecordLookup::new(Arc::new(example_com()), DEADLINE);
    let target = domain("example.com").unwrap();

    let first = lookup.lookup_all(&target).await.unwrap();
    let second = lookup.lookup_all(&target).await.unwrap();

    assert_eq!(first.records(), second.records());
    assert_eq!(first.errors(), second.errors());
}

#[tokio::test]
async fn lookup_is_unreachable_when_every_type_times_out() {
    let resolver = StaticResolver::failing_with(QueryError::Timeout);
    let lookup = RecordLookup::new(Arc::new(resolver), DEADLINE);

    let outcome = lookup.lookup_all(&domain("example.com").unwrap()).await;

    match outcome {
        Err(ReconError::Unreachable { reason }) => assert_eq!(reason, QueryError::Timeout),
        other => panic!("expected Unreachable, got {other:?}"),
    }
}

#[tokio::test]
async fn nonexistent_domain_is_not_a_failure() {
    let resolver = StaticResolver::new();
    let lookup = RecordLookup::new(Arc::new(resolver), DEADLINE);

    let result = lookup.lookup_all(&domain("nothing-here.example").unwrap()).await.unwrap();

    assert_eq!(result.total_records(), 0);
    assert_eq!(result.errors().len(), RecordType::ALL.len());
}

#[tokio::test]
async fn lookup_returns_truncated_result_at_deadline() {
    let lookup = RecordLookup::new(Arc::new(HangingResolver), Duration::from_secs(1));

    let start: Instant = Instant::now();
    let result = lookup.lookup_all(&domain("example.com").unwrap()).await.unwrap();

    assert!(start.elapsed() < Duration::from_secs(3));
    assert!(result.truncated());
    assert_eq!(result.records().len(), RecordType::ALL.len());
    assert_eq!(result.errors().len(), RecordType::ALL.len());
}

#[tokio::test]
async fn truncated_lookup_keeps_types_answered_before_the_deadline() {
    let resolver = PartialResolver {
        inner: StaticResolver::new().answer("example.com", RecordType::A, &[("192.0.2.1", 1)]),
    };
    let lookup = RecordLookup::new(Arc::new(resolver), Duration::from_secs(1));

    let result = lookup.lookup_all(&domain("example.com").unwrap()).await.unwrap();

    assert!(result.truncated());
    assert_eq!(
        result.records_of(RecordType::A),
        &[DnsRecord::new(RecordType::A, "192.0.2.1", Some(1))]
    );
    assert_eq!(result.error_of(RecordType::A), None);
    assert_eq!(result.errors().len(), RecordType::ALL.len() - 1);
    assert_eq!(result.records().len(), RecordType::ALL.len());
}

#[tokio::test]
async fn lookup_export_has_the_exchange_shape() {
    let lookup = RecordLookup::new(Arc::new(example_com()), DEADLINE);
    let result = lookup.lookup_all(&domain("example.com").unwrap()).await.unwrap();
    let tool = ToolInfo::new("sonar", "0.1.0");

    let json = serde_json::to_value(LookupExport::new(&result, &tool)).unwrap();

    assert_eq!(json["domain"], "example.com");
    assert_eq!(json["userAgent"], "sonar/0.1.0");
    assert_eq!(json["toolInfo"]["name"], "sonar");
    assert_eq!(json["records"]["A"][0]["value"], "93.184.216.34");
    assert_eq!(json["records"]["A"][0]["ttl"], 3600);
    assert_eq!(json["records"]["CNAME"], serde_json::json!([]));
    assert!(json.get("truncated").is_none());

    let record: DnsRecord = result.records_of(RecordType::Mx)[0].clone();
    assert_eq!(json["records"]["MX"][0]["type"], record.record_type.as_str());
}
