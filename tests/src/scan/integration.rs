#![cfg(test)]
use std::collections::BTreeSet;
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use sonar_common::error::{QueryError, ReconError};
use sonar_common::export::{ScanExport, ToolInfo};
use sonar_common::network::domain::Domain;
use sonar_common::network::record::{DnsRecord, RecordType};
use sonar_common::network::subdomain::{ServiceTag, SubdomainResult, SubdomainStatus};
use sonar_common::resolving::Resolver;
use sonar_core::{ScanSettings, SubdomainScanner, Wordlist};

use crate::support::{HangingResolver, PartialResolver, SlowResolver, StaticProber, StaticResolver, domain};

fn settings() -> ScanSettings {
    ScanSettings {
        concurrency: 4,
        deadline: Duration::from_secs(5),
        filter_wildcard: true,
    }
}

fn www_mail_ftp() -> (StaticResolver, StaticProber) {
    let resolver = StaticResolver::new()
        .answer("www.example.com", RecordType::A, &[("93.184.216.34", 300)])
        .answer("mail.example.com", RecordType::A, &[("93.184.216.35", 300)]);
    let prober = StaticProber::new()
        .open("93.184.216.34", ServiceTag::Https)
        .open("93.184.216.35", ServiceTag::Smtp);
    (resolver, prober)
}

fn fqdns(result: &SubdomainResult) -> Vec<&str> {
    result
        .subdomains()
        .iter()
        .map(|record| record.fqdn.as_str())
        .collect()
}

#[tokio::test]
async fn scan_reports_live_subdomains_and_omits_nxdomain() {
    let (resolver, prober) = www_mail_ftp();
    let scanner = SubdomainScanner::new(Arc::new(resolver), Arc::new(prober), settings());
    let wordlist = Wordlist::new(["www", "mail", "ftp"]);

    let result = scanner.scan(&domain("example.com").unwrap(), &wordlist).await.unwrap();

    assert_eq!(result.total_found(), 2);
    assert_eq!(fqdns(&result), vec!["mail.example.com", "www.example.com"]);

    let mail = &result.subdomains()[0];
    assert_eq!(mail.status, SubdomainStatus::Active);
    assert_eq!(mail.services, BTreeSet::from([ServiceTag::Smtp]));
    assert_eq!(mail.resolved_address, Some("93.184.216.35".parse::<IpAddr>().unwrap()));

    let www = &result.subdomains()[1];
    assert_eq!(www.status, SubdomainStatus::Active);
    assert_eq!(www.services, BTreeSet::from([ServiceTag::Https]));
    assert!(!result.truncated());
}

#[tokio::test]
async fn duplicate_labels_yield_one_record() {
    let (resolver, prober) = www_mail_ftp();
    let scanner = SubdomainScanner::new(Arc::new(resolver), Arc::new(prober), settings());
    let wordlist = Wordlist::new(["www", "WWW", "www"]);

    let result = scanner.scan(&domain("example.com").unwrap(), &wordlist).await.unwrap();

    assert_eq!(fqdns(&result), vec!["www.example.com"]);
    assert_eq!(result.total_found(), 1);
}

#[tokio::test]
async fn subdomains_are_sorted_regardless_of_wordlist_order() {
    let resolver = ["zeta", "alpha", "mike", "bravo"]
        .into_iter()
        .enumerate()
        .fold(StaticResolver::new(), |resolver, (i, label)| {
            let addr = format!("192.0.2.{}", i + 1);
            resolver.answer(&format!("{label}.example.com"), RecordType::A, &[(addr.as_str(), 60)])
        });
    let scanner = SubdomainScanner::new(Arc::new(resolver), Arc::new(StaticProber::new()), settings());
    let wordlist = Wordlist::new(["zeta", "alpha", "mike", "bravo"]);

    let result = scanner.scan(&domain("example.com").unwrap(), &wordlist).await.unwrap();

    assert_eq!(
        fqdns(&result),
        vec!["alpha.example.com", "bravo.example.com", "mike.example.com", "zeta.example.com"]
    );
    assert!(result.subdomains().iter().all(|r| r.status == SubdomainStatus::Inactive));
}

#[tokio::test]
async fn scan_with_hanging_resolver_returns_truncated_at_deadline() {
    let scan_settings = ScanSettings {
        deadline: Duration::from_secs(1),
        ..settings()
    };
    let scanner = SubdomainScanner::new(Arc::new(HangingResolver), Arc::new(StaticProber::new()), scan_settings);

    let start: Instant = Instant::now();
    let result = scanner
        .scan(&domain("example.com").unwrap(), &Wordlist::builtin())
        .await
        .unwrap();

    assert!(start.elapsed() < Duration::from_secs(3));
    assert!(result.truncated());
    assert_eq!(result.total_found(), 0);
}

#[tokio::test]
async fn truncation_also_applies_without_wildcard_filter() {
    let scan_settings = ScanSettings {
        deadline: Duration::from_secs(1),
        filter_wildcard: false,
        ..settings()
    };
    let scanner = SubdomainScanner::new(Arc::new(HangingResolver), Arc::new(StaticProber::new()), scan_settings);

    let start: Instant = Instant::now();
    let result = scanner
        .scan(&domain("example.com").unwrap(), &Wordlist::new(["www", "mail"]))
        .await
        .unwrap();

    assert!(start.elapsed() < Duration::from_secs(3));
    assert!(result.truncated());
}

#[tokio::test]
async fn truncated_scan_keeps_subdomains_found_before_the_deadline() {
    let resolver = PartialResolver {
        inner: StaticResolver::new().answer("www.example.com", RecordType::A, &[("93.184.216.34", 300)]),
    };
    let scan_settings = ScanSettings {
        deadline: Duration::from_secs(1),
        filter_wildcard: false,
        ..settings()
    };
    let scanner = SubdomainScanner::new(Arc::new(resolver), Arc::new(StaticProber::new()), scan_settings);

    let result = scanner
        .scan(&domain("example.com").unwrap(), &Wordlist::new(["www", "mail", "ftp", "vpn"]))
        .await
        .unwrap();

    assert!(result.truncated());
    assert_eq!(fqdns(&result), vec!["www.example.com"]);
    assert_eq!(
        result.subdomains()[0].resolved_address,
        Some("93.184.216.34".parse::<IpAddr>().unwrap())
    );
}

#[tokio::test]
async fn scan_never_exceeds_the_concurrency_bound() {
    let resolver = Arc::new(SlowResolver::new(Duration::from_millis(10)));
    let scan_settings = ScanSettings {
        concurrency: 3,
        filter_wildcard: false,
        ..settings()
    };
    let scanner = SubdomainScanner::new(resolver.clone(), Arc::new(StaticProber::new()), scan_settings);

    let result = scanner
        .scan(&domain("example.com").unwrap(), &Wordlist::builtin())
        .await
        .unwrap();

    assert!(!result.truncated());
    assert_eq!(result.total_found(), 0);
    assert!(resolver.peak() <= 3, "peak in flight was {}", resolver.peak());
    assert!(resolver.peak() > 1);
}

#[tokio::test]
async fn scan_is_unreachable_when_every_candidate_times_out() {
    let resolver = StaticResolver::failing_with(QueryError::Timeout);
    let scanner = SubdomainScanner::new(Arc::new(resolver), Arc::new(StaticProber::new()), settings());

    let outcome = scanner
        .scan(&domain("example.com").unwrap(), &Wordlist::new(["www", "mail", "ftp"]))
        .await;

    match outcome {
        Err(ReconError::Unreachable { reason }) => assert_eq!(reason, QueryError::Timeout),
        other => panic!("expected Unreachable, got {other:?}"),
    }
}

#[tokio::test]
async fn zero_found_is_a_valid_result() {
    let resolver = Arc::new(StaticResolver::new());
    let scanner = SubdomainScanner::new(resolver.clone(), Arc::new(StaticProber::new()), settings());

    let result = scanner
        .scan(&domain("example.com").unwrap(), &Wordlist::new(["www", "mail"]))
        .await
        .unwrap();

    assert_eq!(result.total_found(), 0);
    assert!(result.subdomains().is_empty());
    assert!(resolver.calls() > 0);
}

#[tokio::test]
async fn wildcard_answers_are_filtered() {
    let resolver = WildcardResolver {
        inner: StaticResolver::new().answer("www.example.com", RecordType::A, &[("93.184.216.34", 300)]),
        wildcard: "198.51.100.9",
    };
    let scanner = SubdomainScanner::new(Arc::new(resolver), Arc::new(StaticProber::new()), settings());

    let result = scanner
        .scan(&domain("example.com").unwrap(), &Wordlist::new(["www", "mail", "ftp"]))
        .await
        .unwrap();

    assert_eq!(fqdns(&result), vec!["www.example.com"]);
    assert_eq!(
        result.wildcard_addresses(),
        &BTreeSet::from(["198.51.100.9".parse::<IpAddr>().unwrap()])
    );
}

#[tokio::test]
async fn wildcard_answers_are_kept_when_filter_is_off() {
    let resolver = WildcardResolver {
        inner: StaticResolver::new(),
        wildcard: "198.51.100.9",
    };
    let scan_settings = ScanSettings {
        filter_wildcard: false,
        ..settings()
    };
    let scanner = SubdomainScanner::new(Arc::new(resolver), Arc::new(StaticProber::new()), scan_settings);

    let result = scanner
        .scan(&domain("example.com").unwrap(), &Wordlist::new(["www", "mail"]))
        .await
        .unwrap();

    assert_eq!(result.total_found(), 2);
    assert!(result.wildcard_addresses().is_empty());
}

#[tokio::test]
async fn progress_callback_counts_found_subdomains() {
    let (resolver, prober) = www_mail_ftp();
    let seen: Arc<AtomicUsize> = Arc::new(AtomicUsize::new(0));
    let seen_ref = seen.clone();
    let scanner = SubdomainScanner::new(Arc::new(resolver), Arc::new(prober), settings())
        .with_progress(Box::new(move |count| seen_ref.store(count, Ordering::Relaxed)));

    scanner
        .scan(&domain("example.com").unwrap(), &Wordlist::new(["www", "mail", "ftp"]))
        .await
        .unwrap();

    assert_eq!(seen.load(Ordering::Relaxed), 2);
}

#[tokio::test]
async fn scan_export_has_the_exchange_shape() {
    let (resolver, prober) = www_mail_ftp();
    let scanner = SubdomainScanner::new(Arc::new(resolver), Arc::new(prober), settings());
    let result = scanner
        .scan(&domain("example.com").unwrap(), &Wordlist::new(["www", "mail", "ftp"]))
        .await
        .unwrap();
    let tool = ToolInfo::new("sonar", "0.1.0");

    let json = serde_json::to_value(ScanExport::new(&result, &tool)).unwrap();

    assert_eq!(json["domain"], "example.com");
    assert_eq!(json["totalFound"], 2);
    assert_eq!(json["subdomains"][1]["subdomain"], "www.example.com");
    assert_eq!(json["subdomains"][1]["ip"], "93.184.216.34");
    assert_eq!(json["subdomains"][1]["status"], "active");
    assert_eq!(json["subdomains"][1]["services"], serde_json::json!(["HTTPS"]));
    assert_eq!(json["userAgent"], "sonar/0.1.0");
    assert!(json.get("truncated").is_none());
}

/// Answers every A query missing from `inner` with one fixed address.
struct WildcardResolver {
    inner: StaticResolver,
    wildcard: &'static str,
}

#[async_trait]
impl Resolver for WildcardResolver {
    async fn resolve(&self, domain: &Domain, record_type: RecordType) -> Result<Vec<DnsRecord>, QueryError> {
        match self.inner.resolve(domain, record_type).await {
            Err(QueryError::Nxdomain) if record_type == RecordType::A => {
                Ok(vec![DnsRecord::new(RecordType::A, self.wildcard, Some(60))])
            }
            other => other,
        }
    }
}
