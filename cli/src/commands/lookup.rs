use std::time::{Duration, Instant};

use colored::*;
use tracing::{info, warn};

use sonar_common::config::Config;
use sonar_common::export::LookupExport;
use sonar_common::network::domain::Domain;
use sonar_common::network::record::{DnsRecord, DnsResult, RecordType};

use crate::commands::{ExportTarget, tool_info};
use crate::mprint;
use crate::terminal::{colors, print, spinner};

type Detail = (String, ColoredString);

pub async fn lookup(domain: &Domain, cfg: &Config, export: &ExportTarget) -> anyhow::Result<()> {
    spinner::report_status(&format!(
        "Querying {} for {} record types...",
        domain.as_str().bold(),
        RecordType::ALL.len()
    ));

    let start_time: Instant = Instant::now();
    let outcome = sonar_core::lookup_all(domain, cfg).await;
    spinner::get_spinner().finish_and_clear();
    let result: DnsResult = outcome?;

    if result.truncated() {
        warn!("Deadline reached before every record type settled");
    }
    if !export.stdout {
        lookup_ends(&result, start_time.elapsed(), cfg);
    }
    export.write(&LookupExport::new(&result, &tool_info()))
}

fn lookup_ends(result: &DnsResult, total_time: Duration, cfg: &Config) {
    if result.total_records() == 0 {
        if shows_failure_rows(result, cfg.quiet) {
            print::header("dns records", cfg.quiet);
            print_record_trees(result);
        }
        print::header("zero records found", cfg.quiet);
        print::no_results();
        return;
    }

    if cfg.quiet > 0 {
        mprint!();
    }

    print::header("dns records", cfg.quiet);
    if cfg.quiet < 2 {
        print_record_trees(result);
    }
    print_summary(result, total_time, cfg);
}

/// An empty lookup still lists per-type failures so the reasons are visible.
fn shows_failure_rows(result: &DnsResult, q_level: u8) -> bool {
    q_level < 2 && !result.errors().is_empty()
}

fn print_record_trees(result: &DnsResult) {
    for (idx, record_type) in RecordType::ALL.into_iter().enumerate() {
        print::tree_head(idx, record_type.as_str());
        print::as_tree_one_level(record_details(result, record_type));
        if idx + 1 != RecordType::ALL.len() {
            mprint!();
        }
    }
}

fn record_details(result: &DnsResult, record_type: RecordType) -> Vec<Detail> {
    if let Some(error) = result.error_of(record_type) {
        return vec![("Error".to_string(), error.to_string().color(colors::FAILURE))];
    }

    let records: &[DnsRecord] = result.records_of(record_type);
    if records.is_empty() {
        return vec![("None".to_string(), "no records".dimmed())];
    }

    records.iter().map(record_to_detail).collect()
}

fn record_to_detail(record: &DnsRecord) -> Detail {
    let ttl: String = match record.ttl {
        Some(ttl) => format!("{ttl}s"),
        None => "-".to_string(),
    };
    let value: ColoredString = match record.record_type {
        RecordType::A => record.value.color(colors::IPV4_ADDR),
        RecordType::Aaaa => record.value.color(colors::IPV6_ADDR),
        _ => record.value.color(colors::TEXT_DEFAULT),
    };
    (ttl, value)
}

fn print_summary(result: &DnsResult, total_time: Duration, cfg: &Config) {
    let records: ColoredString = format!("{} records", result.total_records()).bold().green();
    let total_time: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();
    let output: ColoredString =
        format!("Lookup Complete: {records} resolved in {total_time}").color(colors::TEXT_DEFAULT);

    match cfg.quiet {
        0 => {
            print::fat_separator();
            print::centerln(&output.to_string());
        }
        _ => {
            mprint!();
            info!("{}", output)
        }
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
