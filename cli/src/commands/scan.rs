use std::net::IpAddr;
use std::time::{Duration, Instant};

use colored::*;
use tracing::{info, warn};

use sonar_common::config::Config;
use sonar_common::export::ScanExport;
use sonar_common::network::domain::Domain;
use sonar_common::network::subdomain::{SubdomainRecord, SubdomainResult, SubdomainStatus};

use crate::commands::{ExportTarget, tool_info};
use crate::mprint;
use crate::terminal::{colors, print, spinner};

type Detail = (String, ColoredString);

pub async fn scan(domain: &Domain, cfg: &Config, export: &ExportTarget) -> anyhow::Result<()> {
    spinner::report_status(&format!("Probing candidates under {}...", domain.as_str().bold()));

    let start_time: Instant = Instant::now();
    let outcome = sonar_core::scan(domain, cfg, Some(Box::new(spinner::report_scan_progress))).await;
    spinner::get_spinner().finish_and_clear();
    let result: SubdomainResult = outcome?;

    if !result.wildcard_addresses().is_empty() {
        let addresses: Vec<String> = result.wildcard_addresses().iter().map(IpAddr::to_string).collect();
        warn!("Wildcard DNS in place, ignored answers pointing to {}", addresses.join(", "));
    }
    if result.truncated() {
        warn!("Deadline reached, the candidate list was not fully examined");
    }
    if !export.stdout {
        scan_ends(&result, start_time.elapsed(), cfg);
    }
    export.write(&ScanExport::new(&result, &tool_info()))
}

fn scan_ends(result: &SubdomainResult, total_time: Duration, cfg: &Config) {
    if result.total_found() == 0 {
        print::header("zero subdomains found", cfg.quiet);
        print::no_results();
        return;
    }

    if cfg.quiet > 0 {
        mprint!();
    }

    print::header("subdomains", cfg.quiet);
    if cfg.quiet < 2 {
        for (idx, record) in result.subdomains().iter().enumerate() {
            print::tree_head(idx, record.fqdn.as_str());
            print::as_tree_one_level(subdomain_details(record));
            if idx + 1 != result.total_found() {
                mprint!();
            }
        }
    }
    print_summary(result, total_time, cfg);
}

fn subdomain_details(record: &SubdomainRecord) -> Vec<Detail> {
    let mut details: Vec<Detail> = Vec::new();

    if let Some(addr) = record.resolved_address {
        let color = match addr {
            IpAddr::V4(_) => colors::IPV4_ADDR,
            IpAddr::V6(_) => colors::IPV6_ADDR,
        };
        details.push(("Address".to_string(), addr.to_string().color(color)));
    }

    let status: ColoredString = match record.status {
        SubdomainStatus::Active => "active".green().bold(),
        SubdomainStatus::Inactive => "inactive".yellow(),
    };
    details.push(("Status".to_string(), status));

    let services: ColoredString = if record.services.is_empty() {
        "none".dimmed()
    } else {
        record
            .services
            .iter()
            .map(|service| format!("{service} ({})", service.port()))
            .collect::<Vec<String>>()
            .join(", ")
            .color(colors::SECONDARY)
    };
    details.push(("Services".to_string(), services));

    details
}

fn print_summary(result: &SubdomainResult, total_time: Duration, cfg: &Config) {
    let found: ColoredString = format!("{} subdomains", result.total_found()).bold().green();
    let active: ColoredString = format!("{} active", result.active_count()).bold().green();
    let total_time: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();
    let output: ColoredString =
        format!("Scan Complete: {found} ({active}) identified in {total_time}").color(colors::TEXT_DEFAULT);

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
