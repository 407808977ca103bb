// Scan report assembly, JSON output and console summary

use chrono::Local;
use reconcrawl_scanner::CrawlReport;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const SCAN_DATE_FORMAT: &str = "%Y%m%d_%H%M%S";
pub const DEFAULT_RESULTS_DIR: &str = "results";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub target_domain: String,
    pub scan_date: String,
    pub total_subdomains: usize,
    pub live_subdomains: usize,
    pub subdomains: Vec<String>,
    pub live_subdomains_list: Vec<String>,
    pub crawl_results: CrawlReport,
}

impl ScanReport {
    pub fn new(
        target_domain: &str,
        subdomains: Vec<String>,
        live_subdomains: Vec<String>,
        crawl_results: CrawlReport,
    ) -> Self {
        Self {
            target_domain: target_domain.to_string(),
            scan_date: Local::now().format(SCAN_DATE_FORMAT).to_string(),
            total_subdomains: subdomains.len(),
            live_subdomains: live_subdomains.len(),
            subdomains,
            live_subdomains_list: live_subdomains,
            crawl_results,
        }
    }

    pub fn with_scan_date(mut self, scan_date: &str) -> Self {
        self.scan_date = scan_date.to_string();
        self
    }

    pub fn file_name(&self) -> String {
        format!("scan_{}_{}.json", self.target_domain, self.scan_date)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Writes `report` as pretty JSON into `dir`, creating the directory when
/// needed, and returns the path of the new file.
pub fn write_report(dir: &Path, report: &ScanReport) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(report.file_name());

    let json = report.to_json().map_err(io::Error::other)?;
    let mut file = File::create(&path)?;
    file.write_all(json.as_bytes())?;
    file.write_all(b"\n")?;

    Ok(path)
}

/// Human-readable overview of a finished scan.
pub fn generate_summary(report: &ScanReport) -> String {
    let divider = "=".repeat(50);
    let mut summary = String::new();

    summary.push_str(&divider);
    summary.push('\n');
    summary.push_str(&format!("Target Domain: {}\n", report.target_domain));
    summary.push_str(&format!("Total Subdomains: {}\n", report.total_subdomains));
    summary.push_str(&format!("Live Subdomains: {}\n", report.live_subdomains));
    summary.push_str("\nCrawling Results:\n");
    summary.push_str(&generate_crawl_summary(&report.crawl_results));
    summary.push_str(&divider);
    summary.push('\n');

    summary
}

/// Per-host counts of a crawl report, one block per host.
pub fn generate_crawl_summary(results: &CrawlReport) -> String {
    let mut summary = String::new();
    for (host, entry) in results.iter() {
        summary.push_str(&format!("\n{}:\n", host));
        summary.push_str(&format!("  Paths found: {}\n", entry.paths.len()));
        summary.push_str(&format!("  Parameters found: {}\n", entry.parameters.len()));
    }
    summary
}
