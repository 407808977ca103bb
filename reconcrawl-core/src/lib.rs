use colored::Colorize;

pub mod crawl;
pub mod enumerate;
pub mod live;
pub mod report;

pub use crawl::{CrawlOptions, ReconOptions, ReconProgressCallback, execute_crawl, execute_recon};
pub use report::{ScanReport, generate_summary, write_report};

const BANNER: &str = r#"
  ____  ___  ___ ___  _ __   ___ _ __ __ ___      _| |
 |  __|/ _ \/ __/ _ \| '_ \ / __| '__/ _` \ \ /\ / / |
 | |  |  __/ (_| (_) | | | | (__| | | (_| |\ V  V /| |
 |_|   \___|\___\___/|_| |_|\___|_|  \__,_| \_/\_/ |_|
"#;

pub fn print_banner() {
    println!("{}", BANNER.bright_cyan().bold());
    println!(
        "  {} {}",
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_white(),
        "subdomain recon & crawler - for authorized testing only".dimmed()
    );
    println!();
}
