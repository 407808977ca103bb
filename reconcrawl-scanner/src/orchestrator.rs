use crate::config::CrawlConfig;
use crate::crawler::{CrawlEvent, ProgressCallback, SiteCrawler};
use crate::error::{Result, ScanError};
use crate::fetcher::PageFetcher;
use crate::result::{CrawlReport, HostReport, SiteResult};
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Runs one [`SiteCrawler`] per host, all at once, and collects a report.
///
/// Hosts share the HTTP connection pool and nothing else. A host whose task
/// dies shows up in the report with empty sequences.
pub struct CrawlOrchestrator {
    config: CrawlConfig,
    fetcher: PageFetcher,
    progress_callback: Option<ProgressCallback>,
}

impl CrawlOrchestrator {
    pub fn new(config: CrawlConfig) -> Result<Self> {
        config.validate()?;
        let fetcher = PageFetcher::new(&config)?;
        Ok(Self {
            config,
            fetcher,
            progress_callback: None,
        })
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    pub async fn crawl_hosts(&self, hosts: &[String]) -> CrawlReport {
        self.crawl_hosts_with_cancellation(hosts, CancellationToken::new())
            .await
    }

    pub async fn crawl_hosts_with_cancellation(
        &self,
        hosts: &[String],
        token: CancellationToken,
    ) -> CrawlReport {
        let hosts = dedup_hosts(hosts);
        info!("Starting crawl of {} host(s)", hosts.len());

        let mut report = CrawlReport::new();
        let mut handles = Vec::new();

        for host in hosts {
            let crawler = match SiteCrawler::new(host.clone(), &self.config, self.fetcher.clone()) {
                Ok(crawler) => crawler,
                Err(e) => {
                    warn!("Could not start crawl of {}: {}", host, e);
                    report.insert(host, HostReport::default());
                    continue;
                }
            };
            let crawler = match self.progress_callback {
                Some(ref callback) => crawler.with_progress_callback(callback.clone()),
                None => crawler,
            };

            let token = token.child_token();
            let handle =
                tokio::spawn(async move { crawler.crawl_with_cancellation(&token).await });
            handles.push((host, handle));
        }

        for (host, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => {
                    let error = ScanError::from(e);
                    warn!("Crawl of {} failed: {}", host, error);
                    if let Some(ref callback) = self.progress_callback {
                        callback(CrawlEvent::HostFinished {
                            host: host.clone(),
                            paths: 0,
                            parameters: 0,
                        });
                    }
                    SiteResult::new()
                }
            };
            report.insert(host, result.finalize());
        }

        info!(
            "Crawl complete: {} host(s), {} paths, {} parameters",
            report.len(),
            report.total_paths(),
            report.total_parameters()
        );
        report
    }
}

/// Trims entries and drops blanks and repeats, keeping first-seen order.
fn dedup_hosts(hosts: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    hosts
        .iter()
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .filter(|h| seen.insert(h.clone()))
        .collect()
}
