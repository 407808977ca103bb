use crate::enumerate::SubdomainEnumerator;
use crate::live::{DEFAULT_LIVE_CONCURRENCY, DEFAULT_LIVE_REQUESTS_PER_SECOND, LiveChecker};
use crate::report::ScanReport;
use indicatif::{ProgressBar, ProgressStyle};
use reconcrawl_scanner::{CrawlConfig, CrawlEvent, CrawlOrchestrator, CrawlReport, ProgressCallback};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Options for crawling an already-known list of live hosts
pub struct CrawlOptions {
    pub hosts: Vec<String>,
    pub config: CrawlConfig,
    pub show_progress_bars: bool,
}

/// Options for a full enumerate -> probe -> crawl run
pub struct ReconOptions {
    pub enumerator: SubdomainEnumerator,
    pub crawl: CrawlConfig,
    pub live_concurrency: usize,
    pub live_requests_per_second: f64,
    pub live_timeout: Duration,
    pub show_progress_bars: bool,
}

impl ReconOptions {
    pub fn new(domain: &str, crawl: CrawlConfig) -> Result<Self, String> {
        Ok(Self {
            enumerator: SubdomainEnumerator::new(domain)?,
            live_timeout: crawl.timeout,
            crawl,
            live_concurrency: DEFAULT_LIVE_CONCURRENCY,
            live_requests_per_second: DEFAULT_LIVE_REQUESTS_PER_SECOND,
            show_progress_bars: true,
        })
    }
}

/// Callback for reporting pipeline stage messages
pub type ReconProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

fn spinner(show: bool, message: &str) -> Option<Arc<ProgressBar>> {
    if !show {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message.to_string());
    Some(Arc::new(pb))
}

/// Crawl the given hosts and return the per-host report.
pub async fn execute_crawl(
    options: CrawlOptions,
    token: CancellationToken,
) -> Result<CrawlReport, String> {
    let CrawlOptions {
        hosts,
        config,
        show_progress_bars,
    } = options;

    if hosts.is_empty() {
        return Err("No hosts provided".to_string());
    }

    let orchestrator =
        CrawlOrchestrator::new(config).map_err(|e| format!("Failed to start crawler: {}", e))?;

    let progress_bar = spinner(show_progress_bars, "Starting crawl...");
    let total_hosts = hosts.len();
    let requested = Arc::new(AtomicUsize::new(0));
    let finished = Arc::new(AtomicUsize::new(0));

    let orchestrator = match progress_bar.clone() {
        Some(pb) => {
            let requested = requested.clone();
            let finished = finished.clone();
            let callback: ProgressCallback = Arc::new(move |event: CrawlEvent| {
                match event {
                    CrawlEvent::Fetching { .. } => {
                        requested.fetch_add(1, Ordering::Relaxed);
                    }
                    CrawlEvent::HostFinished { .. } => {
                        finished.fetch_add(1, Ordering::Relaxed);
                    }
                }
                pb.set_message(format!(
                    "Crawling... {} URLs requested, {}/{} hosts done",
                    requested.load(Ordering::Relaxed),
                    finished.load(Ordering::Relaxed),
                    total_hosts
                ));
            });
            orchestrator.with_progress_callback(callback)
        }
        None => orchestrator,
    };

    let report = orchestrator
        .crawl_hosts_with_cancellation(&hosts, token)
        .await;

    if let Some(ref pb) = progress_bar {
        pb.finish_with_message(format!(
            "Crawl complete! {} URLs requested across {} hosts",
            requested.load(Ordering::Relaxed),
            report.len()
        ));
    }

    Ok(report)
}

/// Run the whole pipeline. Returns `Ok(None)` when there is nothing to
/// report: no subdomains, no live hosts, or cancellation during enumeration.
pub async fn execute_recon(
    options: ReconOptions,
    progress_callback: Option<ReconProgressCallback>,
    token: CancellationToken,
) -> Result<Option<ScanReport>, String> {
    let ReconOptions {
        enumerator,
        crawl,
        live_concurrency,
        live_requests_per_second,
        live_timeout,
        show_progress_bars,
    } = options;

    let notify = |msg: String| {
        if let Some(ref callback) = progress_callback {
            callback(msg);
        }
    };

    crawl
        .validate()
        .map_err(|e| format!("Invalid crawl settings: {}", e))?;
    let live_checker = LiveChecker::new(live_concurrency, live_requests_per_second, live_timeout)?;
    let domain = enumerator.domain().to_string();

    info!("Starting reconnaissance for {}", domain);
    notify(format!("Enumerating subdomains of {}", domain));

    let subdomains = tokio::select! {
        found = enumerator.enumerate() => found,
        _ = token.cancelled() => return Ok(None),
    };
    if subdomains.is_empty() {
        notify("No subdomains found.".to_string());
        return Ok(None);
    }
    notify(format!("Found {} subdomain(s)", subdomains.len()));
    for subdomain in &subdomains {
        notify(format!("  → {}", subdomain));
    }

    let probe_bar = spinner(show_progress_bars, "Checking which subdomains are live...");
    let live = tokio::select! {
        live = live_checker.check_alive(&subdomains) => Some(live),
        _ = token.cancelled() => None,
    };
    if let Some(ref pb) = probe_bar {
        pb.finish_and_clear();
    }
    let Some(live) = live else {
        return Ok(Some(ScanReport::new(
            &domain,
            subdomains,
            Vec::new(),
            CrawlReport::new(),
        )));
    };

    if live.is_empty() {
        notify("No live subdomains found.".to_string());
        return Ok(None);
    }
    notify(format!("Found {} live subdomain(s)", live.len()));
    for host in &live {
        notify(format!("  → {}", host));
    }

    notify("Crawling live subdomains for paths and parameters...".to_string());
    let crawl_results = execute_crawl(
        CrawlOptions {
            hosts: live.clone(),
            config: crawl,
            show_progress_bars,
        },
        token,
    )
    .await?;

    Ok(Some(ScanReport::new(&domain, subdomains, live, crawl_results)))
}
