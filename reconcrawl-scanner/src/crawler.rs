use crate::config::CrawlConfig;
use crate::error::{Result, ScanError};
use crate::extractor::{LinkExtractor, query_parameter_names};
use crate::fetcher::{FetchOutcome, PageFetcher};
use crate::filter::UrlFilter;
use crate::limiter::ConcurrencyLimiter;
use crate::rate_gate::RateGate;
use crate::result::{FailedFetch, SiteResult};
use futures::future::{BoxFuture, FutureExt, join_all};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlEvent {
    /// A request for `url` is being dispatched.
    Fetching { host: String, url: String },
    /// A host's traversal is over.
    HostFinished {
        host: String,
        paths: usize,
        parameters: usize,
    },
}

pub type ProgressCallback = Arc<dyn Fn(CrawlEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitOutcome {
    Pruned,
    Skipped,
    Failed,
    Fetched,
}

/// Traverses one host's link graph.
///
/// Every piece of mutable crawl state (visited set, rate gate, limiter,
/// accumulated result) lives on the instance, so instances for different
/// hosts never contend with each other.
pub struct SiteCrawler {
    host: String,
    max_depth: usize,
    fetcher: PageFetcher,
    visited: Mutex<HashSet<String>>,
    gate: RateGate,
    limiter: ConcurrencyLimiter,
    result: Mutex<SiteResult>,
    progress_callback: Option<ProgressCallback>,
}

impl SiteCrawler {
    pub fn new(host: impl Into<String>, config: &CrawlConfig, fetcher: PageFetcher) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            host: host.into(),
            max_depth: config.max_depth,
            fetcher,
            visited: Mutex::new(HashSet::new()),
            gate: RateGate::new(config.rate_interval()),
            limiter: ConcurrencyLimiter::new(config.max_concurrent_requests),
            result: Mutex::new(SiteResult::new()),
            progress_callback: None,
        })
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// HTTPS first, then plain HTTP.
    pub fn seed_urls(&self) -> [String; 2] {
        [
            format!("https://{}", self.host),
            format!("http://{}", self.host),
        ]
    }

    pub async fn crawl(&self) -> SiteResult {
        info!("Crawling {} (max depth {})", self.host, self.max_depth);
        self.run_seeds().await;
        self.finish(false).await
    }

    /// Like [`crawl`](Self::crawl), but stops as soon as `token` fires and
    /// returns whatever was gathered up to that point.
    pub async fn crawl_with_cancellation(&self, token: &CancellationToken) -> SiteResult {
        info!("Crawling {} (max depth {})", self.host, self.max_depth);
        let cancelled = tokio::select! {
            _ = self.run_seeds() => false,
            _ = token.cancelled() => true,
        };
        if cancelled {
            warn!("Crawl of {} cancelled, keeping partial results", self.host);
        }
        self.finish(cancelled).await
    }

    pub async fn visited_count(&self) -> usize {
        self.visited.lock().await.len()
    }

    pub fn available_slots(&self) -> usize {
        self.limiter.available()
    }

    async fn run_seeds(&self) {
        let mut reached = false;
        for seed in self.seed_urls() {
            match self.visit(seed, 0).await {
                VisitOutcome::Fetched | VisitOutcome::Skipped => reached = true,
                VisitOutcome::Failed | VisitOutcome::Pruned => {}
            }
        }

        if !reached {
            warn!("{}", ScanError::HostUnreachable(self.host.clone()));
            self.result.lock().await.unreachable = true;
        }
    }

    async fn finish(&self, cancelled: bool) -> SiteResult {
        let mut result = std::mem::take(&mut *self.result.lock().await);
        result.cancelled = cancelled;

        info!(
            "Finished {}: {} pages, {} paths, {} parameters",
            self.host,
            result.pages_fetched,
            result.paths.len(),
            result.parameters.len()
        );
        if let Some(ref callback) = self.progress_callback {
            callback(CrawlEvent::HostFinished {
                host: self.host.clone(),
                paths: result.paths.len(),
                parameters: result.parameters.len(),
            });
        }
        result
    }

    /// Claims `url` for this crawl. Check and insert happen under one lock,
    /// so two branches can never both win the same URL.
    async fn claim(&self, url: &str) -> bool {
        self.visited.lock().await.insert(url.to_string())
    }

    fn visit(&self, url: String, depth: usize) -> BoxFuture<'_, VisitOutcome> {
        async move {
            if depth >= self.max_depth {
                return VisitOutcome::Pruned;
            }

            if let Err(rejection) = UrlFilter::check(&url, &self.host) {
                debug!("Not following {}: {:?}", url, rejection);
                return VisitOutcome::Pruned;
            }

            let Some(url) = normalize(&url) else {
                return VisitOutcome::Pruned;
            };

            if !self.claim(&url).await {
                return VisitOutcome::Pruned;
            }

            self.gate.wait().await;

            if let Some(ref callback) = self.progress_callback {
                callback(CrawlEvent::Fetching {
                    host: self.host.clone(),
                    url: url.clone(),
                });
            }

            let outcome = {
                let _permit = match self.limiter.acquire().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        warn!("{}", e);
                        return VisitOutcome::Failed;
                    }
                };
                self.fetcher.fetch(&url).await
            };

            let body = match outcome {
                FetchOutcome::Success { body, .. } => body,
                FetchOutcome::Skipped { .. } => {
                    self.result.lock().await.pages_skipped += 1;
                    return VisitOutcome::Skipped;
                }
                FetchOutcome::Failure { reason } => {
                    debug!("{}", reason.clone().into_error(&url));
                    self.result.lock().await.failures.push(FailedFetch {
                        url: url.clone(),
                        reason,
                    });
                    return VisitOutcome::Failed;
                }
            };

            let page = LinkExtractor::extract(&url, &body);

            {
                let mut result = self.result.lock().await;
                result.pages_fetched += 1;
                if let Some(path) = url_path(&url) {
                    result.paths.insert(path);
                }
                result.parameters.extend(query_parameter_names(&url));
                result.parameters.extend(page.parameters);
            }

            if depth + 1 < self.max_depth {
                let next: Vec<String> = {
                    let visited = self.visited.lock().await;
                    page.links
                        .into_iter()
                        .filter(|link| !visited.contains(link))
                        .filter(|link| UrlFilter::is_valid(link, &self.host))
                        .collect()
                };

                debug!("{} -> {} links at depth {}", url, next.len(), depth + 1);
                join_all(next.into_iter().map(|link| self.visit(link, depth + 1))).await;
            }

            VisitOutcome::Fetched
        }
        .boxed()
    }
}

/// Canonical form used as the visited-set key: parsed, fragment dropped.
fn normalize(url: &str) -> Option<String> {
    let mut parsed = Url::parse(url).ok()?;
    parsed.set_fragment(None);
    Some(parsed.to_string())
}

/// Path component of a URL, query and fragment stripped.
pub fn url_path(url: &str) -> Option<String> {
    Url::parse(url).ok().map(|u| u.path().to_string())
}
