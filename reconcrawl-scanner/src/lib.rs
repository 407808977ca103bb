pub mod config;
pub mod crawler;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod filter;
pub mod limiter;
pub mod orchestrator;
pub mod rate_gate;
pub mod result;

pub use config::CrawlConfig;
pub use crawler::{CrawlEvent, ProgressCallback, SiteCrawler};
pub use error::ScanError;
pub use extractor::{ExtractedPage, LinkExtractor};
pub use fetcher::{FetchFailure, FetchOutcome, PageFetcher};
pub use filter::{Rejection, UrlFilter};
pub use limiter::ConcurrencyLimiter;
pub use orchestrator::CrawlOrchestrator;
pub use rate_gate::RateGate;
pub use result::{CrawlReport, HostReport, SiteResult};
