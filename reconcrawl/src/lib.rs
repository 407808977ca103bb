// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{load_hosts_from_file, load_hosts_from_source, parse_host_line};

// Re-export pipeline entry points from reconcrawl-core
pub use reconcrawl_core::crawl::{
    CrawlOptions, ReconOptions, ReconProgressCallback, execute_crawl, execute_recon,
};
