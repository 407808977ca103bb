use crate::fetcher::FetchFailure;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A fetch that did not produce a page, with its cause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedFetch {
    pub url: String,
    pub reason: FetchFailure,
}

/// Everything one host's traversal has accumulated.
#[derive(Debug, Clone, Default)]
pub struct SiteResult {
    pub paths: BTreeSet<String>,
    pub parameters: BTreeSet<String>,
    pub pages_fetched: usize,
    pub pages_skipped: usize,
    pub failures: Vec<FailedFetch>,
    /// Neither seed scheme produced a response.
    pub unreachable: bool,
    pub cancelled: bool,
}

impl SiteResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty() && self.parameters.is_empty()
    }

    pub fn finalize(self) -> HostReport {
        HostReport {
            paths: self.paths.into_iter().collect(),
            parameters: self.parameters.into_iter().collect(),
        }
    }
}

/// Serialized per-host entry of a crawl report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostReport {
    pub paths: Vec<String>,
    pub parameters: Vec<String>,
}

/// host -> {paths, parameters}, ordered by host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CrawlReport {
    hosts: BTreeMap<String, HostReport>,
}

impl CrawlReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, host: String, report: HostReport) {
        self.hosts.insert(host, report);
    }

    pub fn get(&self, host: &str) -> Option<&HostReport> {
        self.hosts.get(host)
    }

    pub fn contains_host(&self, host: &str) -> bool {
        self.hosts.contains_key(host)
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &HostReport)> {
        self.hosts.iter()
    }

    pub fn total_paths(&self) -> usize {
        self.hosts.values().map(|r| r.paths.len()).sum()
    }

    pub fn total_parameters(&self) -> usize {
        self.hosts.values().map(|r| r.parameters.len()).sum()
    }
}
