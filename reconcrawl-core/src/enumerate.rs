// Subdomain discovery from public sources

use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const CRTSH_BASE: &str = "https://crt.sh";
pub const VIRUSTOTAL_BASE: &str = "https://www.virustotal.com";
pub const SHODAN_BASE: &str = "https://api.shodan.io";

pub const VIRUSTOTAL_KEY_VAR: &str = "VIRUSTOTAL_API_KEY";
pub const SHODAN_KEY_VAR: &str = "SHODAN_API_KEY";

/// Prefixes tried by the DNS brute force.
pub const DNS_WORDLIST: &[&str] = &[
    "www", "mail", "ftp", "admin", "blog", "dev", "test", "staging", "api", "portal", "vpn", "cdn",
    "shop", "store", "app",
];

#[derive(Debug, Deserialize)]
pub struct CrtShEntry {
    pub name_value: String,
}

#[derive(Debug, Deserialize)]
struct VirusTotalResponse {
    #[serde(default)]
    data: Vec<VirusTotalItem>,
}

#[derive(Debug, Deserialize)]
struct VirusTotalItem {
    id: String,
}

/// On-disk key file, using the same names as the environment variables.
#[derive(Debug, Default, Deserialize)]
struct KeysFile {
    #[serde(rename = "VIRUSTOTAL_API_KEY", default)]
    virustotal: Option<String>,
    #[serde(rename = "SHODAN_API_KEY", default)]
    shodan: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ShodanResponse {
    #[serde(default)]
    subdomains: Vec<String>,
}

/// API credentials for the optional sources; a missing key skips the source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiKeys {
    pub virustotal: Option<String>,
    pub shodan: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ApiKeys {
    pub fn from_env() -> Self {
        let read = |var: &str| non_blank(std::env::var(var).ok());
        Self {
            virustotal: read(VIRUSTOTAL_KEY_VAR),
            shodan: read(SHODAN_KEY_VAR),
        }
    }

    /// Reads a JSON object such as `{"VIRUSTOTAL_API_KEY": "..."}`.
    /// Absent or blank entries leave that source disabled.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read keys file {}: {}", path.display(), e))?;
        let file: KeysFile = serde_json::from_str(&content)
            .map_err(|e| format!("Invalid keys file {}: {}", path.display(), e))?;

        Ok(Self {
            virustotal: non_blank(file.virustotal),
            shodan: non_blank(file.shodan),
        })
    }

    /// The keys file when one is given and readable, the environment otherwise.
    pub fn load(path: Option<&Path>) -> Self {
        match path.map(Self::from_file) {
            Some(Ok(keys)) => keys,
            Some(Err(e)) => {
                warn!("{}, falling back to environment", e);
                Self::from_env()
            }
            None => Self::from_env(),
        }
    }
}

pub struct SubdomainEnumerator {
    domain: String,
    client: Client,
    keys: ApiKeys,
    crtsh_base: String,
    virustotal_base: String,
    shodan_base: String,
    dns_wordlist: Vec<String>,
}

impl SubdomainEnumerator {
    pub fn new(domain: &str) -> Result<Self, String> {
        let domain = domain.trim().trim_end_matches('.').to_lowercase();
        if domain.is_empty() {
            return Err("Target domain must not be empty".to_string());
        }

        let client = Client::builder()
            .user_agent(format!("reconcrawl/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            domain,
            client,
            keys: ApiKeys::from_env(),
            crtsh_base: CRTSH_BASE.to_string(),
            virustotal_base: VIRUSTOTAL_BASE.to_string(),
            shodan_base: SHODAN_BASE.to_string(),
            dns_wordlist: DNS_WORDLIST.iter().map(|w| w.to_string()).collect(),
        })
    }

    pub fn with_api_keys(mut self, keys: ApiKeys) -> Self {
        self.keys = keys;
        self
    }

    pub fn with_crtsh_base(mut self, base: &str) -> Self {
        self.crtsh_base = base.trim_end_matches('/').to_string();
        self
    }

    pub fn with_virustotal_base(mut self, base: &str) -> Self {
        self.virustotal_base = base.trim_end_matches('/').to_string();
        self
    }

    pub fn with_shodan_base(mut self, base: &str) -> Self {
        self.shodan_base = base.trim_end_matches('/').to_string();
        self
    }

    pub fn with_dns_wordlist(mut self, words: Vec<String>) -> Self {
        self.dns_wordlist = words;
        self
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Queries every source concurrently. Sources that fail contribute nothing.
    pub async fn enumerate(&self) -> Vec<String> {
        info!("Enumerating subdomains of {}", self.domain);

        let (crtsh, virustotal, shodan, dns) = tokio::join!(
            self.search_crtsh(),
            self.search_virustotal(),
            self.search_shodan(),
            self.bruteforce_dns(),
        );

        let mut found = BTreeSet::new();
        for (source, result) in [
            ("crt.sh", crtsh),
            ("VirusTotal", virustotal),
            ("Shodan", shodan),
            ("DNS brute force", dns),
        ] {
            match result {
                Ok(names) => {
                    info!("{} returned {} subdomain(s)", source, names.len());
                    found.extend(names);
                }
                Err(e) => warn!("{} lookup failed: {}", source, e),
            }
        }

        found.into_iter().collect()
    }

    pub async fn search_crtsh(&self) -> Result<Vec<String>, String> {
        let url = format!("{}/?q=%25.{}&output=json", self.crtsh_base, self.domain);
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("unexpected status {}", response.status()));
        }

        let entries: Vec<CrtShEntry> = response
            .json()
            .await
            .map_err(|e| format!("invalid JSON: {}", e))?;

        Ok(parse_crtsh_entries(&entries, &self.domain))
    }

    pub async fn search_virustotal(&self) -> Result<Vec<String>, String> {
        let Some(ref key) = self.keys.virustotal else {
            debug!("{} not set, skipping VirusTotal", VIRUSTOTAL_KEY_VAR);
            return Ok(Vec::new());
        };

        let url = format!(
            "{}/api/v3/domains/{}/subdomains",
            self.virustotal_base, self.domain
        );
        let response = self
            .client
            .get(&url)
            .header("x-apikey", key)
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("unexpected status {}", response.status()));
        }

        let body: VirusTotalResponse = response
            .json()
            .await
            .map_err(|e| format!("invalid JSON: {}", e))?;

        Ok(body
            .data
            .into_iter()
            .map(|item| item.id.to_lowercase())
            .filter(|name| in_domain(name, &self.domain))
            .collect())
    }

    pub async fn search_shodan(&self) -> Result<Vec<String>, String> {
        let Some(ref key) = self.keys.shodan else {
            debug!("{} not set, skipping Shodan", SHODAN_KEY_VAR);
            return Ok(Vec::new());
        };

        let url = format!("{}/dns/domain/{}", self.shodan_base, self.domain);
        let response = self
            .client
            .get(&url)
            .query(&[("key", key.as_str())])
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("unexpected status {}", response.status()));
        }

        let body: ShodanResponse = response
            .json()
            .await
            .map_err(|e| format!("invalid JSON: {}", e))?;

        Ok(body
            .subdomains
            .into_iter()
            .map(|label| label.trim().to_lowercase())
            .filter(|label| !label.is_empty())
            .map(|label| format!("{}.{}", label, self.domain))
            .collect())
    }

    pub async fn bruteforce_dns(&self) -> Result<Vec<String>, String> {
        let lookups = self.dns_wordlist.iter().map(|word| {
            let candidate = format!("{}.{}", word, self.domain);
            async move {
                let resolved = tokio::net::lookup_host((candidate.as_str(), 80))
                    .await
                    .map(|mut addrs| addrs.next().is_some())
                    .unwrap_or(false);
                if resolved {
                    debug!("Resolved {}", candidate);
                    Some(candidate)
                } else {
                    None
                }
            }
        });

        Ok(futures::future::join_all(lookups)
            .await
            .into_iter()
            .flatten()
            .collect())
    }
}

/// Flattens crt.sh rows: one row may carry several newline-separated names,
/// and wildcard entries are reduced to their base name.
pub fn parse_crtsh_entries(entries: &[CrtShEntry], domain: &str) -> Vec<String> {
    let mut names = BTreeSet::new();
    for entry in entries {
        for name in entry.name_value.split('\n') {
            let name = name.trim().trim_start_matches("*.").to_lowercase();
            if !name.is_empty() && in_domain(&name, domain) {
                names.insert(name);
            }
        }
    }
    names.into_iter().collect()
}

fn in_domain(name: &str, domain: &str) -> bool {
    name == domain || name.ends_with(&format!(".{}", domain))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(value: &str) -> CrtShEntry {
        CrtShEntry {
            name_value: value.to_string(),
        }
    }

    #[test]
    fn test_parse_crtsh_entries() {
        let entries = vec![
            entry("www.example.com"),
            entry("*.example.com\nmail.example.com"),
            entry("API.Example.com"),
            entry("www.example.com"),
            entry("example.org"),
            entry("badexample.com"),
            entry(""),
        ];

        assert_eq!(
            parse_crtsh_entries(&entries, "example.com"),
            vec![
                "api.example.com",
                "example.com",
                "mail.example.com",
                "www.example.com"
            ]
        );
    }

    #[test]
    fn test_domain_is_normalized() {
        let enumerator = SubdomainEnumerator::new(" Example.COM. ").unwrap();
        assert_eq!(enumerator.domain(), "example.com");
        assert!(SubdomainEnumerator::new("  . ").is_err());
    }

    #[tokio::test]
    async fn test_keyless_sources_are_skipped() {
        let enumerator = SubdomainEnumerator::new("example.com")
            .unwrap()
            .with_api_keys(ApiKeys::default());
        assert_eq!(enumerator.search_virustotal().await, Ok(Vec::new()));
        assert_eq!(enumerator.search_shodan().await, Ok(Vec::new()));
    }
}
