use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;
use reconcrawl_core::enumerate::ApiKeys;
use reconcrawl_core::report::{DEFAULT_RESULTS_DIR, generate_crawl_summary};
use reconcrawl_core::{
    CrawlOptions, ReconOptions, ReconProgressCallback, execute_crawl, execute_recon,
    generate_summary, write_report,
};
use reconcrawl_scanner::CrawlConfig;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use url::Url;

/// Install the stderr log subscriber. `RUST_LOG` overrides the `warn` default.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

// Helper functions for crawl handler

/// Load hosts from either a file or the `--target` arguments
pub fn load_hosts_from_source(
    targets: Option<&[String]>,
    hosts_file: Option<&PathBuf>,
) -> Result<Vec<String>, String> {
    if let Some(hosts_file_path) = hosts_file {
        load_hosts_from_file(hosts_file_path)
    } else if let Some(targets) = targets {
        let hosts: Vec<String> = targets.iter().filter_map(|t| parse_host_line(t)).collect();
        if hosts.is_empty() {
            return Err("No valid hosts given".to_string());
        }
        Ok(hosts)
    } else {
        Err("Either --target or --hosts-file must be provided".to_string())
    }
}

/// Load and parse hosts from a file, one per line. `#` starts a comment line.
pub fn load_hosts_from_file(path: &Path) -> Result<Vec<String>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read hosts file {}: {}", path.display(), e))?;

    let hosts: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(parse_host_line)
        .collect();

    if hosts.is_empty() {
        return Err(format!("No valid hosts found in {}", path.display()));
    }

    Ok(hosts)
}

/// Reduce a line to `host[:port]`, dropping any scheme, path, query or
/// credentials.
pub fn parse_host_line(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let with_scheme = if line.contains("://") {
        line.to_string()
    } else {
        format!("http://{}", line)
    };

    let parsed = match Url::parse(&with_scheme) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => url,
        _ => {
            eprintln!("{} Skipping invalid host '{}'", "⚠".yellow(), line);
            return None;
        }
    };

    let host = parsed.host_str()?.to_lowercase();
    // An explicit port survives only when it differs from the scheme default
    Some(match parsed.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

/// Map the shared tuning flags onto a crawl configuration.
pub fn crawl_config_from_args(args: &ArgMatches) -> CrawlConfig {
    let mut config = CrawlConfig::new();
    if let Some(max_concurrent) = args.get_one::<usize>("max-concurrent") {
        config = config.with_max_concurrent_requests(*max_concurrent);
    }
    if let Some(rps) = args.get_one::<f64>("rps") {
        config = config.with_requests_per_second(*rps);
    }
    if let Some(max_depth) = args.get_one::<usize>("max-depth") {
        config = config.with_max_depth(*max_depth);
    }
    if let Some(timeout) = args.get_one::<u64>("timeout") {
        config = config.with_timeout_secs(*timeout);
    }
    config
}

/// Expand `~` in the report directory.
pub fn resolve_output_dir(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

fn print_divider() {
    println!("{}", "=".repeat(50).bright_blue());
}

fn print_crawl_settings(config: &CrawlConfig) {
    println!("Max concurrent requests: {}", config.max_concurrent_requests);
    println!("Requests per second: {}", config.requests_per_second);
    println!("Max depth: {}", config.max_depth);
    println!("Timeout: {}s\n", config.timeout.as_secs());
}

pub async fn handle_scan(args: &ArgMatches, quiet: bool, token: CancellationToken) -> Result<()> {
    let domain = args
        .get_one::<String>("domain")
        .context("--domain is required")?;
    let output_dir = resolve_output_dir(
        args.get_one::<String>("output-dir")
            .map(String::as_str)
            .unwrap_or(DEFAULT_RESULTS_DIR),
    );
    let config = crawl_config_from_args(args);
    debug!("Scan settings: {:?}", config);

    let keys = ApiKeys::load(args.get_one::<PathBuf>("keys-file").map(PathBuf::as_path));

    let mut options = ReconOptions::new(domain, config).map_err(anyhow::Error::msg)?;
    options.enumerator = options.enumerator.with_api_keys(keys);
    options.show_progress_bars = !quiet;

    if !quiet {
        println!("\n{} Scanning {}", "🔎".bold(), options.enumerator.domain().bright_white());
        print_crawl_settings(&options.crawl);
    }

    let progress_callback: Option<ReconProgressCallback> = if quiet {
        None
    } else {
        Some(Arc::new(|msg: String| println!("{}", msg)))
    };

    let report = execute_recon(options, progress_callback, token.clone())
        .await
        .map_err(|e| anyhow::anyhow!("Scan failed: {}", e))?;

    let Some(report) = report else {
        if token.is_cancelled() {
            println!("{} Scan interrupted by user", "!".yellow().bold());
        }
        return Ok(());
    };

    if token.is_cancelled() {
        println!(
            "{} Scan interrupted by user, saving partial results",
            "!".yellow().bold()
        );
    }

    let path = write_report(&output_dir, &report)
        .with_context(|| format!("Failed to write report to {}", output_dir.display()))?;
    info!("Report written to {}", path.display());

    println!(
        "\n{} Results saved to: {}",
        "✓".green().bold(),
        path.display().to_string().bright_white()
    );
    println!("\n{} Scan Summary:", "✓".green().bold());
    print!("{}", generate_summary(&report));

    Ok(())
}

pub async fn handle_crawl(args: &ArgMatches, quiet: bool, token: CancellationToken) -> Result<()> {
    let targets: Option<Vec<String>> = args
        .get_many::<String>("target")
        .map(|values| values.cloned().collect());
    let hosts_file = args.get_one::<PathBuf>("hosts-file");

    let hosts =
        load_hosts_from_source(targets.as_deref(), hosts_file).map_err(anyhow::Error::msg)?;
    let config = crawl_config_from_args(args);
    debug!("Crawl settings: {:?}", config);

    if !quiet {
        println!("\n🕷️  Crawling {} host(s)", hosts.len());
        print_crawl_settings(&config);
    }

    let options = CrawlOptions {
        hosts,
        config,
        show_progress_bars: !quiet,
    };

    let report = execute_crawl(options, token.clone())
        .await
        .map_err(|e| anyhow::anyhow!("Crawl failed: {}", e))?;

    if token.is_cancelled() {
        println!("{} Crawl interrupted, results are partial", "!".yellow().bold());
    }

    if let Some(output) = args.get_one::<PathBuf>("output") {
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(output, json + "\n")
            .with_context(|| format!("Failed to write report to {}", output.display()))?;
        println!(
            "{} Report saved to: {}",
            "✓".green().bold(),
            output.display().to_string().bright_white()
        );
    }

    print_divider();
    println!("Crawling Results:");
    print!("{}", generate_crawl_summary(&report));
    print_divider();

    Ok(())
}
