use crate::CLAP_STYLING;
use clap::{arg, command};

/// Tunables shared by `scan` and `crawl`.
fn crawl_tuning_args(cmd: clap::Command) -> clap::Command {
    cmd.arg(
        arg!(-c --"max-concurrent" <NUM>)
            .required(false)
            .help("Maximum in-flight requests per host")
            .value_parser(clap::value_parser!(usize))
            .default_value("20"),
    )
    .arg(
        arg!(-r --"rps" <RATE>)
            .required(false)
            .help("Maximum requests per second per host")
            .value_parser(clap::value_parser!(f64))
            .default_value("10"),
    )
    .arg(
        arg!(--"max-depth" <DEPTH>)
            .required(false)
            .help("Crawl depth limit; 1 fetches only the seed pages")
            .value_parser(clap::value_parser!(usize))
            .default_value("2"),
    )
    .arg(
        arg!(--"timeout" <SECONDS>)
            .required(false)
            .help("Request timeout in seconds")
            .value_parser(clap::value_parser!(u64))
            .default_value("10"),
    )
}

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("reconcrawl")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("reconcrawl")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(crawl_tuning_args(
            command!("scan")
                .about(
                    "Enumerate subdomains of a domain, probe which are live and crawl them for \
                paths and parameters.",
                )
                .arg(
                    arg!(-d --"domain" <DOMAIN>)
                        .required(true)
                        .help("The target domain, e.g. example.com"),
                )
                .arg(
                    arg!(-k --"keys-file" <PATH>)
                        .required(false)
                        .help(
                            "JSON file with VIRUSTOTAL_API_KEY / SHODAN_API_KEY \
                        (default: read them from the environment)",
                        )
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-o --"output-dir" <PATH>)
                        .required(false)
                        .help("Directory the JSON report is written to")
                        .default_value("results"),
                ),
        ))
        .subcommand(crawl_tuning_args(
            command!("crawl")
                .about("Crawl known hosts for paths and parameters, skipping enumeration.")
                .arg(
                    arg!(-t --"target" <HOST>)
                        .required(false)
                        .help("A host to crawl; may be repeated")
                        .action(clap::ArgAction::Append)
                        .conflicts_with("hosts-file"),
                )
                .arg(
                    arg!(-H --"hosts-file" <PATH>)
                        .required(false)
                        .help("Path to a newline-delimited file of hosts to crawl")
                        .value_parser(clap::value_parser!(std::path::PathBuf))
                        .conflicts_with("target"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save the JSON crawl report to file (default: print summary)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                ),
        ))
}
