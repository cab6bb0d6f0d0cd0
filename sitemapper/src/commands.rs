use clap::builder::RangedU64ValueParser;
use clap::{ArgAction, arg};

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("sitemapper")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("sitemapper")
        .about("Crawl a website from a seed URL and write its sitemap.xml")
        .styles(CLAP_STYLING)
        .arg(
            arg!(<URL>)
                .help("The seed URL; only pages on the same host and port are crawled"),
        )
        .arg(
            arg!(-o --"output" <PATH>)
                .required(false)
                .help("Where to write the sitemap ('-' for stdout)")
                .default_value("sitemap.xml"),
        )
        .arg(
            arg!(-t --"threads" <NUM_WORKERS>)
                .required(false)
                .help("The number of async worker 'threads' in the worker pool.")
                .value_parser(RangedU64ValueParser::<usize>::new().range(1..))
                .default_value("10"),
        )
        .arg(
            arg!(--"timeout" <SECONDS>)
                .required(false)
                .help("Per-request timeout in seconds")
                .value_parser(clap::value_parser!(u64).range(1..))
                .default_value("5"),
        )
        .arg(
            arg!(--"max-duration" <SECONDS>)
                .required(false)
                .help("Stop the crawl after this many seconds and write what was found")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            arg!(--"max-frontier" <NUM_URLS>)
                .required(false)
                .help("Maximum number of queued URLs; further discoveries are dropped")
                .value_parser(RangedU64ValueParser::<usize>::new().range(1..)),
        )
        .arg(
            arg!(-f --"format" <FORMAT>)
                .required(false)
                .help("Crawl report format: text, json")
                .value_parser(["text", "json"])
                .default_value("text"),
        )
        .arg(
            arg!(-q --"quiet" "Suppress banner, progress and the crawl report")
                .required(false),
        )
        .arg(
            arg!(-v --"verbose" "Increase log verbosity (-v info, -vv debug, -vvv trace)")
                .required(false)
                .action(ArgAction::Count),
        )
}
