use colored::Colorize;
use sitemapper::handlers::{exit_code, handle_generate, init_tracing, shutdown_signal};
use sitemapper::command_argument_builder;
use sitemapper_core::print_banner;

#[tokio::main]
async fn main() {
    let matches = command_argument_builder().get_matches();
    let quiet = matches.get_flag("quiet");

    init_tracing(matches.get_count("verbose"));

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    if let Err(e) = handle_generate(&matches, shutdown_signal()).await {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(exit_code(&e));
    }
}
