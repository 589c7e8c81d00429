//! cssense - caret-aware CSS completion
//!
//! Command-line front end for the completion engine. Reads a stylesheet
//! from a file or stdin and prints JSON.
//!
//! # Usage
//!
//! ```bash
//! # Candidates at the end of the file
//! cssense complete style.css
//!
//! # State and span at line 3, column 8
//! cssense state style.css --line 3 --column 8
//! cssense info style.css --line 3 --column 8
//! ```

use cssense::cli::CliInterface;
use cssense::error::Result;

/// Application entry point
#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Main application logic
///
/// 1. Parse command-line arguments
/// 2. Load configuration
/// 3. Initialize logging
/// 4. Run the subcommand
async fn run() -> Result<()> {
    let cli = CliInterface::new()?;

    initialize_logging(&cli);

    cli.run().await
}

/// Initialize logging system based on verbosity level
///
/// Logs go to stderr; stdout carries the JSON output.
fn initialize_logging(cli: &CliInterface) {
    let level = cli.config().logging.level.to_tracing_level();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr);

    if cli.config().logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
