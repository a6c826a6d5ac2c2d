// Extract selected GregoBase tables from a phpMyAdmin/MySQL dump into CSV files.

use clap::Parser;
use gregobase_extract::extract::{self, ExtractOptions, DEFAULT_INPUT, DEFAULT_OUTDIR, DEFAULT_TABLES};
use gregobase_extract::logger;
use gregobase_extract::progress::{self, ProgressManager};
use log::debug;
use std::path::PathBuf;
use std::time::Instant;

// Command-line flags.
#[derive(Parser, Debug)]
#[command(author, version, about = "Extract GregoBase tables to CSV")]
struct Args {
    /// Path to SQL dump.
    #[arg(short, long, default_value = DEFAULT_INPUT)]
    input: PathBuf,

    /// Output directory for CSVs.
    #[arg(short, long, default_value = DEFAULT_OUTDIR)]
    outdir: PathBuf,

    /// Table name to extract (repeat for multiple).
    /// Default: gregobase_chants, gregobase_sources, gregobase_chant_sources.
    #[arg(short, long = "table", value_name = "TABLE")]
    tables: Vec<String>,

    /// Fail on INSERT statements that cannot be parsed instead of skipping them.
    #[arg(long)]
    strict: bool,

    /// Enable debug logging (disables progress bars).
    #[arg(long)]
    debug: bool,

    /// Disable progress bars.
    #[arg(long)]
    no_progress: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();
    logger::init(args.debug);

    let tables: Vec<String> = if args.tables.is_empty() {
        DEFAULT_TABLES.iter().map(|t| t.to_string()).collect()
    } else {
        args.tables
    };
    debug!("main: Input {}", args.input.display());
    debug!("main: Tables {}", tables.join(", "));

    // Progress bars are disabled in debug mode to avoid mangled output.
    let progress = ProgressManager::new(!args.debug && !args.no_progress);
    debug!("main: Progress bars {}", if progress.is_enabled() { "on" } else { "off" });
    let options = ExtractOptions {
        strict: args.strict,
    };

    for table in &tables {
        let start = Instant::now();
        let bar = progress.table_bar(&args.input, table);
        let result = extract::extract_table(&args.input, &args.outdir, table, options, bar.as_ref())?;
        progress::finish_table(bar.as_ref(), result.rows_written);
        debug!(
            "main: {} rows from {} statements ({} skipped) in {:?}",
            result.rows_written,
            result.statements,
            result.skipped,
            start.elapsed()
        );
        println!("Wrote: {}", result.path.display());
    }
    Ok(())
}
