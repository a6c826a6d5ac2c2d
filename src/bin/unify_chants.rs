// Unify the extracted GregoBase CSVs into chants JSONL.

use clap::Parser;
use gregobase_extract::compress::compress_jsonl;
use gregobase_extract::logger;
use gregobase_extract::unify::{self, UnifyInputs, DEFAULT_CSV_DIR, DEFAULT_OUTPUT};
use log::debug;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Unify GregoBase CSVs into chants JSONL")]
struct Args {
    /// Output JSONL path.
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Directory holding the extracted CSVs.
    #[arg(long, default_value = DEFAULT_CSV_DIR)]
    csv_dir: PathBuf,

    /// Also gzip the output JSONL.
    #[arg(long)]
    gzip: bool,

    /// Remove uncompressed JSONL after gzip.
    #[arg(long)]
    rm: bool,

    /// Enable debug logging.
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();
    logger::init(args.debug);

    let inputs = UnifyInputs::from_csv_dir(&args.csv_dir);
    let summary = unify::unify(&inputs, &args.output)?;
    debug!(
        "main: {} chants, {} links ({} unresolved)",
        summary.chants, summary.links, summary.unresolved
    );
    println!("Wrote {}", args.output.display());

    if args.gzip {
        let gz = compress_jsonl(&args.output, !args.rm)?;
        println!("Wrote {}", gz.display());
    }
    Ok(())
}
