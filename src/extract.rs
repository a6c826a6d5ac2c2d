// Stage 1: extract selected tables from the dump into one CSV per table.
// The dump is re-read for each table; rows stream straight to the CSV writer.

use crate::error::{Error, Result};
use crate::parser::insert::InsertParser;
use log::debug;
use std::fs::{self, File};
use std::io::BufWriter;
use std::iter;
use std::path::{Path, PathBuf};

pub const DEFAULT_TABLES: [&str; 3] = [
    "gregobase_chants",
    "gregobase_sources",
    "gregobase_chant_sources",
];
pub const DEFAULT_INPUT: &str = "raw/gregobase_online.sql";
pub const DEFAULT_OUTDIR: &str = "extract/csv";

#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    // Fail on statements that cannot be split instead of skipping them.
    pub strict: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableExtract {
    pub table: String,
    pub path: PathBuf,
    pub header: Vec<String>,
    pub statements: usize,
    pub skipped: usize,
    pub rows_written: u64,
}

pub fn csv_path(out_dir: &Path, table: &str) -> PathBuf {
    out_dir.join(format!("{}.csv", table))
}

// View a row at exactly `width` fields: pad with "" on the right or truncate.
pub fn aligned_row(row: &[String], width: usize) -> impl Iterator<Item = &str> {
    row.iter()
        .map(String::as_str)
        .chain(iter::repeat(""))
        .take(width)
}

// Extract one table. The CSV header is the column list of the first matching
// statement; if nothing matches, the file is still created, empty.
pub fn extract_table(
    input: &Path,
    out_dir: &Path,
    table: &str,
    options: ExtractOptions,
    bar: Option<&indicatif::ProgressBar>,
) -> Result<TableExtract> {
    fs::create_dir_all(out_dir).map_err(|e| Error::io(out_dir, e))?;
    let out_file = csv_path(out_dir, table);
    let file = File::create(&out_file).map_err(|e| Error::io(&out_file, e))?;
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(BufWriter::new(file));

    let parser = if options.strict {
        InsertParser::strict()
    } else {
        InsertParser::new()
    };
    debug!(
        "ExtractTable: {} from {} ({})",
        table,
        input.display(),
        if parser.is_strict() { "strict" } else { "lenient" }
    );

    let mut header: Option<Vec<String>> = None;
    let mut rows_written: u64 = 0;
    let stats = parser.parse_inserts_file(input, table, bar, |stmt| {
        let width = match &header {
            Some(h) => {
                if *h != stmt.columns {
                    debug!(
                        "ExtractTable: {} column list differs from header ({} vs {} columns)",
                        table,
                        stmt.columns.len(),
                        h.len()
                    );
                }
                h.len()
            }
            None => {
                writer.write_record(&stmt.columns)?;
                let width = stmt.columns.len();
                header = Some(stmt.columns.clone());
                width
            }
        };
        for row in stmt.rows() {
            if row.len() != width {
                debug!(
                    "ExtractTable: {} row has {} fields, aligning to {}",
                    table,
                    row.len(),
                    width
                );
            }
            writer.write_record(aligned_row(&row, width))?;
            rows_written += 1;
        }
        Ok(())
    })?;
    writer.flush().map_err(|e| Error::io(&out_file, e))?;

    debug!(
        "ExtractTable: wrote {} rows for {} to {}",
        rows_written,
        table,
        out_file.display()
    );
    Ok(TableExtract {
        table: table.to_string(),
        path: out_file,
        header: header.unwrap_or_default(),
        statements: stats.statements,
        skipped: stats.skipped,
        rows_written,
    })
}
