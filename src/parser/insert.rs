// INSERT recognizer: streams a dump line by line and yields, for one table,
// each `INSERT INTO `table` (cols) VALUES ...;` as columns + raw VALUES blob.
// No SQL grammar here: statement boundaries are lines whose trimmed form ends with ';'.

use crate::error::{Error, Result, SplitError};
use crate::logger;
use crate::parser::values;
use crate::parser::InsertStatement;
use log::debug;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

// Two-state machine. While capturing, the accumulated lines of the
// current statement are held in the variant.
#[derive(Debug)]
enum Capture {
    Idle,
    Capturing(Vec<String>),
}

// Counters for one pass over a dump.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanStats {
    pub lines_read: u64,
    pub bytes_read: u64,
    pub statements: usize,
    pub skipped: usize,
}

// Per-table statement recognizer. Feed lines (without the trailing '\n') in order.
#[derive(Debug)]
pub struct StatementRecognizer {
    prefix: String,
    state: Capture,
}

impl StatementRecognizer {
    pub fn new(table: &str) -> Self {
        Self {
            prefix: format!("INSERT INTO `{}`", table),
            state: Capture::Idle,
        }
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self.state, Capture::Capturing(_))
    }

    // Returns Some when this line completes a statement addressed to the table:
    // Ok with the split statement, or Err when the split failed.
    pub fn push_line(&mut self, line: &str) -> Option<std::result::Result<InsertStatement, SplitError>> {
        let done = line.trim().ends_with(';');
        match &mut self.state {
            Capture::Idle => {
                if !line.starts_with(&self.prefix) {
                    return None;
                }
                if done {
                    return Some(split_insert(line));
                }
                self.state = Capture::Capturing(vec![line.to_string()]);
                None
            }
            Capture::Capturing(acc) => {
                acc.push(line.to_string());
                if !done {
                    return None;
                }
                let chunk = acc.join("\n");
                self.state = Capture::Idle;
                Some(split_insert(&chunk))
            }
        }
    }

    // Drop any partial statement, returning how many lines it held.
    pub fn abandon(&mut self) -> usize {
        match std::mem::replace(&mut self.state, Capture::Idle) {
            Capture::Idle => 0,
            Capture::Capturing(acc) => acc.len(),
        }
    }
}

// Split a completed statement into its column list and VALUES blob.
// The column list is the first parenthesized span of the statement.
pub fn split_insert(chunk: &str) -> std::result::Result<InsertStatement, SplitError> {
    let open = chunk.find('(').ok_or(SplitError::MissingOpenParen)?;
    let close = chunk[open + 1..]
        .find(')')
        .map(|i| open + 1 + i)
        .ok_or(SplitError::MissingCloseParen)?;
    let cols = &chunk[open + 1..close];

    let rest = &chunk[close + 1..];
    let kw = "VALUES";
    let at = find_ascii_ci(rest, kw).ok_or(SplitError::MissingValues)?;
    let values = rest[at + kw.len()..]
        .trim_end_matches([';', '\n', '\r', ' '])
        .to_string();

    let columns = cols
        .split(',')
        .map(|c| c.trim().trim_matches('`').to_string())
        .collect();
    Ok(InsertStatement { columns, values })
}

// Drop a trailing "\r\n" or "\n"; CRLF dumps read like LF dumps.
fn strip_line_ending(line: &str) -> &str {
    line.strip_suffix("\r\n")
        .or_else(|| line.strip_suffix('\n'))
        .unwrap_or(line)
}

// Case-insensitive search for an ASCII needle; the returned offset is a char boundary.
fn find_ascii_ci(haystack: &str, needle: &str) -> Option<usize> {
    let n = needle.len();
    haystack
        .as_bytes()
        .windows(n)
        .position(|w| w.eq_ignore_ascii_case(needle.as_bytes()))
}

pub struct InsertParser {
    strict: bool,
}

impl InsertParser {
    // Lenient parser: statements that fail to split are skipped.
    pub fn new() -> Self {
        Self { strict: false }
    }

    // Strict parser: a failed split or an unbalanced VALUES blob is an error.
    pub fn strict() -> Self {
        Self { strict: true }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    // Parse INSERT statements for `table` from a file, streaming them to the caller.
    pub fn parse_inserts_file<F>(
        &self,
        path: &Path,
        table: &str,
        bar: Option<&indicatif::ProgressBar>,
        on_statement: F,
    ) -> Result<ScanStats>
    where
        F: FnMut(InsertStatement) -> Result<()>,
    {
        debug!("ParseInsertsFile: Opening file {}", path.display());
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let reader = BufReader::with_capacity(1024 * 1024, file);
        self.parse_inserts_stream(reader, table, bar, on_statement)
    }

    // Parse INSERT statements for `table` from any line source.
    // Invalid UTF-8 is replaced, never fatal. If a progress bar is provided,
    // it is advanced by bytes read.
    pub fn parse_inserts_stream<R, F>(
        &self,
        mut reader: R,
        table: &str,
        bar: Option<&indicatif::ProgressBar>,
        mut on_statement: F,
    ) -> Result<ScanStats>
    where
        R: BufRead,
        F: FnMut(InsertStatement) -> Result<()>,
    {
        let mut recognizer = StatementRecognizer::new(table);
        let mut stats = ScanStats::default();
        let mut last_logged: u64 = 0;

        let mut buf: Vec<u8> = Vec::new();
        while reader.read_until(b'\n', &mut buf)? > 0 {
            let len = buf.len() as u64;
            stats.bytes_read += len;
            stats.lines_read += 1;
            if let Some(b) = bar {
                b.inc(len);
            } else if logger::is_debug() && stats.bytes_read - last_logged > 100 * 1024 * 1024 {
                debug!(
                    "ParseInsertsStream: {} bytes read for {}",
                    stats.bytes_read, table
                );
                last_logged = stats.bytes_read;
            }

            let text = String::from_utf8_lossy(&buf);
            let line = strip_line_ending(&text);
            match recognizer.push_line(line) {
                None => {}
                Some(Ok(stmt)) => {
                    if self.strict && !values::scan_values(&stmt.values).balanced {
                        return Err(Error::UnbalancedValues {
                            table: table.to_string(),
                            line: stats.lines_read,
                        });
                    }
                    stats.statements += 1;
                    on_statement(stmt)?;
                }
                Some(Err(reason)) => {
                    if self.strict {
                        return Err(Error::MalformedInsert {
                            table: table.to_string(),
                            line: stats.lines_read,
                            reason,
                        });
                    }
                    stats.skipped += 1;
                    debug!(
                        "ParseInsertsStream: skipped INSERT for {} ending at line {}: {}",
                        table, stats.lines_read, reason
                    );
                }
            }

            buf.clear();
        }

        if recognizer.is_capturing() {
            let pending = recognizer.abandon();
            debug!(
                "ParseInsertsStream: dropped unterminated INSERT for {} ({} lines)",
                table, pending
            );
        }

        if let Some(b) = bar {
            b.finish();
        }

        debug!(
            "ParseInsertsStream: {} statements for {}, {} skipped",
            stats.statements, table, stats.skipped
        );
        Ok(stats)
    }
}

impl Default for InsertParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn collect(parser: &InsertParser, dump: &str, table: &str) -> Result<(Vec<InsertStatement>, ScanStats)> {
        let mut out = Vec::new();
        let stats = parser.parse_inserts_stream(Cursor::new(dump.as_bytes()), table, None, |s| {
            out.push(s);
            Ok(())
        })?;
        Ok((out, stats))
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    const DUMP: &str = "\
-- phpMyAdmin SQL Dump
SET NAMES utf8mb4;
CREATE TABLE `gregobase_chants` (
  `id` int(11) NOT NULL
);
INSERT INTO `gregobase_chants` (`id`, `incipit`, `office-part`) VALUES
(1, 'Ad te levavi', 'in'),
(2, 'Populus Sion;', NULL);
INSERT INTO `gregobase_sources` (`id`, `title`) VALUES (1, 'Graduale');
INSERT INTO `gregobase_chants` (`id`, `incipit`, `office-part`) VALUES (3, 'Rorate', 'in');
";

    #[test]
    fn single_line_statement() {
        let mut r = StatementRecognizer::new("t");
        let got = r.push_line("INSERT INTO `t` (`a`, `b`) VALUES (1,'x');");
        let stmt = got.expect("complete").expect("splits");
        assert_eq!(stmt.columns, cols(&["a", "b"]));
        assert_eq!(stmt.values, " (1,'x')");
        assert!(!r.is_capturing());
    }

    #[test]
    fn multi_line_statement_joins_with_newlines() {
        let mut r = StatementRecognizer::new("t");
        assert!(r.push_line("INSERT INTO `t` (`a`) VALUES").is_none());
        assert!(r.is_capturing());
        assert!(r.push_line("(1),").is_none());
        let stmt = r.push_line("(2);  ").expect("complete").expect("splits");
        assert_eq!(stmt.values, "\n(1),\n(2)");
        assert!(!r.is_capturing());
    }

    #[test]
    fn other_tables_and_similar_prefixes_are_ignored() {
        let mut r = StatementRecognizer::new("t");
        assert!(r.push_line("INSERT INTO `t2` (`a`) VALUES (1);").is_none());
        assert!(r.push_line("INSERT INTO `other` (`a`) VALUES").is_none());
        assert!(!r.is_capturing());
        // Prefix must start the line.
        assert!(r.push_line("  INSERT INTO `t` (`a`) VALUES (1);").is_none());
    }

    #[test]
    fn split_trims_columns_and_terminator() {
        let stmt = split_insert("INSERT INTO `t` ( `a` ,b,` c`) values (1,2,3);\r\n").expect("splits");
        assert_eq!(stmt.columns, cols(&["a", "b", " c"]));
        assert_eq!(stmt.values, " (1,2,3)");
    }

    #[test]
    fn split_failures() {
        assert_eq!(split_insert("INSERT INTO `t` VALUES;"), Err(SplitError::MissingOpenParen));
        assert_eq!(split_insert("INSERT INTO `t` (a VALUES;"), Err(SplitError::MissingCloseParen));
        assert_eq!(split_insert("INSERT INTO `t` (a) SELECT 1;"), Err(SplitError::MissingValues));
    }

    #[test]
    fn stream_yields_only_target_table() {
        let (stmts, stats) = collect(&InsertParser::new(), DUMP, "gregobase_chants").expect("scan");
        assert_eq!(stmts.len(), 2);
        assert_eq!(stats.statements, 2);
        assert_eq!(stats.skipped, 0);
        assert_eq!(stmts[0].columns, cols(&["id", "incipit", "office-part"]));
        let rows = stmts[0].rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], cols(&["2", "Populus Sion;", ""]));
        assert_eq!(stmts[1].rows(), vec![cols(&["3", "Rorate", "in"])]);
    }

    #[test]
    fn rescanning_is_idempotent() {
        let parser = InsertParser::new();
        let (a, _) = collect(&parser, DUMP, "gregobase_chants").expect("scan");
        let (b, _) = collect(&parser, DUMP, "gregobase_chants").expect("scan");
        assert_eq!(a, b);
    }

    #[test]
    fn malformed_statement_is_skipped_leniently() {
        let dump = "INSERT INTO `t` broken;\nINSERT INTO `t` (`a`) VALUES (1);\n";
        let (stmts, stats) = collect(&InsertParser::new(), dump, "t").expect("scan");
        assert_eq!(stmts.len(), 1);
        assert_eq!(stats.skipped, 1);
    }

    #[test]
    fn constructors_set_strictness() {
        assert!(!InsertParser::new().is_strict());
        assert!(!InsertParser::default().is_strict());
        assert!(InsertParser::strict().is_strict());
    }

    #[test]
    fn malformed_statement_fails_in_strict_mode() {
        let dump = "INSERT INTO `t` (`a`) VALUES (1);\nINSERT INTO `t` (`a`)\nSELECT 1;\n";
        let err = collect(&InsertParser::strict(), dump, "t").expect_err("strict");
        match err {
            Error::MalformedInsert { table, line, reason } => {
                assert_eq!(table, "t");
                assert_eq!(line, 3);
                assert_eq!(reason, SplitError::MissingValues);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unbalanced_values_fail_only_in_strict_mode() {
        let dump = "INSERT INTO `t` (`a`) VALUES ('oops);\n";
        let (stmts, _) = collect(&InsertParser::new(), dump, "t").expect("lenient");
        assert_eq!(stmts.len(), 1);
        assert!(stmts[0].rows().is_empty());
        let err = collect(&InsertParser::strict(), dump, "t").expect_err("strict");
        assert!(matches!(err, Error::UnbalancedValues { line: 1, .. }));
    }

    #[test]
    fn unterminated_statement_at_eof_is_dropped() {
        let dump = "INSERT INTO `t` (`a`) VALUES (1);\nINSERT INTO `t` (`a`) VALUES\n(2)";
        let (stmts, stats) = collect(&InsertParser::new(), dump, "t").expect("scan");
        assert_eq!(stmts.len(), 1);
        assert_eq!(stats.lines_read, 3);
    }

    #[test]
    fn crlf_dump_decodes_like_lf() {
        let dump = "INSERT INTO `t` (`a`) VALUES\r\n('line1\r\nline2');\r\n";
        let (stmts, stats) = collect(&InsertParser::new(), dump, "t").expect("scan");
        assert_eq!(stats.lines_read, 3);
        assert_eq!(stmts.len(), 1);
        assert_eq!(stmts[0].values, "\n('line1\nline2')");
        assert_eq!(stmts[0].rows(), vec![cols(&["line1\nline2"])]);
    }

    #[test]
    fn lone_carriage_return_inside_a_line_is_kept() {
        assert_eq!(strip_line_ending("a\rb\r\n"), "a\rb");
        assert_eq!(strip_line_ending("a\n"), "a");
        assert_eq!(strip_line_ending("a"), "a");
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let mut dump = b"INSERT INTO `t` (`a`) VALUES ('caf".to_vec();
        dump.push(0xff);
        dump.extend_from_slice(b"');\n");
        let mut out = Vec::new();
        InsertParser::new()
            .parse_inserts_stream(Cursor::new(dump), "t", None, |s| {
                out.push(s);
                Ok(())
            })
            .expect("scan");
        assert_eq!(out[0].rows(), vec![cols(&["caf\u{fffd}"])]);
    }

    #[test]
    fn callback_errors_abort_the_scan() {
        let err = InsertParser::new()
            .parse_inserts_stream(Cursor::new(DUMP.as_bytes()), "gregobase_chants", None, |_| {
                Err(Error::Stream(std::io::Error::other("sink closed")))
            })
            .expect_err("propagates");
        assert!(matches!(err, Error::Stream(_)));
    }
}
