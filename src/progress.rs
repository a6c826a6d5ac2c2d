// Byte-progress bars for extraction passes over a dump.
// Each table is a separate pass over the same file, so each gets its own bar
// under one MultiProgress; a finished pass keeps its bar with a row count.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::fs;
use std::path::Path;

const TEMPLATE: &str = "{prefix:32} {bytes:>10}/{total_bytes:<10} [{bar:40}] {percent:>3}% {msg}";

pub struct ProgressManager {
    multi: Option<MultiProgress>,
}

impl ProgressManager {
    // No bars at all when disabled (debug logging, --no-progress).
    pub fn new(enabled: bool) -> Self {
        Self {
            multi: enabled.then(MultiProgress::new),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.multi.is_some()
    }

    // Bar sized to the dump for one table pass. An unreadable dump gets a
    // zero-length bar; opening it reports the real error.
    pub fn table_bar(&self, dump: &Path, table: &str) -> Option<ProgressBar> {
        let mp = self.multi.as_ref()?;
        let size = fs::metadata(dump).map(|m| m.len()).unwrap_or(0);
        let bar = mp.add(ProgressBar::new(size));
        bar.set_style(
            ProgressStyle::with_template(TEMPLATE)
                .expect("valid progress template")
                .progress_chars("█ "),
        );
        bar.set_prefix(format!("Extract {}", table));
        Some(bar)
    }
}

// Leave the bar on screen with the number of rows written for its table.
pub fn finish_table(bar: Option<&ProgressBar>, rows: u64) {
    if let Some(b) = bar {
        b.finish_with_message(format!("{} rows", rows));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_manager_creates_no_bars() {
        let progress = ProgressManager::new(false);
        assert!(!progress.is_enabled());
        assert!(progress
            .table_bar(Path::new("raw/gregobase_online.sql"), "gregobase_chants")
            .is_none());
        finish_table(None, 3);
    }

    #[test]
    fn bar_is_sized_to_the_dump() {
        let dir = tempfile::tempdir().unwrap();
        let dump = dir.path().join("dump.sql");
        fs::write(&dump, "INSERT INTO `t` (`a`) VALUES (1);\n").unwrap();

        let progress = ProgressManager::new(true);
        let bar = progress.table_bar(&dump, "t").unwrap();
        assert_eq!(bar.length(), Some(34));
        assert_eq!(bar.prefix(), "Extract t");

        finish_table(Some(&bar), 1);
        assert!(bar.is_finished());
        assert_eq!(bar.message(), "1 rows");
    }

    #[test]
    fn missing_dump_gets_an_empty_bar() {
        let progress = ProgressManager::new(true);
        let bar = progress
            .table_bar(Path::new("/nonexistent/dump.sql"), "t")
            .unwrap();
        assert_eq!(bar.length(), Some(0));
    }
}
