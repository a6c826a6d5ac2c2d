// Parser module: INSERT statement recognition and VALUES tuple tokenizing.

pub mod insert;
pub mod values;

// One decoded tuple. NULL is already mapped to the empty string.
pub type Row = Vec<String>;

// A completed `INSERT INTO ... (cols) VALUES ...;` split into its two parts.
// The values blob is the raw text after VALUES with the terminator trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertStatement {
    pub columns: Vec<String>,
    pub values: String,
}

impl InsertStatement {
    pub fn rows(&self) -> Vec<Row> {
        values::parse_values_blob(&self.values)
    }
}
