// GregoBase dump extraction: SQL INSERTs -> per-table CSV -> chants JSONL.

pub mod compress;
pub mod error;
pub mod extract;
pub mod logger;
pub mod parser;
pub mod progress;
pub mod unify;

pub use error::{Error, Result, SplitError};
pub use parser::{InsertStatement, Row};
