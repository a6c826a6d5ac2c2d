// Stage 2: join the extracted CSVs into one JSON object per chant (JSONL).
// Sources are indexed by id, the chant/source bridge is grouped by chant id,
// and every chant is written with an explicit `sources` array.

use crate::error::{Error, Result};
use ahash::AHashMap;
use indexmap::IndexMap;
use log::debug;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const DEFAULT_CSV_DIR: &str = "extract/csv";
pub const DEFAULT_OUTPUT: &str = "extract/chants.jsonl";

// One CSV row keyed by header, in column order. A record shorter than the
// header leaves its trailing columns as None (serialized as null).
pub type CsvRecord = IndexMap<String, Option<String>>;

// Text of one column, if the record has a value for it.
pub fn field<'a>(record: &'a CsvRecord, key: &str) -> Option<&'a str> {
    record.get(key).and_then(|v| v.as_deref())
}

// The three CSVs the join needs.
#[derive(Debug, Clone)]
pub struct UnifyInputs {
    pub chants: PathBuf,
    pub sources: PathBuf,
    pub chant_sources: PathBuf,
}

impl UnifyInputs {
    pub fn from_csv_dir(dir: &Path) -> Self {
        Self {
            chants: dir.join("gregobase_chants.csv"),
            sources: dir.join("gregobase_sources.csv"),
            chant_sources: dir.join("gregobase_chant_sources.csv"),
        }
    }

    // All inputs must exist before anything is written.
    pub fn ensure_present(&self) -> Result<()> {
        for (kind, path) in [
            ("chants", &self.chants),
            ("sources", &self.sources),
            ("chant-sources", &self.chant_sources),
        ] {
            if !path.exists() {
                return Err(Error::MissingCsv {
                    kind,
                    path: path.clone(),
                });
            }
        }
        Ok(())
    }
}

// One bridge entry attached to a chant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceEntry<'a> {
    pub id: Option<&'a str>,
    pub page: Option<&'a str>,
    pub sequence: Option<&'a str>,
    pub extent: Option<&'a str>,
    pub source: Option<&'a CsvRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnifySummary {
    pub chants: usize,
    pub sources: usize,
    pub links: usize,
    pub unresolved: usize,
}

pub fn load_csv_records(path: &Path) -> Result<Vec<CsvRecord>> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);
    let headers = reader.headers()?.clone();
    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        records.push(
            headers
                .iter()
                .enumerate()
                .map(|(i, k)| (k.to_string(), record.get(i).map(str::to_string)))
                .collect(),
        );
    }
    debug!("LoadCsv: {} rows from {}", records.len(), path.display());
    Ok(records)
}

// Index rows by a key column. On duplicate keys the first row wins; rows
// without a value for the column are skipped.
pub fn index_by_key<'a>(rows: &'a [CsvRecord], key: &str) -> AHashMap<&'a str, &'a CsvRecord> {
    let mut index = AHashMap::with_capacity(rows.len());
    for row in rows {
        if let Some(k) = field(row, key) {
            index.entry(k).or_insert(row);
        }
    }
    index
}

// Group bridge rows by chant id, preserving bridge order, each entry enriched
// with the resolved source row (None when the id is unknown).
pub fn group_chant_sources<'a>(
    bridge: &'a [CsvRecord],
    sources_by_id: &AHashMap<&'a str, &'a CsvRecord>,
) -> AHashMap<&'a str, Vec<SourceEntry<'a>>> {
    let mut groups: AHashMap<&'a str, Vec<SourceEntry<'a>>> = AHashMap::new();
    for link in bridge {
        let Some(chant_id) = field(link, "chant_id") else {
            continue;
        };
        let id = field(link, "source");
        let entry = SourceEntry {
            id,
            page: field(link, "page"),
            sequence: field(link, "sequence"),
            extent: field(link, "extent"),
            source: id.and_then(|id| sources_by_id.get(id).copied()),
        };
        groups.entry(chant_id).or_default().push(entry);
    }
    groups
}

// Build the JSON object for one chant: its CSV fields in order plus `sources`.
pub fn chant_record(chant: &CsvRecord, sources: &[SourceEntry<'_>]) -> Result<Value> {
    let mut obj = Map::with_capacity(chant.len() + 1);
    for (k, v) in chant {
        obj.insert(k.clone(), v.clone().map_or(Value::Null, Value::String));
    }
    obj.insert("sources".to_string(), serde_json::to_value(sources)?);
    Ok(Value::Object(obj))
}

// Write one JSON object per chant. Chants without links get `"sources": []`.
pub fn write_jsonl<W: Write>(
    out: &mut W,
    chants: &[CsvRecord],
    groups: &AHashMap<&str, Vec<SourceEntry<'_>>>,
) -> Result<usize> {
    let mut written = 0;
    for chant in chants {
        let entries = field(chant, "id")
            .and_then(|id| groups.get(id))
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        serde_json::to_writer(&mut *out, &chant_record(chant, entries)?)?;
        out.write_all(b"\n")?;
        written += 1;
    }
    Ok(written)
}

// Run the whole join: check inputs, load, index, group, stream JSONL to `output`.
pub fn unify(inputs: &UnifyInputs, output: &Path) -> Result<UnifySummary> {
    inputs.ensure_present()?;

    let chants = load_csv_records(&inputs.chants)?;
    let sources = load_csv_records(&inputs.sources)?;
    let chant_sources = load_csv_records(&inputs.chant_sources)?;

    let sources_by_id = index_by_key(&sources, "id");
    let groups = group_chant_sources(&chant_sources, &sources_by_id);
    let links: usize = groups.values().map(Vec::len).sum();
    let unresolved = groups
        .values()
        .flatten()
        .filter(|e| e.source.is_none())
        .count();
    debug!(
        "Unify: {} chants, {} sources, {} links ({} unresolved)",
        chants.len(),
        sources_by_id.len(),
        links,
        unresolved
    );

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    let file = File::create(output).map_err(|e| Error::io(output, e))?;
    let mut out = BufWriter::new(file);
    let written = write_jsonl(&mut out, &chants, &groups)?;
    out.flush().map_err(|e| Error::io(output, e))?;

    Ok(UnifySummary {
        chants: written,
        sources: sources_by_id.len(),
        links,
        unresolved,
    })
}
