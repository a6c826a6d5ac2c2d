// Gzip a finished JSONL file next to itself (`<path>.gz`).

use crate::error::{Error, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use log::debug;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

const COPY_BUFFER: usize = 1024 * 1024;

pub fn gz_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".gz");
    PathBuf::from(name)
}

// Compress `path` into `<path>.gz`. With keep=false the uncompressed file is
// removed afterwards; a file that is already gone is not an error.
pub fn compress_jsonl(path: &Path, keep: bool) -> Result<PathBuf> {
    let gz = gz_path(path);
    let input = File::open(path).map_err(|e| Error::io(path, e))?;
    let output = File::create(&gz).map_err(|e| Error::io(&gz, e))?;

    let mut reader = BufReader::with_capacity(COPY_BUFFER, input);
    let mut encoder = GzEncoder::new(
        BufWriter::with_capacity(COPY_BUFFER, output),
        Compression::default(),
    );
    let copied = io::copy(&mut reader, &mut encoder).map_err(|e| Error::io(&gz, e))?;
    encoder
        .finish()
        .and_then(|mut w| w.flush())
        .map_err(|e| Error::io(&gz, e))?;
    debug!("CompressJsonl: {} bytes from {} into {}", copied, path.display(), gz.display());

    if !keep {
        match fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(Error::io(path, e)),
        }
    }
    Ok(gz)
}
