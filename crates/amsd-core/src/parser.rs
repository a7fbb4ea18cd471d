//! Reader for the tab-delimited collection export

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Raw export rows, header line first
pub type RawRows = Vec<Vec<String>>;

/// Read a tab-delimited export into raw rows
pub fn read_rows<P: AsRef<Path>>(path: P) -> Result<RawRows> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let rows = read_from(BufReader::new(file), path)?;
    tracing::info!("read {} lines from {}", rows.len(), path.display());
    Ok(rows)
}

/// Read a tab-delimited export from a string (useful for testing)
pub fn read_rows_str(content: &str) -> Result<RawRows> {
    read_from(content.as_bytes(), Path::new("<string>"))
}

fn read_from<R: Read>(reader: R, path: &Path) -> Result<RawRows> {
    // Width is checked against the schema by the caller, so that the error
    // can name the expected column count.
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for result in csv_reader.records() {
        let record = result.map_err(|e| Error::Csv {
            path: PathBuf::from(path),
            source: e,
        })?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    if rows.is_empty() {
        return Err(Error::EmptyInput);
    }
    Ok(rows)
}
