//! amsd-core: Core library for normalizing the message-stick collection export
//!
//! This library provides functionality to:
//! - Read the tab-delimited collection export
//! - Normalize each row against a fixed field schema into a primary record,
//!   lookup tables and junction tables
//! - Convert DMS coordinates and extract linguistic areas
//! - Flag near-duplicate lookup values and repeated identifiers
//! - Resolve linked filenames against a media catalog
//! - Write every table as a CSV file

pub mod config;
pub mod coords;
pub mod diagnostics;
pub mod error;
pub mod ling_area;
pub mod media;
pub mod normalizer;
pub mod parser;
pub mod pipeline;
pub mod registry;
pub mod scanner;
pub mod schema;
pub mod similarity;
pub mod table;
pub mod writer;

#[cfg(test)]
mod fixtures;

pub use config::RunConfig;
pub use coords::{dms_to_decimal, CoordinateError};
pub use diagnostics::Diagnostic;
pub use error::{Error, Result};
pub use ling_area::LinguisticArea;
pub use media::{
    cross_reference, load_catalog, missing_files, parse_catalog, MediaIndex, MediaLink,
    MediaObject,
};
pub use normalizer::{Dataset, Normalizer};
pub use parser::{read_rows, read_rows_str};
pub use pipeline::{convert, run, Conversion, ConvertOptions, RunReport, TableSummary};
pub use registry::{JunctionTable, Key, LookupTable, Registry};
pub use scanner::{plan_upload, scan_images, ImageFile, UploadAction};
pub use schema::{Category, FieldKind, FieldSpec, Schema};
pub use similarity::{check_similarity, levenshtein, SimilarityHit, Thresholds};
pub use table::{CellValue, OutputTable, Record};
pub use writer::{build_tables, write_tables};
