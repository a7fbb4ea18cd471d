//! Non-fatal findings collected during a run

use crate::registry::Key;
use crate::schema::Category;
use serde::Serialize;
use std::fmt;

/// A recovered or advisory finding.
///
/// None of these stop a run; the affected cell or row is degraded and the
/// rest of the output stays consistent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Header text differs from the schema (columns are matched by position)
    HeaderMismatch {
        column: usize,
        expected: String,
        found: String,
    },
    /// Latitude/longitude could not be parsed; stored as empty
    CoordinateFormat {
        row: Key,
        column: String,
        value: String,
        reason: String,
    },
    /// Linguistic area cell did not match the structured pattern; stored as empty
    CompositeExtraction {
        row: Key,
        column: String,
        value: String,
    },
    /// Flat lookup cell held more than one value; only the first is referenced
    ExtraFlatTokens {
        row: Key,
        column: String,
        kept: String,
        extra: Vec<String>,
    },
    /// An identifier column repeats across rows
    DuplicateIdentifier {
        column: String,
        value: String,
        rows: Vec<Key>,
    },
    /// Two lookup values are suspiciously close
    Similarity {
        category: Category,
        first: String,
        second: String,
        distance: usize,
    },
    /// Linked file has no media object with a matching name
    MediaLookupMiss { pk: Key, name: String },
    /// Media object has only derivative bitstreams
    MissingBitstream { pk: Key, name: String, oid: String },
}

impl Diagnostic {
    /// Emit the finding on the diagnostic stream
    pub fn report(&self) {
        match self {
            Diagnostic::Similarity { .. } | Diagnostic::DuplicateIdentifier { .. } => {
                tracing::info!("{}", self)
            }
            _ => tracing::warn!("{}", self),
        }
    }

    /// Serialized tag of the variant
    pub fn kind(&self) -> &'static str {
        match self {
            Diagnostic::HeaderMismatch { .. } => "header_mismatch",
            Diagnostic::CoordinateFormat { .. } => "coordinate_format",
            Diagnostic::CompositeExtraction { .. } => "composite_extraction",
            Diagnostic::ExtraFlatTokens { .. } => "extra_flat_tokens",
            Diagnostic::DuplicateIdentifier { .. } => "duplicate_identifier",
            Diagnostic::Similarity { .. } => "similarity",
            Diagnostic::MediaLookupMiss { .. } => "media_lookup_miss",
            Diagnostic::MissingBitstream { .. } => "missing_bitstream",
        }
    }

    /// Row the finding refers to, if it is row-level
    pub fn row(&self) -> Option<Key> {
        match self {
            Diagnostic::CoordinateFormat { row, .. }
            | Diagnostic::CompositeExtraction { row, .. }
            | Diagnostic::ExtraFlatTokens { row, .. } => Some(*row),
            _ => None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::HeaderMismatch {
                column,
                expected,
                found,
            } => write!(
                f,
                "header of column {} is '{}', expected '{}'",
                column, found, expected
            ),
            Diagnostic::CoordinateFormat {
                row,
                column,
                value,
                reason,
            } => write!(
                f,
                "row {}, column '{}': cannot convert coordinate '{}': {}",
                row, column, value, reason
            ),
            Diagnostic::CompositeExtraction { row, column, value } => write!(
                f,
                "row {}, column '{}': linguistic area does not match the expected structure: '{}'",
                row, column, value
            ),
            Diagnostic::ExtraFlatTokens {
                row,
                column,
                kept,
                extra,
            } => write!(
                f,
                "row {}, column '{}': kept '{}', ignored {} further value(s): {}",
                row,
                column,
                kept,
                extra.len(),
                extra.join(", ")
            ),
            Diagnostic::DuplicateIdentifier {
                column,
                value,
                rows,
            } => {
                let rows: Vec<String> = rows.iter().map(|r| r.to_string()).collect();
                write!(
                    f,
                    "duplicate {} '{}' in rows {}",
                    column,
                    value,
                    rows.join(", ")
                )
            }
            Diagnostic::Similarity {
                category,
                first,
                second,
                distance,
            } => write!(
                f,
                "{}: '{}' and '{}' are similar (distance {})",
                category, first, second, distance
            ),
            Diagnostic::MediaLookupMiss { name, .. } => {
                write!(f, "no image match for '{}'", name)
            }
            Diagnostic::MissingBitstream { name, oid, .. } => {
                write!(f, "no path found for '{}' in object {}", name, oid)
            }
        }
    }
}
