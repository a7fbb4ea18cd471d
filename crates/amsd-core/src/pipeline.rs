//! End-to-end conversion: export rows in, CSV tables out

use crate::config::RunConfig;
use crate::diagnostics::Diagnostic;
use crate::error::{Error, Result};
use crate::media::{cross_reference, load_catalog, MediaIndex};
use crate::normalizer::{Dataset, Normalizer};
use crate::parser::read_rows;
use crate::schema::{Category, Schema};
use crate::similarity::{check_similarity, Thresholds};
use crate::table::OutputTable;
use crate::writer::{build_tables, write_tables};
use serde::Serialize;
use std::path::PathBuf;

/// Options of an in-memory conversion
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    pub thresholds: Thresholds,
    pub flat: bool,
}

/// Result of converting a set of export rows
#[derive(Debug, Clone)]
pub struct Conversion {
    pub dataset: Dataset,
    pub tables: Vec<OutputTable>,
    /// Header, row, duplicate, similarity and media findings, in that order
    pub diagnostics: Vec<Diagnostic>,
}

impl Conversion {
    pub fn record_count(&self) -> usize {
        self.dataset.records.len()
    }

    pub fn table(&self, name: &str) -> Option<&OutputTable> {
        self.tables.iter().find(|t| t.name == name)
    }
}

/// Normalize export rows (header first) and build every output table.
///
/// Fails without producing anything when any row has the wrong column
/// count; every other finding is collected as a diagnostic.
pub fn convert<S: AsRef<str>>(
    schema: &Schema,
    rows: &[Vec<S>],
    media: Option<&MediaIndex>,
    options: &ConvertOptions,
) -> Result<Conversion> {
    let (header, data) = rows.split_first().ok_or(Error::EmptyInput)?;

    let mut diagnostics = schema.check_header(header)?;
    for diagnostic in &diagnostics {
        diagnostic.report();
    }

    let mut normalizer = Normalizer::new(schema);
    for row in data {
        normalizer.normalize_row(row)?;
    }
    let dataset = normalizer.finish();
    tracing::info!("normalized {} records", dataset.records.len());
    diagnostics.extend(dataset.diagnostics.iter().cloned());

    for hit in check_similarity(&dataset.registry, &options.thresholds) {
        let diagnostic = Diagnostic::from(hit);
        diagnostic.report();
        diagnostics.push(diagnostic);
    }

    let links = match media {
        Some(index) => {
            let filenames = dataset
                .registry
                .text_table(Category::LinkedFilenames)
                .ok_or_else(|| Error::InvalidSchema("no linked_filenames table".to_string()))?;
            let result = cross_reference(filenames, index);
            diagnostics.extend(result.diagnostics);
            Some(result.links)
        }
        None => None,
    };

    let tables = build_tables(schema, &dataset, links.as_deref(), options.flat);

    Ok(Conversion {
        dataset,
        tables,
        diagnostics,
    })
}

/// Row count of one written table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSummary {
    pub name: String,
    pub rows: usize,
}

/// Summary of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub records: usize,
    pub tables: Vec<TableSummary>,
    pub files_written: Vec<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Read the export and catalog named by `config`, convert, and write the tables
pub fn run(config: &RunConfig) -> Result<RunReport> {
    let schema = Schema::standard()?;
    let rows = read_rows(&config.input)?;

    let media = match &config.catalog {
        Some(path) => Some(MediaIndex::new(load_catalog(path)?)),
        None => {
            tracing::info!("no media catalog given, linked files are not resolved");
            None
        }
    };

    let options = ConvertOptions {
        thresholds: config.thresholds.clone(),
        flat: config.flat,
    };
    let conversion = convert(&schema, &rows, media.as_ref(), &options)?;

    let files_written = write_tables(&conversion.tables, &config.output_dir)?;
    tracing::info!(
        "wrote {} tables to {}",
        files_written.len(),
        config.output_dir.display()
    );

    Ok(RunReport {
        input: config.input.clone(),
        output_dir: config.output_dir.clone(),
        records: conversion.record_count(),
        tables: conversion
            .tables
            .iter()
            .map(|t| TableSummary {
                name: t.name.clone(),
                rows: t.row_count(),
            })
            .collect(),
        files_written,
        diagnostics: conversion.diagnostics,
    })
}
