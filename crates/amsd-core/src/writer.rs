//! Builds the output tables and writes them as CSV files

use crate::error::{Error, Result};
use crate::media::MediaLink;
use crate::normalizer::Dataset;
use crate::schema::{Category, FieldSpec, Schema, PK_COLUMN};
use crate::table::{CellValue, OutputTable};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the primary table
pub const PRIMARY_TABLE: &str = "sticks";

/// Name of the optional human-readable export of the primary table
pub const FLAT_TABLE: &str = "sticks_flat";

fn header(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| c.to_string()).collect()
}

/// Build every output table.
///
/// `media` holds the cross-referenced `linked_filenames` rows; without it the
/// table is written with empty `oid` and `path` columns. Every table is
/// emitted, even when it has no rows.
pub fn build_tables(
    schema: &Schema,
    dataset: &Dataset,
    media: Option<&[MediaLink]>,
    flat: bool,
) -> Vec<OutputTable> {
    let mut tables = Vec::new();

    let mut primary = OutputTable::new(PRIMARY_TABLE, schema.header_row());
    primary.rows = dataset.records.iter().map(|r| r.to_row()).collect();
    tables.push(primary);

    for category in Category::ALL {
        tables.push(lookup_table(dataset, category, media));
    }

    for junction in dataset.registry.junctions() {
        let category = junction.category();
        let name = category
            .junction_name()
            .unwrap_or_else(|| format!("x_sticks_{}", category));
        let mut table = OutputTable::new(
            name,
            vec!["stick_pk".to_string(), format!("{}_pk", category)],
        );
        table.rows = junction
            .rows()
            .iter()
            .map(|(record, value)| vec![record.to_string(), value.to_string()])
            .collect();
        tables.push(table);
    }

    if flat {
        tables.push(flat_table(schema, dataset));
    }

    tables
}

fn lookup_table(dataset: &Dataset, category: Category, media: Option<&[MediaLink]>) -> OutputTable {
    let registry = &dataset.registry;
    match category {
        Category::LingArea => {
            let mut table = OutputTable::new(
                category.table_name(),
                header(&[
                    PK_COLUMN,
                    "chirila_name",
                    "austlang_code",
                    "austlang_name",
                    "glottolog_code",
                ]),
            );
            table.rows = registry
                .ling_area()
                .iter()
                .map(|(pk, area)| {
                    std::iter::once(pk.to_string())
                        .chain(area.columns().iter().map(|c| c.to_string()))
                        .collect()
                })
                .collect();
            table
        }
        Category::LinkedFilenames => {
            let mut table = OutputTable::new(
                category.table_name(),
                header(&[PK_COLUMN, "name", "oid", "path"]),
            );
            table.rows = match media {
                Some(links) => links.iter().map(MediaLink::to_row).collect(),
                None => registry
                    .display_values(category)
                    .into_iter()
                    .map(|(pk, name)| vec![pk.to_string(), name, String::new(), String::new()])
                    .collect(),
            };
            table
        }
        _ => {
            let mut table =
                OutputTable::new(category.table_name(), header(&[PK_COLUMN, "name"]));
            table.rows = registry
                .display_values(category)
                .into_iter()
                .map(|(pk, name)| vec![pk.to_string(), name])
                .collect();
            table
        }
    }
}

/// Primary table with lookups resolved to their text.
///
/// Table-exclusive columns are left out; their values are only reachable
/// through their own table and junction.
fn flat_table(schema: &Schema, dataset: &Dataset) -> OutputTable {
    let fields: Vec<(usize, &FieldSpec)> = schema
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, f)| !f.table_exclusive)
        .collect();

    let columns = std::iter::once(PK_COLUMN.to_string())
        .chain(fields.iter().map(|(_, f)| f.name.to_string()))
        .collect();
    let mut table = OutputTable::new(FLAT_TABLE, columns);

    for record in &dataset.records {
        let mut row = Vec::with_capacity(fields.len() + 1);
        row.push(record.pk.to_string());
        for (idx, field) in &fields {
            let cell = record.get(*idx).unwrap_or(&CellValue::Empty);
            let value = match field.category() {
                Some(category) => cell
                    .keys()
                    .iter()
                    .filter_map(|k| dataset.registry.resolve(category, *k))
                    .collect::<Vec<_>>()
                    .join("; "),
                None => cell.to_string_value(),
            };
            row.push(value);
        }
        table.rows.push(row);
    }

    table
}

/// Write each table to `<dir>/<name>.csv`, creating `dir` if needed
pub fn write_tables<P: AsRef<Path>>(tables: &[OutputTable], dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(tables.len());
    for table in tables {
        let path = dir.join(format!("{}.csv", table.name));
        write_table(table, &path)?;
        tracing::debug!("wrote {} rows to {}", table.row_count(), path.display());
        written.push(path);
    }
    Ok(written)
}

/// Write one table as comma-separated values, quoting where necessary
pub fn write_table(table: &OutputTable, path: &Path) -> Result<()> {
    let csv_err = |e: csv::Error| Error::Csv {
        path: path.to_path_buf(),
        source: e,
    };

    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .from_path(path)
        .map_err(csv_err)?;

    writer.write_record(&table.header).map_err(csv_err)?;
    for row in &table.rows {
        writer.write_record(row).map_err(csv_err)?;
    }
    writer.flush()?;
    Ok(())
}

/// Render one table as CSV text
pub fn to_csv_string(table: &OutputTable) -> Result<String> {
    let csv_err = |e: csv::Error| Error::Csv {
        path: PathBuf::from(format!("{}.csv", table.name)),
        source: e,
    };

    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(Vec::new());
    writer.write_record(&table.header).map_err(csv_err)?;
    for row in &table.rows {
        writer.write_record(row).map_err(csv_err)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
