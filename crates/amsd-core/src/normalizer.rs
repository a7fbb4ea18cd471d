//! Row normalizer: one export row in, one record plus lookup updates out

use crate::coords::dms_to_decimal;
use crate::diagnostics::Diagnostic;
use crate::error::{Error, Result};
use crate::ling_area::LinguisticArea;
use crate::registry::{Key, Registry};
use crate::schema::{Category, FieldKind, FieldSpec, Schema};
use crate::table::{CellValue, Record};
use regex::Regex;
use std::collections::{BTreeMap, HashSet};

/// Output of a completed normalization pass
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Primary table rows, pk 1..=n
    pub records: Vec<Record>,
    pub registry: Registry,
    /// Findings from every row plus the duplicate-identifier check
    pub diagnostics: Vec<Diagnostic>,
}

/// Streams export rows into records, lookup tables and junction tables
pub struct Normalizer<'a> {
    schema: &'a Schema,
    registry: Registry,
    records: Vec<Record>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Normalizer<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            registry: Registry::new(),
            records: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Normalize the next data row.
    ///
    /// Rows must be fed in export order: the record's pk is its 1-based
    /// position, which is also its line index when the header is line 0.
    pub fn normalize_row<S: AsRef<str>>(&mut self, cells: &[S]) -> Result<&Record> {
        let pk = self.records.len() as Key + 1;
        if cells.len() != self.schema.len() {
            return Err(Error::SchemaMismatch {
                line: u64::from(pk) + 1,
                expected: self.schema.len(),
                found: cells.len(),
            });
        }

        let schema = self.schema;
        // (category, key) pairs already linked for this record
        let mut linked = HashSet::new();
        let mut values = Vec::with_capacity(cells.len());
        for (field, raw) in schema.fields().iter().zip(cells) {
            let value = self.normalize_cell(pk, field, raw.as_ref(), &mut linked)?;
            values.push(value);
        }

        self.records.push(Record::new(pk, values));
        Ok(&self.records[self.records.len() - 1])
    }

    fn normalize_cell(
        &mut self,
        pk: Key,
        field: &FieldSpec,
        raw: &str,
        linked: &mut HashSet<(Category, Key)>,
    ) -> Result<CellValue> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(CellValue::Empty);
        }
        let value = if field.case_fold {
            trimmed.to_lowercase()
        } else {
            trimmed.to_string()
        };

        match &field.kind {
            FieldKind::Text => Ok(CellValue::Text(value)),
            FieldKind::Coordinate => match dms_to_decimal(&value) {
                Ok(degrees) => Ok(CellValue::Float(degrees)),
                Err(e) => {
                    self.push_diagnostic(Diagnostic::CoordinateFormat {
                        row: pk,
                        column: field.name.to_string(),
                        value,
                        reason: e.to_string(),
                    });
                    Ok(CellValue::Empty)
                }
            },
            FieldKind::LinguisticArea { pattern } => {
                match LinguisticArea::extract(pattern, &value) {
                    Some(area) => Ok(CellValue::Key(self.registry.ling_area_mut().intern(area))),
                    None => {
                        self.push_diagnostic(Diagnostic::CompositeExtraction {
                            row: pk,
                            column: field.name.to_string(),
                            value,
                        });
                        Ok(CellValue::Empty)
                    }
                }
            }
            FieldKind::Lookup { category, split } => {
                let tokens = tokenize(split.as_ref(), &value);
                self.lookup_tokens(pk, field, *category, tokens, linked)
            }
        }
    }

    fn lookup_tokens(
        &mut self,
        pk: Key,
        field: &FieldSpec,
        category: Category,
        tokens: Vec<&str>,
        linked: &mut HashSet<(Category, Key)>,
    ) -> Result<CellValue> {
        let table = self
            .registry
            .text_table_mut(category)
            .ok_or_else(|| Error::InvalidSchema(format!("no text table for '{}'", category)))?;

        let mut keys: Vec<Key> = Vec::with_capacity(tokens.len());
        for token in &tokens {
            let key = table.intern(token.to_string());
            if !keys.contains(&key) {
                keys.push(key);
            }
        }

        if keys.is_empty() {
            return Ok(CellValue::Empty);
        }

        if !category.has_junction() {
            if tokens.len() > 1 {
                self.push_diagnostic(Diagnostic::ExtraFlatTokens {
                    row: pk,
                    column: field.name.to_string(),
                    kept: tokens[0].to_string(),
                    extra: tokens[1..].iter().map(|t| t.to_string()).collect(),
                });
            }
            return Ok(CellValue::Key(keys[0]));
        }

        if let Some(junction) = self.registry.junction_mut(category) {
            for &key in &keys {
                if linked.insert((category, key)) {
                    junction.link(pk, key);
                }
            }
        }
        Ok(CellValue::Keys(keys))
    }

    fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        diagnostic.report();
        self.diagnostics.push(diagnostic);
    }

    /// Records normalized so far
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Finish the pass and check identifier columns for repeats
    pub fn finish(mut self) -> Dataset {
        let schema = self.schema;
        for (idx, field) in schema.fields().iter().enumerate() {
            if !field.unique {
                continue;
            }

            let mut seen: BTreeMap<&str, Vec<Key>> = BTreeMap::new();
            for record in &self.records {
                if let Some(value) = record.get(idx).and_then(CellValue::as_text) {
                    seen.entry(value).or_default().push(record.pk);
                }
            }

            let duplicates: Vec<Diagnostic> = seen
                .into_iter()
                .filter(|(_, rows)| rows.len() > 1)
                .map(|(value, rows)| Diagnostic::DuplicateIdentifier {
                    column: field.name.to_string(),
                    value: value.to_string(),
                    rows,
                })
                .collect();

            for diagnostic in duplicates {
                self.push_diagnostic(diagnostic);
            }
        }

        Dataset {
            records: self.records,
            registry: self.registry,
            diagnostics: self.diagnostics,
        }
    }
}

/// Split a cell into trimmed, non-empty tokens
fn tokenize<'v>(split: Option<&Regex>, value: &'v str) -> Vec<&'v str> {
    match split {
        Some(re) => re
            .split(value)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect(),
        None => vec![value],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::row;

    fn schema() -> Schema {
        Schema::standard().unwrap()
    }

    fn cell<'r>(schema: &Schema, record: &'r Record, name: &str) -> &'r CellValue {
        &record.cells[schema.position(name).unwrap()]
    }

    #[test]
    fn test_direct_cells_are_trimmed() {
        let schema = schema();
        let mut normalizer = Normalizer::new(&schema);
        let record = normalizer
            .normalize_row(&row(&[("title", "  Message stick  "), ("notes", "   ")]))
            .unwrap();

        assert_eq!(record.pk, 1);
        assert_eq!(
            cell(&schema, record, "title"),
            &CellValue::Text("Message stick".to_string())
        );
        assert_eq!(cell(&schema, record, "notes"), &CellValue::Empty);
    }

    #[test]
    fn test_pks_follow_row_order() {
        let schema = schema();
        let mut normalizer = Normalizer::new(&schema);
        for _ in 0..3 {
            normalizer.normalize_row(&row(&[])).unwrap();
        }
        let pks: Vec<Key> = normalizer.records().iter().map(|r| r.pk).collect();
        assert_eq!(pks, vec![1, 2, 3]);
    }

    #[test]
    fn test_coordinates_converted() {
        let schema = schema();
        let mut normalizer = Normalizer::new(&schema);
        let record = normalizer
            .normalize_row(&row(&[("lat", "33°52'4\"S"), ("long", "151°12'30\"E")]))
            .unwrap()
            .clone();

        match cell(&schema, &record, "lat") {
            CellValue::Float(v) => assert!((v - -33.867778).abs() < 1e-6),
            other => panic!("unexpected {:?}", other),
        }
        assert!(normalizer.finish().diagnostics.is_empty());
    }

    #[test]
    fn test_bad_coordinate_is_recovered() {
        let schema = schema();
        let mut normalizer = Normalizer::new(&schema);
        normalizer
            .normalize_row(&row(&[("lat", "somewhere north"), ("title", "kept")]))
            .unwrap();
        let dataset = normalizer.finish();

        let record = &dataset.records[0];
        assert_eq!(cell(&schema, record, "lat"), &CellValue::Empty);
        assert_eq!(
            cell(&schema, record, "title"),
            &CellValue::Text("kept".to_string())
        );
        assert!(matches!(
            &dataset.diagnostics[..],
            [Diagnostic::CoordinateFormat { row: 1, column, .. }] if column == "lat"
        ));
    }

    #[test]
    fn test_multi_value_lookup_with_junction() {
        let schema = schema();
        let mut normalizer = Normalizer::new(&schema);
        normalizer
            .normalize_row(&row(&[("material", "wood, ochre  string")]))
            .unwrap();
        normalizer
            .normalize_row(&row(&[("material", "Ochre,clay")]))
            .unwrap();
        let dataset = normalizer.finish();

        assert_eq!(
            cell(&schema, &dataset.records[0], "material"),
            &CellValue::Keys(vec![1, 2, 3])
        );
        assert_eq!(
            cell(&schema, &dataset.records[1], "material"),
            &CellValue::Keys(vec![2, 4])
        );

        let junction = dataset.registry.junction(Category::Material).unwrap();
        assert_eq!(junction.rows(), &[(1, 1), (1, 2), (1, 3), (2, 2), (2, 4)]);
    }

    #[test]
    fn test_repeated_token_links_once() {
        let schema = schema();
        let mut normalizer = Normalizer::new(&schema);
        let record = normalizer
            .normalize_row(&row(&[("material", "clay, clay")]))
            .unwrap()
            .clone();
        let dataset = normalizer.finish();

        assert_eq!(cell(&schema, &record, "material"), &CellValue::Keys(vec![1]));
        assert_eq!(dataset.registry.junction(Category::Material).unwrap().rows(), &[(1, 1)]);
    }

    #[test]
    fn test_case_folding_collapses_values() {
        let schema = schema();
        let mut normalizer = Normalizer::new(&schema);
        normalizer.normalize_row(&row(&[("material", "Ochre")])).unwrap();
        normalizer.normalize_row(&row(&[("material", "ochre")])).unwrap();
        let dataset = normalizer.finish();

        let table = dataset.registry.text_table(Category::Material).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.value(1).map(String::as_str), Some("ochre"));
    }

    #[test]
    fn test_filenames_and_citations_keep_case() {
        let schema = schema();
        let mut normalizer = Normalizer::new(&schema);
        normalizer
            .normalize_row(&row(&[
                ("linked_filenames", "IMG_01.JPG; img_01.jpg"),
                ("source_citation", "Roth 1897"),
            ]))
            .unwrap();
        let dataset = normalizer.finish();

        let files = dataset.registry.text_table(Category::LinkedFilenames).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files.key_of("IMG_01.JPG"), Some(1));
        let citations = dataset.registry.text_table(Category::SourceCitation).unwrap();
        assert_eq!(citations.key_of("Roth 1897"), Some(1));
    }

    #[test]
    fn test_single_value_lookup() {
        let schema = schema();
        let mut normalizer = Normalizer::new(&schema);
        normalizer.normalize_row(&row(&[("item_type", "Stick")])).unwrap();
        normalizer.normalize_row(&row(&[("item_type", "stick ")])).unwrap();
        let dataset = normalizer.finish();

        for record in &dataset.records {
            assert_eq!(cell(&schema, record, "item_type"), &CellValue::Key(1));
        }
        assert!(dataset.registry.junction(Category::ItemType).is_none());
    }

    #[test]
    fn test_ling_area_columns_share_one_table() {
        let schema = schema();
        let mut normalizer = Normalizer::new(&schema);
        let area = "Chirila: Yolngu  Austlang: N198 : Djambarrpuyngu  Glottolog: djam1255";
        let other = "Chirila: Warlpiri  Austlang: C15 : Warlpiri  Glottolog: warl1254";
        normalizer
            .normalize_row(&row(&[("ling_area_1", area), ("ling_area_2", other)]))
            .unwrap();
        normalizer.normalize_row(&row(&[("ling_area_3", area)])).unwrap();
        let dataset = normalizer.finish();

        assert_eq!(dataset.registry.ling_area().len(), 2);
        assert_eq!(cell(&schema, &dataset.records[0], "ling_area_2"), &CellValue::Key(2));
        assert_eq!(cell(&schema, &dataset.records[1], "ling_area_3"), &CellValue::Key(1));
    }

    #[test]
    fn test_unstructured_ling_area_is_recovered() {
        let schema = schema();
        let mut normalizer = Normalizer::new(&schema);
        normalizer
            .normalize_row(&row(&[("ling_area_1", "Western Desert")]))
            .unwrap();
        let dataset = normalizer.finish();

        assert_eq!(cell(&schema, &dataset.records[0], "ling_area_1"), &CellValue::Empty);
        assert!(dataset.registry.ling_area().is_empty());
        assert!(matches!(
            &dataset.diagnostics[..],
            [Diagnostic::CompositeExtraction { row: 1, .. }]
        ));
    }

    #[test]
    fn test_holder_file_is_flat() {
        let schema = schema();
        let mut normalizer = Normalizer::new(&schema);
        normalizer
            .normalize_row(&row(&[("holder_file", "Museum Victoria  Box 12")]))
            .unwrap();
        let dataset = normalizer.finish();

        assert_eq!(cell(&schema, &dataset.records[0], "holder_file"), &CellValue::Key(1));
        let table = dataset.registry.text_table(Category::HolderFile).unwrap();
        assert_eq!(table.len(), 2);
        assert!(matches!(
            &dataset.diagnostics[..],
            [Diagnostic::ExtraFlatTokens { kept, .. }] if kept == "Museum Victoria"
        ));
    }

    #[test]
    fn test_empty_tokens_are_dropped() {
        let schema = schema();
        let mut normalizer = Normalizer::new(&schema);
        normalizer
            .normalize_row(&row(&[("linked_filenames", "a.jpg; ;b.jpg;")]))
            .unwrap();
        normalizer.normalize_row(&row(&[("technique", " , ")])).unwrap();
        let dataset = normalizer.finish();

        assert_eq!(
            cell(&schema, &dataset.records[0], "linked_filenames"),
            &CellValue::Keys(vec![1, 2])
        );
        assert_eq!(cell(&schema, &dataset.records[1], "technique"), &CellValue::Empty);
    }

    #[test]
    fn test_short_row_is_rejected() {
        let schema = schema();
        let mut normalizer = Normalizer::new(&schema);
        let mut cells = row(&[]);
        cells.pop();

        let err = normalizer.normalize_row(&cells).unwrap_err();
        assert!(matches!(
            err,
            Error::SchemaMismatch {
                line: 2,
                expected: 42,
                found: 41
            }
        ));
        assert!(normalizer.records().is_empty());
    }

    #[test]
    fn test_duplicate_identifiers_reported() {
        let schema = schema();
        let mut normalizer = Normalizer::new(&schema);
        normalizer.normalize_row(&row(&[("amsd_id", "AMSD_001")])).unwrap();
        normalizer.normalize_row(&row(&[("amsd_id", "AMSD_002")])).unwrap();
        normalizer.normalize_row(&row(&[("amsd_id", "AMSD_001")])).unwrap();
        let dataset = normalizer.finish();

        assert_eq!(
            dataset.diagnostics,
            vec![Diagnostic::DuplicateIdentifier {
                column: "amsd_id".to_string(),
                value: "AMSD_001".to_string(),
                rows: vec![1, 3],
            }]
        );
    }
}
