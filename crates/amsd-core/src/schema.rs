//! Field schema for the collection export
//!
//! The export has a fixed set of columns. Each column is described by a
//! [`FieldDef`] in [`FIELDS`]; [`Schema::standard`] compiles the patterns and
//! validates the definitions once, before any row is read.

use crate::diagnostics::Diagnostic;
use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Number of columns in the collection export
pub const EXPECTED_COLUMNS: usize = 42;

/// Output name of the primary key column
pub const PK_COLUMN: &str = "pk";

/// Structured pattern for linguistic area cells
pub const LING_AREA_PATTERN: &str =
    r"Chirila\s*:\s*(.*?)  +Austlang\s*:\s*(.*?)\s*:(.*?)  +Glottolog\s*:\s*(.*)\s*";

/// Lookup categories, in output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Keywords,
    SemDomain,
    LinkedFilenames,
    ItemType,
    Material,
    Technique,
    LingArea,
    SourceCitation,
    SourceType,
    HolderFile,
    DataEntry,
}

impl Category {
    /// All categories in output order
    pub const ALL: [Category; 11] = [
        Category::Keywords,
        Category::SemDomain,
        Category::LinkedFilenames,
        Category::ItemType,
        Category::Material,
        Category::Technique,
        Category::LingArea,
        Category::SourceCitation,
        Category::SourceType,
        Category::HolderFile,
        Category::DataEntry,
    ];

    /// Name of the lookup table (and output file stem)
    pub fn table_name(self) -> &'static str {
        match self {
            Category::Keywords => "keywords",
            Category::SemDomain => "sem_domain",
            Category::LinkedFilenames => "linked_filenames",
            Category::ItemType => "item_type",
            Category::Material => "material",
            Category::Technique => "technique",
            Category::LingArea => "ling_area",
            Category::SourceCitation => "source_citation",
            Category::SourceType => "source_type",
            Category::HolderFile => "holder_file",
            Category::DataEntry => "data_entry",
        }
    }

    /// Resolve a table name back to its category
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.table_name() == name)
    }

    /// Whether records link to this category through a junction table.
    ///
    /// Flat categories hold at most one value per record.
    pub fn has_junction(self) -> bool {
        !matches!(
            self,
            Category::LingArea | Category::HolderFile | Category::ItemType
        )
    }

    /// Junction table name, e.g. `x_sticks_material`
    pub fn junction_name(self) -> Option<String> {
        self.has_junction()
            .then(|| format!("x_sticks_{}", self.table_name()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Uncompiled routing rule of a column
#[derive(Debug, Clone, Copy)]
pub enum RuleDef {
    Text,
    Coordinate,
    Lookup(Category, Option<&'static str>),
    LinguisticArea(&'static str),
}

/// Static definition of one export column
#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub header: &'static str,
    pub name: &'static str,
    pub rule: RuleDef,
    pub case_fold: bool,
    pub table_exclusive: bool,
    pub unique: bool,
}

impl FieldDef {
    const fn new(header: &'static str, name: &'static str, rule: RuleDef) -> Self {
        Self {
            header,
            name,
            rule,
            case_fold: false,
            table_exclusive: false,
            unique: false,
        }
    }

    const fn text(header: &'static str, name: &'static str) -> Self {
        Self::new(header, name, RuleDef::Text)
    }

    const fn coordinate(header: &'static str, name: &'static str) -> Self {
        Self::new(header, name, RuleDef::Coordinate)
    }

    const fn lookup(
        header: &'static str,
        name: &'static str,
        category: Category,
        split: Option<&'static str>,
    ) -> Self {
        Self::new(header, name, RuleDef::Lookup(category, split))
    }

    const fn ling_area(header: &'static str, name: &'static str) -> Self {
        Self::new(header, name, RuleDef::LinguisticArea(LING_AREA_PATTERN))
    }

    const fn folded(self) -> Self {
        Self {
            case_fold: true,
            ..self
        }
    }

    const fn exclusive(self) -> Self {
        Self {
            table_exclusive: true,
            ..self
        }
    }

    const fn unique(self) -> Self {
        Self {
            unique: true,
            ..self
        }
    }
}

/// Column definitions of the collection export, in input order
pub const FIELDS: [FieldDef; EXPECTED_COLUMNS] = [
    FieldDef::text("AMSD ID", "amsd_id").unique(),
    FieldDef::text("Title", "title"),
    FieldDef::lookup("Keywords", "keywords", Category::Keywords, Some(r" {2,}"))
        .folded()
        .exclusive(),
    FieldDef::text("Description", "description"),
    FieldDef::text("Creator of Object", "obj_creator"),
    FieldDef::text("Date Created", "date_created"),
    FieldDef::text("Notes on date created", "note_place_created"),
    FieldDef::text("Place Created", "place_created"),
    FieldDef::lookup("Item type", "item_type", Category::ItemType, None)
        .folded()
        .exclusive(),
    FieldDef::ling_area("Linguistic area", "ling_area_1"),
    FieldDef::ling_area("Linguistic area 2", "ling_area_2"),
    FieldDef::ling_area("Linguistic area 3", "ling_area_3"),
    FieldDef::text("Notes on Linguistic area(s)", "notes_ling_area"),
    FieldDef::text(
        "Term for 'message stick' (or related) in language",
        "stick_term",
    ),
    FieldDef::text("Message", "message"),
    FieldDef::text("Motifs", "motifs"),
    FieldDef::text("Motif transcription", "motif_transcription"),
    FieldDef::lookup(
        "Semantic domain",
        "sem_domain",
        Category::SemDomain,
        Some(r" {2,}"),
    )
    .folded()
    .exclusive(),
    FieldDef::text("Dimension 1 (mm)", "dim_1"),
    FieldDef::text("Dimension 2 (mm)", "dim_2"),
    FieldDef::text("Dimension 3 (mm)", "dim_3"),
    FieldDef::lookup("Material", "material", Category::Material, Some(r" *, *|  +"))
        .folded()
        .exclusive(),
    FieldDef::lookup("Technique", "technique", Category::Technique, Some(r" *, *"))
        .folded()
        .exclusive(),
    FieldDef::lookup(
        "Source citation",
        "source_citation",
        Category::SourceCitation,
        Some(r"  +| *; "),
    )
    .exclusive(),
    FieldDef::lookup("Source type", "source_type", Category::SourceType, Some(r"  +"))
        .folded()
        .exclusive(),
    FieldDef::text("Date Collected", "date_collected"),
    FieldDef::lookup(
        "Institution/Holder: file",
        "holder_file",
        Category::HolderFile,
        Some(r"  +"),
    ),
    FieldDef::text("Institution/Holder: object identifier", "holder_obj_id"),
    FieldDef::text("Collector", "collector"),
    FieldDef::text("Place Collected", "place_collected"),
    FieldDef::text("Creator Copyright", "creator_coyright"),
    FieldDef::text("File Copyright", "file_copyright"),
    FieldDef::coordinate("Latitude", "lat"),
    FieldDef::coordinate("Longitude", "long"),
    FieldDef::text("Notes on coordinates", "notes_coords"),
    FieldDef::text("URL (collecting institution)", "url_institution"),
    FieldDef::text("URL (source document)", "url_source_1"),
    FieldDef::text("URL (source document 2)", "url_source_2"),
    FieldDef::text("IRN", "irn"),
    FieldDef::text("Notes", "notes"),
    FieldDef::lookup(
        "Data entry (OCCAMS)",
        "data_entry",
        Category::DataEntry,
        Some(r"  +"),
    ),
    FieldDef::lookup(
        "Linked Filename",
        "linked_filenames",
        Category::LinkedFilenames,
        Some(r" *; *"),
    )
    .exclusive(),
];

/// Compiled routing rule of a column
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// Stored on the record as trimmed text
    Text,
    /// Stored on the record as decimal degrees
    Coordinate,
    /// Routed through a lookup table, optionally tokenized first
    Lookup {
        category: Category,
        split: Option<Regex>,
    },
    /// Composite cell extracted into the `ling_area` table
    LinguisticArea { pattern: Regex },
}

/// A compiled column definition
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Header text expected in the export
    pub header: &'static str,
    /// Output column name
    pub name: &'static str,
    pub kind: FieldKind,
    /// Lower-case values before storing them
    pub case_fold: bool,
    /// Value lives only in its own table and junction
    pub table_exclusive: bool,
    /// Repeated values across rows are reported
    pub unique: bool,
}

impl FieldSpec {
    /// Lookup category the column feeds, if any
    pub fn category(&self) -> Option<Category> {
        match &self.kind {
            FieldKind::Lookup { category, .. } => Some(*category),
            FieldKind::LinguisticArea { .. } => Some(Category::LingArea),
            FieldKind::Text | FieldKind::Coordinate => None,
        }
    }
}

/// The ordered, compiled field schema
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    /// Compile the collection export schema
    pub fn standard() -> Result<Self> {
        let schema = Self::compile(&FIELDS)?;
        if schema.len() != EXPECTED_COLUMNS {
            return Err(Error::InvalidSchema(format!(
                "expected {} fields, found {}",
                EXPECTED_COLUMNS,
                schema.len()
            )));
        }
        Ok(schema)
    }

    /// Compile and validate a list of field definitions
    pub fn compile(defs: &[FieldDef]) -> Result<Self> {
        let mut names = HashSet::new();
        let mut fields = Vec::with_capacity(defs.len());

        for def in defs {
            if def.name == PK_COLUMN || !names.insert(def.name) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate output column '{}'",
                    def.name
                )));
            }

            let kind = match def.rule {
                RuleDef::Text => FieldKind::Text,
                RuleDef::Coordinate => FieldKind::Coordinate,
                RuleDef::Lookup(Category::LingArea, _) => {
                    return Err(Error::InvalidSchema(format!(
                        "column '{}' routes to ling_area without the composite pattern",
                        def.name
                    )));
                }
                RuleDef::Lookup(category, split) => FieldKind::Lookup {
                    category,
                    split: split.map(|p| compile_pattern(def.name, p)).transpose()?,
                },
                RuleDef::LinguisticArea(pattern) => {
                    let pattern = compile_pattern(def.name, pattern)?;
                    // whole match + four sub-fields
                    if pattern.captures_len() != 5 {
                        return Err(Error::InvalidSchema(format!(
                            "linguistic area pattern of '{}' must capture 4 groups",
                            def.name
                        )));
                    }
                    FieldKind::LinguisticArea { pattern }
                }
            };

            fields.push(FieldSpec {
                header: def.header,
                name: def.name,
                kind,
                case_fold: def.case_fold,
                table_exclusive: def.table_exclusive,
                unique: def.unique,
            });
        }

        Ok(Self { fields })
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Find a field by output name
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Column index of a field by output name
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Header of the primary table: `pk` followed by every output name
    pub fn header_row(&self) -> Vec<String> {
        std::iter::once(PK_COLUMN)
            .chain(self.fields.iter().map(|f| f.name))
            .map(str::to_string)
            .collect()
    }

    /// Validate the export's header line.
    ///
    /// A wrong column count is fatal; differing header texts are only
    /// reported, since the columns are matched by position.
    pub fn check_header<S: AsRef<str>>(&self, header: &[S]) -> Result<Vec<Diagnostic>> {
        if header.len() != self.len() {
            return Err(Error::SchemaMismatch {
                line: 1,
                expected: self.len(),
                found: header.len(),
            });
        }

        let mut diagnostics = Vec::new();
        for (column, (field, found)) in self.fields.iter().zip(header).enumerate() {
            let found: &str = found.as_ref();
            if found.trim() != field.header {
                diagnostics.push(Diagnostic::HeaderMismatch {
                    column: column + 1,
                    expected: field.header.to_string(),
                    found: found.trim().to_string(),
                });
            }
        }
        Ok(diagnostics)
    }
}

fn compile_pattern(field: &str, pattern: &str) -> Result<Regex> {
    if pattern.is_empty() {
        return Err(Error::InvalidSchema(format!(
            "empty split pattern on column '{}'",
            field
        )));
    }
    Ok(Regex::new(pattern)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names_where(schema: &Schema, pred: impl Fn(&FieldSpec) -> bool) -> Vec<&'static str> {
        let mut names: Vec<&str> = schema
            .fields()
            .iter()
            .filter(|f| pred(f))
            .map(|f| f.name)
            .collect();
        names.sort_unstable();
        names
    }

    #[test]
    fn test_standard_schema_compiles() {
        let schema = Schema::standard().unwrap();
        assert_eq!(schema.len(), EXPECTED_COLUMNS);
        assert_eq!(schema.fields()[0].name, "amsd_id");
        assert_eq!(schema.fields()[41].name, "linked_filenames");
    }

    #[test]
    fn test_case_folded_set() {
        let schema = Schema::standard().unwrap();
        assert_eq!(
            names_where(&schema, |f| f.case_fold),
            vec![
                "item_type",
                "keywords",
                "material",
                "sem_domain",
                "source_type",
                "technique"
            ]
        );
    }

    #[test]
    fn test_table_exclusive_set() {
        let schema = Schema::standard().unwrap();
        assert_eq!(
            names_where(&schema, |f| f.table_exclusive),
            vec![
                "item_type",
                "keywords",
                "linked_filenames",
                "material",
                "sem_domain",
                "source_citation",
                "source_type",
                "technique"
            ]
        );
    }

    #[test]
    fn test_header_row() {
        let schema = Schema::standard().unwrap();
        let header = schema.header_row();
        assert_eq!(header.len(), EXPECTED_COLUMNS + 1);
        assert_eq!(header[0], "pk");
        assert_eq!(header[1], "amsd_id");
    }

    #[test]
    fn test_check_header_count_mismatch() {
        let schema = Schema::standard().unwrap();
        let header = vec!["AMSD ID"; 41];
        let err = schema.check_header(&header).unwrap_err();
        assert!(matches!(
            err,
            Error::SchemaMismatch {
                expected: 42,
                found: 41,
                ..
            }
        ));
    }

    #[test]
    fn test_check_header_text_mismatch_is_reported() {
        let schema = Schema::standard().unwrap();
        let mut header: Vec<&str> = FIELDS.iter().map(|f| f.header).collect();
        assert!(schema.check_header(&header).unwrap().is_empty());

        header[1] = "Name";
        let diags = schema.check_header(&header).unwrap();
        assert_eq!(diags.len(), 1);
        assert!(matches!(&diags[0], Diagnostic::HeaderMismatch { column: 2, .. }));
    }

    #[test]
    fn test_compile_rejects_duplicate_names() {
        let defs = [FieldDef::text("A", "a"), FieldDef::text("B", "a")];
        assert!(matches!(
            Schema::compile(&defs),
            Err(Error::InvalidSchema(_))
        ));
    }

    #[test]
    fn test_compile_rejects_bad_pattern() {
        let defs = [FieldDef::lookup("A", "a", Category::Keywords, Some("(unclosed"))];
        assert!(matches!(Schema::compile(&defs), Err(Error::Pattern(_))));
    }

    #[test]
    fn test_compile_rejects_plain_ling_area_lookup() {
        let defs = [FieldDef::lookup("A", "a", Category::LingArea, None)];
        assert!(matches!(
            Schema::compile(&defs),
            Err(Error::InvalidSchema(_))
        ));
    }

    #[test]
    fn test_category_names_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_name(category.table_name()), Some(category));
        }
        assert_eq!(Category::from_name("nope"), None);
    }

    #[test]
    fn test_junction_categories() {
        assert_eq!(
            Category::Material.junction_name().as_deref(),
            Some("x_sticks_material")
        );
        assert!(Category::HolderFile.junction_name().is_none());
        assert!(Category::LingArea.junction_name().is_none());
        assert!(Category::ItemType.junction_name().is_none());
    }
}
