//! Row builders shared by unit tests

use crate::schema::FIELDS;

/// The export's header line
pub fn header() -> Vec<String> {
    FIELDS.iter().map(|f| f.header.to_string()).collect()
}

/// A data row with the named output columns set and every other cell empty
pub fn row(values: &[(&str, &str)]) -> Vec<String> {
    let mut cells = vec![String::new(); FIELDS.len()];
    for (name, value) in values {
        let idx = FIELDS
            .iter()
            .position(|f| f.name == *name)
            .unwrap_or_else(|| panic!("unknown column '{}'", name));
        cells[idx] = value.to_string();
    }
    cells
}

/// Render rows as a tab-delimited export
pub fn to_tsv(rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    for row in rows {
        out.push_str(&row.join("\t"));
        out.push('\n');
    }
    out
}
