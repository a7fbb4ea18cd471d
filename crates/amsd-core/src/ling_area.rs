//! Composite linguistic area values
//!
//! A single export cell such as
//! `Chirila: Yolngu  Austlang: N198 : Djambarrpuyngu  Glottolog: djam1255`
//! names the same language area in three reference systems.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Glottolog placeholder written by data entry when no code exists
const NO_GLOTTOLOG_CODE: &str = "no code";

/// The four sub-fields of a linguistic area cell
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinguisticArea {
    pub chirila_name: String,
    pub austlang_code: String,
    pub austlang_name: String,
    pub glottolog_code: String,
}

impl LinguisticArea {
    /// Apply the structured pattern to a cell; `None` when it does not match.
    ///
    /// The pattern must have four capture groups, in field order.
    pub fn extract(pattern: &Regex, cell: &str) -> Option<Self> {
        let caps = pattern.captures(cell)?;
        let group = |i: usize| {
            caps.get(i)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default()
        };

        Some(Self {
            chirila_name: group(1),
            austlang_code: group(2),
            austlang_name: group(3),
            glottolog_code: group(4),
        })
    }

    /// Glottolog code as written to the output table
    pub fn glottolog_output(&self) -> &str {
        if self.glottolog_code == NO_GLOTTOLOG_CODE {
            ""
        } else {
            &self.glottolog_code
        }
    }

    /// Output columns after `pk`
    pub fn columns(&self) -> [&str; 4] {
        [
            self.chirila_name.as_str(),
            self.austlang_code.as_str(),
            self.austlang_name.as_str(),
            self.glottolog_output(),
        ]
    }
}

/// Composite key text, sub-fields joined with `|`
impl fmt::Display for LinguisticArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}|{}",
            self.chirila_name, self.austlang_code, self.austlang_name, self.glottolog_code
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::LING_AREA_PATTERN;

    fn pattern() -> Regex {
        Regex::new(LING_AREA_PATTERN).unwrap()
    }

    #[test]
    fn test_extract_full_cell() {
        let cell = "Chirila: Yolngu  Austlang: N198 : Djambarrpuyngu  Glottolog: djam1255";
        let area = LinguisticArea::extract(&pattern(), cell).unwrap();

        assert_eq!(area.chirila_name, "Yolngu");
        assert_eq!(area.austlang_code, "N198");
        assert_eq!(area.austlang_name, "Djambarrpuyngu");
        assert_eq!(area.glottolog_code, "djam1255");
        assert_eq!(area.to_string(), "Yolngu|N198|Djambarrpuyngu|djam1255");
    }

    #[test]
    fn test_no_code_is_blank_in_output() {
        let cell = "Chirila : Kala Lagaw Ya   Austlang : Y1 : Kala Lagaw Ya  Glottolog : no code";
        let area = LinguisticArea::extract(&pattern(), cell).unwrap();

        assert_eq!(area.glottolog_code, "no code");
        assert_eq!(area.columns(), ["Kala Lagaw Ya", "Y1", "Kala Lagaw Ya", ""]);
    }

    #[test]
    fn test_single_spaced_cell_does_not_match() {
        let cell = "Chirila: Yolngu Austlang: N198 : Djambarrpuyngu Glottolog: djam1255";
        assert!(LinguisticArea::extract(&pattern(), cell).is_none());
    }

    #[test]
    fn test_free_text_does_not_match() {
        assert!(LinguisticArea::extract(&pattern(), "Arnhem Land").is_none());
    }
}
