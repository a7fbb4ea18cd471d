//! Media catalog access and cross-referencing of linked filenames
//!
//! The media store itself is remote; the core only reads its catalog, a JSON
//! snapshot mapping object ids to object metadata and bitstreams.

use crate::diagnostics::Diagnostic;
use crate::error::{Error, Result};
use crate::registry::{Key, LookupTable};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

/// Derivative bitstreams generated by the media store, never the original upload
pub const DERIVATIVE_BITSTREAMS: [&str; 2] = ["thumbnail.jpg", "web.jpg"];

/// An object in the media store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaObject {
    /// Object name, the stem of the uploaded file
    pub name: String,
    /// Object id in the store
    pub storage_id: String,
    /// Bitstream ids in catalog order
    pub bitstream_ids: Vec<String>,
    /// File name recorded at upload time
    pub path: Option<String>,
}

impl MediaObject {
    /// First bitstream that is not a derivative
    pub fn original_bitstream(&self) -> Option<&str> {
        self.bitstream_ids
            .iter()
            .map(String::as_str)
            .find(|id| !DERIVATIVE_BITSTREAMS.contains(id))
    }
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    metadata: CatalogMetadata,
    #[serde(default)]
    bitstreams: Vec<CatalogBitstream>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogMetadata {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CatalogBitstream {
    #[serde(rename = "bitstreamid", alias = "id")]
    id: String,
}

/// Load media objects from a catalog JSON file
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<Vec<MediaObject>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let objects = parse_catalog(&content)?;
    tracing::info!("loaded {} media objects from {}", objects.len(), path.display());
    Ok(objects)
}

/// Parse catalog JSON; objects without a name are skipped
pub fn parse_catalog(content: &str) -> Result<Vec<MediaObject>> {
    let entries: BTreeMap<String, CatalogEntry> = serde_json::from_str(content)?;

    let mut objects = Vec::with_capacity(entries.len());
    for (oid, entry) in entries {
        let Some(name) = entry.metadata.name else {
            tracing::debug!("skipping catalog object {} without a name", oid);
            continue;
        };
        objects.push(MediaObject {
            name,
            storage_id: entry.id.unwrap_or(oid),
            bitstream_ids: entry.bitstreams.into_iter().map(|b| b.id).collect(),
            path: entry.metadata.path,
        });
    }
    Ok(objects)
}

/// Media objects by name
#[derive(Debug, Clone, Default)]
pub struct MediaIndex {
    by_name: HashMap<String, MediaObject>,
}

impl MediaIndex {
    /// Index objects by name; a later object with the same name wins
    pub fn new(objects: impl IntoIterator<Item = MediaObject>) -> Self {
        let by_name = objects
            .into_iter()
            .map(|o| (o.name.clone(), o))
            .collect();
        Self { by_name }
    }

    pub fn get(&self, name: &str) -> Option<&MediaObject> {
        self.by_name.get(name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// A `linked_filenames` row with its resolved storage location
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaLink {
    pub pk: Key,
    pub name: String,
    /// Object id, empty when unmatched
    pub oid: String,
    /// Original bitstream id, empty when unresolved
    pub path: String,
}

impl MediaLink {
    /// Output row `pk,name,oid,path`
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.pk.to_string(),
            self.name.clone(),
            self.oid.clone(),
            self.path.clone(),
        ]
    }
}

/// Result of cross-referencing the linked filenames
#[derive(Debug, Clone, Default)]
pub struct CrossReference {
    pub links: Vec<MediaLink>,
    pub diagnostics: Vec<Diagnostic>,
}

/// File name without its last extension
pub fn file_stem(name: &str) -> &str {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
}

/// Resolve every linked filename against the media index, in key order
pub fn cross_reference(filenames: &LookupTable<String>, index: &MediaIndex) -> CrossReference {
    let mut result = CrossReference::default();

    for (pk, name) in filenames.iter() {
        let link = match index.get(file_stem(name)) {
            Some(object) => {
                let path = match object.original_bitstream() {
                    Some(id) => id.to_string(),
                    None => {
                        result.diagnostics.push(Diagnostic::MissingBitstream {
                            pk,
                            name: name.clone(),
                            oid: object.storage_id.clone(),
                        });
                        String::new()
                    }
                };
                MediaLink {
                    pk,
                    name: name.clone(),
                    oid: object.storage_id.clone(),
                    path,
                }
            }
            None => {
                result.diagnostics.push(Diagnostic::MediaLookupMiss {
                    pk,
                    name: name.clone(),
                });
                MediaLink {
                    pk,
                    name: name.clone(),
                    oid: String::new(),
                    path: String::new(),
                }
            }
        };
        result.links.push(link);
    }

    for diagnostic in &result.diagnostics {
        diagnostic.report();
    }
    result
}

/// Linked file names that have no uploaded counterpart.
///
/// Each cell is a `;`-separated list of file names; names are compared with
/// the upload file names recorded in the catalog. Sorted by descending count,
/// then name.
pub fn missing_files<'c>(
    cells: impl IntoIterator<Item = &'c str>,
    objects: &[MediaObject],
) -> Vec<(String, usize)> {
    let uploaded: HashSet<&str> = objects.iter().filter_map(|o| o.path.as_deref()).collect();

    let mut missing: HashMap<&str, usize> = HashMap::new();
    for cell in cells {
        for name in cell.split(';').map(str::trim).filter(|n| !n.is_empty()) {
            if !uploaded.contains(name) {
                *missing.entry(name).or_insert(0) += 1;
            }
        }
    }

    let mut missing: Vec<(String, usize)> = missing
        .into_iter()
        .map(|(name, count)| (name.to_string(), count))
        .collect();
    missing.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    missing
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(name: &str, oid: &str, bitstreams: &[&str]) -> MediaObject {
        MediaObject {
            name: name.to_string(),
            storage_id: oid.to_string(),
            bitstream_ids: bitstreams.iter().map(|b| b.to_string()).collect(),
            path: Some(format!("{}.tif", name)),
        }
    }

    fn filenames(names: &[&str]) -> LookupTable<String> {
        let mut table = LookupTable::new();
        for name in names {
            table.intern(name.to_string());
        }
        table
    }

    #[test]
    fn test_resolves_original_bitstream() {
        let index = MediaIndex::new(vec![object(
            "stick_01",
            "EAEA0-1",
            &["thumbnail.jpg", "web.jpg", "orig.tif"],
        )]);
        let result = cross_reference(&filenames(&["stick_01.tif"]), &index);

        assert_eq!(
            result.links,
            vec![MediaLink {
                pk: 1,
                name: "stick_01.tif".to_string(),
                oid: "EAEA0-1".to_string(),
                path: "orig.tif".to_string(),
            }]
        );
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_only_derivatives_gives_empty_path() {
        let index = MediaIndex::new(vec![object(
            "stick_01",
            "EAEA0-1",
            &["thumbnail.jpg", "web.jpg"],
        )]);
        let result = cross_reference(&filenames(&["stick_01.tif"]), &index);

        assert_eq!(result.links[0].oid, "EAEA0-1");
        assert_eq!(result.links[0].path, "");
        assert!(matches!(
            &result.diagnostics[..],
            [Diagnostic::MissingBitstream { pk: 1, .. }]
        ));
    }

    #[test]
    fn test_unmatched_name() {
        let index = MediaIndex::new(vec![object("stick_01", "EAEA0-1", &["a.tif"])]);
        let result = cross_reference(&filenames(&["stick_01.jpg", "stick_02.jpg"]), &index);

        assert_eq!(result.links[0].path, "a.tif");
        assert_eq!(result.links[1].to_row(), vec!["2", "stick_02.jpg", "", ""]);
        assert_eq!(
            result.diagnostics,
            vec![Diagnostic::MediaLookupMiss {
                pk: 2,
                name: "stick_02.jpg".to_string()
            }]
        );
    }

    #[test]
    fn test_later_object_wins() {
        let index = MediaIndex::new(vec![
            object("a", "first", &[]),
            object("a", "second", &[]),
        ]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("a").unwrap().storage_id, "second");
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("stick_01.tif"), "stick_01");
        assert_eq!(file_stem("archive.tar.gz"), "archive.tar");
        assert_eq!(file_stem("noext"), "noext");
    }

    #[test]
    fn test_parse_catalog() {
        let json = r#"{
            "EAEA0-2": {
                "id": "EAEA0-2",
                "metadata": {"name": "stick_02", "path": "stick_02.jpg", "collection": "amsd"},
                "bitstreams": [
                    {"bitstreamid": "stick_02.jpg", "content-type": "image/jpeg"},
                    {"bitstreamid": "thumbnail.jpg"}
                ]
            },
            "EAEA0-1": {
                "metadata": {"name": "stick_01"},
                "bitstreams": [{"id": "stick_01.tif"}]
            },
            "EAEA0-3": {"metadata": {}, "bitstreams": []}
        }"#;
        let objects = parse_catalog(json).unwrap();

        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].name, "stick_01");
        assert_eq!(objects[0].storage_id, "EAEA0-1");
        assert_eq!(objects[0].bitstream_ids, vec!["stick_01.tif"]);
        assert_eq!(objects[0].path, None);
        assert_eq!(objects[1].path.as_deref(), Some("stick_02.jpg"));
        assert_eq!(objects[1].original_bitstream(), Some("stick_02.jpg"));
    }

    #[test]
    fn test_missing_files_sorted_by_count() {
        let objects = vec![object("a", "1", &[])];
        let cells = ["a.tif; b.jpg", "c.jpg;b.jpg", "", "c.jpg ; b.jpg"];
        let missing = missing_files(cells.iter().copied(), &objects);

        assert_eq!(
            missing,
            vec![("b.jpg".to_string(), 3), ("c.jpg".to_string(), 2)]
        );
    }
}
