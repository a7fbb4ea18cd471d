//! Image directory scanner and offline upload planning

use crate::error::Result;
use crate::media::MediaIndex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Image formats accepted by the media store
pub const SUPPORTED_IMAGE_TYPES: &[&str] = &["png", "gif", "jpg", "jpeg", "tif", "tiff"];

/// A file found in the image directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageFile {
    /// Full path to the file
    pub path: PathBuf,
    /// File stem, used as the media object name
    pub stem: String,
    /// Whether the extension is a supported image type
    pub supported: bool,
}

/// What an upload of one file would do
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum UploadAction {
    /// Not a supported image format
    Skip { path: PathBuf },
    /// No object with this name yet
    Create { path: PathBuf, name: String },
    /// An object with this name exists and would be replaced
    Replace {
        path: PathBuf,
        name: String,
        oid: String,
    },
}

/// List the files directly inside `dir`, sorted by file name
pub fn scan_images<P: AsRef<Path>>(dir: P) -> Result<Vec<ImageFile>> {
    let mut images = Vec::new();

    for entry in WalkDir::new(dir.as_ref())
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        images.push(ImageFile {
            path: path.to_path_buf(),
            stem: stem.to_string(),
            supported: is_supported(path),
        });
    }

    Ok(images)
}

/// Check the extension against [`SUPPORTED_IMAGE_TYPES`], ignoring case
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SUPPORTED_IMAGE_TYPES.contains(&ext.to_lowercase().as_str()))
}

/// Decide per file whether an upload would create, replace or skip it
pub fn plan_upload(images: &[ImageFile], index: &MediaIndex) -> Vec<UploadAction> {
    images
        .iter()
        .map(|image| {
            if !image.supported {
                return UploadAction::Skip {
                    path: image.path.clone(),
                };
            }
            match index.get(&image.stem) {
                Some(object) => UploadAction::Replace {
                    path: image.path.clone(),
                    name: image.stem.clone(),
                    oid: object.storage_id.clone(),
                },
                None => UploadAction::Create {
                    path: image.path.clone(),
                    name: image.stem.clone(),
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaObject;
    use std::fs;

    #[test]
    fn test_is_supported() {
        assert!(is_supported(Path::new("a.jpg")));
        assert!(is_supported(Path::new("a.TIFF")));
        assert!(!is_supported(Path::new("a.pdf")));
        assert!(!is_supported(Path::new("noext")));
    }

    #[test]
    fn test_scan_is_flat_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.tif"), b"").unwrap();
        fs::write(dir.path().join("a.JPG"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("c.png"), b"").unwrap();

        let images = scan_images(dir.path()).unwrap();
        let stems: Vec<&str> = images.iter().map(|i| i.stem.as_str()).collect();
        assert_eq!(stems, vec!["a", "b", "notes"]);
        assert!(images[0].supported);
        assert!(!images[2].supported);
    }

    #[test]
    fn test_plan_upload() {
        let images = vec![
            ImageFile {
                path: PathBuf::from("a.jpg"),
                stem: "a".to_string(),
                supported: true,
            },
            ImageFile {
                path: PathBuf::from("b.jpg"),
                stem: "b".to_string(),
                supported: true,
            },
            ImageFile {
                path: PathBuf::from("c.pdf"),
                stem: "c".to_string(),
                supported: false,
            },
        ];
        let index = MediaIndex::new(vec![MediaObject {
            name: "a".to_string(),
            storage_id: "EAEA0-1".to_string(),
            bitstream_ids: vec!["a.jpg".to_string()],
            path: Some("a.jpg".to_string()),
        }]);

        let plan = plan_upload(&images, &index);
        assert_eq!(
            plan,
            vec![
                UploadAction::Replace {
                    path: PathBuf::from("a.jpg"),
                    name: "a".to_string(),
                    oid: "EAEA0-1".to_string(),
                },
                UploadAction::Create {
                    path: PathBuf::from("b.jpg"),
                    name: "b".to_string(),
                },
                UploadAction::Skip {
                    path: PathBuf::from("c.pdf"),
                },
            ]
        );
    }
}
