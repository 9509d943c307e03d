//! Image/annotation pairing, resolved once when the dataset is opened.

use std::path::PathBuf;

use crate::config::DatasetLayout;
use crate::constants::{ANNOTATION_EXTENSION, IMAGE_SUFFIX};
use crate::error::DatasetError;

/// Derive the annotation file name for an image file name.
///
/// Every occurrence of `.jpg` is removed, not only a trailing extension,
/// before `.xml` is appended: `a.jpg` pairs with `a.xml`, while
/// `myjpg.jpg.file.jpg` pairs with `myjpg.file.xml`. The match is
/// case-sensitive.
pub fn annotation_file_name(image_name: &str) -> String {
    format!(
        "{}{}",
        image_name.replace(IMAGE_SUFFIX, ""),
        ANNOTATION_EXTENSION
    )
}

/// One image and the annotation file it is paired with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Image file name inside the image folder
    pub file_name: String,
    /// Full path of the image
    pub image_path: PathBuf,
    /// Full path of the paired annotation; not checked for existence
    pub annotation_path: PathBuf,
}

/// Sorted listing of the image folder with resolved annotation paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// List the image folder of `layout` and pair every file with its annotation.
    ///
    /// Only the image folder is read. Directories (also when reached through
    /// a symlink) and files whose names are not valid UTF-8 are skipped with
    /// a warning. File names are sorted by their UTF-8 bytes, so the order is
    /// the same on every run over the same directory contents.
    pub fn scan(layout: &DatasetLayout) -> Result<Self, DatasetError> {
        let image_dir = layout.image_path();
        let annotation_dir = layout.annotation_path();

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&image_dir).map_err(|e| DatasetError::io(&image_dir, e))? {
            let entry = entry.map_err(|e| DatasetError::io(&image_dir, e))?;
            let path = entry.path();
            // Follows symlinks. A dangling link is kept and fails when fetched.
            match std::fs::metadata(&path) {
                Ok(metadata) if metadata.is_dir() => {
                    log::warn!("Skipping directory {:?} in image folder", path);
                    continue;
                }
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(DatasetError::io(&path, e)),
            }

            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    log::warn!("Skipping non-UTF-8 file name {:?} in image folder", raw);
                    continue;
                }
            };
            names.push(name);
        }
        names.sort();

        let entries = names
            .into_iter()
            .map(|file_name| ManifestEntry {
                image_path: image_dir.join(&file_name),
                annotation_path: annotation_dir.join(annotation_file_name(&file_name)),
                file_name,
            })
            .collect();

        Ok(Self { entries })
    }

    /// Build a manifest from explicit entries, in the given order.
    pub fn from_entries(entries: Vec<ManifestEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ManifestEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ManifestEntry> {
        self.entries.iter()
    }
}
