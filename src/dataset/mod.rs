//! Index-addressable detection dataset over image/annotation file pairs.
//!
//! ## Layout
//!
//! ```text
//! <root>/
//!   JPEGImages/   <image file>   # any raster format the decoder recognises
//!   Annotations/  <stem>.xml     # paired by annotation_file_name()
//! ```
//!
//! The image folder is listed and sorted once, when the dataset is opened.
//! Examples are materialized on demand: every [`Dataset::get`] reads the
//! image and the annotation from disk again, so edits to the files are seen
//! by the next fetch. Nothing is cached, and all state after construction is
//! read-only, so fetches from several threads need no coordination.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use xmlset::{Dataset, XmlDataset};
//!
//! let dataset = XmlDataset::open("./Data/")?;
//! let example = dataset.get(0)?;
//! println!("{} boxes", example.annotation.boxes.len());
//! ```

mod manifest;
mod split;

pub use manifest::{Manifest, ManifestEntry, annotation_file_name};
pub use split::{Split, Subset, holdout_split};

use std::path::Path;

use crate::annotation::{Annotation, Example, ImageData};
use crate::config::{DatasetConfig, DatasetLayout};
use crate::error::DatasetError;
use crate::format::read_boxes;
use crate::transforms::{Transform, detection_transform};

/// Random access to a finite sequence of examples.
pub trait Dataset: Send + Sync {
    /// Number of examples.
    fn len(&self) -> usize;

    /// Materialize the example at `index`.
    ///
    /// Fails with [`DatasetError::IndexOutOfRange`] when `index >= len()`.
    fn get(&self, index: usize) -> Result<Example, DatasetError>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Dataset of `JPEGImages/` images paired with `Annotations/` XML files.
pub struct XmlDataset {
    layout: DatasetLayout,
    manifest: Manifest,
    transform: Option<Box<dyn Transform>>,
}

impl XmlDataset {
    /// Open the standard layout under `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, DatasetError> {
        Self::from_layout(DatasetLayout::new(root.as_ref()))
    }

    /// Open a dataset with custom subfolder names.
    ///
    /// Only the image folder is listed here; annotation files are not
    /// looked at until their example is requested.
    pub fn from_layout(layout: DatasetLayout) -> Result<Self, DatasetError> {
        let manifest = Manifest::scan(&layout)?;
        log::info!(
            "Opened dataset at {:?} with {} images",
            layout.root,
            manifest.len()
        );
        Ok(Self {
            layout,
            manifest,
            transform: None,
        })
    }

    /// Open the configured layout and install the configured transform.
    pub fn from_config(config: &DatasetConfig) -> Result<Self, DatasetError> {
        config.validate()?;
        Ok(Self::from_layout(config.layout.clone())?
            .with_transform(detection_transform(&config.transform)))
    }

    /// Install a transform applied to every fetched example.
    pub fn with_transform(mut self, transform: impl Transform + 'static) -> Self {
        self.transform = Some(Box::new(transform));
        self
    }

    /// Remove the transform; fetched examples hold the decoded RGB image.
    pub fn without_transform(mut self) -> Self {
        self.transform = None;
        self
    }

    pub fn has_transform(&self) -> bool {
        self.transform.is_some()
    }

    pub fn layout(&self) -> &DatasetLayout {
        &self.layout
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Paths of the example at `index`, without touching the filesystem.
    pub fn entry(&self, index: usize) -> Result<&ManifestEntry, DatasetError> {
        self.manifest.get(index).ok_or(DatasetError::IndexOutOfRange {
            index,
            len: self.manifest.len(),
        })
    }

    /// Fetch the example at `index` without applying the transform.
    pub fn get_raw(&self, index: usize) -> Result<Example, DatasetError> {
        let entry = self.entry(index)?;

        let image = load_rgb(&entry.image_path)?;
        let boxes = read_boxes(&entry.annotation_path)?;
        log::debug!(
            "Loaded example {} ({}): {}x{}, {} boxes",
            index,
            entry.file_name,
            image.width(),
            image.height(),
            boxes.len()
        );

        Ok(Example::new(image, Annotation::from_boxes(boxes, index)))
    }

    /// Iterate over all examples in index order.
    pub fn iter(&self) -> Iter<'_, Self> {
        Iter::new(self)
    }
}

impl Dataset for XmlDataset {
    fn len(&self) -> usize {
        self.manifest.len()
    }

    fn get(&self, index: usize) -> Result<Example, DatasetError> {
        let example = self.get_raw(index)?;
        match &self.transform {
            Some(transform) => transform.apply(example),
            None => Ok(example),
        }
    }
}

impl std::fmt::Debug for XmlDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XmlDataset")
            .field("layout", &self.layout)
            .field("len", &self.manifest.len())
            .field("has_transform", &self.transform.is_some())
            .finish()
    }
}

/// Read and decode an image file, converting it to three-channel RGB.
fn load_rgb(path: &Path) -> Result<ImageData, DatasetError> {
    let bytes = std::fs::read(path).map_err(|e| DatasetError::io(path, e))?;
    let img = image::load_from_memory(&bytes).map_err(|source| DatasetError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ImageData::Rgb(img.to_rgb8()))
}

/// Lazy in-order iterator over a dataset; each item is one fetch.
pub struct Iter<'a, D: ?Sized> {
    dataset: &'a D,
    next: usize,
    len: usize,
}

impl<'a, D: Dataset + ?Sized> Iter<'a, D> {
    pub fn new(dataset: &'a D) -> Self {
        Self {
            dataset,
            next: 0,
            len: dataset.len(),
        }
    }
}

impl<D: Dataset + ?Sized> Iterator for Iter<'_, D> {
    type Item = Result<Example, DatasetError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.len {
            return None;
        }
        let index = self.next;
        self.next += 1;
        Some(self.dataset.get(index))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.next;
        (remaining, Some(remaining))
    }
}

impl<D: Dataset + ?Sized> ExactSizeIterator for Iter<'_, D> {}

#[cfg(test)]
mod tests;
