//! xmlset - XML-annotated object detection dataset
//!
//! Reads a directory of images with one Pascal VOC style XML annotation per
//! image and serves `(image, annotation)` examples by index, ready to be fed
//! to a detection training loop.

pub mod annotation;
pub mod config;
pub mod constants;
pub mod dataset;
pub mod error;
pub mod format;
pub mod transforms;

pub use annotation::{Annotation, BoundingBox, Example, ImageData};
pub use config::{DatasetConfig, DatasetLayout, LogLevel, TransformConfig};
pub use dataset::{
    Dataset, Manifest, ManifestEntry, Split, Subset, XmlDataset, annotation_file_name,
    holdout_split,
};
pub use error::DatasetError;
pub use transforms::{Compose, RandomHorizontalFlip, ToTensor, Transform, detection_transform};
