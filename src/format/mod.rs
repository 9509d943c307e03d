//! Annotation file reading.
//!
//! Each image is paired with one Pascal VOC style XML document listing its
//! object bounding boxes. This module turns such a document into an ordered
//! list of [`BoundingBox`](crate::annotation::BoundingBox) values.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use xmlset::format::parse_boxes;
//!
//! let boxes = parse_boxes(&xml)?;
//! ```

mod error;
mod pascal_voc;

pub use error::VocError;
pub use pascal_voc::{parse_boxes, parse_boxes_from_bytes, read_boxes};

#[cfg(test)]
mod tests;
