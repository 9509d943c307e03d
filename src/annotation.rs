//! Annotation data model.
//!
//! This module provides the types returned by the dataset:
//! - [`BoundingBox`]: one object instance in absolute pixel coordinates
//! - [`Annotation`]: the per-image label record (boxes, labels, areas, crowd flags, id)
//! - [`ImageData`] and [`Example`]: the image paired with its annotation

use image::RgbImage;
use ndarray::{Array3, Axis};
use serde::{Deserialize, Serialize};

use crate::constants::{FOREGROUND_LABEL, NOT_CROWD};

// ============================================================================
// Core Geometry Types
// ============================================================================

/// An axis-aligned bounding box in absolute pixel coordinates.
///
/// `xmin < xmax` and `ymin < ymax` are assumed, not verified.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub xmin: f32,
    pub ymin: f32,
    pub xmax: f32,
    pub ymax: f32,
}

impl BoundingBox {
    pub fn new(xmin: f32, ymin: f32, xmax: f32, ymax: f32) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Box area, `(xmax - xmin) * (ymax - ymin)`.
    pub fn area(&self) -> f32 {
        (self.xmax - self.xmin) * (self.ymax - self.ymin)
    }

    /// Mirror the box across the vertical axis of an image `width` pixels wide.
    pub fn flip_horizontal(&self, width: f32) -> Self {
        Self {
            xmin: width - self.xmax,
            ymin: self.ymin,
            xmax: width - self.xmin,
            ymax: self.ymax,
        }
    }

    /// Corners as `[xmin, ymin, xmax, ymax]`.
    pub fn to_array(&self) -> [f32; 4] {
        [self.xmin, self.ymin, self.xmax, self.ymax]
    }
}

// ============================================================================
// Annotation Record
// ============================================================================

/// Label record for one image.
///
/// All per-box sequences have the same length as `boxes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub boxes: Vec<BoundingBox>,
    /// Class id per box; always the foreground class.
    pub labels: Vec<i64>,
    /// Position of the example in the dataset listing.
    pub image_id: usize,
    /// Area per box, used downstream to bucket detections by size.
    pub areas: Vec<f32>,
    /// Crowd flag per box; always zero.
    pub iscrowd: Vec<u8>,
}

impl Annotation {
    /// Build the full record from parsed boxes.
    pub fn from_boxes(boxes: Vec<BoundingBox>, image_id: usize) -> Self {
        let count = boxes.len();
        let areas = boxes.iter().map(BoundingBox::area).collect();
        Self {
            boxes,
            labels: vec![FOREGROUND_LABEL; count],
            image_id,
            areas,
            iscrowd: vec![NOT_CROWD; count],
        }
    }

    /// Number of object instances.
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// Whether the image has no objects.
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

// ============================================================================
// Image Payload
// ============================================================================

/// Pixel data of an example.
///
/// The dataset always produces `Rgb`; `Tensor` only appears after a
/// transform converts the image into a training-ready layout.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageData {
    /// Decoded 8-bit RGB image.
    Rgb(RgbImage),
    /// Channels-first `[3, height, width]` array with values in `[0, 1]`.
    Tensor(Array3<f32>),
}

impl ImageData {
    /// Image width in pixels.
    pub fn width(&self) -> usize {
        match self {
            ImageData::Rgb(img) => img.width() as usize,
            ImageData::Tensor(t) => t.len_of(Axis(2)),
        }
    }

    /// Image height in pixels.
    pub fn height(&self) -> usize {
        match self {
            ImageData::Rgb(img) => img.height() as usize,
            ImageData::Tensor(t) => t.len_of(Axis(1)),
        }
    }

    /// `(width, height)` in pixels.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width(), self.height())
    }

    /// Borrow the RGB image, if not yet converted.
    pub fn as_rgb(&self) -> Option<&RgbImage> {
        match self {
            ImageData::Rgb(img) => Some(img),
            ImageData::Tensor(_) => None,
        }
    }

    /// Borrow the tensor, if converted.
    pub fn as_tensor(&self) -> Option<&Array3<f32>> {
        match self {
            ImageData::Rgb(_) => None,
            ImageData::Tensor(t) => Some(t),
        }
    }

    /// Mirror the pixels left-right.
    pub fn flip_horizontal(self) -> Self {
        match self {
            ImageData::Rgb(mut img) => {
                image::imageops::flip_horizontal_in_place(&mut img);
                ImageData::Rgb(img)
            }
            ImageData::Tensor(mut t) => {
                t.invert_axis(Axis(2));
                ImageData::Tensor(t)
            }
        }
    }
}

/// One image plus its annotation record.
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    pub image: ImageData,
    pub annotation: Annotation,
}

impl Example {
    pub fn new(image: ImageData, annotation: Annotation) -> Self {
        Self { image, annotation }
    }
}
