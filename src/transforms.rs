//! Per-example transform stages.
//!
//! A transform receives a complete [`Example`] and returns one of the same
//! shape. It is the only place where pixel data becomes a training-ready
//! tensor. Any `Fn(Example) -> Result<Example, DatasetError>` closure is a
//! transform, so callers can plug in their own augmentation.
//!
//! ```rust,ignore
//! use xmlset::transforms::{Compose, RandomHorizontalFlip, ToTensor};
//!
//! let transform = Compose::new()
//!     .then(ToTensor)
//!     .then(RandomHorizontalFlip::new(0.5));
//! let dataset = XmlDataset::open("./Data/")?.with_transform(transform);
//! ```

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use image::RgbImage;
use ndarray::Array3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::annotation::{BoundingBox, Example, ImageData};
use crate::config::TransformConfig;
use crate::error::DatasetError;

/// A stage applied to every fetched example.
pub trait Transform: Send + Sync {
    fn apply(&self, example: Example) -> Result<Example, DatasetError>;
}

impl<F> Transform for F
where
    F: Fn(Example) -> Result<Example, DatasetError> + Send + Sync,
{
    fn apply(&self, example: Example) -> Result<Example, DatasetError> {
        self(example)
    }
}

/// Convert an 8-bit RGB image into a `[3, height, width]` array in `[0, 1]`.
///
/// Examples that already hold a tensor pass through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToTensor;

impl ToTensor {
    pub fn convert(img: &RgbImage) -> Array3<f32> {
        let (width, height) = img.dimensions();
        Array3::from_shape_fn(
            (3, height as usize, width as usize),
            |(c, y, x)| f32::from(img.get_pixel(x as u32, y as u32)[c]) / 255.0,
        )
    }
}

impl Transform for ToTensor {
    fn apply(&self, example: Example) -> Result<Example, DatasetError> {
        let image = match example.image {
            ImageData::Rgb(img) => ImageData::Tensor(Self::convert(&img)),
            tensor @ ImageData::Tensor(_) => tensor,
        };
        Ok(Example {
            image,
            annotation: example.annotation,
        })
    }
}

/// Mirror the image and its boxes left-right with a fixed probability.
///
/// Box areas are unchanged by the flip. With a seed, each `image_id` draws
/// from its own generator seeded with `seed ^ image_id`: the n-th fetch of an
/// example makes the same decision on every run, while successive fetches
/// (epochs) make fresh ones. Fetch order across examples and threads does
/// not matter.
#[derive(Debug)]
pub struct RandomHorizontalFlip {
    probability: f32,
    seed: Option<u64>,
    streams: Mutex<HashMap<usize, StdRng>>,
}

impl RandomHorizontalFlip {
    pub fn new(probability: f32) -> Self {
        Self {
            probability,
            seed: None,
            streams: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self.reset();
        self
    }

    pub fn probability(&self) -> f32 {
        self.probability
    }

    /// Restart every per-example stream, so the next fetches repeat the
    /// decisions of the first epoch.
    pub fn reset(&self) {
        self.lock_streams().clear();
    }

    fn lock_streams(&self) -> MutexGuard<'_, HashMap<usize, StdRng>> {
        self.streams
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn should_flip(&self, image_id: usize) -> bool {
        if self.probability <= 0.0 {
            return false;
        }
        if self.probability >= 1.0 {
            return true;
        }
        let draw: f32 = match self.seed {
            Some(seed) => self
                .lock_streams()
                .entry(image_id)
                .or_insert_with(|| StdRng::seed_from_u64(seed ^ image_id as u64))
                .gen_range(0.0..1.0),
            None => rand::thread_rng().gen_range(0.0..1.0),
        };
        draw < self.probability
    }
}

impl Transform for RandomHorizontalFlip {
    fn apply(&self, example: Example) -> Result<Example, DatasetError> {
        if !self.should_flip(example.annotation.image_id) {
            return Ok(example);
        }

        let width = example.image.width() as f32;
        let mut annotation = example.annotation;
        annotation.boxes = annotation
            .boxes
            .iter()
            .map(|b| b.flip_horizontal(width))
            .collect::<Vec<BoundingBox>>();
        log::trace!(
            "Flipped image {} ({} boxes)",
            annotation.image_id,
            annotation.boxes.len()
        );

        Ok(Example {
            image: example.image.flip_horizontal(),
            annotation,
        })
    }
}

/// Apply a sequence of transforms in order.
#[derive(Default)]
pub struct Compose {
    stages: Vec<Box<dyn Transform>>,
}

impl Compose {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage.
    pub fn then(mut self, stage: impl Transform + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl Transform for Compose {
    fn apply(&self, example: Example) -> Result<Example, DatasetError> {
        self.stages
            .iter()
            .try_fold(example, |example, stage| stage.apply(example))
    }
}

/// Standard detection pipeline: tensor conversion, plus a random flip when training.
pub fn detection_transform(config: &TransformConfig) -> Compose {
    let transform = Compose::new().then(ToTensor);
    if !config.train {
        return transform;
    }

    let mut flip = RandomHorizontalFlip::new(config.flip_probability);
    if let Some(seed) = config.seed {
        flip = flip.with_seed(seed);
    }
    transform.then(flip)
}
