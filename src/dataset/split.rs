//! Index views and train/test splitting.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::{Dataset, Iter};
use crate::annotation::Example;
use crate::error::DatasetError;

/// Train and test index lists over a dataset of a given length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Randomly permute `0..len` and hold out the last `holdout` indices for testing.
///
/// When `holdout >= len` every index goes to the test split. With a seed the
/// permutation is reproducible.
pub fn holdout_split(len: usize, holdout: usize, seed: Option<u64>) -> Split {
    let mut indices: Vec<usize> = (0..len).collect();
    match seed {
        Some(seed) => indices.shuffle(&mut StdRng::seed_from_u64(seed)),
        None => indices.shuffle(&mut rand::thread_rng()),
    }

    let test = indices.split_off(len - holdout.min(len));
    log::debug!(
        "Split {} examples into {} train / {} test",
        len,
        indices.len(),
        test.len()
    );
    Split {
        train: indices,
        test,
    }
}

/// A dataset seen through a list of parent indices.
///
/// Fetched examples keep the parent's `image_id`.
#[derive(Debug, Clone)]
pub struct Subset<'a, D: ?Sized> {
    dataset: &'a D,
    indices: Vec<usize>,
}

impl<'a, D: Dataset + ?Sized> Subset<'a, D> {
    pub fn new(dataset: &'a D, indices: Vec<usize>) -> Self {
        Self { dataset, indices }
    }

    /// Parent indices, in subset order.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn iter(&self) -> Iter<'_, Self> {
        Iter::new(self)
    }
}

impl<D: Dataset + ?Sized> Dataset for Subset<'_, D> {
    fn len(&self) -> usize {
        self.indices.len()
    }

    fn get(&self, index: usize) -> Result<Example, DatasetError> {
        let parent = *self
            .indices
            .get(index)
            .ok_or(DatasetError::IndexOutOfRange {
                index,
                len: self.indices.len(),
            })?;
        self.dataset.get(parent)
    }
}
