//! Global constants for the dataset layout and annotation record.

/// Default image subfolder under the dataset root.
pub const IMAGE_DIR: &str = "JPEGImages";

/// Default annotation subfolder under the dataset root.
pub const ANNOTATION_DIR: &str = "Annotations";

/// Substring removed from an image filename to derive its annotation stem.
pub const IMAGE_SUFFIX: &str = ".jpg";

/// Extension appended to the derived annotation stem.
pub const ANNOTATION_EXTENSION: &str = ".xml";

/// Default dataset root, matching the training script's `--data_path`.
pub const DEFAULT_ROOT: &str = "./Data/";

/// Class id assigned to every box (binary foreground/background task).
pub const FOREGROUND_LABEL: i64 = 1;

/// Crowd flag assigned to every box. The source format has no crowd annotations.
pub const NOT_CROWD: u8 = 0;

/// Default number of examples held out for evaluation.
pub const DEFAULT_HOLDOUT: usize = 100;

/// Default horizontal flip probability for training transforms.
pub const DEFAULT_FLIP_PROBABILITY: f32 = 0.5;
