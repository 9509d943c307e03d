//! Configuration file support.
//!
//! A dataset configuration names the dataset root and its subfolders, the
//! transform applied to each example, the evaluation holdout, and the log
//! level. It is stored as JSON; every field has a default.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    ANNOTATION_DIR, DEFAULT_FLIP_PROBABILITY, DEFAULT_HOLDOUT, DEFAULT_ROOT, IMAGE_DIR,
};
use crate::error::DatasetError;

/// Log level setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Get the display name for this log level.
    pub fn name(&self) -> &'static str {
        match self {
            LogLevel::Error => "Error",
            LogLevel::Warn => "Warn",
            LogLevel::Info => "Info",
            LogLevel::Debug => "Debug",
            LogLevel::Trace => "Trace",
        }
    }

    /// Get all log levels in order from least to most verbose.
    pub fn all() -> &'static [LogLevel] {
        &[
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
        ]
    }

    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogLevel::all()
            .iter()
            .copied()
            .find(|level| level.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown log level '{}'", s))
    }
}

/// Where images and annotations live on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetLayout {
    /// Dataset root directory
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Image subfolder name, relative to the root
    #[serde(default = "default_image_dir")]
    pub image_dir: String,

    /// Annotation subfolder name, relative to the root
    #[serde(default = "default_annotation_dir")]
    pub annotation_dir: String,
}

fn default_root() -> PathBuf {
    PathBuf::from(DEFAULT_ROOT)
}

fn default_image_dir() -> String {
    IMAGE_DIR.to_string()
}

fn default_annotation_dir() -> String {
    ANNOTATION_DIR.to_string()
}

impl DatasetLayout {
    /// Standard `JPEGImages/` + `Annotations/` layout under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            image_dir: default_image_dir(),
            annotation_dir: default_annotation_dir(),
        }
    }

    /// Set the image subfolder name.
    pub fn with_image_dir(mut self, dir: impl Into<String>) -> Self {
        self.image_dir = dir.into();
        self
    }

    /// Set the annotation subfolder name.
    pub fn with_annotation_dir(mut self, dir: impl Into<String>) -> Self {
        self.annotation_dir = dir.into();
        self
    }

    /// Full path of the image subfolder.
    pub fn image_path(&self) -> PathBuf {
        self.root.join(&self.image_dir)
    }

    /// Full path of the annotation subfolder.
    pub fn annotation_path(&self) -> PathBuf {
        self.root.join(&self.annotation_dir)
    }
}

impl Default for DatasetLayout {
    fn default() -> Self {
        Self::new(default_root())
    }
}

/// Transform section of the config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformConfig {
    /// Enable training-time augmentation
    #[serde(default)]
    pub train: bool,

    /// Probability of a horizontal flip when training
    #[serde(default = "default_flip_probability")]
    pub flip_probability: f32,

    /// Seed for reproducible augmentation
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_flip_probability() -> f32 {
    DEFAULT_FLIP_PROBABILITY
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            train: false,
            flip_probability: default_flip_probability(),
            seed: None,
        }
    }
}

/// Complete dataset configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Directory layout
    #[serde(flatten)]
    pub layout: DatasetLayout,

    /// Per-example transform
    #[serde(default)]
    pub transform: TransformConfig,

    /// Number of examples held out for evaluation
    #[serde(default = "default_holdout")]
    pub holdout: usize,

    /// Seed for the train/test permutation
    #[serde(default)]
    pub split_seed: Option<u64>,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_holdout() -> usize {
    DEFAULT_HOLDOUT
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            layout: DatasetLayout::default(),
            transform: TransformConfig::default(),
            holdout: default_holdout(),
            split_seed: None,
            log_level: LogLevel::default(),
        }
    }
}

impl DatasetConfig {
    /// Default configuration rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            layout: DatasetLayout::new(root),
            ..Self::default()
        }
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, DatasetError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| DatasetError::config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let json = std::fs::read_to_string(path).map_err(|e| DatasetError::io(path, e))?;
        let config = Self::from_json_str(&json)?;
        log::info!("Loaded dataset config from {:?}", path);
        Ok(config)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String, DatasetError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| DatasetError::config(format!("Failed to serialize config: {}", e)))
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), DatasetError> {
        let p = self.transform.flip_probability;
        if !(0.0..=1.0).contains(&p) {
            return Err(DatasetError::config(format!(
                "flip_probability must be within [0, 1], got {}",
                p
            )));
        }
        if self.layout.image_dir.is_empty() {
            return Err(DatasetError::config("image_dir must not be empty"));
        }
        if self.layout.annotation_dir.is_empty() {
            return Err(DatasetError::config("annotation_dir must not be empty"));
        }
        Ok(())
    }
}
