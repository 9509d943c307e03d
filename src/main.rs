//! Command-line entry point for inspecting and validating a dataset.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use xmlset::{
    Dataset, DatasetConfig, DatasetError, LogLevel, XmlDataset, detection_transform,
    holdout_split,
};

/// Inspect an XML-annotated detection dataset.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Dataset root containing JPEGImages/ and Annotations/ (default: ./Data/).
    #[arg(long)]
    data_path: Option<PathBuf>,
    /// JSON configuration file; command-line flags take precedence.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Log verbosity: error, warn, info, debug or trace.
    #[arg(long)]
    log_level: Option<LogLevel>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the number of examples and the train/test split sizes.
    Summary {
        /// Number of examples held out for evaluation.
        #[arg(long)]
        holdout: Option<usize>,
        /// Seed for the split permutation.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Load every example and report the ones that fail.
    Check,
    /// Print one example's annotation as JSON.
    Show {
        /// Example index.
        index: usize,
        /// Apply the training transform (random horizontal flip).
        #[arg(long, default_value_t = false)]
        train: bool,
        /// Seed for the training transform.
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn load_config(args: &Args) -> Result<DatasetConfig, DatasetError> {
    let mut config = match &args.config {
        Some(path) => DatasetConfig::load(path)?,
        None => DatasetConfig::default(),
    };
    if let Some(root) = &args.data_path {
        config.layout.root = root.clone();
    }
    if let Some(level) = args.log_level {
        config.log_level = level;
    }
    Ok(config)
}

fn run(args: Args, mut config: DatasetConfig) -> Result<bool, DatasetError> {
    match args.command {
        Command::Summary { holdout, seed } => {
            let dataset = XmlDataset::from_layout(config.layout.clone())?;
            let split = holdout_split(
                dataset.len(),
                holdout.unwrap_or(config.holdout),
                seed.or(config.split_seed),
            );
            println!("root:     {}", config.layout.root.display());
            println!("examples: {}", dataset.len());
            println!("train:    {}", split.train.len());
            println!("test:     {}", split.test.len());
            Ok(true)
        }
        Command::Check => {
            let dataset = XmlDataset::from_layout(config.layout.clone())?;
            let mut failures = 0usize;
            let mut boxes = 0usize;
            for (index, result) in dataset.iter().enumerate() {
                match result {
                    Ok(example) => boxes += example.annotation.len(),
                    Err(e) => {
                        failures += 1;
                        log::error!("Example {}: {}", index, e);
                    }
                }
            }
            println!(
                "{} examples, {} boxes, {} failures",
                dataset.len(),
                boxes,
                failures
            );
            Ok(failures == 0)
        }
        Command::Show { index, train, seed } => {
            config.transform.train |= train;
            if seed.is_some() {
                config.transform.seed = seed;
            }
            let dataset = XmlDataset::from_layout(config.layout.clone())?
                .with_transform(detection_transform(&config.transform));
            let entry = dataset.entry(index)?.clone();
            let example = dataset.get(index)?;
            let (width, height) = example.image.dimensions();

            println!("image:      {}", entry.image_path.display());
            println!("annotation: {}", entry.annotation_path.display());
            println!("size:       {}x{}", width, height);
            match serde_json::to_string_pretty(&example.annotation) {
                Ok(json) => {
                    println!("{}", json);
                    Ok(true)
                }
                Err(e) => {
                    log::error!("Failed to serialize annotation: {}", e);
                    Ok(false)
                }
            }
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    env_logger::Builder::new()
        .filter_level(config.log_level.to_level_filter())
        .init();

    match run(args, config) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
