//! MNIST 1LNN training binary.
//!
//! Trains the single-layer classifier over the 60,000-image MNIST training
//! split, then evaluates it on the 10,000-image test split. Prints error
//! counts, success rates, and timings, and optionally appends per-pass
//! metrics as JSONL for dashboards.
//!
//! ## Usage
//!
//! ```bash
//! lnn-train --data-dir data/mnist --learning-rate 0.05
//! ```

use clap::Parser;
use mnist_1lnn::data::mnist::{self, MnistStream};
use mnist_1lnn::{evaluate_pass, train_pass, Config, Layer, PassStats};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::process;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(
    name = "lnn-train",
    about = "Train a 1-layer linear classifier on MNIST handwriting images"
)]
struct Args {
    /// Directory containing the four uncompressed MNIST IDX files
    #[arg(long, default_value = "data/mnist")]
    data_dir: PathBuf,

    /// Weight update step size
    #[arg(long, default_value_t = 0.05)]
    learning_rate: f32,

    /// RNG seed for weight initialization (omit for an entropy seed)
    #[arg(long)]
    seed: Option<u64>,

    /// Cap the number of training samples (default: full split)
    #[arg(long)]
    max_train_samples: Option<usize>,

    /// Cap the number of test samples (default: full split)
    #[arg(long)]
    max_test_samples: Option<usize>,

    /// Append per-pass metrics to this JSONL file
    #[arg(long)]
    metrics_file: Option<PathBuf>,
}

/// Per-pass metrics for JSON logging.
#[derive(Debug, Serialize, Deserialize)]
struct PassMetrics {
    split: String,
    samples: usize,
    errors: usize,
    success_rate: f32,
    elapsed_secs: f32,
    samples_per_sec: f32,
}

impl PassMetrics {
    fn new(split: &str, stats: &PassStats) -> Self {
        Self {
            split: split.to_string(),
            samples: stats.samples,
            errors: stats.errors,
            success_rate: stats.success_rate(),
            elapsed_secs: stats.elapsed.as_secs_f32(),
            samples_per_sec: stats.samples_per_sec(),
        }
    }
}

fn report(split: &str, stats: &PassStats) {
    eprintln!(
        "{}: {} samples, {} errors, success rate {:.2}% ({:.1} sec, {:.0} samples/sec)",
        split,
        stats.samples,
        stats.errors,
        stats.success_rate(),
        stats.elapsed.as_secs_f32(),
        stats.samples_per_sec(),
    );
}

fn append_metrics(path: &PathBuf, metrics: &PassMetrics) {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .expect("Failed to open metrics file");
    let line = serde_json::to_string(metrics).expect("Failed to serialize metrics");
    writeln!(file, "{}", line).expect("Failed to write metrics");
}

fn main() {
    let args = Args::parse();
    let start = Instant::now();

    let config = Config {
        learning_rate: args.learning_rate,
        seed: args.seed,
    };

    eprintln!("MNIST-1LNN: a 1-layer neural network processing the MNIST handwriting images");
    eprintln!("  Data dir: {}", args.data_dir.display());
    eprintln!("  Learning rate: {}", config.learning_rate);
    match config.seed {
        Some(seed) => eprintln!("  Seed: {}", seed),
        None => eprintln!("  Seed: entropy"),
    }
    eprintln!();

    let mut layer = Layer::new(mnist::NUM_CLASSES, mnist::IMAGE_PIXELS, config.seed)
        .expect("Failed to create layer");

    let mut train_stream = match MnistStream::open_training(&args.data_dir) {
        Ok(stream) => stream.limit(args.max_train_samples.unwrap_or(mnist::TRAIN_COUNT)),
        Err(err) => {
            eprintln!("Failed to open training split: {}", err);
            process::exit(1);
        }
    };

    let train_stats = match train_pass(&mut layer, &mut train_stream, config.learning_rate) {
        Ok(stats) => stats,
        Err(err) => {
            eprintln!("Training pass failed: {}", err);
            process::exit(1);
        }
    };
    report("training", &train_stats);
    eprintln!("Done training");

    let mut test_stream = match MnistStream::open_testing(&args.data_dir) {
        Ok(stream) => stream.limit(args.max_test_samples.unwrap_or(mnist::TEST_COUNT)),
        Err(err) => {
            eprintln!("Failed to open test split: {}", err);
            process::exit(1);
        }
    };

    let test_stats = match evaluate_pass(&mut layer, &mut test_stream) {
        Ok(stats) => stats,
        Err(err) => {
            eprintln!("Evaluation pass failed: {}", err);
            process::exit(1);
        }
    };
    report("testing", &test_stats);

    if let Some(ref path) = args.metrics_file {
        append_metrics(path, &PassMetrics::new("train", &train_stats));
        append_metrics(path, &PassMetrics::new("test", &test_stats));
    }

    eprintln!();
    eprintln!(
        "DONE! Total execution time: {:.1} sec",
        start.elapsed().as_secs_f32()
    );
}
