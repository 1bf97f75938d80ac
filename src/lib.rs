//! # MNIST 1-Layer Neural Network
//!
//! A single-layer linear classifier for the MNIST handwriting dataset.
//! One cell per digit class, no hidden layers, no activation function,
//! no backpropagation.
//!
//! ## Overview
//!
//! Learning is achieved by incrementally nudging each cell's connection
//! weights toward the desired one-hot target after every image
//! (supervised, perceptron-style updates). Its ~85% success rate is far
//! off the state of the art, but close to Yann LeCun's 88% reference
//! result for a plain linear classifier.
//!
//! ## Structure
//!
//! - [`layer`] — Classifier layer, cells, target encoding, prediction
//! - [`data`] — MNIST IDX dataset streams and sample sources
//! - [`training`] — Sequential training/evaluation passes and statistics

pub mod data;
pub mod layer;
pub mod training;

pub use data::{InMemorySource, Sample, SampleSource};
pub use layer::{encode_target, Layer, LayerError, LayerResult, Mode};
pub use training::{evaluate_pass, train_pass, PassError, PassStats};

/// Run configuration shared by the training and evaluation passes.
#[derive(Debug, Clone)]
pub struct Config {
    /// Step size for the per-cell weight update.
    pub learning_rate: f32,
    /// Explicit RNG seed for weight initialization. `None` seeds from
    /// OS entropy, which is the production default; tests pass a fixed
    /// seed for reproducibility.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            learning_rate: 0.05,
            seed: None,
        }
    }
}
