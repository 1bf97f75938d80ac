//! Classifier layer: one linear cell per class.
//!
//! The layer owns a fixed array of cells, one per output class. Each cell
//! holds a weight per input pixel and produces a scalar output for the
//! current image:
//!
//! ```text
//! output_i = (Σ_j weight_i[j] · input[j]) / N      input[j] ∈ {0, 1}
//! ```
//!
//! The image is binarized before use (any non-zero intensity counts as 1),
//! so the sum ranges over the active pixels only while the divisor stays
//! the full pixel count N. The divisor is deliberately *not* the active
//! pixel count; changing it would alter the learning dynamics.
//!
//! ## Learning rule
//!
//! After the forward computation, training mode moves each active weight
//! toward the one-hot target:
//!
//! ```text
//! weight_i[j] += (target_i - output_i) · learning_rate     where input[j] == 1
//! ```
//!
//! No momentum, no regularization, no bias term. Cells never read or write
//! each other's weights, so the per-cell work for one sample runs as a
//! rayon parallel loop over the cell array.

use ndarray::Array1;
use ndarray_rand::RandomExt;
use rand::distributions::Uniform;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::error::Error;
use std::fmt;

use crate::data::Sample;

/// Error type for layer operations.
#[derive(Debug, Clone)]
pub enum LayerError {
    /// Sample pixel count does not match the layer's input size.
    ShapeMismatch(String),
    /// Label outside the layer's class range.
    LabelOutOfRange { label: usize, classes: usize },
    /// Invalid layer configuration.
    InvalidConfig(String),
}

impl fmt::Display for LayerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerError::ShapeMismatch(msg) => write!(f, "Shape mismatch: {}", msg),
            LayerError::LabelOutOfRange { label, classes } => {
                write!(f, "Label {} out of range for {} classes", label, classes)
            }
            LayerError::InvalidConfig(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl Error for LayerError {}

pub type LayerResult<T> = Result<T, LayerError>;

/// Per-sample operating mode, chosen by the driver at the call site.
///
/// The layer has no internal mode flag; whether weights mutate is decided
/// entirely by which variant the caller passes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mode {
    /// Forward computation followed by a weight update toward the target.
    Train { learning_rate: f32 },
    /// Forward computation only; weights are left untouched.
    Infer,
}

/// Encode a class label as a one-hot target vector.
///
/// Produces a vector of length `classes` with `1.0` at index `label` and
/// `0.0` everywhere else. An out-of-range label is a precondition
/// violation: the dataset is assumed well-formed, so the caller treats
/// this as fatal.
pub fn encode_target(label: usize, classes: usize) -> LayerResult<Array1<f32>> {
    if label >= classes {
        return Err(LayerError::LabelOutOfRange { label, classes });
    }
    let mut target = Array1::zeros(classes);
    target[label] = 1.0;
    Ok(target)
}

/// One class's linear decision unit.
///
/// `weight` is the only state that persists across samples. `input` and
/// `output` are caches overwritten by every forward computation.
#[derive(Debug, Clone)]
pub struct Cell {
    /// Connection weight per input pixel.
    weight: Array1<f32>,
    /// Binarized copy of the last-seen image.
    input: Array1<f32>,
    /// Normalized sum of active weights from the last forward pass.
    output: f32,
}

impl Cell {
    fn new(inputs: usize, rng: &mut StdRng) -> Self {
        Self {
            weight: Array1::random_using(inputs, Uniform::new(0.0f32, 1.0), rng),
            input: Array1::zeros(inputs),
            output: 0.0,
        }
    }

    /// Binarize the image into the cell's input cache and compute the
    /// normalized weighted sum.
    ///
    /// Since the cached input is 0/1, the masked sum over active pixels is
    /// exactly the dot product with the binarized vector.
    fn forward(&mut self, pixels: &[u8]) -> f32 {
        for (slot, &p) in self.input.iter_mut().zip(pixels) {
            *slot = if p != 0 { 1.0 } else { 0.0 };
        }
        self.output = self.weight.dot(&self.input) / self.input.len() as f32;
        self.output
    }

    /// Move every active weight toward the target by the scaled error.
    ///
    /// Inactive positions carried no signal on this sample and stay put.
    fn adjust(&mut self, target: f32, learning_rate: f32) {
        let err = target - self.output;
        self.weight.scaled_add(err * learning_rate, &self.input);
    }
}

/// A fixed-size layer of independent classifier cells.
///
/// Created once per run with randomized weights, mutated once per training
/// sample, read-only during evaluation.
pub struct Layer {
    cells: Vec<Cell>,
    inputs: usize,
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("classes", &self.cells.len())
            .field("inputs", &self.inputs)
            .finish()
    }
}

impl Layer {
    /// Create a layer of `classes` cells with `inputs` weights each, drawn
    /// independently from the uniform distribution over [0, 1).
    ///
    /// `seed` fixes the RNG for reproducible runs; `None` seeds from OS
    /// entropy.
    ///
    /// # Errors
    /// `InvalidConfig` if `classes` or `inputs` is zero.
    pub fn new(classes: usize, inputs: usize, seed: Option<u64>) -> LayerResult<Self> {
        if classes == 0 || inputs == 0 {
            return Err(LayerError::InvalidConfig(
                "Layer needs at least one class and one input".to_string(),
            ));
        }

        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };

        let cells = (0..classes).map(|_| Cell::new(inputs, &mut rng)).collect();

        Ok(Self { cells, inputs })
    }

    /// Number of output classes (cells).
    pub fn classes(&self) -> usize {
        self.cells.len()
    }

    /// Number of input pixels per cell.
    pub fn inputs(&self) -> usize {
        self.inputs
    }

    /// Compute one cell's output for the given image.
    ///
    /// Binarizes the image into the cell's input cache and stores the
    /// normalized weighted sum as the cell's output. With weights in
    /// [0, 1) the result lies in [0, 1].
    ///
    /// # Errors
    /// `ShapeMismatch` if the pixel count differs from the layer's input
    /// size; `InvalidConfig` if the cell index is out of bounds.
    pub fn compute_cell(&mut self, cell: usize, pixels: &[u8]) -> LayerResult<f32> {
        self.check_shape(pixels)?;
        let cell = self.cell_mut(cell)?;
        Ok(cell.forward(pixels))
    }

    /// Update one cell's weights toward `target` using the output cached
    /// by the preceding [`compute_cell`](Self::compute_cell) call.
    pub fn update_cell(&mut self, cell: usize, target: f32, learning_rate: f32) -> LayerResult<()> {
        let cell = self.cell_mut(cell)?;
        cell.adjust(target, learning_rate);
        Ok(())
    }

    /// Index of the cell with the maximum output.
    ///
    /// Scans cells in ascending index order keeping the first maximum, so
    /// ties resolve to the lowest index. Deterministic for a fixed output
    /// vector.
    pub fn predict(&self) -> usize {
        let mut max_index = 0;
        let mut max_output = self.cells[0].output;
        for (i, cell) in self.cells.iter().enumerate().skip(1) {
            if cell.output > max_output {
                max_index = i;
                max_output = cell.output;
            }
        }
        max_index
    }

    /// Run the full per-sample computation and return the predicted class.
    ///
    /// In [`Mode::Train`] every cell computes its output and immediately
    /// adjusts its weights toward the corresponding one-hot target
    /// component; in [`Mode::Infer`] weights are left untouched. Cells are
    /// independent, so the per-cell work is distributed across rayon
    /// worker threads.
    ///
    /// # Errors
    /// `ShapeMismatch` for a malformed sample, `LabelOutOfRange` for a bad
    /// label in training mode. Both are precondition violations the driver
    /// treats as fatal.
    pub fn run_sample(&mut self, sample: &Sample, mode: Mode) -> LayerResult<usize> {
        self.check_shape(&sample.pixels)?;

        match mode {
            Mode::Train { learning_rate } => {
                let target = encode_target(sample.label as usize, self.cells.len())?;
                self.cells
                    .par_iter_mut()
                    .enumerate()
                    .for_each(|(i, cell)| {
                        cell.forward(&sample.pixels);
                        cell.adjust(target[i], learning_rate);
                    });
            }
            Mode::Infer => {
                self.cells.par_iter_mut().for_each(|cell| {
                    cell.forward(&sample.pixels);
                });
            }
        }

        Ok(self.predict())
    }

    /// Snapshot of all cell outputs, in cell order.
    pub fn outputs(&self) -> Vec<f32> {
        self.cells.iter().map(|c| c.output).collect()
    }

    /// One cell's weight vector (read-only).
    pub fn weights(&self, cell: usize) -> LayerResult<&Array1<f32>> {
        self.cells
            .get(cell)
            .map(|c| &c.weight)
            .ok_or_else(|| LayerError::InvalidConfig(format!("No cell at index {}", cell)))
    }

    /// Overwrite one cell's weight vector. Intended for tests and
    /// deterministic setups.
    pub fn set_weights(&mut self, cell: usize, weights: Array1<f32>) -> LayerResult<()> {
        if weights.len() != self.inputs {
            return Err(LayerError::ShapeMismatch(format!(
                "Expected {} weights, got {}",
                self.inputs,
                weights.len()
            )));
        }
        let cell = self.cell_mut(cell)?;
        cell.weight = weights;
        Ok(())
    }

    fn check_shape(&self, pixels: &[u8]) -> LayerResult<()> {
        if pixels.len() != self.inputs {
            return Err(LayerError::ShapeMismatch(format!(
                "Sample has {} pixels, layer expects {}",
                pixels.len(),
                self.inputs
            )));
        }
        Ok(())
    }

    fn cell_mut(&mut self, index: usize) -> LayerResult<&mut Cell> {
        let count = self.cells.len();
        self.cells
            .get_mut(index)
            .ok_or_else(|| LayerError::InvalidConfig(format!("Cell {} of {}", index, count)))
    }
}
