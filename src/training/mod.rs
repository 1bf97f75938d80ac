//! Training and evaluation passes over a sample source.
//!
//! Both passes are the same sequential loop: read the next sample, run the
//! layer on it, compare the prediction to the true label, count the
//! mismatch. The only difference is the [`Mode`] handed to the layer —
//! training mode updates weights after every sample, evaluation never
//! touches them.
//!
//! Every sample in a split must be processed or the pass is invalid: any
//! I/O error or layer precondition violation aborts with an error, there
//! is no retry and no partial result.

use std::error::Error;
use std::fmt;
use std::io;
use std::time::{Duration, Instant};

use crate::data::SampleSource;
use crate::layer::{Layer, LayerError, Mode};

/// Aggregate statistics from one completed pass.
#[derive(Debug, Clone)]
pub struct PassStats {
    /// Total samples processed.
    pub samples: usize,
    /// Samples whose prediction did not match the true label.
    pub errors: usize,
    /// Wall-clock duration of the pass.
    pub elapsed: Duration,
}

impl PassStats {
    /// Percentage of samples predicted correctly: `100 - errors/samples*100`.
    pub fn success_rate(&self) -> f32 {
        if self.samples == 0 {
            return 100.0;
        }
        100.0 - self.errors as f32 / self.samples as f32 * 100.0
    }

    /// Throughput over the pass.
    pub fn samples_per_sec(&self) -> f32 {
        let secs = self.elapsed.as_secs_f32();
        if secs > 0.0 {
            self.samples as f32 / secs
        } else {
            0.0
        }
    }
}

/// Error type for a failed pass.
#[derive(Debug)]
pub enum PassError {
    /// The sample source failed (open, read, or early exhaustion).
    Io(io::Error),
    /// The layer rejected a sample (bad shape or label).
    Layer(LayerError),
}

impl fmt::Display for PassError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassError::Io(err) => write!(f, "Sample source error: {}", err),
            PassError::Layer(err) => write!(f, "Layer error: {}", err),
        }
    }
}

impl Error for PassError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PassError::Io(err) => Some(err),
            PassError::Layer(err) => Some(err),
        }
    }
}

impl From<io::Error> for PassError {
    fn from(err: io::Error) -> Self {
        PassError::Io(err)
    }
}

impl From<LayerError> for PassError {
    fn from(err: LayerError) -> Self {
        PassError::Layer(err)
    }
}

/// Run the layer over every remaining sample in the source.
fn run_pass<S: SampleSource>(
    layer: &mut Layer,
    source: &mut S,
    mode: Mode,
) -> Result<PassStats, PassError> {
    let start = Instant::now();
    let mut samples = 0;
    let mut errors = 0;

    while source.remaining() > 0 {
        let sample = source.next_sample()?;
        let predicted = layer.run_sample(&sample, mode)?;
        if predicted != sample.label as usize {
            errors += 1;
        }
        samples += 1;
    }

    Ok(PassStats {
        samples,
        errors,
        elapsed: start.elapsed(),
    })
}

/// Train the layer on every sample in the source, in order.
///
/// # Errors
/// Aborts on the first I/O error or precondition violation; the layer may
/// have been partially trained when this returns an error.
pub fn train_pass<S: SampleSource>(
    layer: &mut Layer,
    source: &mut S,
    learning_rate: f32,
) -> Result<PassStats, PassError> {
    run_pass(layer, source, Mode::Train { learning_rate })
}

/// Evaluate the layer on every sample in the source without mutating any
/// weights.
pub fn evaluate_pass<S: SampleSource>(
    layer: &mut Layer,
    source: &mut S,
) -> Result<PassStats, PassError> {
    run_pass(layer, source, Mode::Infer)
}
