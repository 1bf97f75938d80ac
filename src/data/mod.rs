//! Dataset access: sample sources and the MNIST IDX file reader.
//!
//! ## Submodules
//!
//! - [`mnist`] — Paired image/label streams over the canonical IDX files

pub mod mnist;

pub use mnist::MnistStream;

use std::io;

/// One dataset record: raw pixel intensities plus the true class label.
///
/// Pixels are kept as the raw bytes read from the file; binarization
/// happens inside the classifier layer at consumption time. Samples are
/// ephemeral, constructed per iteration and discarded after use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    /// Pixel intensities, row-major, one byte per pixel.
    pub pixels: Vec<u8>,
    /// Class label in `[0, classes)`.
    pub label: u8,
}

/// A bounded, ordered, single-cursor stream of samples.
///
/// The drivers consume a source strictly sequentially: each sample's
/// prediction and error bookkeeping completes before the next record is
/// read. Implementations report the fixed number of records left so the
/// caller can run the split to completion.
pub trait SampleSource {
    /// Number of records not yet consumed.
    fn remaining(&self) -> usize;

    /// Read the next record.
    ///
    /// # Errors
    /// I/O failure, including a stream that ends before its declared
    /// record count is exhausted. The drivers treat any error as fatal.
    fn next_sample(&mut self) -> io::Result<Sample>;
}

/// In-memory sample source.
///
/// Serves a pre-built `Vec<Sample>` in order. Used by tests and by callers
/// that assemble datasets programmatically.
#[derive(Debug, Clone)]
pub struct InMemorySource {
    samples: Vec<Sample>,
    cursor: usize,
}

impl InMemorySource {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples, cursor: 0 }
    }

    /// Rewind the cursor so the samples can be served again.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }
}

impl SampleSource for InMemorySource {
    fn remaining(&self) -> usize {
        self.samples.len() - self.cursor
    }

    fn next_sample(&mut self) -> io::Result<Sample> {
        let sample = self.samples.get(self.cursor).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "In-memory source exhausted")
        })?;
        self.cursor += 1;
        Ok(sample)
    }
}
