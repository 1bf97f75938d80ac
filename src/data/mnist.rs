//! MNIST IDX dataset streams.
//!
//! Reads the canonical MNIST files from <http://yann.lecun.com/exdb/mnist/>
//! (uncompressed IDX format). Images and labels live in separate files,
//! paired index-for-index:
//!
//! ```text
//! images: [magic: u32 = 2051] [count: u32] [rows: u32] [cols: u32] [pixels: count×784×u8]
//! labels: [magic: u32 = 2049] [count: u32] [labels: count×u8]
//! ```
//!
//! All header fields are big-endian. Headers are validated at open time;
//! a short read mid-stream is reported as `UnexpectedEof` and treated as
//! fatal by the drivers.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use super::{Sample, SampleSource};

/// MNIST image width in pixels.
pub const IMAGE_WIDTH: usize = 28;
/// MNIST image height in pixels.
pub const IMAGE_HEIGHT: usize = 28;
/// Pixels per image (28 × 28 = 784).
pub const IMAGE_PIXELS: usize = IMAGE_WIDTH * IMAGE_HEIGHT;
/// Number of digit classes.
pub const NUM_CLASSES: usize = 10;
/// Images in the training split.
pub const TRAIN_COUNT: usize = 60_000;
/// Images in the test split.
pub const TEST_COUNT: usize = 10_000;

/// Training split image file name.
pub const TRAIN_IMAGES: &str = "train-images-idx3-ubyte";
/// Training split label file name.
pub const TRAIN_LABELS: &str = "train-labels-idx1-ubyte";
/// Test split image file name.
pub const TEST_IMAGES: &str = "t10k-images-idx3-ubyte";
/// Test split label file name.
pub const TEST_LABELS: &str = "t10k-labels-idx1-ubyte";

const IMAGE_MAGIC: u32 = 2051;
const LABEL_MAGIC: u32 = 2049;

/// Paired image/label streams over one MNIST split.
///
/// Records are read one at a time in file order; both files are closed
/// when the stream is dropped, on every exit path.
pub struct MnistStream {
    images: BufReader<File>,
    labels: BufReader<File>,
    remaining: usize,
}

impl MnistStream {
    /// Open the training split (60,000 records) under `data_dir`.
    ///
    /// # Errors
    /// `io::Error` if either file is missing or its header is malformed.
    pub fn open_training<P: AsRef<Path>>(data_dir: P) -> io::Result<Self> {
        let dir = data_dir.as_ref();
        Self::open(&dir.join(TRAIN_IMAGES), &dir.join(TRAIN_LABELS))
    }

    /// Open the test split (10,000 records) under `data_dir`.
    ///
    /// # Errors
    /// `io::Error` if either file is missing or its header is malformed.
    pub fn open_testing<P: AsRef<Path>>(data_dir: P) -> io::Result<Self> {
        let dir = data_dir.as_ref();
        Self::open(&dir.join(TEST_IMAGES), &dir.join(TEST_LABELS))
    }

    /// Open an arbitrary image/label file pair.
    ///
    /// Validates both magic numbers, the 28×28 image geometry, and that
    /// the two files declare the same record count.
    pub fn open(image_path: &Path, label_path: &Path) -> io::Result<Self> {
        let mut images = BufReader::new(File::open(image_path)?);
        let mut labels = BufReader::new(File::open(label_path)?);

        let image_magic = read_u32_be(&mut images)?;
        if image_magic != IMAGE_MAGIC {
            return Err(invalid_data(format!(
                "Bad image file magic: expected {}, got {}",
                IMAGE_MAGIC, image_magic
            )));
        }
        let image_count = read_u32_be(&mut images)? as usize;
        let rows = read_u32_be(&mut images)? as usize;
        let cols = read_u32_be(&mut images)? as usize;
        if rows != IMAGE_HEIGHT || cols != IMAGE_WIDTH {
            return Err(invalid_data(format!(
                "Unexpected image geometry: {}x{}, expected {}x{}",
                rows, cols, IMAGE_HEIGHT, IMAGE_WIDTH
            )));
        }

        let label_magic = read_u32_be(&mut labels)?;
        if label_magic != LABEL_MAGIC {
            return Err(invalid_data(format!(
                "Bad label file magic: expected {}, got {}",
                LABEL_MAGIC, label_magic
            )));
        }
        let label_count = read_u32_be(&mut labels)? as usize;
        if label_count != image_count {
            return Err(invalid_data(format!(
                "Image/label count mismatch: {} images, {} labels",
                image_count, label_count
            )));
        }

        Ok(Self {
            images,
            labels,
            remaining: image_count,
        })
    }

    /// Cap the number of records this stream will serve.
    pub fn limit(mut self, max: usize) -> Self {
        self.remaining = self.remaining.min(max);
        self
    }
}

impl SampleSource for MnistStream {
    fn remaining(&self) -> usize {
        self.remaining
    }

    fn next_sample(&mut self) -> io::Result<Sample> {
        if self.remaining == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "MNIST stream exhausted",
            ));
        }

        let mut pixels = vec![0u8; IMAGE_PIXELS];
        self.images.read_exact(&mut pixels)?;

        let mut label = [0u8; 1];
        self.labels.read_exact(&mut label)?;

        self.remaining -= 1;
        Ok(Sample {
            pixels,
            label: label[0],
        })
    }
}

fn read_u32_be<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

fn invalid_data(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}
