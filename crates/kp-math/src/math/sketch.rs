//! Streaming quantile sketch over the `tdigest` crate.
//!
//! `tdigest::TDigest` is immutable: every merge returns a new digest. Folding
//! values in one at a time would rebuild the centroid list per insert, so
//! values are collected in a buffer of `5 × compression` points and merged in
//! one `merge_unsorted` call when it fills. Queries fold a pending buffer into
//! a temporary digest without mutating the sketch.

use tdigest::TDigest;
use thiserror::Error;

/// Smallest accepted compression parameter.
pub const MIN_COMPRESSION: usize = 10;

/// Largest accepted compression parameter.
pub const MAX_COMPRESSION: usize = 100_000;

/// Unmerged buffer size as a multiple of the compression parameter.
const BUFFER_FACTOR: usize = 5;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SketchError {
    #[error("invalid compression {0}: must be within [10, 100000]")]
    InvalidCompression(usize),

    #[error("cannot merge sketches with compression {left} and {right}")]
    IncompatibleCompression { left: usize, right: usize },
}

/// Approximate quantiles of an `f64` stream.
#[derive(Debug, Clone)]
pub struct QuantileSketch {
    compression: usize,
    digest: TDigest,
    buffer: Vec<f64>,
    buffer_limit: usize,
}

impl QuantileSketch {
    /// Compression is fixed for the lifetime of the sketch.
    pub fn new(compression: usize) -> Result<Self, SketchError> {
        if !(MIN_COMPRESSION..=MAX_COMPRESSION).contains(&compression) {
            return Err(SketchError::InvalidCompression(compression));
        }
        let buffer_limit = compression * BUFFER_FACTOR;
        Ok(Self {
            compression,
            digest: TDigest::new_with_size(compression),
            buffer: Vec::with_capacity(buffer_limit),
            buffer_limit,
        })
    }

    pub fn compression(&self) -> usize {
        self.compression
    }

    /// Number of values added.
    pub fn count(&self) -> u64 {
        self.digest.count().round() as u64 + self.buffer.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.digest.count() == 0.0 && self.buffer.is_empty()
    }

    /// Adds one value. Non-finite values are ignored.
    pub fn add(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        self.buffer.push(value);
        if self.buffer.len() >= self.buffer_limit {
            self.flush();
        }
    }

    /// Folds buffered values into the digest.
    pub fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let pending = std::mem::replace(&mut self.buffer, Vec::with_capacity(self.buffer_limit));
        self.digest = self.digest.merge_unsorted(pending);
    }

    /// Merges another sketch into this one.
    pub fn merge(&mut self, other: &QuantileSketch) -> Result<(), SketchError> {
        if self.compression != other.compression {
            return Err(SketchError::IncompatibleCompression {
                left: self.compression,
                right: other.compression,
            });
        }
        self.flush();
        let mut theirs = other.digest.clone();
        if !other.buffer.is_empty() {
            theirs = theirs.merge_unsorted(other.buffer.clone());
        }
        self.digest = TDigest::merge_digests(vec![self.digest.clone(), theirs]);
        Ok(())
    }

    pub fn min(&self) -> Option<f64> {
        self.with_digest(|digest| digest.min())
    }

    pub fn max(&self) -> Option<f64> {
        self.with_digest(|digest| digest.max())
    }

    /// Approximate value at quantile `q`, clamped to `[0, 1]`.
    ///
    /// Returns `None` for an empty sketch or NaN `q`.
    pub fn quantile(&self, q: f64) -> Option<f64> {
        if q.is_nan() {
            return None;
        }
        self.with_digest(|digest| digest.estimate_quantile(q.clamp(0.0, 1.0)))
    }

    /// Several quantiles from one view of the sketch.
    ///
    /// `qs` must be ascending; the estimates are forced non-decreasing.
    pub fn quantiles(&self, qs: &[f64]) -> Option<Vec<f64>> {
        if qs.iter().any(|q| q.is_nan()) {
            return None;
        }
        self.with_digest(|digest| {
            let mut floor = f64::NEG_INFINITY;
            qs.iter()
                .map(|q| {
                    floor = floor.max(digest.estimate_quantile(q.clamp(0.0, 1.0)));
                    floor
                })
                .collect()
        })
    }

    fn with_digest<T>(&self, f: impl FnOnce(&TDigest) -> T) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        if self.buffer.is_empty() {
            Some(f(&self.digest))
        } else {
            Some(f(&self.digest.merge_unsorted(self.buffer.clone())))
        }
    }
}
