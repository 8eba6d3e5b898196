//! Conversion from split integer I/Q streams to complex floating point.
//!
//! AD936x devices opened through the generic FMCOMMS2 source hand back I and
//! Q as two separate streams of sign-extended 12-bit samples. A
//! [`FormatConverter`] scales each stream down so that full scale maps to a
//! magnitude of 1.0, then pairs them up sample-for-sample:
//!
//! ```
//! use waverave_pluto::{ADC_FULL_SCALE, ComplexF32, FormatConverter};
//!
//! let mut conv = FormatConverter::new(ADC_FULL_SCALE);
//! let out = conv.convert(&[2048, -1024], &[0, 512])?;
//! assert_eq!(out, [ComplexF32::new(1.0, 0.0), ComplexF32::new(-0.5, 0.25)]);
//! # Ok::<(), waverave_pluto::Error>(())
//! ```

use tracing::warn;

use crate::{ComplexF32, Error};

/// Default limit on samples held back for the lagging stream. One default
/// device buffer.
pub const DEFAULT_MAX_HELD: usize = 128 * 1024;

/// Scale integer samples down to floating point.
pub fn scale(samples: &[i16], divisor: f32) -> Vec<f32> {
    samples.iter().map(|&s| s as f32 / divisor).collect()
}

/// Pair up two real streams into one complex stream.
///
/// Only as many samples as the shorter stream holds are produced.
pub fn combine(re: &[f32], im: &[f32]) -> Vec<ComplexF32> {
    re.iter()
        .zip(im.iter())
        .map(|(&re, &im)| ComplexF32::new(re, im))
        .collect()
}

/// Split a buffer of interleaved little-endian `i16` I/Q pairs into separate
/// I and Q streams. A trailing partial pair is dropped.
pub fn deinterleave_i16(bytes: &[u8]) -> (Vec<i16>, Vec<i16>) {
    let pairs = bytes.len() / 4;
    let mut i = Vec::with_capacity(pairs);
    let mut q = Vec::with_capacity(pairs);
    for chunk in bytes.chunks_exact(4) {
        let [re, im]: [i16; 2] = bytemuck::pod_read_unaligned(chunk);
        i.push(i16::from_le(re));
        q.push(i16::from_le(im));
    }
    (i, q)
}

/// Converts split integer I/Q blocks into complex `f32` samples.
///
/// Conversion is stateless per sample. The only state kept is whatever one
/// stream delivered beyond the other, which is held until its partner
/// samples show up so that I and Q never slip against each other.
///
/// The backlog is bounded. If one stream gets more than the limit ahead of
/// the other, the streams are treated as desynchronized: the held samples
/// are dropped and [`Error::StreamDesync`] is returned.
#[derive(Clone, Debug)]
pub struct FormatConverter {
    divisor: f32,
    max_held: usize,
    held_i: Vec<i16>,
    held_q: Vec<i16>,
}

impl FormatConverter {
    /// Create a converter that maps `divisor` to a magnitude of 1.0, holding
    /// back at most [`DEFAULT_MAX_HELD`] samples.
    pub fn new(divisor: f32) -> Self {
        Self {
            divisor,
            max_held: DEFAULT_MAX_HELD,
            held_i: Vec::new(),
            held_q: Vec::new(),
        }
    }

    /// Set the most samples one stream may run ahead of the other.
    pub fn with_max_held(mut self, max_held: usize) -> Self {
        self.max_held = max_held;
        self
    }

    /// Number of samples held back waiting for the other stream.
    pub fn held(&self) -> usize {
        self.held_i.len().max(self.held_q.len())
    }

    /// Convert the next I and Q samples.
    ///
    /// Fails if the unmatched remainder would exceed the backlog limit. The
    /// converter starts over empty afterwards.
    pub fn convert(&mut self, i: &[i16], q: &[i16]) -> Result<Vec<ComplexF32>, Error> {
        if self.held_i.is_empty() && self.held_q.is_empty() && i.len() == q.len() {
            return Ok(combine(&scale(i, self.divisor), &scale(q, self.divisor)));
        }
        self.held_i.extend_from_slice(i);
        self.held_q.extend_from_slice(q);
        let n = self.held_i.len().min(self.held_q.len());
        let re = scale(&self.held_i[..n], self.divisor);
        let im = scale(&self.held_q[..n], self.divisor);
        self.held_i.drain(..n);
        self.held_q.drain(..n);

        let held = self.held();
        if held > self.max_held {
            warn!("I/Q streams out of step by {held} samples, dropping backlog");
            self.reset();
            return Err(Error::StreamDesync {
                held,
                limit: self.max_held,
            });
        }
        Ok(combine(&re, &im))
    }

    /// Drop any held samples.
    pub fn reset(&mut self) {
        self.held_i.clear();
        self.held_q.clear();
    }
}
