//! A simulated device, for running without hardware.
//!
//! [`SimDevice`] behaves like an AD936x on the other end of an IIO link as
//! far as a [`Source`][crate::Source] can tell: it enforces the generation's
//! tuning and gain limits, applies whole configuration snapshots, and streams
//! a test tone in the generation's native format. It can also be made
//! unreachable, to exercise failure paths.

use std::f64::consts::TAU;

use tracing::{debug, info};

use crate::{
    ComplexF32, Error,
    config::{GainSetting, OpenParams, Params},
    convert::deinterleave_i16,
    device::{Device, RawBlock},
    generation::{Generation, NativeFormat},
};

/// Default tone offset from the center frequency, in Hz.
pub const DEFAULT_TONE_HZ: f64 = 100_000.0;

/// Tone amplitude relative to full scale.
const TONE_AMPLITUDE: f64 = 0.5;

fn check_gain(generation: Generation, gain: &GainSetting) -> Result<(), Error> {
    let range = generation.gain_range();
    if gain.is_manual() && !range.contains(gain.value) {
        return Err(Error::ValueRange {
            range: range.start..=range.stop,
            val: gain.value,
        });
    }
    Ok(())
}

fn check_params(generation: Generation, params: &Params) -> Result<(), Error> {
    let limits = generation.freq_limits();
    if !limits.contains(&params.frequency) {
        return Err(Error::TuningRange {
            range: limits,
            val: params.frequency,
        });
    }
    if params.sample_rate == 0 {
        return Err(Error::InvalidParameter("Sample rate must be nonzero"));
    }
    check_gain(generation, &params.gain1)?;
    if let Some(gain2) = params.gain2.as_ref() {
        check_gain(generation, gain2)?;
    }
    Ok(())
}

/// A simulated receiver.
#[derive(Clone, Debug)]
pub struct SimDevice {
    generation: Generation,
    uri: String,
    buffer_size: usize,
    params: Params,
    tone_hz: f64,
    phase: f64,
    commits: usize,
    reachable: bool,
}

impl SimDevice {
    /// Open a simulated device with a full initial parameter set.
    ///
    /// Fails the same way a real device would if the parameters are out of
    /// range.
    pub fn open(open: &OpenParams) -> Result<Self, Error> {
        if open.uri.is_empty() {
            return Err(Error::Unreachable { uri: String::new() });
        }
        if open.buffer_size == 0 {
            return Err(Error::InvalidParameter("Buffer size must be nonzero"));
        }
        if !open.channels.iter().any(|&c| c) {
            return Err(Error::InvalidParameter("No stream channels enabled"));
        }
        check_params(open.generation, &open.params)?;
        info!("Simulating {} at {}", open.generation, open.uri);
        Ok(Self {
            generation: open.generation,
            uri: open.uri.clone(),
            buffer_size: open.buffer_size,
            params: open.params.clone(),
            tone_hz: DEFAULT_TONE_HZ,
            phase: 0.0,
            commits: 0,
            reachable: true,
        })
    }

    /// Set the tone's offset from the center frequency, in Hz.
    pub fn with_tone(mut self, offset_hz: f64) -> Self {
        self.tone_hz = offset_hz;
        self
    }

    /// Set the buffer size, in samples.
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }

    /// Simulate the link going down or coming back up.
    pub fn set_reachable(&mut self, reachable: bool) {
        self.reachable = reachable;
    }

    /// The parameters currently applied.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Number of successful reconfigurations since opening.
    pub fn commits(&self) -> usize {
        self.commits
    }

    /// The generation being simulated.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    fn link(&self) -> Result<(), Error> {
        if self.reachable {
            Ok(())
        } else {
            Err(Error::Unreachable {
                uri: self.uri.clone(),
            })
        }
    }

    fn next_phase(&mut self) -> f64 {
        let phase = self.phase;
        let step = TAU * self.tone_hz / self.params.sample_rate as f64;
        self.phase = (self.phase + step) % TAU;
        phase
    }
}

impl Device for SimDevice {
    fn set_params(&mut self, params: &Params) -> Result<(), Error> {
        self.link()?;
        check_params(self.generation, params)?;
        self.params = params.clone();
        self.commits += 1;
        debug!("Simulated device reconfigured ({} total)", self.commits);
        Ok(())
    }

    fn recv(&mut self) -> Result<RawBlock, Error> {
        self.link()?;
        match self.generation.native_format() {
            NativeFormat::ComplexF32 => {
                let samples = (0..self.buffer_size)
                    .map(|_| {
                        let phase = self.next_phase();
                        ComplexF32::new(
                            (TONE_AMPLITUDE * phase.cos()) as f32,
                            (TONE_AMPLITUDE * phase.sin()) as f32,
                        )
                    })
                    .collect();
                Ok(RawBlock::Complex(samples))
            }
            NativeFormat::SplitI16 { divisor } => {
                // Build the interleaved little-endian buffer an IIO device
                // would hand back, then split it.
                let scale = TONE_AMPLITUDE * (divisor as f64 - 1.0);
                let mut bytes = Vec::with_capacity(self.buffer_size * 4);
                for _ in 0..self.buffer_size {
                    let phase = self.next_phase();
                    let i = (scale * phase.cos()).round() as i16;
                    let q = (scale * phase.sin()).round() as i16;
                    bytes.extend_from_slice(&i.to_le_bytes());
                    bytes.extend_from_slice(&q.to_le_bytes());
                }
                let (i, q) = deinterleave_i16(&bytes);
                Ok(RawBlock::Split { i, q })
            }
        }
    }
}
