//! Mirrored configuration state and the snapshots sent to the device.
//!
//! A [`Config`] is the adapter's view of what the device *should* be set to.
//! It's only ever handed to the device as a whole, in one of two snapshot
//! forms:
//!
//! - [`OpenParams`] - the full initial parameter set, used once to open the
//!   device.
//! - [`Params`] - the reconfigurable subset, used for every commit.
//!
//! Which optional fields of a snapshot get filled in depends on the
//! [`Generation`]: only generations with two independent gain channels get a
//! second gain, and only generations with port selection get a port.

use crate::generation::{Generation, RF_PORT};

/// Gain-control mode used for both channels until changed.
pub const DEFAULT_GAIN_MODE: &str = "fast_attack";

/// The gain-control mode that lets the gain value take effect.
pub const MANUAL_GAIN_MODE: &str = "manual";

/// Fraction of the sample rate used when bandwidth is set automatically.
pub const AUTO_BANDWIDTH_RATIO: f64 = 0.8;

/// Resolve an automatic bandwidth for the given sample rate.
pub fn auto_bandwidth(sample_rate: u32) -> u32 {
    (AUTO_BANDWIDTH_RATIO * sample_rate as f64) as u32
}

/// Gain setting for one receive channel.
///
/// The mode selects the device's gain-control algorithm (`manual`,
/// `slow_attack`, `fast_attack`, `hybrid`). The value only matters when the
/// mode is [`MANUAL_GAIN_MODE`], but it's always mirrored and always sent.
#[derive(Clone, Debug, PartialEq)]
pub struct GainSetting {
    /// Gain-control mode name.
    pub mode: String,
    /// Gain value, in dB.
    pub value: f64,
}

impl GainSetting {
    /// Create a new gain setting.
    pub fn new(mode: impl Into<String>, value: f64) -> Self {
        Self {
            mode: mode.into(),
            value,
        }
    }

    /// Whether the gain value is applied directly by the device.
    pub fn is_manual(&self) -> bool {
        self.mode == MANUAL_GAIN_MODE
    }
}

/// The complete mirrored configuration of one device.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Connection URI (`ip:...` or `usb:...`).
    pub uri: String,
    /// Center frequency, in Hz.
    pub frequency: u64,
    /// Sample rate, in Hz.
    pub sample_rate: u32,
    /// Decimation factor applied inside the device.
    pub decimation: u32,
    /// RF bandwidth, in Hz.
    pub bandwidth: u32,
    /// Which of the four hardware stream channels are enabled.
    pub channels: [bool; 4],
    /// Device buffer size, in samples.
    pub buffer_size: usize,
    /// Quadrature tracking.
    pub quadrature: bool,
    /// RF DC offset tracking.
    pub rf_dc: bool,
    /// Baseband DC offset tracking.
    pub bb_dc: bool,
    /// Gain of the `RX1` and `RX2` channels.
    pub gain: [GainSetting; 2],
    /// RF port selection.
    pub rf_port: String,
    /// Frequency correction, in ppm. Never sent to the device.
    pub freq_corr_ppm: f64,
    /// Opaque filter descriptor.
    pub filter: String,
}

impl Config {
    /// The power-on configuration for a generation.
    pub fn new(generation: Generation) -> Self {
        let gain = GainSetting::new(DEFAULT_GAIN_MODE, 64.0);
        Self {
            uri: generation.default_uri().to_owned(),
            frequency: 434_000_000,
            sample_rate: 2_500_000,
            decimation: 0,
            bandwidth: 2_000_000,
            channels: [true, true, false, false],
            buffer_size: 128 * 1024,
            quadrature: true,
            rf_dc: true,
            bb_dc: true,
            gain: [gain.clone(), gain],
            rf_port: RF_PORT.to_owned(),
            freq_corr_ppm: 0.0,
            filter: String::new(),
        }
    }

    /// Enabled channels as a bitmask, with channel 1 in bit 0.
    pub fn channel_mask(&self) -> u8 {
        self.channels
            .iter()
            .enumerate()
            .fold(0, |mask, (i, &en)| mask | ((en as u8) << i))
    }

    /// Build the reconfiguration snapshot for this state.
    pub fn snapshot(&self, generation: Generation) -> Params {
        Params {
            frequency: self.frequency,
            sample_rate: self.sample_rate,
            bandwidth: self.bandwidth,
            quadrature: self.quadrature,
            rf_dc: self.rf_dc,
            bb_dc: self.bb_dc,
            gain1: self.gain[0].clone(),
            gain2: (generation.gain_channels() > 1).then(|| self.gain[1].clone()),
            rf_port: generation
                .has_port_select()
                .then(|| self.rf_port.clone()),
            filter: self.filter.clone(),
        }
    }

    /// Build the full parameter set needed to open the device.
    pub fn open_params(&self, generation: Generation) -> OpenParams {
        OpenParams {
            generation,
            uri: self.uri.clone(),
            decimation: self.decimation,
            channels: self.channels,
            buffer_size: self.buffer_size,
            params: self.snapshot(generation),
        }
    }
}

/// An immutable snapshot of everything the device accepts on reconfiguration.
///
/// The device always gets all of these at once; there's no way to change a
/// single field on its own.
#[derive(Clone, Debug, PartialEq)]
pub struct Params {
    /// Center frequency, in Hz.
    pub frequency: u64,
    /// Sample rate, in Hz.
    pub sample_rate: u32,
    /// RF bandwidth, in Hz.
    pub bandwidth: u32,
    /// Quadrature tracking.
    pub quadrature: bool,
    /// RF DC offset tracking.
    pub rf_dc: bool,
    /// Baseband DC offset tracking.
    pub bb_dc: bool,
    /// `RX1` gain.
    pub gain1: GainSetting,
    /// `RX2` gain, for generations with two independent gain channels.
    pub gain2: Option<GainSetting>,
    /// RF port, for generations with port selection.
    pub rf_port: Option<String>,
    /// Opaque filter descriptor.
    pub filter: String,
}

/// Everything needed to open a device.
#[derive(Clone, Debug, PartialEq)]
pub struct OpenParams {
    /// Which generation of device to open.
    pub generation: Generation,
    /// Connection URI.
    pub uri: String,
    /// Decimation factor.
    pub decimation: u32,
    /// Stream channel enables.
    pub channels: [bool; 4],
    /// Buffer size, in samples.
    pub buffer_size: usize,
    /// Initial reconfigurable parameters.
    pub params: Params,
}
