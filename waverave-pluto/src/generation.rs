use std::ops::RangeInclusive;

use crate::range::{MetaRange, Range};

/// Names of the two gain-controllable receive channels, in order.
pub const GAIN_NAMES: [&str; 2] = ["RX1", "RX2"];

/// Supported sample rates, in Hz. Identical for every generation.
pub const SAMPLE_RATES: [u32; 4] = [2_500_000, 5_000_000, 10_000_000, 20_000_000];

/// The one RF port the receive path is wired to.
pub const RF_PORT: &str = "A_BALANCED";

/// Divisor taking a full-scale 12-bit ADC sample to unit magnitude.
pub const ADC_FULL_SCALE: f32 = 2048.0;

/// Native sample format of a device's receive stream.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NativeFormat {
    /// Already complex `f32`, forwarded as-is.
    ComplexF32,
    /// Separate I and Q streams of `i16`, each needing to be divided by
    /// `divisor` and paired up into complex samples.
    SplitI16 {
        /// Integer value that maps to a magnitude of 1.0.
        divisor: f32,
    },
}

/// A hardware generation of the receiver.
///
/// Both generations share the same AD936x RF front-end and the same
/// whole-state configuration interface, but differ in how the IIO driver
/// exposes them:
///
/// - `Pluto` uses the dedicated PlutoSDR source. It streams complex `f32`
///   directly and has a single gain control; the second gain channel is still
///   mirrored, but never reaches the device.
/// - `Fmcomms2` uses the generic AD936x source. It streams I and Q as two
///   separate `i16` channels, controls both gain channels independently, and
///   takes an explicit RF port selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Generation {
    /// ADALM-PLUTO through the PlutoSDR source.
    Pluto,
    /// AD936x through the generic FMCOMMS2 source.
    Fmcomms2,
}

impl Generation {
    /// Every known generation.
    pub const ALL: [Generation; 2] = [Generation::Pluto, Generation::Fmcomms2];

    /// Short human-readable label.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pluto => "PlutoSDR",
            Self::Fmcomms2 => "FMCOMMS2",
        }
    }

    /// Machine-readable key used in device descriptors.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Pluto => "plutosdr",
            Self::Fmcomms2 => "fmcomms2",
        }
    }

    /// Device descriptor string, as handed to a device registry.
    pub fn descriptor(&self) -> String {
        format!("{},label='{}'", self.key(), self.name())
    }

    /// Default connection URI for this generation.
    pub fn default_uri(&self) -> &'static str {
        match self {
            Self::Pluto => "ip:pluto.local",
            Self::Fmcomms2 => "ip:192.168.2.1",
        }
    }

    /// Native format of the receive stream.
    pub fn native_format(&self) -> NativeFormat {
        match self {
            Self::Pluto => NativeFormat::ComplexF32,
            Self::Fmcomms2 => NativeFormat::SplitI16 {
                divisor: ADC_FULL_SCALE,
            },
        }
    }

    /// Number of independently controlled gain channels the device accepts.
    pub fn gain_channels(&self) -> usize {
        match self {
            Self::Pluto => 1,
            Self::Fmcomms2 => 2,
        }
    }

    /// Whether the device takes an RF port selection in its configuration.
    pub fn has_port_select(&self) -> bool {
        matches!(self, Self::Fmcomms2)
    }

    /// Tunable center frequency range, in Hz, with a 1 Hz step.
    pub fn freq_range(&self) -> Range {
        match self {
            Self::Pluto => Range::new(70.0e6, 6000.0e6, 1.0),
            Self::Fmcomms2 => Range::new(325.0e6, 3800.0e6, 1.0),
        }
    }

    /// Tunable center frequency range as integer Hz.
    pub fn freq_limits(&self) -> RangeInclusive<u64> {
        let r = self.freq_range();
        (r.start as u64)..=(r.stop as u64)
    }

    /// Gain range, in dB, with a 1 dB step. Same for both gain channels.
    pub fn gain_range(&self) -> Range {
        match self {
            Self::Pluto => Range::new(0.0, 72.0, 1.0),
            Self::Fmcomms2 => Range::new(0.0, 100.0, 1.0),
        }
    }

    /// Supported sample rates as a discrete set.
    pub fn sample_rates(&self) -> MetaRange {
        SAMPLE_RATES
            .iter()
            .map(|&r| Range::single(r as f64))
            .collect()
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Generation {
    type Err = &'static str;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pluto" | "plutosdr" => Ok(Self::Pluto),
            "fmcomms2" | "ad936x" => Ok(Self::Fmcomms2),
            _ => Err("Unknown generation, expected `pluto` or `fmcomms2`"),
        }
    }
}

/// List descriptor strings for every supported device kind.
pub fn list_devices() -> Vec<String> {
    Generation::ALL.iter().map(Generation::descriptor).collect()
}
