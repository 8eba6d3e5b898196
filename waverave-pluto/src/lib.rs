/*!

A uniform radio source for the [ADALM-PLUTO][pluto] and other AD936x-based
receivers, as reached through their IIO streaming drivers.

[pluto]: https://www.analog.com/en/resources/evaluation-hardware-and-software/evaluation-boards-kits/adalm-pluto.html

The IIO drivers for these radios don't take settings one at a time. They
accept a complete configuration (frequency, sample rate, bandwidth, gain
modes and values, tracking loops, port, filter) as one combined write, and
their receive streams come in whatever sample format that driver generation
produces. This crate sits on top of that and presents the usual per-setting
source interface:

- [`Source`] - mirrors the configuration, takes individual settings, and
  commits the whole configuration to the device on every change. Also
  answers capability queries and hands out complex `f32` sample blocks.
- [`Device`] - the trait a streaming driver implements. It's opened with an
  [`OpenParams`] and reconfigured with a [`Params`] snapshot.
- [`FormatConverter`] - turns the split `i16` I/Q streams of older driver
  generations into complex `f32`.
- [`Generation`] - everything that differs between driver generations:
  tuning and gain ranges, native stream format, and which parts of the
  configuration the device actually takes.

A [`SimDevice`] is included for running without hardware:

```
use waverave_pluto::{Generation, SimDevice, Source};

# fn main() -> Result<(), waverave_pluto::Error> {
let mut src = Source::open(Generation::Pluto, "", SimDevice::open)?;

// Each of these commits the full configuration to the device.
src.set_center_freq(2_400_000_000)?;
src.set_sample_rate(10_000_000)?;
src.set_gain_named(40.0, "RX1")?;

// Reads never go to the device.
assert_eq!(src.center_freq(), 2_400_000_000);
assert_eq!(src.device().params().frequency, 2_400_000_000);

let mut pow_sum = 0.0;
let block = src.read_block()?;
for x in block.iter() {
    pow_sum += x.norm_sqr() as f64;
}
let average_power = (pow_sum / block.len() as f64).log10() * 10.0;
assert!(average_power < 0.0);
# Ok(())
# }
```

*/

#![warn(missing_docs)]

mod config;
pub mod convert;
mod device;
mod error;
mod generation;
mod range;
pub mod sim;
mod source;

pub use crate::config::{
    AUTO_BANDWIDTH_RATIO, Config, DEFAULT_GAIN_MODE, GainSetting, MANUAL_GAIN_MODE, OpenParams,
    Params, auto_bandwidth,
};
pub use crate::convert::FormatConverter;
pub use crate::device::{Device, RawBlock};
pub use crate::error::Error;
pub use crate::generation::{
    ADC_FULL_SCALE, GAIN_NAMES, Generation, NativeFormat, RF_PORT, SAMPLE_RATES, list_devices,
};
pub use crate::range::{MetaRange, Range};
pub use crate::sim::SimDevice;
pub use crate::source::Source;

/// Complex 32-bit floating point samples, as produced by a [`Source`].
pub type ComplexF32 = num_complex::Complex<f32>;
