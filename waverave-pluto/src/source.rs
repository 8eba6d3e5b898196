use tracing::{debug, info, trace, warn};

use crate::{
    ComplexF32, Error,
    config::{Config, OpenParams, Params, auto_bandwidth},
    convert::FormatConverter,
    device::{Device, RawBlock},
    generation::{GAIN_NAMES, Generation, NativeFormat},
    range::{MetaRange, Range},
};

fn gain_index(name: &str) -> Option<usize> {
    GAIN_NAMES.iter().position(|n| *n == name)
}

/// A radio source: one device, its mirrored configuration, and its complex
/// sample output.
///
/// Every setter updates the mirrored [`Config`] first, then commits the
/// *whole* configuration to the device in one [`Device::set_params`] call.
/// Getters only ever read the mirror, so a value is always readable right
/// after it was set, whether or not the device accepted it.
///
/// If a commit fails, the error is returned and the mirror is left holding
/// the new value. The last snapshot the device actually accepted stays
/// available through [`last_committed`][Source::last_committed], and
/// [`is_diverged`][Source::is_diverged] reports whether the two differ.
/// Nothing is rolled back or retried; calling [`commit`][Source::commit]
/// again is up to the caller.
///
/// Setters take `&mut self` and do no locking of their own. Streaming with
/// [`read_block`][Source::read_block] goes through the same instance, so
/// samples read right after a commit may still have been produced under the
/// previous configuration.
///
/// ```
/// use waverave_pluto::{Generation, SimDevice, Source};
///
/// # fn main() -> Result<(), waverave_pluto::Error> {
/// let mut src = Source::open(Generation::Pluto, "", SimDevice::open)?;
///
/// src.set_center_freq(915_000_000)?;
/// src.set_sample_rate(5_000_000)?;
/// src.set_bandwidth(0)?; // auto: 0.8 * sample rate
/// src.set_gain_named(40.0, "RX1")?;
///
/// assert_eq!(src.bandwidth(), 4_000_000);
/// assert_eq!(src.device().commits(), 4);
///
/// let samples = src.read_block()?;
/// assert!(!samples.is_empty());
/// # Ok(())
/// # }
/// ```
pub struct Source<D> {
    generation: Generation,
    args: String,
    config: Config,
    last_committed: Params,
    device: D,
    converter: Option<FormatConverter>,
}

impl<D: Device> Source<D> {
    /// Open a source for the given hardware generation.
    ///
    /// `args` is an opaque argument string. It's kept around for reference but
    /// doesn't select or configure anything; every initial value is the
    /// generation's default.
    ///
    /// `open` is called once with the complete initial parameter set and must
    /// produce the device. Any error it returns is passed straight through.
    pub fn open<F>(generation: Generation, args: &str, open: F) -> Result<Self, Error>
    where
        F: FnOnce(&OpenParams) -> Result<D, Error>,
    {
        let config = Config::new(generation);
        let open_params = config.open_params(generation);
        let device = open(&open_params)?;
        info!(
            "Opened {} at {} ({} Hz, {} S/s)",
            generation, config.uri, config.frequency, config.sample_rate
        );
        let converter = match generation.native_format() {
            NativeFormat::ComplexF32 => None,
            NativeFormat::SplitI16 { divisor } => {
                Some(FormatConverter::new(divisor).with_max_held(config.buffer_size))
            }
        };
        Ok(Self {
            generation,
            args: args.to_owned(),
            config,
            last_committed: open_params.params,
            device,
            converter,
        })
    }

    /// Push the entire mirrored configuration to the device.
    ///
    /// All setters except [`set_freq_corr`][Self::set_freq_corr] and
    /// [`set_antenna`][Self::set_antenna] call this.
    pub fn commit(&mut self) -> Result<(), Error> {
        let params = self.config.snapshot(self.generation);
        debug!(?params, "Committing configuration");
        match self.device.set_params(&params) {
            Ok(()) => {
                self.last_committed = params;
                Ok(())
            }
            Err(e) => {
                warn!("Device rejected configuration: {e}");
                Err(e)
            }
        }
    }

    /// Get the next block of complex samples from the device.
    ///
    /// Devices with a split integer stream are run through the source's
    /// [`FormatConverter`] first. The returned block may be shorter than the
    /// device's buffer if its I and Q streams arrived out of step. If they
    /// drift apart by more than one buffer, this fails with
    /// [`Error::StreamDesync`].
    pub fn read_block(&mut self) -> Result<Vec<ComplexF32>, Error> {
        let block = self.device.recv()?;
        match (block, self.converter.as_mut()) {
            (RawBlock::Complex(samples), None) => Ok(samples),
            (RawBlock::Split { i, q }, Some(conv)) => conv.convert(&i, &q),
            _ => Err(Error::StreamMismatch),
        }
    }

    /// Set the sample rate, in Hz. Returns the rate set.
    pub fn set_sample_rate(&mut self, rate: u32) -> Result<u32, Error> {
        self.config.sample_rate = rate;
        self.commit()?;
        Ok(rate)
    }

    /// Set the center frequency, in Hz. Returns the frequency set.
    ///
    /// The frequency isn't checked against [`freq_range`][Self::freq_range];
    /// the device does its own range enforcement.
    pub fn set_center_freq(&mut self, freq: u64) -> Result<u64, Error> {
        self.config.frequency = freq;
        self.commit()?;
        Ok(freq)
    }

    /// Set the RF bandwidth, in Hz. Returns the bandwidth set.
    ///
    /// A bandwidth of 0 selects 80% of the current sample rate. This is
    /// resolved immediately, so later sample rate changes don't affect it.
    pub fn set_bandwidth(&mut self, bw: u32) -> Result<u32, Error> {
        let bw = if bw == 0 {
            auto_bandwidth(self.config.sample_rate)
        } else {
            bw
        };
        self.config.bandwidth = bw;
        self.commit()?;
        Ok(bw)
    }

    /// Set the gain of both channels, in dB. Returns the gain set.
    pub fn set_gain(&mut self, gain: f64) -> Result<f64, Error> {
        for g in self.config.gain.iter_mut() {
            g.value = gain;
        }
        self.commit()?;
        Ok(gain)
    }

    /// Set the gain of the `RX1` or `RX2` channel, in dB. Returns the gain
    /// passed in.
    ///
    /// Any other name leaves the gains unchanged, but still commits.
    pub fn set_gain_named(&mut self, gain: f64, name: &str) -> Result<f64, Error> {
        if let Some(idx) = gain_index(name) {
            self.config.gain[idx].value = gain;
        }
        self.commit()?;
        Ok(gain)
    }

    /// Set the gain-control mode (`manual`, `slow_attack`, `fast_attack`,
    /// `hybrid`) of the `RX1` or `RX2` channel.
    ///
    /// Any other name leaves the modes unchanged, but still commits.
    pub fn set_gain_mode(&mut self, mode: &str, name: &str) -> Result<(), Error> {
        if let Some(idx) = gain_index(name) {
            self.config.gain[idx].mode = mode.to_owned();
        }
        self.commit()
    }

    /// Select an antenna. The receive path is fixed, so this does nothing
    /// and returns the one antenna there is.
    pub fn set_antenna(&mut self, name: &str) -> &str {
        if name != self.config.rf_port {
            trace!("Ignoring antenna selection \"{name}\"");
        }
        self.antenna()
    }

    /// Set the frequency correction, in ppm. Returns the value set.
    ///
    /// The device has no correction control, so this is only stored and
    /// reported back; nothing is committed.
    pub fn set_freq_corr(&mut self, ppm: f64) -> f64 {
        trace!("Frequency correction set to {ppm} ppm (not sent to device)");
        self.config.freq_corr_ppm = ppm;
        ppm
    }

    /// Sample rate, in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    /// Center frequency, in Hz.
    pub fn center_freq(&self) -> u64 {
        self.config.frequency
    }

    /// RF bandwidth, in Hz.
    pub fn bandwidth(&self) -> u32 {
        self.config.bandwidth
    }

    /// Gain of `RX1`, in dB.
    pub fn gain(&self) -> f64 {
        self.config.gain[0].value
    }

    /// Gain of the named channel, in dB. Unknown names read as 0.
    pub fn gain_named(&self, name: &str) -> f64 {
        gain_index(name)
            .map(|idx| self.config.gain[idx].value)
            .unwrap_or(0.0)
    }

    /// Gain-control mode of the named channel.
    pub fn gain_mode(&self, name: &str) -> Option<&str> {
        gain_index(name).map(|idx| self.config.gain[idx].mode.as_str())
    }

    /// The selected antenna.
    pub fn antenna(&self) -> &str {
        &self.config.rf_port
    }

    /// Frequency correction, in ppm.
    pub fn freq_corr(&self) -> f64 {
        self.config.freq_corr_ppm
    }
}

impl<D> Source<D> {
    /// The hardware generation.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Short device label.
    pub fn name(&self) -> &'static str {
        self.generation.name()
    }

    /// The argument string given when opening.
    pub fn args(&self) -> &str {
        &self.args
    }

    /// Number of output streams. Always one complex stream.
    pub fn num_channels(&self) -> usize {
        1
    }

    /// The full mirrored configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The last configuration snapshot the device accepted.
    pub fn last_committed(&self) -> &Params {
        &self.last_committed
    }

    /// Check if the mirrored configuration differs from what the device last
    /// accepted, i.e. a commit failed and nothing has succeeded since.
    pub fn is_diverged(&self) -> bool {
        self.config.snapshot(self.generation) != self.last_committed
    }

    /// Supported sample rates.
    pub fn sample_rates(&self) -> MetaRange {
        self.generation.sample_rates()
    }

    /// Tunable frequency range.
    pub fn freq_range(&self) -> Range {
        self.generation.freq_range()
    }

    /// Gain range.
    pub fn gain_range(&self) -> Range {
        self.generation.gain_range()
    }

    /// Gain range of a named channel. The same for every name.
    pub fn gain_range_named(&self, _name: &str) -> Range {
        self.generation.gain_range()
    }

    /// Names of the gain channels.
    pub fn gain_names(&self) -> &'static [&'static str] {
        &GAIN_NAMES
    }

    /// Available antennas. There's only ever the one fixed port.
    pub fn antennas(&self) -> Vec<String> {
        vec![self.config.rf_port.clone()]
    }

    /// Borrow the underlying device.
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Mutably borrow the underlying device.
    ///
    /// Changes made directly on the device aren't reflected in the mirrored
    /// configuration.
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }
}
