use clap::Args;
use color_eyre::eyre::Context;
use tracing::warn;
use waverave_pluto::{Device, SAMPLE_RATES, Source};

#[derive(Args, Debug)]
pub struct RadioParams {
    /// Center frequency in Hz. Valid range depends on the generation: 70-6000
    /// MHz for pluto, 325-3800 MHz for fmcomms2.
    #[arg(short, long)]
    freq_hz: Option<u64>,

    /// Sample rate in Hz. Supported rates are 2.5, 5, 10, and 20 MHz.
    #[arg(short = 'r', long = "rate")]
    sample_rate_hz: Option<u32>,

    /// RF bandwidth in Hz. Set to 0 to use 80% of the sample rate.
    #[arg(short, long = "bandwidth")]
    bandwidth_hz: Option<u32>,

    /// Gain-control mode for both channels: manual, slow_attack, fast_attack,
    /// or hybrid. Gain values only take effect in manual mode.
    #[arg(short = 'm', long)]
    gain_mode: Option<String>,

    /// Gain for both RX1 and RX2, in dB. Rounded onto the generation's gain
    /// range.
    #[arg(short, long)]
    gain: Option<f64>,

    /// RX1 gain in dB. Applied after `--gain`.
    #[arg(long = "rx1")]
    rx1_gain: Option<f64>,

    /// RX2 gain in dB. Applied after `--gain`.
    #[arg(long = "rx2")]
    rx2_gain: Option<f64>,

    /// Frequency correction in ppm. Recorded only; the radio has no
    /// correction control.
    #[arg(short = 'C', long)]
    ppm: Option<f64>,

    /// Antenna port. Only A_BALANCED is wired up.
    #[arg(short, long)]
    antenna: Option<String>,
}

impl RadioParams {
    pub fn configure<D: Device>(&self, src: &mut Source<D>) -> color_eyre::Result<()> {
        if let Some(freq_hz) = self.freq_hz {
            src.set_center_freq(freq_hz)
                .wrap_err("Failed setting frequency")?;
        }

        // Sample rate goes before bandwidth so an automatic bandwidth follows
        // the new rate.
        if let Some(rate) = self.sample_rate_hz {
            if !SAMPLE_RATES.contains(&rate) {
                warn!("Sample rate {rate} Hz isn't one of the supported rates {SAMPLE_RATES:?}");
            }
            src.set_sample_rate(rate)
                .wrap_err("Failed setting sample rate")?;
        }

        if let Some(bw) = self.bandwidth_hz {
            src.set_bandwidth(bw)
                .wrap_err("Failed setting bandwidth")?;
        }

        if let Some(mode) = self.gain_mode.as_deref() {
            for name in src.gain_names() {
                src.set_gain_mode(mode, name)
                    .wrap_err_with(|| format!("Failed setting {name} gain mode"))?;
            }
        }

        let gain_range = src.gain_range();
        let clip_gain = |name: &str, gain: f64| {
            let clipped = gain_range.clip(gain, true);
            if clipped != gain {
                warn!("{name} gain {gain} dB adjusted to {clipped} dB (range {gain_range})");
            }
            clipped
        };

        if let Some(gain) = self.gain {
            src.set_gain(clip_gain("RX1/RX2", gain))
                .wrap_err("Failed setting gain")?;
        }

        if let Some(gain) = self.rx1_gain {
            src.set_gain_named(clip_gain("RX1", gain), "RX1")
                .wrap_err("Failed setting RX1 gain")?;
        }

        if let Some(gain) = self.rx2_gain {
            src.set_gain_named(clip_gain("RX2", gain), "RX2")
                .wrap_err("Failed setting RX2 gain")?;
        }

        if let Some(ppm) = self.ppm {
            src.set_freq_corr(ppm);
        }

        if let Some(antenna) = self.antenna.as_deref() {
            let selected = src.set_antenna(antenna);
            if selected != antenna {
                warn!("Antenna {antenna} isn't available, staying on {selected}");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use waverave_pluto::{Generation, SimDevice};

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        params: RadioParams,
    }

    fn configured(generation: Generation, args: &[&str]) -> Source<SimDevice> {
        let cli = TestCli::try_parse_from(std::iter::once("test").chain(args.iter().copied()))
            .unwrap();
        let mut src = Source::open(generation, "", SimDevice::open).unwrap();
        cli.params.configure(&mut src).unwrap();
        src
    }

    #[test]
    fn out_of_range_gain_is_clipped() {
        let src = configured(Generation::Pluto, &["-m", "manual", "-g", "90"]);
        assert_eq!(src.gain(), 72.0);
        assert_eq!(src.device().params().gain1.value, 72.0);

        let src = configured(Generation::Fmcomms2, &["-m", "manual", "--rx2", "90.4"]);
        assert_eq!(src.gain_named("RX2"), 90.0);
        assert_eq!(src.gain_named("RX1"), 64.0);
    }

    #[test]
    fn rate_applied_before_auto_bandwidth() {
        let src = configured(Generation::Pluto, &["-b", "0", "-r", "10000000"]);
        assert_eq!(src.sample_rate(), 10_000_000);
        assert_eq!(src.bandwidth(), 8_000_000);
    }
}
