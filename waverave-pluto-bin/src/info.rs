use clap::Args;
use waverave_pluto::{Config, GAIN_NAMES, Generation, MetaRange, Range, list_devices};

/// Print the known device kinds and the capabilities of a generation.
#[derive(Args, Debug)]
pub struct Cmd {
    /// Show every generation instead of just the selected one.
    #[arg(long)]
    all: bool,
}

#[derive(Clone, Debug)]
struct AllInfo {
    generation: Generation,
    freq_range: Range,
    gain_range: Range,
    sample_rates: MetaRange,
    config: Config,
}

impl AllInfo {
    fn load(generation: Generation) -> Self {
        AllInfo {
            generation,
            freq_range: generation.freq_range(),
            gain_range: generation.gain_range(),
            sample_rates: generation.sample_rates(),
            config: Config::new(generation),
        }
    }
}

impl std::fmt::Display for AllInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cfg = &self.config;
        writeln!(f, "{} ({})", self.generation, self.generation.descriptor())?;
        writeln!(
            f,
            "Frequency range: {:.0}-{:.0} MHz",
            self.freq_range.start / 1e6,
            self.freq_range.stop / 1e6
        )?;
        writeln!(f, "Gain range: {} dB", self.gain_range)?;
        write!(f, "Sample rates:")?;
        for rate in self.sample_rates.values() {
            write!(f, " {}", rate / 1e6)?;
        }
        writeln!(f, " MHz")?;
        writeln!(
            f,
            "Gain channels: {} ({} independently controlled)",
            GAIN_NAMES.join(", "),
            self.generation.gain_channels()
        )?;
        writeln!(f, "Antennas: {}", cfg.rf_port)?;
        writeln!(f, "Native format: {:?}", self.generation.native_format())?;
        writeln!(f, "Defaults:")?;
        writeln!(f, "    URI: {}", cfg.uri)?;
        writeln!(f, "    Frequency: {} Hz", cfg.frequency)?;
        writeln!(f, "    Sample rate: {} Hz", cfg.sample_rate)?;
        writeln!(f, "    Bandwidth: {} Hz", cfg.bandwidth)?;
        writeln!(f, "    Channel mask: 0b{:04b}", cfg.channel_mask())?;
        writeln!(f, "    Buffer size: {} samples", cfg.buffer_size)?;
        for (name, gain) in GAIN_NAMES.iter().zip(cfg.gain.iter()) {
            writeln!(f, "    {name} gain: {} dB ({})", gain.value, gain.mode)?;
        }
        Ok(())
    }
}

impl Cmd {
    pub fn cmd(&self, generation: Generation) -> color_eyre::Result<()> {
        println!("Device descriptors:");
        for dev in list_devices() {
            println!("    {dev}");
        }
        let generations: &[Generation] = if self.all {
            &Generation::ALL
        } else {
            std::slice::from_ref(&generation)
        };
        for g in generations {
            println!();
            print!("{}", AllInfo::load(*g));
        }
        Ok(())
    }
}
