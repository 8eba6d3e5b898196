use std::{
    io::Write,
    time::{Duration, Instant},
};

use clap::Args;
use color_eyre::{Section, eyre::Context};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use waverave_pluto::{ComplexF32, Device, Source};

#[derive(Args, Debug)]
pub struct Cmd {
    #[command(flatten)]
    params: crate::config::RadioParams,

    /// Number of sample blocks that can be queued between the radio and the
    /// writer. Clamped between 2 and 256.
    #[arg(short = 'q', long, default_value_t = 16)]
    queue_depth: usize,

    /// Number of samples to receive (default is unlimited).
    #[arg(short = 'n', long = "samples")]
    num_samples: Option<u64>,

    /// Record complex f32 samples to a file. Omit for stdout.
    #[arg(default_value_t)]
    filename: String,
}

impl Cmd {
    pub async fn cmd<D: Device + 'static>(&self, mut src: Source<D>) -> color_eyre::Result<()> {
        self.params
            .configure(&mut src)
            .wrap_err("Failed configuring the radio")?;

        let quit = crate::os_signal::quit_watch().await;
        let mut tracker = tokio::task::JoinSet::new();

        // Reading from the device blocks, so both ends run on blocking threads
        let (buf_tx, buf_rx) = crossbeam_channel::bounded(self.queue_depth.clamp(2, 256));
        let token = quit.token();
        tracker.spawn_blocking(move || run_rf(src, buf_tx, token));
        let token = quit.token();
        let filename = self.filename.clone();
        let max_samples = self.num_samples;
        tracker.spawn_blocking(move || write_file(buf_rx, filename, max_samples, token));

        quit.quit().await;
        let results =
            tokio::time::timeout(Duration::from_secs(1), tracker.join_all()).await?;

        let mut errors = results.into_iter().filter_map(Result::err);
        let Some(first) = errors.next() else {
            return Ok(());
        };
        Err(errors.fold(first, |report, e| report.section(e)))
    }
}

/// Stream from the radio until told to quit. Cancels `quit` on the way out,
/// however it ends, so the writer and the main task stop too.
fn run_rf<D: Device>(
    src: Source<D>,
    buf_tx: Sender<Vec<ComplexF32>>,
    quit: CancellationToken,
) -> color_eyre::Result<()> {
    let res = stream_blocks(src, buf_tx, &quit);
    quit.cancel();
    res
}

fn stream_blocks<D: Device>(
    mut src: Source<D>,
    buf_tx: Sender<Vec<ComplexF32>>,
    quit: &CancellationToken,
) -> color_eyre::Result<()> {
    let start = Instant::now();
    let mut count = 0u64;
    while !quit.is_cancelled() {
        let buf = src
            .read_block()
            .wrap_err("Failed receiving from the radio")?;
        count += buf.len() as u64;
        match buf_tx.try_send(buf) {
            Ok(()) => (),
            Err(TrySendError::Full(_)) => error!("Radio to file buffer overflow"),
            Err(TrySendError::Disconnected(_)) => break,
        }
    }
    let secs = start.elapsed().as_secs_f64();
    info!(
        "Received {count} samples in {secs:.2} s ({:.3} MS/s)",
        count as f64 / secs.max(1e-9) / 1e6
    );
    Ok(())
}

/// Write samples out until told to quit or the sample limit is hit. Cancels
/// `quit` on the way out, including when the output can't be opened.
fn write_file(
    buf_rx: Receiver<Vec<ComplexF32>>,
    filename: String,
    max_samples: Option<u64>,
    quit: CancellationToken,
) -> color_eyre::Result<()> {
    let res = write_samples(buf_rx, &filename, max_samples, &quit);
    quit.cancel();
    res
}

fn open_output(filename: &str) -> color_eyre::Result<Box<dyn Write>> {
    if filename.is_empty() {
        return Ok(Box::new(std::io::stdout().lock()));
    }
    let file =
        std::fs::File::create(filename).wrap_err_with(|| format!("Couldn't create {filename}"))?;
    Ok(Box::new(std::io::BufWriter::new(file)))
}

fn write_samples(
    buf_rx: Receiver<Vec<ComplexF32>>,
    filename: &str,
    max_samples: Option<u64>,
    quit: &CancellationToken,
) -> color_eyre::Result<()> {
    let mut writer = open_output(filename)?;

    let mut sample_count = 0u64;
    while !quit.is_cancelled() {
        let buf = match buf_rx.recv_timeout(Duration::from_millis(100)) {
            Ok(buf) => buf,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };
        let take = match max_samples {
            Some(max) => buf.len().min((max - sample_count) as usize),
            None => buf.len(),
        };
        let bytes: &[u8] = bytemuck::cast_slice(&buf[..take]);
        writer
            .write_all(bytes)
            .wrap_err("Failed writing samples")?;
        sample_count += take as u64;
        if max_samples.is_some_and(|max| sample_count >= max) {
            break;
        }
    }

    if let Err(e) = writer.flush() {
        warn!("Failed flushing output: {e}");
    }
    Ok(())
}
