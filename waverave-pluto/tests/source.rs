use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use anyhow::Result;
use waverave_pluto::{
    ComplexF32, Config, Device, Error, GainSetting, Generation, OpenParams, Params, RawBlock,
    Source,
};

/// Shared view into a [`Recorder`], kept by the test after the source takes
/// ownership of the device.
#[derive(Clone, Default)]
struct Log {
    opened: Arc<Mutex<Option<OpenParams>>>,
    commits: Arc<Mutex<Vec<Params>>>,
    fail: Arc<AtomicBool>,
}

impl Log {
    fn commits(&self) -> Vec<Params> {
        self.commits.lock().unwrap().clone()
    }

    fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::Release);
    }
}

/// Records every configuration it's given, optionally rejecting them.
struct Recorder {
    log: Log,
    block: RawBlock,
}

impl Device for Recorder {
    fn set_params(&mut self, params: &Params) -> Result<(), Error> {
        self.log.commits.lock().unwrap().push(params.clone());
        if self.log.fail.load(Ordering::Acquire) {
            Err(Error::Device("configuration rejected".into()))
        } else {
            Ok(())
        }
    }

    fn recv(&mut self) -> Result<RawBlock, Error> {
        Ok(self.block.clone())
    }
}

fn open_with(generation: Generation, block: RawBlock) -> Result<(Source<Recorder>, Log)> {
    let log = Log::default();
    let dev_log = log.clone();
    let src = Source::open(generation, "plutosdr,label='PlutoSDR'", move |open| {
        *dev_log.opened.lock().unwrap() = Some(open.clone());
        Ok(Recorder {
            log: dev_log,
            block,
        })
    })?;
    Ok((src, log))
}

fn open(generation: Generation) -> Result<(Source<Recorder>, Log)> {
    open_with(generation, RawBlock::Complex(vec![ComplexF32::new(0.25, -0.25); 16]))
}

fn defaults(generation: Generation) -> Params {
    Config::new(generation).snapshot(generation)
}

#[test]
fn opened_with_complete_parameters() -> Result<()> {
    let (_src, log) = open(Generation::Fmcomms2)?;
    let opened = log.opened.lock().unwrap().clone().expect("device was opened");
    assert_eq!(opened.generation, Generation::Fmcomms2);
    assert_eq!(opened.uri, "ip:192.168.2.1");
    assert_eq!(opened.decimation, 0);
    assert_eq!(opened.channels, [true, true, false, false]);
    assert_eq!(opened.buffer_size, 128 * 1024);
    assert_eq!(opened.params, defaults(Generation::Fmcomms2));
    assert!(log.commits().is_empty());
    Ok(())
}

#[test]
fn center_freq_commits_full_state() -> Result<()> {
    let (mut src, log) = open(Generation::Pluto)?;
    assert_eq!(src.freq_range().start, 70e6);
    assert_eq!(src.freq_range().stop, 6000e6);

    assert_eq!(src.set_center_freq(2_400_000_000)?, 2_400_000_000);
    assert_eq!(src.center_freq(), 2_400_000_000);

    let expected = Params {
        frequency: 2_400_000_000,
        ..defaults(Generation::Pluto)
    };
    assert_eq!(log.commits(), [expected]);
    Ok(())
}

#[test]
fn per_channel_gain_commits() -> Result<()> {
    let (mut src, log) = open(Generation::Fmcomms2)?;
    src.set_gain_named(40.0, "RX1")?;
    src.set_gain_named(50.0, "RX2")?;
    assert_eq!(src.gain_named("RX1"), 40.0);
    assert_eq!(src.gain_named("RX2"), 50.0);

    let commits = log.commits();
    assert_eq!(commits.len(), 2);
    assert_eq!(commits[0].gain1, GainSetting::new("fast_attack", 40.0));
    assert_eq!(commits[0].gain2, Some(GainSetting::new("fast_attack", 64.0)));
    assert_eq!(commits[1].gain1, GainSetting::new("fast_attack", 40.0));
    assert_eq!(commits[1].gain2, Some(GainSetting::new("fast_attack", 50.0)));
    for c in commits.iter() {
        assert_eq!(c.frequency, 434_000_000);
        assert_eq!(c.rf_port.as_deref(), Some("A_BALANCED"));
    }
    Ok(())
}

#[test]
fn single_gain_generation_only_sends_rx1() -> Result<()> {
    let (mut src, log) = open(Generation::Pluto)?;
    src.set_gain_named(50.0, "RX2")?;
    assert_eq!(src.gain_named("RX2"), 50.0);
    assert_eq!(src.gain(), 64.0);
    let commits = log.commits();
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].gain2, None);
    assert_eq!(commits[0].rf_port, None);
    Ok(())
}

#[test]
fn unknown_gain_name_still_commits() -> Result<()> {
    let (mut src, log) = open(Generation::Fmcomms2)?;
    src.set_gain_named(12.0, "unknown")?;
    assert_eq!(src.gain_named("RX1"), 64.0);
    assert_eq!(src.gain_named("RX2"), 64.0);
    assert_eq!(log.commits(), [defaults(Generation::Fmcomms2)]);
    Ok(())
}

#[test]
fn unknown_gain_mode_name_still_commits() -> Result<()> {
    let (mut src, log) = open(Generation::Fmcomms2)?;
    src.set_gain_mode("manual", "RX9")?;
    assert_eq!(src.gain_mode("RX1"), Some("fast_attack"));
    assert_eq!(src.gain_mode("RX2"), Some("fast_attack"));
    assert_eq!(src.gain_mode("RX9"), None);
    assert_eq!(log.commits(), [defaults(Generation::Fmcomms2)]);
    Ok(())
}

#[test]
fn gain_mode_commits_per_channel() -> Result<()> {
    let (mut src, log) = open(Generation::Fmcomms2)?;
    src.set_gain_mode("manual", "RX2")?;
    src.set_gain_named(20.0, "RX2")?;
    assert_eq!(src.gain_mode("RX2"), Some("manual"));

    let commits = log.commits();
    assert_eq!(commits.len(), 2);
    assert_eq!(commits[0].gain1, GainSetting::new("fast_attack", 64.0));
    assert_eq!(commits[0].gain2, Some(GainSetting::new("manual", 64.0)));
    assert_eq!(commits[1].gain2, Some(GainSetting::new("manual", 20.0)));
    Ok(())
}

#[test]
fn global_gain_sets_both() -> Result<()> {
    let (mut src, log) = open(Generation::Fmcomms2)?;
    src.set_gain(33.0)?;
    assert_eq!(src.gain_named("RX1"), 33.0);
    assert_eq!(src.gain_named("RX2"), 33.0);
    let commits = log.commits();
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].gain1.value, 33.0);
    assert_eq!(commits[0].gain2.as_ref().map(|g| g.value), Some(33.0));
    Ok(())
}

#[test]
fn freq_corr_and_antenna_never_commit() -> Result<()> {
    let (mut src, log) = open(Generation::Pluto)?;
    src.set_freq_corr(2.5);
    src.set_freq_corr(-0.75);
    assert_eq!(src.freq_corr(), -0.75);
    assert_eq!(src.set_antenna("RX2B"), "A_BALANCED");
    assert_eq!(src.antennas(), [src.antenna().to_owned()]);
    assert!(log.commits().is_empty());
    Ok(())
}

#[test]
fn read_after_write() -> Result<()> {
    let (mut src, log) = open(Generation::Fmcomms2)?;
    src.set_sample_rate(20_000_000)?;
    src.set_center_freq(915_000_000)?;
    log.fail(true);
    let _ = src.set_bandwidth(5_000_000);
    let _ = src.set_sample_rate(5_000_000);
    log.fail(false);
    src.set_gain_named(7.0, "RX2")?;
    let _ = src.set_center_freq(1_000_000_000);

    assert_eq!(src.sample_rate(), 5_000_000);
    assert_eq!(src.center_freq(), 1_000_000_000);
    assert_eq!(src.bandwidth(), 5_000_000);
    assert_eq!(src.gain_named("RX1"), 64.0);
    assert_eq!(src.gain_named("RX2"), 7.0);
    assert_eq!(log.commits().len(), 6);
    assert!(!src.is_diverged());
    Ok(())
}

#[test]
fn failed_commit_keeps_requested_value() -> Result<()> {
    let (mut src, log) = open(Generation::Pluto)?;
    log.fail(true);

    let err = src.set_sample_rate(10_000_000).unwrap_err();
    assert!(matches!(err, Error::Device(_)));
    assert_eq!(src.sample_rate(), 10_000_000);
    assert_eq!(log.commits().len(), 1);
    assert_eq!(log.commits()[0].sample_rate, 10_000_000);

    // Device still has the old state; the source can say so
    assert!(src.is_diverged());
    assert_eq!(src.last_committed(), &defaults(Generation::Pluto));

    // A later successful commit brings them back in line
    log.fail(false);
    src.commit()?;
    assert!(!src.is_diverged());
    assert_eq!(src.last_committed().sample_rate, 10_000_000);
    Ok(())
}

#[test]
fn auto_bandwidth_not_recomputed() -> Result<()> {
    let (mut src, log) = open(Generation::Pluto)?;
    src.set_sample_rate(5_000_000)?;
    assert_eq!(src.set_bandwidth(0)?, 4_000_000);
    src.set_sample_rate(20_000_000)?;
    assert_eq!(src.bandwidth(), 4_000_000);
    let commits = log.commits();
    assert_eq!(commits[1].bandwidth, 4_000_000);
    assert_eq!(commits[2].bandwidth, 4_000_000);
    assert_eq!(commits[2].sample_rate, 20_000_000);
    Ok(())
}

#[test]
fn complex_blocks_pass_through() -> Result<()> {
    let (mut src, _log) = open(Generation::Pluto)?;
    let block = src.read_block()?;
    assert_eq!(block, vec![ComplexF32::new(0.25, -0.25); 16]);
    Ok(())
}

#[test]
fn split_blocks_are_converted() -> Result<()> {
    let block = RawBlock::Split {
        i: vec![2048, 0, -1024],
        q: vec![0, -2048, 512],
    };
    let (mut src, _log) = open_with(Generation::Fmcomms2, block)?;
    assert_eq!(
        src.read_block()?,
        [
            ComplexF32::new(1.0, 0.0),
            ComplexF32::new(0.0, -1.0),
            ComplexF32::new(-0.5, 0.25),
        ]
    );
    Ok(())
}

#[test]
fn one_sided_stream_desync_is_reported() -> Result<()> {
    let block = RawBlock::Split {
        i: vec![100; 100_000],
        q: Vec::new(),
    };
    let (mut src, _log) = open_with(Generation::Fmcomms2, block)?;

    // The first block fits in the backlog, the second pushes it past one
    // device buffer.
    assert!(src.read_block()?.is_empty());
    match src.read_block() {
        Err(Error::StreamDesync { held, limit }) => {
            assert_eq!(held, 200_000);
            assert_eq!(limit, src.config().buffer_size);
        }
        other => panic!("expected a desync error, got {other:?}"),
    }

    // Backlog was dropped, so the cycle starts over
    assert!(src.read_block()?.is_empty());
    Ok(())
}

#[test]
fn mismatched_stream_format() -> Result<()> {
    let (mut src, _log) = open(Generation::Fmcomms2)?;
    assert!(matches!(src.read_block(), Err(Error::StreamMismatch)));
    Ok(())
}

#[test]
fn open_failure_is_returned() {
    let res = Source::<Recorder>::open(Generation::Pluto, "", |open| {
        Err(Error::Unreachable {
            uri: open.uri.clone(),
        })
    });
    match res {
        Err(Error::Unreachable { uri }) => assert_eq!(uri, "ip:pluto.local"),
        _ => panic!("expected the open failure to be returned"),
    }
}
