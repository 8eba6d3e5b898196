use std::ops::RangeInclusive;

/// An error from opening, configuring, or streaming from a radio device.
///
/// The adapter itself never recovers from any of these. They come from the
/// [`Device`][crate::Device] implementation and are handed straight back to
/// whoever called the setter:
///
/// - `Unreachable` means the device couldn't be reached at all. When
///   returned from a setter, the mirrored configuration has already been
///   updated and no longer matches the hardware until the next successful
///   commit.
/// - `TuningRange`, `ValueRange`, and `InvalidParameter` mean the device
///   rejected the configuration snapshot it was given.
/// - `Device` carries whatever message the underlying driver reported.
/// - `StreamMismatch` means a device handed back a sample block in a format
///   the source wasn't set up to convert.
/// - `StreamDesync` means a device's I and Q streams drifted too far apart to
///   pair up. The held samples are discarded and the next read starts fresh.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The device at the given URI couldn't be reached.
    #[error("Device at \"{uri}\" is unreachable")]
    #[allow(missing_docs)]
    Unreachable { uri: String },

    /// The requested center frequency is outside what the device can tune.
    #[error("Tuning value ({val} Hz) out of range ({}..={} Hz)", .range.start(), .range.end())]
    #[allow(missing_docs)]
    TuningRange { range: RangeInclusive<u64>, val: u64 },

    /// Some other numeric argument is out of range.
    #[error("Value ({val}) out of range ({}..={})", .range.start(), .range.end())]
    #[allow(missing_docs)]
    ValueRange { range: RangeInclusive<f64>, val: f64 },

    /// Some argument is invalid in a way not easily expressed as a range.
    #[error("Invalid Parameter: {0}")]
    InvalidParameter(&'static str),

    /// The device driver reported a failure.
    #[error("Device error: {0}")]
    Device(String),

    /// A sample block didn't match the stream format expected for this device.
    #[error("Sample block format doesn't match the device's native stream format")]
    StreamMismatch,

    /// One of a device's split I/Q streams ran too far ahead of the other.
    #[error("I/Q streams out of step by {held} samples (limit {limit})")]
    #[allow(missing_docs)]
    StreamDesync { held: usize, limit: usize },
}
