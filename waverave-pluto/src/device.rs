use crate::{ComplexF32, Error, config::Params};

/// One block of samples, in the device's native stream format.
#[derive(Clone, Debug, PartialEq)]
pub enum RawBlock {
    /// Complex samples, already normalized to unit full scale.
    Complex(Vec<ComplexF32>),
    /// Separate in-phase and quadrature integer streams. These are expected
    /// to be sample-synchronized, but a block may end with one stream ahead of
    /// the other.
    Split {
        /// In-phase samples.
        i: Vec<i16>,
        /// Quadrature samples.
        q: Vec<i16>,
    },
}

impl RawBlock {
    /// Number of complex samples this block can produce on its own.
    pub fn len(&self) -> usize {
        match self {
            Self::Complex(v) => v.len(),
            Self::Split { i, q } => i.len().min(q.len()),
        }
    }

    /// Returns true if the block can't produce any samples on its own.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The streaming device underneath a [`Source`][crate::Source].
///
/// Implementations do the actual register I/O and buffer transport. The only
/// configuration entry point is [`set_params`][Device::set_params], which
/// always receives the *entire* reconfigurable state and must apply it as
/// one operation. Implementations are expected to enforce their own limits
/// (tuning range, supported rates); the source does no local validation.
///
/// Opening a device is left to the caller of [`Source::open`][crate::Source::open],
/// which hands it the complete [`OpenParams`][crate::OpenParams].
pub trait Device: Send {
    /// Apply a complete configuration snapshot.
    fn set_params(&mut self, params: &Params) -> Result<(), Error>;

    /// Block until the next buffer of samples is ready and return it.
    fn recv(&mut self) -> Result<RawBlock, Error>;
}

impl<D: Device + ?Sized> Device for Box<D> {
    fn set_params(&mut self, params: &Params) -> Result<(), Error> {
        (**self).set_params(params)
    }

    fn recv(&mut self) -> Result<RawBlock, Error> {
        (**self).recv()
    }
}
