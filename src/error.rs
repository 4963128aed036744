//! Error types for the driver
//!
//! The protocol itself has no failure mode distinct from "unexpected pin
//! pattern", which is absorbed by the fail-closed mode classification.
//! What remains observable as an error is GPIO failure from the hardware
//! interface and the one out-of-contract input, an invalid state byte
//! index.

use crate::interface::PadInterface;

/// Errors that can occur when reading a pad
///
/// Generic over the interface type to preserve the specific hardware
/// error. This allows error handling code to match on the underlying GPIO
/// error.
#[derive(Debug)]
pub enum Error<I: PadInterface> {
    /// GPIO error from the [`PadInterface`] implementation
    Interface(I::Error),
    /// State byte index outside `{0, 1}`
    ///
    /// Rejected before any hardware access, so an invalid call has no
    /// side effect on the sampling gates or the change flag.
    InvalidIndex {
        /// The index that was requested
        index: u8,
    },
}

impl<I: PadInterface> core::fmt::Display for Error<I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Interface(_) => write!(f, "Interface error"),
            Error::InvalidIndex { index } => {
                write!(f, "Invalid state byte index {index} (expected 0 or 1)")
            }
        }
    }
}

impl<I: PadInterface + core::fmt::Debug> core::error::Error for Error<I> {}
