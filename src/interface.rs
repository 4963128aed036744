//! Hardware interface abstraction
//!
//! This module provides the [`PadInterface`] trait and the [`Interface`]
//! struct for talking to a DE-9 gamepad through plain GPIO.
//!
//! ## Hardware Requirements
//!
//! A DE-9 pad needs:
//! - 6 GPIO inputs, configured with **pull-ups** (the pad pulls lines low):
//!   - **Up / Down / Left / Right**: direction lines
//!   - **A / B**: the two button lines (multiplexed on MD pads)
//! - 1 optional GPIO output:
//!   - **TH**: select line, toggled to switch MD pads between report
//!     phases. Without it only SMS pads can be read.
//!
//! The driver does not configure pin modes itself; hand it pins that your
//! HAL has already set up as pull-up inputs and a push-pull output.
//!
//! ## Example
//!
//! ```rust,ignore
//! use megapad::Interface;
//! use embedded_hal::digital::{InputPin, OutputPin};
//!
//! // Full wiring, TH present:
//! let interface = Interface::new(up, down, left, right, a, b, th, delay, clock);
//!
//! // SMS-only wiring, no TH:
//! let interface = Interface::without_select(up, down, left, right, a, b, delay, clock);
//! ```

use core::convert::Infallible;
use core::fmt::Debug;
use core::marker::PhantomData;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorType, InputPin, OutputPin};

/// Snapshot of the six controller lines.
///
/// The wiring is active-low: every field is `true` when the corresponding
/// line reads logic low, i.e. when the pad is asserting it. Which button a
/// line carries depends on the current report phase of the pad.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Lines {
    /// Up line asserted (low)
    pub up: bool,
    /// Down line asserted (low)
    pub down: bool,
    /// Left line asserted (low)
    pub left: bool,
    /// Right line asserted (low)
    pub right: bool,
    /// First button line asserted (low)
    pub a: bool,
    /// Second button line asserted (low)
    pub b: bool,
}

impl Lines {
    /// Left and Right asserted together.
    ///
    /// Physically impossible on a passive SMS pad; MD pads overdrive both
    /// lines low during the TH-low report phase, which is what mode
    /// detection keys on.
    pub const fn left_right_low(&self) -> bool {
        self.left && self.right
    }

    /// All four direction lines asserted together.
    ///
    /// Only presented by 6-button pads while parked in their extended
    /// report phase.
    pub const fn all_directions_low(&self) -> bool {
        self.up && self.down && self.left && self.right
    }
}

/// Monotonic millisecond clock
///
/// The sampling gates need wall-clock milliseconds that never run
/// backwards. Implement this for whatever time source your platform has
/// (a timer peripheral, a tick counter, ...). The [`StdMonotonic`] impl is
/// available with the `std` feature.
pub trait Monotonic {
    /// Milliseconds since some fixed, arbitrary point in the past.
    fn now_ms(&mut self) -> u64;
}

/// Monotonic clock backed by [`std::time::Instant`].
#[cfg(feature = "std")]
#[cfg_attr(docsrs, doc(cfg(feature = "std")))]
pub struct StdMonotonic(std::time::Instant);

#[cfg(feature = "std")]
impl StdMonotonic {
    /// Create a clock starting at zero.
    pub fn new() -> Self {
        Self(std::time::Instant::now())
    }
}

#[cfg(feature = "std")]
impl Default for StdMonotonic {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Monotonic for StdMonotonic {
    fn now_ms(&mut self) -> u64 {
        self.0.elapsed().as_millis() as u64
    }
}

/// Trait for hardware access to a DE-9 pad
///
/// This trait abstracts over the GPIO mechanism, allowing
/// [`MegaPad`](crate::pad::MegaPad) to work with any implementation that
/// can drive one output, sample six inputs, busy-wait for microseconds and
/// read a monotonic clock. For embedded-hal pins use the provided
/// [`Interface`]; tests use [`SimPad`](crate::sim::SimPad).
pub trait PadInterface {
    /// Error type for interface operations
    ///
    /// Must implement [`Debug`] for error reporting.
    type Error: Debug;

    /// Whether a TH/select line is wired.
    ///
    /// Without one the pad is treated as SMS for the lifetime of the
    /// driver and mode detection never runs.
    fn has_select(&self) -> bool;

    /// Drive TH high (idle / first report phase).
    ///
    /// Must silently succeed when no select line is bound.
    ///
    /// # Errors
    ///
    /// Returns an error if GPIO fails.
    fn select_high(&mut self) -> Result<(), Self::Error>;

    /// Drive TH low (second report phase).
    ///
    /// Must silently succeed when no select line is bound.
    ///
    /// # Errors
    ///
    /// Returns an error if GPIO fails.
    fn select_low(&mut self) -> Result<(), Self::Error>;

    /// Sample all six lines.
    ///
    /// # Errors
    ///
    /// Returns an error if GPIO fails.
    fn read_lines(&mut self) -> Result<Lines, Self::Error>;

    /// Busy-wait for at least `us` microseconds.
    ///
    /// The protocol needs TH held stable for a minimum settle time before
    /// the pad's internal logic reacts; these waits are blocking by design
    /// and must not be preempted mid-sequence.
    fn settle_us(&mut self, us: u32);

    /// Read the monotonic millisecond clock used by the sampling gates.
    fn now_ms(&mut self) -> u64;
}

/// Placeholder output pin for wirings without a TH line
///
/// [`Interface::without_select`] uses this as the select pin type so that
/// SMS-only wirings need no phantom pin from the HAL. It is never driven.
pub struct NoSelect<E = Infallible>(PhantomData<E>);

impl<E: digital::Error> ErrorType for NoSelect<E> {
    type Error = E;
}

impl<E: digital::Error> OutputPin for NoSelect<E> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Hardware interface implementation over embedded-hal v1.0 pins
///
/// ## Type Parameters
///
/// * `UP`, `DOWN`, `LEFT`, `RIGHT` - direction lines implementing [`InputPin`]
/// * `A`, `B` - button lines implementing [`InputPin`]
/// * `TH` - select line implementing [`OutputPin`] (use [`NoSelect`] when absent)
/// * `D` - delay implementing [`DelayNs`]
/// * `T` - clock implementing [`Monotonic`]
///
/// All pins must share one error type, as is usual for pins from a single
/// HAL.
pub struct Interface<UP, DOWN, LEFT, RIGHT, A, B, TH, D, T> {
    up: UP,
    down: DOWN,
    left: LEFT,
    right: RIGHT,
    a: A,
    b: B,
    /// Select line; `None` pins the driver to SMS mode
    select: Option<TH>,
    delay: D,
    clock: T,
}

impl<UP, DOWN, LEFT, RIGHT, A, B, TH, D, T, PinErr> Interface<UP, DOWN, LEFT, RIGHT, A, B, TH, D, T>
where
    UP: InputPin<Error = PinErr>,
    DOWN: InputPin<Error = PinErr>,
    LEFT: InputPin<Error = PinErr>,
    RIGHT: InputPin<Error = PinErr>,
    A: InputPin<Error = PinErr>,
    B: InputPin<Error = PinErr>,
    TH: OutputPin<Error = PinErr>,
    D: DelayNs,
    T: Monotonic,
    PinErr: Debug,
{
    /// Create an interface with a TH/select line.
    ///
    /// Mode detection will run when the driver is constructed on top of
    /// this interface.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        up: UP,
        down: DOWN,
        left: LEFT,
        right: RIGHT,
        a: A,
        b: B,
        th: TH,
        delay: D,
        clock: T,
    ) -> Self {
        Self {
            up,
            down,
            left,
            right,
            a,
            b,
            select: Some(th),
            delay,
            clock,
        }
    }
}

impl<UP, DOWN, LEFT, RIGHT, A, B, D, T, PinErr>
    Interface<UP, DOWN, LEFT, RIGHT, A, B, NoSelect<PinErr>, D, T>
where
    UP: InputPin<Error = PinErr>,
    DOWN: InputPin<Error = PinErr>,
    LEFT: InputPin<Error = PinErr>,
    RIGHT: InputPin<Error = PinErr>,
    A: InputPin<Error = PinErr>,
    B: InputPin<Error = PinErr>,
    D: DelayNs,
    T: Monotonic,
    PinErr: digital::Error,
{
    /// Create an interface without a TH/select line.
    ///
    /// The driver on top will be locked to SMS mode for its lifetime.
    #[allow(clippy::too_many_arguments)]
    pub fn without_select(
        up: UP,
        down: DOWN,
        left: LEFT,
        right: RIGHT,
        a: A,
        b: B,
        delay: D,
        clock: T,
    ) -> Self {
        Self {
            up,
            down,
            left,
            right,
            a,
            b,
            select: None,
            delay,
            clock,
        }
    }
}

impl<UP, DOWN, LEFT, RIGHT, A, B, TH, D, T, PinErr> PadInterface
    for Interface<UP, DOWN, LEFT, RIGHT, A, B, TH, D, T>
where
    UP: InputPin<Error = PinErr>,
    DOWN: InputPin<Error = PinErr>,
    LEFT: InputPin<Error = PinErr>,
    RIGHT: InputPin<Error = PinErr>,
    A: InputPin<Error = PinErr>,
    B: InputPin<Error = PinErr>,
    TH: OutputPin<Error = PinErr>,
    D: DelayNs,
    T: Monotonic,
    PinErr: Debug,
{
    type Error = PinErr;

    fn has_select(&self) -> bool {
        self.select.is_some()
    }

    fn select_high(&mut self) -> Result<(), Self::Error> {
        if let Some(th) = self.select.as_mut() {
            th.set_high()?;
        }
        Ok(())
    }

    fn select_low(&mut self) -> Result<(), Self::Error> {
        if let Some(th) = self.select.as_mut() {
            th.set_low()?;
        }
        Ok(())
    }

    fn read_lines(&mut self) -> Result<Lines, Self::Error> {
        Ok(Lines {
            up: self.up.is_low()?,
            down: self.down.is_low()?,
            left: self.left.is_low()?,
            right: self.right.is_low()?,
            a: self.a.is_low()?,
            b: self.b.is_low()?,
        })
    }

    fn settle_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }

    fn now_ms(&mut self) -> u64 {
        self.clock.now_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fixed-level input pin.
    struct FakePin(bool);

    impl ErrorType for FakePin {
        type Error = Infallible;
    }

    impl InputPin for FakePin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(self.0)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.0)
        }
    }

    struct FakeOut;

    impl ErrorType for FakeOut {
        type Error = Infallible;
    }

    impl OutputPin for FakeOut {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    struct ZeroClock;

    impl Monotonic for ZeroClock {
        fn now_ms(&mut self) -> u64 {
            0
        }
    }

    #[test]
    fn read_lines_maps_low_to_asserted() {
        // Up held low (pressed), everything else floating high.
        let mut interface = Interface::new(
            FakePin(false),
            FakePin(true),
            FakePin(true),
            FakePin(true),
            FakePin(true),
            FakePin(true),
            FakeOut,
            NoDelay,
            ZeroClock,
        );
        let lines = interface.read_lines().unwrap();
        assert!(lines.up);
        assert!(!lines.down && !lines.left && !lines.right && !lines.a && !lines.b);
        assert!(interface.has_select());
    }

    #[test]
    fn without_select_reports_no_select_and_tolerates_writes() {
        let mut interface = Interface::without_select(
            FakePin(true),
            FakePin(true),
            FakePin(true),
            FakePin(true),
            FakePin(true),
            FakePin(true),
            NoDelay,
            ZeroClock,
        );
        assert!(!interface.has_select());
        interface.select_high().unwrap();
        interface.select_low().unwrap();
    }

    #[test]
    fn line_predicates() {
        let lines = Lines {
            left: true,
            right: true,
            ..Lines::default()
        };
        assert!(lines.left_right_low());
        assert!(!lines.all_directions_low());

        let lines = Lines {
            up: true,
            down: true,
            left: true,
            right: true,
            ..Lines::default()
        };
        assert!(lines.all_directions_low());
    }
}
