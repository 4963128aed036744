//! Pad driver core
//!
//! Mode detection, the multiplexed read sequences for the three pad
//! generations, and the sampling gates that keep the hardware from being
//! bit-banged more often than the protocol allows.

use crate::buttons::{Button, Buttons};
use crate::error::Error;
use crate::interface::{Lines, PadInterface};

/// Settle time between TH edges while walking report phases.
///
/// Protocol-critical, not tunable.
const PHASE_SETTLE_US: u32 = 150;

/// TH-high idle time before detection, lets any pad return to its default
/// phase. Protocol-critical, not tunable.
const DETECT_SETTLE_US: u32 = 3000;

/// Minimum time between hardware read sequences.
const SAMPLE_INTERVAL_MS: u64 = 5;

/// Minimum time between change-notification polls via [`MegaPad::poll`].
const POLL_INTERVAL_MS: u64 = 10;

/// Detected controller generation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Master System style: 4 directions, 2 buttons, no multiplexing
    Sms,
    /// Mega Drive 3-button: adds A and Start via the TH line
    Md3,
    /// Mega Drive 6-button: adds X, Y, Z and Mode via the extended TH sequence
    Md6,
}

/// Driver for one DE-9 controller port
///
/// Owns the hardware interface and the decoded state. The attached pad
/// type is detected once at construction (when a TH line is wired) and
/// can be re-detected with [`detect_mode`](MegaPad::detect_mode) or forced
/// with [`set_mode`](MegaPad::set_mode).
///
/// All timers are per instance; two pads on separate ports gate
/// independently.
pub struct MegaPad<I>
where
    I: PadInterface,
{
    /// Hardware interface
    interface: I,
    /// Current classification of the attached pad
    mode: Mode,
    /// Set by [`set_mode`](MegaPad::set_mode): read routines no longer
    /// reclassify the pad when a report phase looks wrong
    mode_locked: bool,
    /// Latest decoded sample
    buttons: Buttons,
    /// Previous sample, for change detection
    history: Buttons,
    /// Sample differs from history; cleared by the data accessors
    changed: bool,
    last_sample_ms: Option<u64>,
    last_poll_ms: Option<u64>,
}

impl<I> MegaPad<I>
where
    I: PadInterface,
{
    /// Create a driver and classify the attached pad.
    ///
    /// When the interface has a TH line, detection runs once immediately;
    /// without one the driver is pinned to [`Mode::Sms`] for its lifetime
    /// and detection never runs.
    ///
    /// # Errors
    ///
    /// Returns an error if GPIO fails during detection.
    pub fn new(interface: I) -> Result<Self, Error<I>> {
        let mut pad = Self {
            interface,
            mode: Mode::Sms,
            mode_locked: false,
            buttons: Buttons::NONE,
            history: Buttons::NONE,
            changed: false,
            last_sample_ms: None,
            last_poll_ms: None,
        };
        if pad.interface.has_select() {
            pad.run_detection()?;
        }
        Ok(pad)
    }

    /// Poll for a button change.
    ///
    /// Drives a hardware sample at most every 10ms and reports whether the
    /// decoded state differs from the sample before it. The flag is *not*
    /// cleared here; any data accessor clears it.
    ///
    /// # Errors
    ///
    /// Returns an error if GPIO fails.
    pub fn poll(&mut self) -> Result<bool, Error<I>> {
        let now = self.interface.now_ms();
        let due = match self.last_poll_ms {
            None => true,
            Some(last) => now.saturating_sub(last) >= POLL_INTERVAL_MS,
        };
        if due {
            self.last_poll_ms = Some(now);
            self.sample()?;
        }
        Ok(self.changed)
    }

    /// Read the 4-bit direction nibble (`RLDU`, pressed = set).
    ///
    /// Clears the change flag.
    ///
    /// # Errors
    ///
    /// Returns an error if GPIO fails.
    pub fn direction(&mut self) -> Result<u8, Error<I>> {
        self.sample()?;
        self.changed = false;
        Ok(self.buttons.direction())
    }

    /// Whether Start is pressed. Clears the change flag.
    ///
    /// Always `false` on SMS pads, which have no Start button.
    ///
    /// # Errors
    ///
    /// Returns an error if GPIO fails.
    pub fn start_pressed(&mut self) -> Result<bool, Error<I>> {
        self.sample()?;
        self.changed = false;
        Ok(self.buttons.contains(Button::START))
    }

    /// Read the full button state. Clears the change flag.
    ///
    /// Bits that are not meaningful for the current mode are guaranteed
    /// zero; an SMS pad can never report Start or the 6-button extras.
    ///
    /// # Errors
    ///
    /// Returns an error if GPIO fails.
    pub fn buttons(&mut self) -> Result<Buttons, Error<I>> {
        self.sample()?;
        self.changed = false;
        Ok(self.buttons)
    }

    /// Read one raw state byte: 0 = `SCBARLDU`, 1 = `xxxxMZYX`.
    ///
    /// Clears the change flag.
    ///
    /// # Errors
    ///
    /// Any index outside `{0, 1}` is rejected with
    /// [`Error::InvalidIndex`] before the hardware is touched. GPIO
    /// failures are reported as [`Error::Interface`].
    pub fn state_byte(&mut self, index: u8) -> Result<u8, Error<I>> {
        if index > 1 {
            return Err(Error::InvalidIndex { index });
        }
        self.sample()?;
        self.changed = false;
        Ok(match index {
            0 => self.buttons.low_byte(),
            _ => self.buttons.high_byte(),
        })
    }

    /// Re-run pad type detection and return the result.
    ///
    /// Unlike the other accessors this bypasses the sampling gates and
    /// actively probes the pad. It also overrides a mode forced with
    /// [`set_mode`](MegaPad::set_mode). Without a TH line it returns
    /// [`Mode::Sms`] without touching the hardware.
    ///
    /// # Errors
    ///
    /// Returns an error if GPIO fails.
    pub fn detect_mode(&mut self) -> Result<Mode, Error<I>> {
        if !self.interface.has_select() {
            return Ok(Mode::Sms);
        }
        self.run_detection()
    }

    /// Force the pad classification.
    ///
    /// Also locks the mode: read routines will no longer reclassify the
    /// pad when a report phase does not show the expected line pattern.
    /// No-op when the interface has no TH line.
    pub fn set_mode(&mut self, mode: Mode) {
        if self.interface.has_select() {
            self.mode = mode;
            self.mode_locked = true;
        }
    }

    /// The current classification, without touching the hardware.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Access the underlying interface.
    pub fn interface_mut(&mut self) -> &mut I {
        &mut self.interface
    }

    /// Consume the driver and give the interface back.
    pub fn release(self) -> I {
        self.interface
    }

    /// Classify the attached pad by toggling TH and watching which
    /// direction lines it overdrives. Fails closed: anything that does not
    /// answer like an MD pad at each gate stays at the lower mode.
    fn run_detection(&mut self) -> Result<Mode, Error<I>> {
        self.mode = Mode::Sms;
        self.select_high()?;
        self.interface.settle_us(DETECT_SETTLE_US);
        self.select_low()?;
        let lines = self.lines()?;
        if lines.left_right_low() {
            // Left+Right together is impossible on a passive pad; an MD
            // pad pulls both low during this phase.
            self.mode = Mode::Md3;
            self.interface.settle_us(PHASE_SETTLE_US);
            self.select_high()?;
            self.interface.settle_us(PHASE_SETTLE_US);
            self.select_low()?;
            self.interface.settle_us(PHASE_SETTLE_US);
            self.select_high()?;
            self.interface.settle_us(PHASE_SETTLE_US);
            self.select_low()?;
            self.interface.settle_us(PHASE_SETTLE_US);
            let lines = self.lines()?;
            if lines.all_directions_low() {
                // Only a 6-button pad parks all four lines low here.
                self.mode = Mode::Md6;
            }
        }
        self.select_high()?;
        log::debug!("detected {:?} pad", self.mode);
        Ok(self.mode)
    }

    /// Gated dispatch: run the read sequence for the current mode at most
    /// once per 5ms, then update the change flag. Calls inside the gate
    /// window leave all state untouched.
    fn sample(&mut self) -> Result<(), Error<I>> {
        let now = self.interface.now_ms();
        if let Some(last) = self.last_sample_ms {
            if now.saturating_sub(last) < SAMPLE_INTERVAL_MS {
                return Ok(());
            }
        }
        self.last_sample_ms = Some(now);
        match self.mode {
            Mode::Sms => self.read_sms()?,
            Mode::Md3 => self.read_md3()?,
            Mode::Md6 => self.read_md6()?,
        }
        if self.buttons != self.history {
            self.changed = true;
        }
        Ok(())
    }

    /// First report phase: directions plus the two button lines, which
    /// carry B and C (the two SMS buttons). Common prefix of the MD
    /// routines.
    fn read_sms(&mut self) -> Result<(), Error<I>> {
        self.history = self.buttons;
        self.buttons = Buttons::NONE;
        self.select_high()?;
        let lines = self.lines()?;
        if lines.up {
            self.buttons |= Button::UP;
        }
        if lines.down {
            self.buttons |= Button::DOWN;
        }
        if lines.left {
            self.buttons |= Button::LEFT;
        }
        if lines.right {
            self.buttons |= Button::RIGHT;
        }
        if lines.a {
            self.buttons |= Button::B;
        }
        if lines.b {
            self.buttons |= Button::C;
        }
        Ok(())
    }

    /// Second report phase: with TH low the button lines carry A and
    /// Start. A pad that does not pull Left+Right low here is not an MD
    /// pad; unless the mode is locked, reclassify as SMS and leave the
    /// extra bits clear.
    fn read_md3(&mut self) -> Result<(), Error<I>> {
        self.read_sms()?;
        self.select_low()?;
        self.interface.settle_us(PHASE_SETTLE_US);
        let lines = self.lines()?;
        if self.mode_locked || lines.left_right_low() {
            if lines.a {
                self.buttons |= Button::A;
            }
            if lines.b {
                self.buttons |= Button::START;
            }
        } else {
            log::warn!("pad stopped answering the MD report phase, falling back to SMS");
            self.mode = Mode::Sms;
        }
        self.select_high()?;
        Ok(())
    }

    /// Extended report phase: walk TH through the same edge sequence as
    /// detection, then the direction lines carry X, Y, Z and Mode. A pad
    /// that does not park all four lines low beforehand has left the
    /// extended phase; unless locked, reclassify as 3-button.
    fn read_md6(&mut self) -> Result<(), Error<I>> {
        self.read_md3()?;
        if self.mode == Mode::Sms {
            // read_md3 already reclassified mid-read
            return Ok(());
        }
        self.interface.settle_us(PHASE_SETTLE_US);
        self.select_low()?;
        self.interface.settle_us(PHASE_SETTLE_US);
        self.select_high()?;
        self.interface.settle_us(PHASE_SETTLE_US);
        self.select_low()?;
        let probe = self.lines()?;
        if self.mode_locked || probe.all_directions_low() {
            self.select_high()?;
            let lines = self.lines()?;
            if lines.left {
                self.buttons |= Button::X;
            }
            if lines.down {
                self.buttons |= Button::Y;
            }
            if lines.up {
                self.buttons |= Button::Z;
            }
            if lines.right {
                self.buttons |= Button::MODE;
            }
        } else {
            log::warn!("pad left the extended report phase, falling back to 3-button");
            self.mode = Mode::Md3;
        }
        self.select_high()?;
        Ok(())
    }

    fn select_high(&mut self) -> Result<(), Error<I>> {
        self.interface.select_high().map_err(Error::Interface)
    }

    fn select_low(&mut self) -> Result<(), Error<I>> {
        self.interface.select_low().map_err(Error::Interface)
    }

    fn lines(&mut self) -> Result<Lines, Error<I>> {
        self.interface.read_lines().map_err(Error::Interface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimKind, SimPad};

    fn pad(kind: SimKind) -> MegaPad<SimPad> {
        let mut pad = MegaPad::new(SimPad::new(kind)).unwrap();
        // Let the pad's edge counter idle out after detection, as it
        // would on real hardware before the first read.
        pad.interface_mut().advance_ms(2);
        pad
    }

    #[test]
    fn selectless_pad_is_always_sms() {
        let mut pad = MegaPad::new(SimPad::without_select()).unwrap();
        pad.interface_mut().press(Button::UP);
        pad.interface_mut().press(Button::B);
        assert_eq!(pad.detect_mode().unwrap(), Mode::Sms);
        assert_eq!(pad.mode(), Mode::Sms);
    }

    #[test]
    fn detection_ladder() {
        assert_eq!(pad(SimKind::Sms).mode(), Mode::Sms);
        assert_eq!(pad(SimKind::Md3).mode(), Mode::Md3);
        assert_eq!(pad(SimKind::Md6).mode(), Mode::Md6);
    }

    #[test]
    fn direction_is_gate_held_within_five_ms() {
        let mut pad = pad(SimKind::Md3);
        pad.interface_mut().press(Button::UP);
        let first = pad.direction().unwrap();
        assert_eq!(first, 0b0001);
        // A press inside the gate window must not show up yet.
        pad.interface_mut().press(Button::DOWN);
        assert_eq!(pad.direction().unwrap(), first);
        pad.interface_mut().advance_ms(5);
        assert_eq!(pad.direction().unwrap(), 0b0011);
    }

    #[test]
    fn change_flag_is_edge_triggered() {
        let mut pad = pad(SimKind::Md3);
        // First sample goes from empty to empty, nothing changed.
        assert!(!pad.poll().unwrap());
        pad.interface_mut().press(Button::START);
        pad.interface_mut().advance_ms(10);
        assert!(pad.poll().unwrap());
        // Accessor consumes the flag.
        assert!(pad.start_pressed().unwrap());
        pad.interface_mut().advance_ms(10);
        assert!(!pad.poll().unwrap());
    }

    #[test]
    fn sms_never_reports_md_bits_even_under_noise() {
        let mut pad = MegaPad::new(SimPad::without_select()).unwrap();
        pad.interface_mut().inject_noise(Lines {
            up: true,
            down: true,
            left: true,
            right: true,
            a: true,
            b: true,
        });
        let buttons = pad.buttons().unwrap();
        // Directions and the two SMS buttons read pressed, nothing else.
        assert_eq!(buttons.low_byte(), 0x6F);
        assert_eq!(buttons.high_byte(), 0x00);
        assert!(!buttons.contains(Button::A));
        assert!(!buttons.contains(Button::START));
    }

    #[test]
    fn md6_buttons_reach_the_high_byte() {
        let mut pad = pad(SimKind::Md6);
        pad.interface_mut().press(Button::Z);
        pad.interface_mut().press(Button::MODE);
        pad.interface_mut().press(Button::A);
        let buttons = pad.buttons().unwrap();
        assert!(buttons.contains(Button::Z));
        assert!(buttons.contains(Button::MODE));
        assert!(buttons.contains(Button::A));
        assert_eq!(buttons.high_byte(), 0x0C);
        assert_eq!(pad.state_byte(1).unwrap(), 0x0C);
    }

    #[test]
    fn locked_mode_survives_anomalous_reads() {
        let mut pad = pad(SimKind::Md6);
        pad.set_mode(Mode::Md6);
        // Pad starts answering like a dumb SMS stick.
        pad.interface_mut().set_kind(SimKind::Sms);
        pad.interface_mut().advance_ms(5);
        pad.buttons().unwrap();
        assert_eq!(pad.mode(), Mode::Md6);
    }

    #[test]
    fn unlocked_anomaly_fails_closed() {
        let mut pad = pad(SimKind::Md3);
        pad.interface_mut().set_kind(SimKind::Sms);
        pad.interface_mut().advance_ms(5);
        pad.buttons().unwrap();
        assert_eq!(pad.mode(), Mode::Sms);
        // Explicit re-detection may climb back up once the pad answers again.
        pad.interface_mut().set_kind(SimKind::Md3);
        assert_eq!(pad.detect_mode().unwrap(), Mode::Md3);
    }

    #[test]
    fn set_mode_without_select_is_a_no_op() {
        let mut pad = MegaPad::new(SimPad::without_select()).unwrap();
        pad.set_mode(Mode::Md6);
        assert_eq!(pad.mode(), Mode::Sms);
    }

    #[test]
    fn state_byte_rejects_out_of_range_index() {
        let mut pad = pad(SimKind::Sms);
        assert!(matches!(
            pad.state_byte(2),
            Err(Error::InvalidIndex { index: 2 })
        ));
        // The rejected call must not have consumed the gate.
        assert_eq!(pad.state_byte(0).unwrap(), 0x00);
    }

    #[test]
    fn sms_scenario_up_and_button_one() {
        // Up plus the first physical button on an SMS pad: exactly the Up
        // bit and the bit-5 slot in byte 0.
        let mut pad = pad(SimKind::Sms);
        pad.interface_mut().press(Button::UP);
        pad.interface_mut().press(Button::B);
        assert_eq!(pad.direction().unwrap(), 0b0001);
        pad.interface_mut().advance_ms(5);
        assert_eq!(pad.state_byte(0).unwrap(), 0x21);
        assert_eq!(pad.state_byte(1).unwrap(), 0x00);
    }

    #[test]
    fn full_state_packs_both_bytes() {
        let mut pad = pad(SimKind::Md6);
        pad.interface_mut().press(Button::START);
        pad.interface_mut().press(Button::X);
        let buttons = pad.buttons().unwrap();
        assert_eq!(buttons.raw(), 0x0180);
    }
}
