//! Simulated controllers for driver tests.
//!
//! [`SimPad`] implements [`PadInterface`] entirely in memory, modelling
//! the line behavior of all three pad generations including the TH
//! falling-edge counter a 6-button pad uses to enter its extended report
//! phase. Tests press buttons and advance the clock directly; time only
//! moves when the driver busy-waits or a test advances it.

use core::convert::Infallible;

use crate::buttons::{Button, Buttons};
use crate::interface::{Lines, PadInterface};

/// Which pad generation the simulation behaves as.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimKind {
    /// Passive 2-button pad, ignores TH entirely
    Sms,
    /// 3-button pad, two report phases on TH
    Md3,
    /// 6-button pad, extended phase after three TH falling edges
    Md6,
}

/// A 6-button pad forgets its TH edge count after this long without a new
/// falling edge and drops back to 3-button reporting.
const EDGE_WINDOW_US: u64 = 1500;

/// In-memory DE-9 pad.
#[derive(Debug)]
pub struct SimPad {
    kind: SimKind,
    has_select: bool,
    th_high: bool,
    fall_count: u8,
    last_fall_us: u64,
    now_us: u64,
    pressed: Buttons,
    noise: Lines,
}

impl SimPad {
    /// Create a pad of the given generation on a wiring with a TH line.
    pub fn new(kind: SimKind) -> Self {
        Self {
            kind,
            has_select: true,
            th_high: true,
            fall_count: 0,
            last_fall_us: 0,
            now_us: 0,
            pressed: Buttons::NONE,
            noise: Lines::default(),
        }
    }

    /// SMS pad on a wiring without a TH line.
    pub fn without_select() -> Self {
        Self {
            has_select: false,
            ..Self::new(SimKind::Sms)
        }
    }

    /// Hold a button down.
    pub fn press(&mut self, button: Button) {
        self.pressed |= button;
    }

    /// Let go of a button.
    pub fn release(&mut self, button: Button) {
        self.pressed = Buttons(self.pressed.raw() & !(button as u16));
    }

    /// Swap the pad for one of a different generation, keeping the wiring.
    pub fn set_kind(&mut self, kind: SimKind) {
        self.kind = kind;
    }

    /// Advance the simulated clock.
    pub fn advance_ms(&mut self, ms: u64) {
        self.now_us += ms * 1000;
    }

    /// Advance the simulated clock by microseconds.
    pub fn advance_us(&mut self, us: u64) {
        self.now_us += us;
    }

    /// Force lines low regardless of pad behavior, as electrical noise
    /// would.
    pub fn inject_noise(&mut self, noise: Lines) {
        self.noise = noise;
    }

    fn expire_edges(&mut self) {
        if self.fall_count != 0 && self.now_us.saturating_sub(self.last_fall_us) > EDGE_WINDOW_US {
            self.fall_count = 0;
        }
    }

    fn on(&self, button: Button) -> bool {
        self.pressed.contains(button)
    }

    /// First report phase: directions plus B and C on the button lines.
    fn first_phase(&self) -> Lines {
        Lines {
            up: self.on(Button::UP),
            down: self.on(Button::DOWN),
            left: self.on(Button::LEFT),
            right: self.on(Button::RIGHT),
            a: self.on(Button::B),
            b: self.on(Button::C),
        }
    }

    /// Second report phase: Left/Right overdriven low, A and Start on the
    /// button lines.
    fn second_phase(&self) -> Lines {
        Lines {
            up: self.on(Button::UP),
            down: self.on(Button::DOWN),
            left: true,
            right: true,
            a: self.on(Button::A),
            b: self.on(Button::START),
        }
    }

    fn model_lines(&mut self) -> Lines {
        self.expire_edges();
        match self.kind {
            // A passive pad never looks at TH.
            SimKind::Sms => self.first_phase(),
            SimKind::Md3 => {
                if self.th_high {
                    self.first_phase()
                } else {
                    self.second_phase()
                }
            }
            SimKind::Md6 => {
                if self.fall_count >= 3 {
                    if self.th_high {
                        // Extended phase: directions carry Z/Y/X/Mode.
                        Lines {
                            up: self.on(Button::Z),
                            down: self.on(Button::Y),
                            left: self.on(Button::X),
                            right: self.on(Button::MODE),
                            a: self.on(Button::B),
                            b: self.on(Button::C),
                        }
                    } else {
                        // All four low announces the extended phase.
                        Lines {
                            up: true,
                            down: true,
                            left: true,
                            right: true,
                            a: self.on(Button::A),
                            b: self.on(Button::START),
                        }
                    }
                } else if self.th_high {
                    self.first_phase()
                } else {
                    self.second_phase()
                }
            }
        }
    }
}

impl PadInterface for SimPad {
    type Error = Infallible;

    fn has_select(&self) -> bool {
        self.has_select
    }

    fn select_high(&mut self) -> Result<(), Self::Error> {
        if self.has_select {
            self.th_high = true;
        }
        Ok(())
    }

    fn select_low(&mut self) -> Result<(), Self::Error> {
        if self.has_select && self.th_high {
            self.th_high = false;
            self.expire_edges();
            self.fall_count = self.fall_count.saturating_add(1);
            self.last_fall_us = self.now_us;
        }
        Ok(())
    }

    fn read_lines(&mut self) -> Result<Lines, Self::Error> {
        let lines = self.model_lines();
        Ok(Lines {
            up: lines.up || self.noise.up,
            down: lines.down || self.noise.down,
            left: lines.left || self.noise.left,
            right: lines.right || self.noise.right,
            a: lines.a || self.noise.a,
            b: lines.b || self.noise.b,
        })
    }

    fn settle_us(&mut self, us: u32) {
        self.now_us += u64::from(us);
    }

    fn now_ms(&mut self) -> u64 {
        self.now_us / 1000
    }
}
