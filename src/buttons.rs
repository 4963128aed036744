//! Packed button state
//!
//! Button state is kept as a 16-bit field whose layout is a compatibility
//! contract with existing DE-9 tooling: the low byte is `SCBARLDU`
//! (Start, C, B, A, Right, Left, Down, Up) and the high byte carries the
//! 6-button extras in its low nibble (`xxxxMZYX`). Bits that are not
//! meaningful for the detected pad type always read as zero.

/// Button flags
///
/// Each flag is one bit of the packed [`Buttons`] field. On an SMS pad the
/// two physical buttons land on the [`B`](Button::B) and [`C`](Button::C)
/// slots; [`A`](Button::A) and [`START`](Button::START) only exist on MD
/// pads and [`X`](Button::X)/[`Y`](Button::Y)/[`Z`](Button::Z)/
/// [`MODE`](Button::MODE) only on 6-button pads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u16)]
pub enum Button {
    /// D-pad Up
    UP = 0x0001,
    /// D-pad Down
    DOWN = 0x0002,
    /// D-pad Left
    LEFT = 0x0004,
    /// D-pad Right
    RIGHT = 0x0008,
    /// A button (MD pads)
    A = 0x0010,
    /// B button (SMS button 1)
    B = 0x0020,
    /// C button (SMS button 2)
    C = 0x0040,
    /// Start button (MD pads)
    START = 0x0080,
    /// X button (6-button pads)
    X = 0x0100,
    /// Y button (6-button pads)
    Y = 0x0200,
    /// Z button (6-button pads)
    Z = 0x0400,
    /// Mode button (6-button pads)
    MODE = 0x0800,
}

/// Container for button state
///
/// Holds every button as a bit of a `u16`, pressed = set.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
#[repr(transparent)]
pub struct Buttons(pub(crate) u16);

impl Buttons {
    /// No buttons pressed
    pub const NONE: Buttons = Buttons(0);

    /// Mask of the four direction bits
    pub const DIRECTION_MASK: u16 = 0x000F;

    /// Check if a specific button is pressed
    #[inline]
    pub const fn contains(self, button: Button) -> bool {
        (self.0 & button as u16) != 0
    }

    /// Check if any of the specified buttons are pressed
    #[inline]
    pub const fn contains_any(self, buttons: Buttons) -> bool {
        (self.0 & buttons.0) != 0
    }

    /// Check if all of the specified buttons are pressed
    #[inline]
    pub const fn contains_all(self, buttons: Buttons) -> bool {
        (self.0 & buttons.0) == buttons.0
    }

    /// True when nothing is pressed
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The 4-bit direction nibble (`RLDU`, pressed = set)
    #[inline]
    pub const fn direction(self) -> u8 {
        (self.0 & Self::DIRECTION_MASK) as u8
    }

    /// Low byte of the packed state (`SCBARLDU`)
    #[inline]
    pub const fn low_byte(self) -> u8 {
        self.0 as u8
    }

    /// High byte of the packed state (`xxxxMZYX`)
    #[inline]
    pub const fn high_byte(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Get raw button flags
    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

impl core::ops::BitOr for Button {
    type Output = Buttons;

    fn bitor(self, other: Button) -> Buttons {
        Buttons(self as u16 | other as u16)
    }
}

impl core::ops::BitOr<Button> for Buttons {
    type Output = Buttons;

    fn bitor(self, other: Button) -> Buttons {
        Buttons(self.0 | other as u16)
    }
}

impl core::ops::BitOrAssign<Button> for Buttons {
    fn bitor_assign(&mut self, other: Button) {
        self.0 |= other as u16;
    }
}

impl From<Buttons> for u16 {
    fn from(buttons: Buttons) -> u16 {
        buttons.0
    }
}

impl core::fmt::Debug for Buttons {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        const NAMES: [(Button, &str); 12] = [
            (Button::UP, "UP"),
            (Button::DOWN, "DOWN"),
            (Button::LEFT, "LEFT"),
            (Button::RIGHT, "RIGHT"),
            (Button::A, "A"),
            (Button::B, "B"),
            (Button::C, "C"),
            (Button::START, "START"),
            (Button::X, "X"),
            (Button::Y, "Y"),
            (Button::Z, "Z"),
            (Button::MODE, "MODE"),
        ];

        write!(f, "Buttons(")?;
        let mut first = true;
        for (button, name) in NAMES {
            if self.contains(button) {
                if !first {
                    write!(f, "|")?;
                }
                write!(f, "{name}")?;
                first = false;
            }
        }
        if first {
            write!(f, "-")?;
        }
        write!(f, ")")
    }
}
