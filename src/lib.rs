//! Driver for Sega Mega Drive / Master System style DE-9 gamepads.
//!
//! Reads any of the three digital pad generations through plain GPIO and
//! decodes the button state into a compact bitfield:
//!
//! - **SMS**: 4 directions, 2 buttons
//! - **MD3**: 4 directions, 3 buttons + Start (TH multiplexed)
//! - **MD6**: 4 directions, 6 buttons + Start & Mode (extended TH sequence)
//!
//! The attached pad type is auto-detected by toggling the TH (select) line
//! and watching which direction lines the pad overdrives; anything that
//! does not answer like a Mega Drive pad falls back to SMS. Mouse and
//! Saturn protocols are not supported.
//!
//! The driver can be used in two styles: change-notification via
//! [`MegaPad::poll`], which reports whether the buttons changed since the
//! previous sample, or plain polling via the accessors
//! ([`MegaPad::direction`], [`MegaPad::buttons`], ...), which always return
//! the freshest gated sample.
//!
//! ## Hardware requirements
//!
//! Six GPIO inputs with pull-ups (Up, Down, Left, Right and the two button
//! lines) and optionally one GPIO output for TH/select. Without a select
//! line only SMS pads can be read. See [`Interface`] for the embedded-hal
//! wiring.
//!
//! ## Example
//!
//! ```rust,ignore
//! use megapad::{Interface, MegaPad, Button};
//!
//! // Pins are pull-up inputs from your HAL, th is a push-pull output.
//! let interface = Interface::new(up, down, left, right, a, b, th, delay, clock);
//! let mut pad = MegaPad::new(interface)?;
//!
//! loop {
//!     if pad.poll()? {
//!         let buttons = pad.buttons()?;
//!         if buttons.contains(Button::START) {
//!             pause_game();
//!         }
//!     }
//! }
//! ```

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod buttons;
pub mod error;
pub mod interface;
pub mod pad;
pub mod sim;

pub use buttons::{Button, Buttons};
pub use error::Error;
pub use interface::{Interface, Lines, Monotonic, NoSelect, PadInterface};
pub use pad::{MegaPad, Mode};

#[cfg(feature = "std")]
pub use interface::StdMonotonic;
