//! End-to-end scenarios driving only the public API, the way an
//! application loop would.

use megapad::sim::{SimKind, SimPad};
use megapad::{Button, MegaPad, Mode};

#[test]
fn six_button_session() {
    let mut pad = MegaPad::new(SimPad::new(SimKind::Md6)).unwrap();
    assert_eq!(pad.mode(), Mode::Md6);

    // Nothing pressed yet: no change, empty state.
    assert!(!pad.poll().unwrap());
    assert!(pad.buttons().unwrap().is_empty());

    // Player presses Right + Y, the app notices via poll and reads.
    pad.interface_mut().press(Button::RIGHT);
    pad.interface_mut().press(Button::Y);
    pad.interface_mut().advance_ms(10);
    assert!(pad.poll().unwrap());
    let buttons = pad.buttons().unwrap();
    assert!(buttons.contains_all(Button::RIGHT | Button::Y));
    assert_eq!(buttons.direction(), 0b1000);

    // Release everything; next poll interval reports the change again.
    pad.interface_mut().release(Button::RIGHT);
    pad.interface_mut().release(Button::Y);
    pad.interface_mut().advance_ms(10);
    assert!(pad.poll().unwrap());
    assert!(pad.buttons().unwrap().is_empty());
}

#[test]
fn start_pause_loop_on_three_button_pad() {
    let mut pad = MegaPad::new(SimPad::new(SimKind::Md3)).unwrap();
    assert!(!pad.start_pressed().unwrap());

    pad.interface_mut().press(Button::START);
    pad.interface_mut().advance_ms(5);
    assert!(pad.start_pressed().unwrap());
    // Start never leaks into the direction nibble.
    pad.interface_mut().advance_ms(5);
    assert_eq!(pad.direction().unwrap(), 0);
}

#[test]
fn hotplug_reclassification() {
    // A 3-button pad is yanked and replaced with a 6-button one; explicit
    // re-detection picks the new type up.
    let mut pad = MegaPad::new(SimPad::new(SimKind::Md3)).unwrap();
    assert_eq!(pad.mode(), Mode::Md3);

    pad.interface_mut().set_kind(SimKind::Md6);
    pad.interface_mut().advance_ms(10);
    assert_eq!(pad.detect_mode().unwrap(), Mode::Md6);

    pad.interface_mut().press(Button::X);
    pad.interface_mut().advance_ms(10);
    assert!(pad.buttons().unwrap().contains(Button::X));
}

#[test]
fn packed_word_layout_is_stable() {
    let mut pad = MegaPad::new(SimPad::new(SimKind::Md6)).unwrap();
    for button in [Button::UP, Button::A, Button::START, Button::MODE] {
        pad.interface_mut().press(button);
    }
    pad.interface_mut().advance_ms(5);
    let word = pad.buttons().unwrap().raw();
    assert_eq!(word, 0x0891);
    pad.interface_mut().advance_ms(5);
    assert_eq!(pad.state_byte(0).unwrap(), 0x91);
    pad.interface_mut().advance_ms(5);
    assert_eq!(pad.state_byte(1).unwrap(), 0x08);
}
