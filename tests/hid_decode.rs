//! Boot-protocol keyboard decode properties (§4.8, §8 scenarios 1-2).
//!
//! `KeyboardDevice::poll_report` decodes the raw 8-byte boot report and hands
//! it to the registered handlers; the handlers themselves only ever see a
//! [`KeyboardReport`] plus [`scancode_to_ascii`]'s translation of it, which is
//! exactly what's exercised here without needing a live interrupt transfer.

use dwcotg_uspi::{led, modifier, scancode, scancode_to_ascii, KeyboardReport, MouseReport};

fn report(mods: u8, keys: [u8; 6]) -> KeyboardReport {
    KeyboardReport { modifiers: mods, reserved: 0, keys }
}

#[test]
fn cooked_handler_sees_a_then_b() {
    let first = report(0, [0x04, 0, 0, 0, 0, 0]);
    let second = report(0, [0x05, 0, 0, 0, 0, 0]);

    assert_eq!(scancode_to_ascii(first.keys[0], first.shift()), Some('a'));
    assert_eq!(scancode_to_ascii(second.keys[0], second.shift()), Some('b'));
}

#[test]
fn ctrl_alt_del_requires_both_modifiers_and_the_delete_scancode() {
    let chord = report(modifier::LEFT_CTRL | modifier::LEFT_ALT, [scancode::DELETE, 0, 0, 0, 0, 0]);
    assert!(chord.is_ctrl_alt_del());

    // Ctrl+Alt without Delete is not the chord.
    let no_delete = report(modifier::LEFT_CTRL | modifier::LEFT_ALT, [0, 0, 0, 0, 0, 0]);
    assert!(!no_delete.is_ctrl_alt_del());

    // Delete with only one modifier held is not the chord either, and must
    // not be mistaken for a printable keypress by the cooked handler path.
    let ctrl_only = report(modifier::LEFT_CTRL, [scancode::DELETE, 0, 0, 0, 0, 0]);
    assert!(!ctrl_only.is_ctrl_alt_del());
    assert_eq!(scancode_to_ascii(scancode::DELETE, false), None);
}

#[test]
fn right_side_modifiers_also_satisfy_ctrl_and_alt() {
    let chord = report(modifier::RIGHT_CTRL | modifier::RIGHT_ALT, [scancode::DELETE, 0, 0, 0, 0, 0]);
    assert!(chord.is_ctrl_alt_del());
}

#[test]
fn scancode_to_ascii_maps_letters_and_respects_shift() {
    assert_eq!(scancode_to_ascii(0x04, false), Some('a'));
    assert_eq!(scancode_to_ascii(0x04, true), Some('A'));
    assert_eq!(scancode_to_ascii(0x1D, false), Some('z'));
}

#[test]
fn scancode_to_ascii_has_no_mapping_for_reserved_or_out_of_range_codes() {
    assert_eq!(scancode_to_ascii(0x00, false), None); // "no event"
    assert_eq!(scancode_to_ascii(0xFF, false), None); // past the lookup table
}

#[test]
fn led_bits_are_distinct_single_bits() {
    let all = led::NUM_LOCK | led::CAPS_LOCK | led::SCROLL_LOCK;
    assert_eq!(all.count_ones(), 3);
}

#[test]
fn mouse_report_decodes_button_bitmap() {
    let m = MouseReport { buttons: 0b011, x: -5, y: 3 };
    assert!(m.left());
    assert!(m.right());
    assert!(!m.middle());
    assert_eq!(m.x, -5);
    assert_eq!(m.y, 3);
}
