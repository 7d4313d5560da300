//! USB-MIDI Event Packet round-trip and boundary properties (§4.9).

use dwcotg_uspi::MidiEvent;

#[test]
fn note_on_round_trips_through_the_wire_format() {
    let event = MidiEvent { cable: 0, cin: 0x9, data: [0x90, 0x3C, 0x64] };
    let bytes = event.to_bytes();
    assert_eq!(bytes, [0x09, 0x90, 0x3C, 0x64]);
    assert_eq!(MidiEvent::from_bytes(bytes), event);
}

#[test]
fn cable_number_occupies_the_high_nibble() {
    let event = MidiEvent { cable: 0xF, cin: 0x9, data: [0x90, 0x3C, 0x64] };
    let bytes = event.to_bytes();
    assert_eq!(bytes[0], 0xF9);
    assert_eq!(MidiEvent::from_bytes(bytes).cable, 0xF);
}

#[test]
fn note_on_with_zero_velocity_is_conventionally_a_note_off() {
    let event = MidiEvent::from_bytes([0x09, 0x90, 0x3C, 0x00]);
    assert!(!event.is_note_on());

    let real_note_on = MidiEvent::from_bytes([0x09, 0x90, 0x3C, 0x01]);
    assert!(real_note_on.is_note_on());
}

#[test]
fn channel_is_the_low_nibble_of_the_status_byte() {
    let event = MidiEvent::from_bytes([0x09, 0x95, 0x3C, 0x64]);
    assert_eq!(event.channel(), 5);
}

#[test]
fn a_buffer_of_several_packets_decodes_independently() {
    let raw = [0x09, 0x90, 0x3C, 0x64, 0x08, 0x80, 0x3C, 0x00];
    let first = MidiEvent::from_bytes([raw[0], raw[1], raw[2], raw[3]]);
    let second = MidiEvent::from_bytes([raw[4], raw[5], raw[6], raw[7]]);
    assert!(first.is_note_on());
    assert!(!second.is_note_on());
    assert_eq!(second.cin, 0x8);
}
