#![allow(missing_docs, reason = "integration tests")]
#![allow(clippy::unwrap_used, reason = "tests fail loudly")]
//! Host-level tests for quadrature decoding.

use knob_drive::quadrature::{QuadratureDecoder, pack_levels, transition_delta};

// Levels as (clk, dt).
const CLOCKWISE: [(bool, bool); 4] = [(true, false), (true, true), (false, true), (false, false)];
const COUNTER_CLOCKWISE: [(bool, bool); 4] =
    [(false, true), (true, true), (true, false), (false, false)];

fn feed(decoder: &QuadratureDecoder, levels: &[(bool, bool)]) {
    for &(clk, dt) in levels {
        decoder.record_levels(clk, dt);
    }
}

#[test]
fn pack_levels_puts_clk_in_the_high_bit() {
    assert_eq!(pack_levels(false, false), 0b00);
    assert_eq!(pack_levels(false, true), 0b01);
    assert_eq!(pack_levels(true, false), 0b10);
    assert_eq!(pack_levels(true, true), 0b11);
}

#[test]
fn unchanged_levels_have_no_delta() {
    for state in 0..4 {
        assert_eq!(transition_delta(state, state), 0);
    }
}

#[test]
fn single_line_flips_are_unit_steps() {
    assert_eq!(transition_delta(0b00, 0b10), 1);
    assert_eq!(transition_delta(0b10, 0b11), 1);
    assert_eq!(transition_delta(0b11, 0b01), 1);
    assert_eq!(transition_delta(0b01, 0b00), 1);

    assert_eq!(transition_delta(0b00, 0b01), -1);
    assert_eq!(transition_delta(0b01, 0b11), -1);
    assert_eq!(transition_delta(0b11, 0b10), -1);
    assert_eq!(transition_delta(0b10, 0b00), -1);
}

#[test]
fn double_flips_resolve_to_two() {
    assert_eq!(transition_delta(0b00, 0b11), 2);
    assert_eq!(transition_delta(0b11, 0b00), 2);
    assert_eq!(transition_delta(0b01, 0b10), -2);
    assert_eq!(transition_delta(0b10, 0b01), -2);
}

#[test]
fn one_detent_each_way() {
    let decoder = QuadratureDecoder::new();
    feed(&decoder, &CLOCKWISE);
    assert_eq!(decoder.take_rotation(), 4);

    feed(&decoder, &COUNTER_CLOCKWISE);
    assert_eq!(decoder.take_rotation(), -4);
}

#[test]
fn repeated_levels_are_ignored() {
    let decoder = QuadratureDecoder::new();
    decoder.record_levels(true, false);
    decoder.record_levels(true, false);
    decoder.record_levels(true, false);
    assert_eq!(decoder.peek_rotation(), 1);

    // Still flags activity for the consumer.
    assert!(decoder.has_pending());
}

#[test]
fn back_and_forth_cancels_out() {
    let decoder = QuadratureDecoder::new();
    decoder.record_levels(true, false);
    decoder.record_levels(false, false);
    decoder.record_levels(true, false);
    decoder.record_levels(false, false);
    assert_eq!(decoder.take_rotation(), 0);
}

#[test]
fn take_rotation_drains_once() {
    let decoder = QuadratureDecoder::new();
    feed(&decoder, &CLOCKWISE);
    feed(&decoder, &CLOCKWISE);
    assert_eq!(decoder.peek_rotation(), 8);
    assert_eq!(decoder.take_rotation(), 8);
    assert_eq!(decoder.take_rotation(), 0);
    assert_eq!(decoder.peek_rotation(), 0);
}

#[test]
fn acknowledge_leaves_rotation_alone() {
    let decoder = QuadratureDecoder::new();
    assert!(!decoder.has_pending());

    feed(&decoder, &COUNTER_CLOCKWISE);
    assert!(decoder.has_pending());
    decoder.acknowledge();
    assert!(!decoder.has_pending());
    assert_eq!(decoder.peek_rotation(), -4);

    // Draining does not touch the pending flag either.
    decoder.record_levels(false, true);
    decoder.take_rotation();
    assert!(decoder.has_pending());
}

#[test]
fn button_level_is_tracked() {
    let decoder = QuadratureDecoder::new();
    assert!(!decoder.is_pressed());

    decoder.record_button_level(true);
    assert!(decoder.is_pressed());
    assert!(decoder.has_pending());
    assert_eq!(decoder.peek_rotation(), 0);

    decoder.acknowledge();
    decoder.record_button_level(false);
    assert!(!decoder.is_pressed());
    assert!(decoder.has_pending());
}

#[test]
fn seed_sets_the_starting_levels_silently() {
    let decoder = QuadratureDecoder::new();
    decoder.seed(true, true, true);
    assert!(!decoder.has_pending());
    assert!(decoder.is_pressed());

    // From 11, dropping CLK is a clockwise quarter step.
    decoder.record_levels(false, true);
    assert_eq!(decoder.take_rotation(), 1);
}

#[test]
fn shared_static_decoder() {
    static DECODER: QuadratureDecoder = QuadratureDecoder::new();

    let producer = std::thread::spawn(|| {
        for _ in 0..100 {
            feed(&DECODER, &CLOCKWISE);
        }
    });
    let mut total = 0;
    while !producer.is_finished() {
        total += DECODER.take_rotation();
    }
    producer.join().unwrap();
    total += DECODER.take_rotation();
    assert_eq!(total, 400);
}
