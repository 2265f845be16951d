//! Interrupt-safe quadrature decoding for rotary encoders with a push switch.
//!
//! [`QuadratureDecoder`] is the shared state between the edge producer (GPIO interrupt
//! context) and the control loop (consumer). Every field is an atomic so the consumer's
//! "read then clear" of the rotation accumulator can never lose a tick that arrives in
//! between.
//!
//! See [`QuadratureDecoder`] for the producer/consumer contract.

use portable_atomic::{AtomicBool, AtomicI32, AtomicU8, Ordering};

/// Packs the two sampled quadrature lines as `(clk << 1) | dt`.
#[must_use]
pub const fn pack_levels(clk_high: bool, dt_high: bool) -> u8 {
    ((clk_high as u8) << 1) | dt_high as u8
}

/// Rotation delta for a transition, indexed by `previous | (new << 2)`.
///
/// Simultaneous flips of both lines (keys 3, 6, 9, 12) should not happen on a clean
/// signal but do under bounce or coalesced edges. They resolve to ±2 instead of being
/// discarded.
const TRANSITION_DELTAS: [i8; 16] = [
    0, 1, -1, 2, //
    -1, 0, -2, 1, //
    1, -2, 0, -1, //
    2, -1, 1, 0, //
];

/// Looks up the rotation delta for a move from `previous` to `new` (both 2-bit packed levels).
#[must_use]
pub const fn transition_delta(previous: u8, new: u8) -> i8 {
    TRANSITION_DELTAS[(((previous & 0b11) | ((new & 0b11) << 2)) & 0b1111) as usize]
}

/// Shared decoder state for one rotary encoder.
///
/// # Contract
///
/// - The producer calls [`record_levels`](Self::record_levels) on every edge of either
///   quadrature line and [`record_button_level`](Self::record_button_level) on every edge of
///   the switch line. Both never block and never allocate.
/// - The consumer polls [`has_pending`](Self::has_pending), reads
///   [`peek_rotation`](Self::peek_rotation) / [`is_pressed`](Self::is_pressed), drains with
///   [`take_rotation`](Self::take_rotation), and clears the pending flag with
///   [`acknowledge`](Self::acknowledge). Only the consumer clears either.
/// - The rotation accumulator is never clamped here; deadzones belong to the consumer.
///
/// # Example
///
/// ```
/// use knob_drive::quadrature::QuadratureDecoder;
///
/// static DECODER: QuadratureDecoder = QuadratureDecoder::new();
///
/// // Producer side (edge interrupts): one detent with CLK leading DT.
/// DECODER.record_levels(true, false);
/// DECODER.record_levels(true, true);
/// DECODER.record_levels(false, true);
/// DECODER.record_levels(false, false);
///
/// // Consumer side (control loop).
/// assert!(DECODER.has_pending());
/// DECODER.acknowledge();
/// assert_eq!(DECODER.take_rotation(), 4);
/// assert_eq!(DECODER.take_rotation(), 0);
/// ```
pub struct QuadratureDecoder {
    previous: AtomicU8,
    rotation: AtomicI32,
    pressed: AtomicBool,
    pending: AtomicBool,
}

impl QuadratureDecoder {
    /// Creates a decoder with both lines assumed low and the switch released.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            previous: AtomicU8::new(0),
            rotation: AtomicI32::new(0),
            pressed: AtomicBool::new(false),
            pending: AtomicBool::new(false),
        }
    }

    /// Seeds the decoder with the levels read at setup, without counting or flagging anything.
    pub fn seed(&self, clk_high: bool, dt_high: bool, pressed: bool) {
        self.previous
            .store(pack_levels(clk_high, dt_high), Ordering::Release);
        self.pressed.store(pressed, Ordering::Release);
    }

    /// Records freshly sampled quadrature levels. Call on any edge of either line.
    ///
    /// Samples equal to the last classified levels are ignored.
    pub fn record_levels(&self, clk_high: bool, dt_high: bool) {
        let new = pack_levels(clk_high, dt_high);
        // Edge sources may preempt each other; classify and advance `previous` as one step.
        critical_section::with(|_| {
            let previous = self.previous.load(Ordering::Acquire);
            if new == previous {
                return;
            }
            let delta = transition_delta(previous, new);
            if delta != 0 {
                self.rotation.fetch_add(i32::from(delta), Ordering::AcqRel);
            }
            self.previous.store(new, Ordering::Release);
        });
        self.pending.store(true, Ordering::Release);
    }

    /// Records the sampled switch level. Call on any edge of the switch line.
    pub fn record_button_level(&self, pressed: bool) {
        self.pressed.store(pressed, Ordering::Release);
        self.pending.store(true, Ordering::Release);
    }

    /// Returns `true` if any edge was recorded since the last [`acknowledge`](Self::acknowledge).
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Clears the pending flag. The rotation accumulator is untouched.
    pub fn acknowledge(&self) {
        self.pending.store(false, Ordering::Release);
    }

    /// Reads the unconsumed rotation without draining it.
    #[must_use]
    pub fn peek_rotation(&self) -> i32 {
        self.rotation.load(Ordering::Acquire)
    }

    /// Atomically drains the unconsumed rotation, returning it and leaving zero behind.
    pub fn take_rotation(&self) -> i32 {
        self.rotation.swap(0, Ordering::AcqRel)
    }

    /// Returns the last sampled switch level (`true` while held down).
    #[must_use]
    pub fn is_pressed(&self) -> bool {
        self.pressed.load(Ordering::Acquire)
    }
}

impl Default for QuadratureDecoder {
    fn default() -> Self {
        Self::new()
    }
}
