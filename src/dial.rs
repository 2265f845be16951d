//! What the control loop hands to a display: a snapshot of the knob's current dial.
//!
//! Drawing is left to the [`DialRenderer`] implementation.

use crate::settings::Mode;

/// Snapshot of the value the knob currently adjusts.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(not(feature = "host"), derive(defmt::Format))]
pub struct DialView {
    /// Active mode.
    pub mode: Mode,
    /// Current value in the mode's unit.
    pub value: u16,
    /// Lowest value the mode allows.
    pub min: u16,
    /// Highest value the mode allows.
    pub max: u16,
    /// Change per knob step.
    pub step: u16,
    /// Pulse width currently commanded, for a secondary readout.
    pub pulse_width_us: u16,
}

impl DialView {
    /// Unit suffix for the mode's value.
    #[must_use]
    pub const fn unit(&self) -> &'static str {
        match self.mode {
            Mode::Percent => "%",
            Mode::Angle => "deg",
            Mode::PulseWidth | Mode::MinPulseWidth => "us",
        }
    }
}

/// Draws a [`DialView`]. Implemented by whatever display the board carries.
pub trait DialRenderer {
    /// Redraws the dial.
    fn render(&mut self, view: &DialView);
}

/// Renderer for boards without a display.
pub struct NoDisplay;

impl DialRenderer for NoDisplay {
    fn render(&mut self, _view: &DialView) {}
}
