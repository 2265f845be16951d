//! PWM slice setup for a fixed frequency and duty resolution.
//!
//! The slice counter wraps at `top = 2^bits - 1`, so a duty value from
//! [`PwmTiming::pulse_width_to_duty`] can be written to the compare register unchanged.

use defmt::info;
use embassy_rp::Peri;
use embassy_rp::clocks::clk_sys_freq;
use embassy_rp::pwm::{ChannelAPin, ChannelBPin, Config, Pwm, PwmOutput, Slice};
use fixed::FixedU16;
use fixed::types::extra::U4;

use crate::actuation::PwmTiming;
use crate::{Error, Result};

// 8.4 fixed-point divider, in sixteenths.
const DIVIDER_MIN_16THS: u64 = 16;
const DIVIDER_MAX_16THS: u64 = 255 * 16 + 15;

/// Configures `slice` with output on channel A and returns that channel.
///
/// # Errors
///
/// Returns [`Error::PwmFrequencyUnreachable`] if the clock divider cannot produce
/// `timing`'s frequency at its resolution.
pub fn pwm_output_a<'d, T: Slice>(
    slice: Peri<'d, T>,
    pin: Peri<'d, impl ChannelAPin<T>>,
    timing: PwmTiming,
) -> Result<PwmOutput<'d>> {
    let config = slice_config(timing)?;
    let (output, _) = Pwm::new_output_a(slice, pin, config).split();
    output.ok_or(Error::InvalidBoardConfig("PWM channel A has no output"))
}

/// Configures `slice` with output on channel B and returns that channel.
///
/// # Errors
///
/// Returns [`Error::PwmFrequencyUnreachable`] if the clock divider cannot produce
/// `timing`'s frequency at its resolution.
pub fn pwm_output_b<'d, T: Slice>(
    slice: Peri<'d, T>,
    pin: Peri<'d, impl ChannelBPin<T>>,
    timing: PwmTiming,
) -> Result<PwmOutput<'d>> {
    let config = slice_config(timing)?;
    let (_, output) = Pwm::new_output_b(slice, pin, config).split();
    output.ok_or(Error::InvalidBoardConfig("PWM channel B has no output"))
}

fn slice_config(timing: PwmTiming) -> Result<Config> {
    let clk = u64::from(clk_sys_freq()); // Hz
    let top = timing.duty_max();
    let frequency_hz = u64::from(timing.frequency_hz());
    let counts_per_second = frequency_hz * (u64::from(top) + 1);

    // Edge-aligned first; phase-correct counts up and down, halving the divider needed.
    let mut phase_correct = false;
    let mut divider_16ths = (clk * 16 + counts_per_second / 2) / counts_per_second;
    if divider_16ths > DIVIDER_MAX_16THS {
        phase_correct = true;
        divider_16ths = (clk * 16 + counts_per_second) / (2 * counts_per_second);
    }
    if !(DIVIDER_MIN_16THS..=DIVIDER_MAX_16THS).contains(&divider_16ths) {
        return Err(Error::PwmFrequencyUnreachable(timing.frequency_hz()));
    }
    let divider_bits =
        u16::try_from(divider_16ths).map_err(|_| Error::PwmFrequencyUnreachable(timing.frequency_hz()))?;

    let mut config = Config::default();
    config.top = top;
    config.phase_correct = phase_correct;
    config.divider = FixedU16::<U4>::from_bits(divider_bits);
    config.compare_a = 0;
    config.compare_b = 0;
    config.enable = true;

    info!(
        "pwm clk={}Hz div={}.{}/16 top={} phase_correct={}",
        clk,
        divider_16ths / 16,
        divider_16ths % 16,
        top,
        phase_correct
    );
    Ok(config)
}
