//! Rotary-encoder knob control of PWM motors and servos for Pico 1 and 2.
//!
//! A quadrature knob with a push switch drives either a continuous motor (percent control)
//! or a positional servo (angle control). The selected mode and the minimum pulse-width
//! calibration survive power cycles in internal flash.
//!
//! | Module | Purpose |
//! | ------ | ------- |
//! | [`quadrature`] | Interrupt-safe quadrature decoding |
//! | [`actuation`] | Pulse width / percent / angle / duty conversions |
//! | [`actuator`] | PWM actuator with one authoritative command |
//! | [`settings`] | Persisted settings with debounced writes |
//! | [`board`] | Hardware description per board revision |
//! | [`control`] | The knob control loop |
//! | [`dial`] | Display snapshot and renderer interface |
//!
//! # Glossary
//!
//! - **Quadrature signal:** two lines (CLK and DT) that toggle out of phase as the knob turns;
//!   which one leads gives the direction.
//! - **Detent:** one mechanical click of the knob, a full quadrature cycle.
//! - **Duty:** the compare value written to the PWM slice, up to `2^bits - 1`.
//! - **PWM ([Pulse Width Modulation](https://en.wikipedia.org/wiki/Pulse-width_modulation)) Slices:**
//!   Both Pico 1 and 2 have 8 slices (& 16 channels). These "slices" are unrelated to Rust slices.
#![cfg_attr(not(feature = "host"), no_std)]
#![cfg_attr(not(feature = "host"), no_main)]

// Compile-time checks: exactly one board must be selected (unless testing with host feature)
#[cfg(all(not(any(feature = "pico1", feature = "pico2")), not(feature = "host")))]
compile_error!("Must enable exactly one board feature: 'pico1' or 'pico2'");

#[cfg(all(feature = "pico1", feature = "pico2"))]
compile_error!("Cannot enable both 'pico1' and 'pico2' features simultaneously");

// Compile-time checks: exactly one architecture must be selected (unless testing with host feature)
#[cfg(all(not(any(feature = "arm", feature = "riscv")), not(feature = "host")))]
compile_error!("Must enable exactly one architecture feature: 'arm' or 'riscv'");

#[cfg(all(feature = "arm", feature = "riscv"))]
compile_error!("Cannot enable both 'arm' and 'riscv' features simultaneously");

// Compile-time check: pico1 only supports ARM
#[cfg(all(feature = "pico1", feature = "riscv"))]
compile_error!("Pico 1 (RP2040) only supports ARM architecture, not RISC-V");

pub mod actuation;
pub mod actuator;
pub mod board;
pub mod control;
pub mod dial;
mod error;
#[cfg(not(feature = "host"))]
pub mod pwm_channel;
pub mod quadrature;
#[cfg(not(feature = "host"))]
pub mod rotary_encoder;
pub mod settings;

// Re-export error types and result (used throughout)
pub use crate::error::{Error, Result};
