//! A device abstraction for a quadrature rotary encoder with a push switch (KY-040 style).
//!
//! GPIO edge interrupts wake two small tasks that sample the lines and feed a shared
//! [`QuadratureDecoder`]. The control loop reads the decoder; see [`RotaryEncoder`].

use embassy_executor::Spawner;
use embassy_futures::select::select;
use embassy_rp::Peri;
use embassy_rp::gpio::{Input, Pin, Pull};

use crate::quadrature::QuadratureDecoder;
use crate::{Error, Result};

/// Static resources for [`RotaryEncoder`].
pub struct RotaryEncoderStatic {
    decoder: QuadratureDecoder,
}

impl RotaryEncoderStatic {
    /// Creates static resources.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            decoder: QuadratureDecoder::new(),
        }
    }
}

impl Default for RotaryEncoderStatic {
    fn default() -> Self {
        Self::new()
    }
}

/// A rotary encoder whose CLK, DT, and SW lines idle high (internal pull-ups) and are pulled
/// to ground by the encoder.
///
/// # Example
///
/// ```rust,no_run
/// # #![no_std]
/// # #![no_main]
/// use knob_drive::rotary_encoder::{RotaryEncoder, RotaryEncoderStatic};
/// # #[panic_handler]
/// # fn panic(_info: &core::panic::PanicInfo) -> ! { loop {} }
///
/// async fn example(p: embassy_rp::Peripherals, spawner: embassy_executor::Spawner) -> knob_drive::Result<()> {
///     static ENCODER_STATIC: RotaryEncoderStatic = RotaryEncoderStatic::new();
///     let encoder = RotaryEncoder::new(&ENCODER_STATIC, p.PIN_2, p.PIN_1, p.PIN_3, spawner)?;
///
///     let decoder = encoder.decoder();
///     if decoder.has_pending() {
///         decoder.acknowledge();
///         let _ticks = decoder.take_rotation();
///     }
///     Ok(())
/// }
/// ```
pub struct RotaryEncoder {
    decoder: &'static QuadratureDecoder,
}

impl RotaryEncoder {
    /// Configures the three pins, seeds the decoder from their current levels, and spawns the
    /// edge-watching tasks.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TaskSpawn`] if an encoder was already created (the task pools hold one
    /// task each).
    pub fn new(
        rotary_encoder_static: &'static RotaryEncoderStatic,
        clk: Peri<'static, impl Pin>,
        dt: Peri<'static, impl Pin>,
        sw: Peri<'static, impl Pin>,
        spawner: Spawner,
    ) -> Result<Self> {
        let clk = Input::new(clk, Pull::Up);
        let dt = Input::new(dt, Pull::Up);
        let sw = Input::new(sw, Pull::Up);

        let decoder = &rotary_encoder_static.decoder;
        decoder.seed(clk.is_high(), dt.is_high(), sw.is_low());
        defmt::info!(
            "RotaryEncoder: clk={} dt={} pressed={}",
            clk.is_high(),
            dt.is_high(),
            sw.is_low()
        );

        let token = quadrature_edge_task(clk, dt, decoder);
        spawner.spawn(token).map_err(Error::TaskSpawn)?;
        let token = switch_edge_task(sw, decoder);
        spawner.spawn(token).map_err(Error::TaskSpawn)?;

        Ok(Self { decoder })
    }

    /// Shared decoder state, for the control loop.
    #[must_use]
    pub const fn decoder(&self) -> &'static QuadratureDecoder {
        self.decoder
    }
}

#[embassy_executor::task]
async fn quadrature_edge_task(
    mut clk: Input<'static>,
    mut dt: Input<'static>,
    decoder: &'static QuadratureDecoder,
) -> ! {
    loop {
        select(clk.wait_for_any_edge(), dt.wait_for_any_edge()).await;
        // Sample both lines after either edge; a missed intermediate state shows up as a
        // double flip, which the transition table resolves.
        decoder.record_levels(clk.is_high(), dt.is_high());
    }
}

#[embassy_executor::task]
async fn switch_edge_task(mut sw: Input<'static>, decoder: &'static QuadratureDecoder) -> ! {
    loop {
        sw.wait_for_any_edge().await;
        decoder.record_button_level(sw.is_low());
    }
}
