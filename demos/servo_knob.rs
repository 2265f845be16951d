#![no_std]
#![no_main]
#![cfg(not(feature = "host"))]

use core::{convert::Infallible, panic};
use embassy_executor::Spawner;
use embassy_time::{Duration, Instant, Ticker};
use knob_drive::{
    Result,
    board::BoardConfig,
    control::Controller,
    dial::{DialRenderer, DialView},
    pwm_channel::pwm_output_b,
    rotary_encoder::{RotaryEncoder, RotaryEncoderStatic},
    settings::flash::FlashSettings,
};
use {defmt::info, defmt_rtt as _, panic_probe as _};

// Servo on GPIO 15; encoder CLK on GPIO 2, DT on GPIO 1, SW on GPIO 3.
const BOARD: BoardConfig = BoardConfig::SERVO;

/// Stands in for the dial display: prints each redraw over RTT.
struct RttDial;

impl DialRenderer for RttDial {
    fn render(&mut self, view: &DialView) {
        info!(
            "[{}] {} {} ({}..{} step {}) = {}us",
            view.mode.label(),
            view.value,
            view.unit(),
            view.min,
            view.max,
            view.step,
            view.pulse_width_us
        );
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) -> ! {
    let err = inner_main(spawner).await.unwrap_err();
    panic!("{err}");
}

async fn inner_main(spawner: Spawner) -> Result<Infallible> {
    let p = embassy_rp::init(Default::default());
    BOARD.validate()?;

    // GPIO 15 → PWM slice 7, channel B
    let output = pwm_output_b(p.PWM_SLICE7, p.PIN_15, BOARD.timing)?;

    static ENCODER_STATIC: RotaryEncoderStatic = RotaryEncoderStatic::new();
    let encoder = RotaryEncoder::new(&ENCODER_STATIC, p.PIN_2, p.PIN_1, p.PIN_3, spawner)?;

    let mut controller = Controller::new(
        BOARD,
        encoder.decoder(),
        output,
        FlashSettings::new(p.FLASH),
    )?;
    let mut dial = RttDial;
    if BOARD.has_display {
        dial.render(&controller.dial_view());
    }

    let mut ticker = Ticker::every(Duration::from_millis(BOARD.loop_period_ms()));
    loop {
        if let Some(view) = controller.tick(Instant::now().as_millis())? {
            if BOARD.has_display {
                dial.render(&view);
            }
        }
        ticker.next().await;
    }
}
