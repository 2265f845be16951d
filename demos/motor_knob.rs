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
    dial::{DialRenderer, NoDisplay},
    pwm_channel::pwm_output_a,
    rotary_encoder::{RotaryEncoder, RotaryEncoderStatic},
    settings::flash::FlashSettings,
};
use {defmt::info, defmt_rtt as _, panic_probe as _};

// ESC on GPIO 0; encoder CLK on GPIO 2, DT on GPIO 1, SW on GPIO 3.
const BOARD: BoardConfig = BoardConfig::MOTOR;

#[embassy_executor::main]
async fn main(spawner: Spawner) -> ! {
    let err = inner_main(spawner).await.unwrap_err();
    panic!("{err}");
}

async fn inner_main(spawner: Spawner) -> Result<Infallible> {
    let p = embassy_rp::init(Default::default());
    BOARD.validate()?;

    // GPIO 0 → PWM slice 0, channel A
    let output = pwm_output_a(p.PWM_SLICE0, p.PIN_0, BOARD.timing)?;

    static ENCODER_STATIC: RotaryEncoderStatic = RotaryEncoderStatic::new();
    let encoder = RotaryEncoder::new(&ENCODER_STATIC, p.PIN_2, p.PIN_1, p.PIN_3, spawner)?;

    let mut controller = Controller::new(
        BOARD,
        encoder.decoder(),
        output,
        FlashSettings::new(p.FLASH),
    )?;
    let mut display = NoDisplay;
    display.render(&controller.dial_view());
    info!("Motor knob ready: {}", controller.dial_view());

    let mut ticker = Ticker::every(Duration::from_millis(BOARD.loop_period_ms()));
    loop {
        if let Some(view) = controller.tick(Instant::now().as_millis())? {
            display.render(&view);
        }
        ticker.next().await;
    }
}
