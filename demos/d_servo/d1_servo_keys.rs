#![no_std]
#![no_main]
#![cfg(not(feature = "host"))]

//! Two servos on one board, driven through the client API by five buttons.
//!
//! Build with `--no-default-features --features embedded --target thumbv6m-none-eabi`; the
//! build script links against `memory-pico1w.x`.
//!
//! | GPIO | Key | Action |
//! |------|-----|--------|
//! | 2 | Up | enable |
//! | 3 | Down | disable |
//! | 4 | Left | 180° |
//! | 5 | Right | 0° |
//! | 6 | `q` | release the servos and stop |

use core::{convert::Infallible, future, panic};
use embassy_executor::Spawner;
use embassy_futures::select::select_array;
use embassy_rp::{
    gpio::{Input, Pull},
    pwm::{Config, Pwm},
};
use embassy_time::Timer;
use servo_envoy::{
    Result,
    backend::rp::RpPwm,
    client::{Action, Key, ServoClient},
    config::ServoConfig,
    dispatch::LocalTransport,
    registry::ChannelRegistry,
    servo_config,
};
use {defmt::info, defmt_rtt as _, panic_probe as _};

const KEYS: [Key; 5] = [Key::Up, Key::Down, Key::Left, Key::Right, Key::Char(b'q')];

// A wider-travel servo on channel 1.
const WIDE: ServoConfig = servo_config! {
    max_duty_ns: 2_500_000,
    max_degrees: 270,
};

#[embassy_executor::main]
async fn main(spawner: Spawner) -> ! {
    let err = inner_main(spawner).await.unwrap_err();
    panic!("{err}");
}

async fn inner_main(_spawner: Spawner) -> Result<Infallible> {
    let p = embassy_rp::init(Default::default());

    let registry = ChannelRegistry::<RpPwm<'static>, 2>::new(ServoConfig::DEFAULT);

    // GPIO 11 → slice 5 output B
    let pwm = Pwm::new_output_b(p.PWM_SLICE5, p.PIN_11, Config::default());
    registry.attach(0, |_| Ok(RpPwm::new_output_b(pwm))).await?;
    // GPIO 12 → slice 6 output A
    let pwm = Pwm::new_output_a(p.PWM_SLICE6, p.PIN_12, Config::default());
    registry
        .attach_with_config(1, WIDE, |_| Ok(RpPwm::new_output_a(pwm)))
        .await?;

    let mut buttons = [
        Input::new(p.PIN_2, Pull::Up),
        Input::new(p.PIN_3, Pull::Up),
        Input::new(p.PIN_4, Pull::Up),
        Input::new(p.PIN_5, Pull::Up),
        Input::new(p.PIN_6, Pull::Up),
    ];

    let transport = LocalTransport::new(&registry);
    let mut servo = ServoClient::create("/dev/servo0")?;
    servo.init(&transport).await?;
    let mut wide_servo = ServoClient::create("/dev/servo1")?;
    wide_servo.init(&transport).await?;

    loop {
        let (_, pressed) =
            select_array(buttons.each_mut().map(|button| button.wait_for_low())).await;
        let Some(&key) = KEYS.get(pressed) else {
            continue;
        };
        let action = key.action();
        info!("key {} -> {}", key, action);
        if action == Action::Quit {
            break;
        }

        servo.apply(action).await?;
        // The wide servo mirrors the first across its own range.
        let mirrored = match action {
            Action::SetPosition(0) => Action::SetPosition(270),
            Action::SetPosition(_) => Action::SetPosition(0),
            other => other,
        };
        wide_servo.apply(mirrored).await?;
        info!(
            "positions: {} {}",
            servo.get_position().await?,
            wide_servo.get_position().await?
        );

        // Debounce and wait for release.
        Timer::after_millis(50).await;
        for button in &mut buttons {
            button.wait_for_high().await;
        }
    }

    servo.close()?;
    wide_servo.close()?;
    registry.detach_all().await;
    info!("servos released");

    future::pending().await
}
