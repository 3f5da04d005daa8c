//! RP2040/RP235x PWM slices as servo backends.
//!
//! See [`RpPwm`] for usage.

use embassy_rp::clocks::clk_sys_freq;
use embassy_rp::pwm::{Config, Pwm};

use crate::backend::{BackendError, PwmBackend};
use crate::fmt::info;

/// A PWM slice output driven with 1 µs ticks.
///
/// # Examples
/// ```rust,no_run
/// # #![no_std]
/// # #![no_main]
/// use embassy_rp::pwm::{Config, Pwm};
/// use servo_envoy::backend::rp::RpPwm;
/// # use core::panic::PanicInfo;
/// # #[panic_handler]
/// # fn panic(_info: &PanicInfo) -> ! { loop {} }
/// fn example(p: embassy_rp::Peripherals) {
///     // GPIO 15 is output B of PWM slice 7.
///     let pwm = Pwm::new_output_b(p.PWM_SLICE7, p.PIN_15, Config::default());
///     let backend = RpPwm::new_output_b(pwm);
/// }
/// ```
pub struct RpPwm<'d> {
    pwm: Pwm<'d>,
    cfg: Config, // Store config to avoid recreating default (which resets divider)
    output: RpOutput,
}

#[derive(Debug, Clone, Copy)]
enum RpOutput {
    A,
    B,
}

impl<'d> RpPwm<'d> {
    /// Use output A of the slice.
    #[must_use]
    pub fn new_output_a(pwm: Pwm<'d>) -> Self {
        Self::init(pwm, RpOutput::A)
    }

    /// Use output B of the slice.
    #[must_use]
    pub fn new_output_b(pwm: Pwm<'d>) -> Self {
        Self::init(pwm, RpOutput::B)
    }

    fn init(mut pwm: Pwm<'d>, output: RpOutput) -> Self {
        let clk = clk_sys_freq() as u64; // Hz
        // Aim for tick ≈ 1 µs: divider = clk_sys / 1_000_000
        let div_int = u8::try_from((clk / 1_000_000).clamp(1, 255)).unwrap_or(u8::MAX);

        let mut cfg = Config::default();
        cfg.phase_correct = false; // edge-aligned => exact 1 µs steps
        cfg.divider = div_int.into();
        cfg.enable = false; // Channel enables explicitly
        pwm.set_config(&cfg);

        info!("RpPwm clk={}Hz div={}", clk, div_int);

        Self { pwm, cfg, output }
    }

    fn compare(&self) -> u16 {
        match self.output {
            RpOutput::A => self.cfg.compare_a,
            RpOutput::B => self.cfg.compare_b,
        }
    }
}

impl PwmBackend for RpPwm<'_> {
    fn configure(&mut self, period_ns: u32, duty_cycle_ns: u32) -> Result<(), BackendError> {
        // One tick ≈ 1 µs, so top = period_us - 1 and compare = duty_us.
        let top = u16::try_from(period_ns / 1_000)
            .ok()
            .and_then(|period_us| period_us.checked_sub(1))
            .ok_or(BackendError::Fault)?;
        let compare = u16::try_from(duty_cycle_ns / 1_000).map_err(|_| BackendError::Fault)?;
        if compare > top {
            return Err(BackendError::Fault);
        }
        // Update the stored config and reapply it with the divider intact.
        self.cfg.top = top;
        match self.output {
            RpOutput::A => self.cfg.compare_a = compare,
            RpOutput::B => self.cfg.compare_b = compare,
        }
        self.pwm.set_config(&self.cfg);
        Ok(())
    }

    fn enable(&mut self) -> Result<(), BackendError> {
        self.cfg.enable = true;
        self.pwm.set_config(&self.cfg);
        Ok(())
    }

    fn disable(&mut self) -> Result<(), BackendError> {
        self.cfg.enable = false;
        self.pwm.set_config(&self.cfg);
        Ok(())
    }

    fn duty_cycle_ns(&self) -> Option<u32> {
        Some(u32::from(self.compare()) * 1_000)
    }
}
