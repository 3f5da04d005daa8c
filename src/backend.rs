//! The PWM capability a servo channel drives.
//!
//! A [`PwmBackend`] accepts a period and duty cycle and can start or stop driving its output.
//! Two implementations ship with the crate:
//!
//! - [`HalPwm`] adapts any [`embedded_hal::pwm::SetDutyCycle`] output whose period is fixed by
//!   the hardware.
//! - `rp::RpPwm` (embedded builds) drives an RP2040/RP235x PWM slice directly.

use derive_more::{Display, Error};
use embedded_hal::pwm::SetDutyCycle;

use crate::fmt::{debug, error};

#[cfg(all(not(feature = "host"), any(feature = "pico1", feature = "pico2")))]
pub mod rp;

/// Failures a backend can report.
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BackendError {
    /// The hardware is not available yet; acquisition may succeed later.
    #[display("PWM backend not ready")]
    NotReady,
    /// The hardware rejected the request.
    #[display("PWM backend fault")]
    Fault,
}

/// A PWM output that a [`Channel`](crate::channel::Channel) owns exclusively.
///
/// Calls are synchronous and expected to complete promptly.
pub trait PwmBackend {
    /// Apply a period and duty cycle. Does not change whether the output is driven.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the hardware cannot apply the timing.
    fn configure(&mut self, period_ns: u32, duty_cycle_ns: u32) -> Result<(), BackendError>;

    /// Start driving the output with the last configured timing.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the output cannot be started.
    fn enable(&mut self) -> Result<(), BackendError>;

    /// Stop driving the output.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the output cannot be stopped.
    fn disable(&mut self) -> Result<(), BackendError>;

    /// The duty cycle the hardware is currently applying, if it can report one.
    fn duty_cycle_ns(&self) -> Option<u32> {
        None
    }
}

impl<B: PwmBackend + ?Sized> PwmBackend for &mut B {
    fn configure(&mut self, period_ns: u32, duty_cycle_ns: u32) -> Result<(), BackendError> {
        (**self).configure(period_ns, duty_cycle_ns)
    }

    fn enable(&mut self) -> Result<(), BackendError> {
        (**self).enable()
    }

    fn disable(&mut self) -> Result<(), BackendError> {
        (**self).disable()
    }

    fn duty_cycle_ns(&self) -> Option<u32> {
        (**self).duty_cycle_ns()
    }
}

// ============================================================================
// HalPwm - embedded-hal adapter
// ============================================================================

/// Adapts an [`embedded_hal::pwm::SetDutyCycle`] output to [`PwmBackend`].
///
/// The output's period is fixed by whoever configured it (`hardware_period_ns`), so
/// [`configure`](PwmBackend::configure) scales the requested duty cycle against that period.
/// Disabling sets the output fully off; enabling re-applies the stored duty cycle.
pub struct HalPwm<P> {
    pwm: P,
    hardware_period_ns: u32,
    duty_cycle_ns: u32,
    enabled: bool,
}

impl<P: SetDutyCycle> HalPwm<P> {
    /// Wrap an output whose period is `hardware_period_ns`. The output is turned off.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Fault`] if the period is zero or the output cannot be turned off.
    pub fn new(mut pwm: P, hardware_period_ns: u32) -> Result<Self, BackendError> {
        if hardware_period_ns == 0 {
            error!("HalPwm: zero hardware period");
            return Err(BackendError::Fault);
        }
        pwm.set_duty_cycle_fully_off().map_err(|_| BackendError::Fault)?;
        Ok(Self {
            pwm,
            hardware_period_ns,
            duty_cycle_ns: 0,
            enabled: false,
        })
    }

    /// Release the wrapped output.
    pub fn into_inner(self) -> P {
        self.pwm
    }

    fn apply(&mut self) -> Result<(), BackendError> {
        let max_duty = u64::from(self.pwm.max_duty_cycle());
        let ticks = max_duty * u64::from(self.duty_cycle_ns) / u64::from(self.hardware_period_ns);
        let ticks = u16::try_from(ticks).map_err(|_| BackendError::Fault)?;
        debug!("HalPwm: {}ns -> {} ticks", self.duty_cycle_ns, ticks);
        self.pwm.set_duty_cycle(ticks).map_err(|_| {
            error!("HalPwm: set_duty_cycle({}) failed", ticks);
            BackendError::Fault
        })
    }
}

impl<P: SetDutyCycle> PwmBackend for HalPwm<P> {
    fn configure(&mut self, period_ns: u32, duty_cycle_ns: u32) -> Result<(), BackendError> {
        if period_ns != self.hardware_period_ns || duty_cycle_ns > period_ns {
            error!(
                "HalPwm: cannot apply {}ns/{}ns on a {}ns output",
                duty_cycle_ns,
                period_ns,
                self.hardware_period_ns
            );
            return Err(BackendError::Fault);
        }
        let prior = self.duty_cycle_ns;
        self.duty_cycle_ns = duty_cycle_ns;
        if self.enabled {
            if let Err(err) = self.apply() {
                self.duty_cycle_ns = prior;
                return Err(err);
            }
        }
        Ok(())
    }

    fn enable(&mut self) -> Result<(), BackendError> {
        self.apply()?;
        self.enabled = true;
        Ok(())
    }

    fn disable(&mut self) -> Result<(), BackendError> {
        self.pwm
            .set_duty_cycle_fully_off()
            .map_err(|_| BackendError::Fault)?;
        self.enabled = false;
        Ok(())
    }
}
