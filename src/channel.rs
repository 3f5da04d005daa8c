//! One servo output: a PWM backend plus the state needed to drive it by angle.
//!
//! See [`Channel`] for the gating rules.

use crate::backend::{BackendError, PwmBackend};
use crate::config::ServoConfig;
use crate::fmt::{debug, error, warn};
use crate::{Error, Result};

/// Angle reported by [`Channel::get_angle`] while the output is disabled.
///
/// This is a protocol marker, not an angle.
pub const DISABLED_ANGLE: i32 = -1;

/// A servo output with its own PWM backend.
///
/// A channel starts disabled with its duty cycle at the centre of the configured range. The
/// duty cycle it records is always one the backend accepted, and it survives
/// [`disable`](Self::disable) so a later [`enable`](Self::enable) resumes at the same angle.
///
/// Dropping a channel disables its output (failures are logged) and then releases the backend.
///
/// ```rust
/// use servo_envoy::backend::{BackendError, PwmBackend};
/// use servo_envoy::channel::{Channel, DISABLED_ANGLE};
/// use servo_envoy::config::ServoConfig;
///
/// #[derive(Default)]
/// struct NullPwm;
///
/// impl PwmBackend for NullPwm {
///     fn configure(&mut self, _period_ns: u32, _duty_ns: u32) -> Result<(), BackendError> {
///         Ok(())
///     }
///     fn enable(&mut self) -> Result<(), BackendError> {
///         Ok(())
///     }
///     fn disable(&mut self) -> Result<(), BackendError> {
///         Ok(())
///     }
/// }
///
/// let mut channel = Channel::new(0, NullPwm, ServoConfig::DEFAULT)?;
/// assert_eq!(channel.get_angle(), DISABLED_ANGLE);
/// channel.set_angle(45)?;
/// channel.enable()?;
/// assert_eq!(channel.get_angle(), 45);
/// # Ok::<(), servo_envoy::Error>(())
/// ```
pub struct Channel<B: PwmBackend> {
    index: u8,
    config: ServoConfig,
    duty_cycle_ns: u32,
    enabled: bool,
    backend: B,
}

impl<B: PwmBackend> Channel<B> {
    /// Bind `backend` to channel `index`, configuring it at the centre of the duty range.
    ///
    /// The output is left disabled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BackendUnavailable`] if the backend is not ready and
    /// [`Error::IoFailure`] if it rejects the initial timing.
    pub fn new(index: u8, backend: B, config: ServoConfig) -> Result<Self> {
        Self::bind(index, backend, config).map_err(|err| match err {
            BackendError::NotReady => Error::BackendUnavailable,
            BackendError::Fault => Error::IoFailure,
        })
    }

    pub(crate) fn bind(
        index: u8,
        mut backend: B,
        config: ServoConfig,
    ) -> core::result::Result<Self, BackendError> {
        let duty_cycle_ns = config.center_duty_ns();
        backend.configure(config.period_ns(), duty_cycle_ns)?;
        backend.disable()?;
        Ok(Self {
            index,
            config,
            duty_cycle_ns,
            enabled: false,
            backend,
        })
    }

    /// Channel index within its registry.
    #[must_use]
    pub const fn index(&self) -> u8 {
        self.index
    }

    /// Timing this channel was attached with.
    #[must_use]
    pub const fn config(&self) -> &ServoConfig {
        &self.config
    }

    /// The most recently committed duty cycle in nanoseconds.
    #[must_use]
    pub const fn duty_cycle_ns(&self) -> u32 {
        self.duty_cycle_ns
    }

    /// Whether the output is being driven.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Start driving the output at the committed duty cycle. Enabling twice is fine.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IoFailure`] if the backend cannot start; the channel stays disabled.
    pub fn enable(&mut self) -> Result<()> {
        self.backend.enable().map_err(|err| {
            error!("channel {}: enable failed: {}", self.index, err);
            Error::IoFailure
        })?;
        self.enabled = true;
        debug!("channel {}: enabled", self.index);
        Ok(())
    }

    /// Stop driving the output, keeping the committed duty cycle. Disabling twice is fine.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IoFailure`] if the backend cannot stop; the enabled flag is unchanged.
    pub fn disable(&mut self) -> Result<()> {
        self.backend.disable().map_err(|err| {
            error!("channel {}: disable failed: {}", self.index, err);
            Error::IoFailure
        })?;
        self.enabled = false;
        debug!("channel {}: disabled", self.index);
        Ok(())
    }

    /// Move to `degrees`, clamped to `0..=max_degrees`.
    ///
    /// The new duty cycle is committed only if the backend accepts it. Works while disabled;
    /// the position takes effect on the next [`enable`](Self::enable).
    ///
    /// # Errors
    ///
    /// Returns [`Error::IoFailure`] if the backend rejects the duty cycle; the previous duty
    /// cycle is kept.
    pub fn set_angle(&mut self, degrees: i32) -> Result<()> {
        let prior = self.duty_cycle_ns;
        self.duty_cycle_ns = self.config.angle_to_duty_ns(degrees);
        if let Err(err) = self
            .backend
            .configure(self.config.period_ns(), self.duty_cycle_ns)
        {
            error!(
                "channel {}: duty {}ns rejected: {}",
                self.index,
                self.duty_cycle_ns,
                err
            );
            self.duty_cycle_ns = prior;
            return Err(Error::IoFailure);
        }
        debug!(
            "channel {}: set_angle({}) -> {}ns",
            self.index,
            degrees,
            self.duty_cycle_ns
        );
        Ok(())
    }

    /// Current angle in degrees, or [`DISABLED_ANGLE`] while disabled.
    ///
    /// Reads the backend's duty cycle when it reports one, otherwise the committed value.
    #[must_use]
    pub fn get_angle(&self) -> i32 {
        if !self.enabled {
            return DISABLED_ANGLE;
        }
        let duty_cycle_ns = self.backend.duty_cycle_ns().unwrap_or(self.duty_cycle_ns);
        self.config.duty_ns_to_angle(duty_cycle_ns)
    }
}

impl<B: PwmBackend> Drop for Channel<B> {
    fn drop(&mut self) {
        if let Err(err) = self.backend.disable() {
            warn!("channel {}: disable on teardown failed: {}", self.index, err);
        }
        self.enabled = false;
    }
}
