#![cfg(feature = "host")]
#![allow(missing_docs)]
//! Host-level tests for channel gating and duty-cycle commits.

mod support;

use core::convert::Infallible;

use embedded_hal::pwm::{ErrorType, SetDutyCycle};
use servo_envoy::Error;
use servo_envoy::backend::{BackendError, HalPwm, PwmBackend};
use servo_envoy::channel::{Channel, DISABLED_ANGLE};
use servo_envoy::config::ServoConfig;
use servo_envoy::registry::{AttachError, ChannelRegistry};
use support::mock;

#[test]
fn new_channel_is_centered_and_disabled() -> Result<(), Error> {
    let (pwm, probe) = mock();
    let channel = Channel::new(3, pwm, ServoConfig::DEFAULT)?;

    assert_eq!(channel.index(), 3);
    assert!(!channel.is_enabled());
    assert_eq!(channel.duty_cycle_ns(), 1_400_000);
    assert_eq!(channel.get_angle(), DISABLED_ANGLE);

    let state = probe.state();
    assert_eq!(state.period_ns, 20_000_000);
    assert_eq!(state.duty_cycle_ns, 1_400_000);
    assert!(!state.enabled);
    Ok(())
}

#[test]
fn set_angle_commits_mapped_duty() -> Result<(), Error> {
    let (pwm, probe) = mock();
    let mut channel = Channel::new(0, pwm, ServoConfig::DEFAULT)?;

    channel.set_angle(0)?;
    assert_eq!(probe.state().duty_cycle_ns, 500_000);
    channel.set_angle(180)?;
    assert_eq!(probe.state().duty_cycle_ns, 2_300_000);
    channel.set_angle(90)?;
    assert_eq!(channel.duty_cycle_ns(), 1_400_000);
    assert_eq!(probe.state().duty_cycle_ns, 1_400_000);
    Ok(())
}

#[test]
fn set_angle_clamps_out_of_range_requests() -> Result<(), Error> {
    let (pwm, probe) = mock();
    let mut channel = Channel::new(0, pwm, ServoConfig::DEFAULT)?;

    channel.set_angle(-45)?;
    assert_eq!(channel.duty_cycle_ns(), 500_000);
    channel.set_angle(i32::MAX)?;
    assert_eq!(channel.duty_cycle_ns(), 2_300_000);
    assert_eq!(probe.state().duty_cycle_ns, 2_300_000);
    Ok(())
}

#[test]
fn rejected_duty_rolls_back() -> Result<(), Error> {
    let (pwm, probe) = mock();
    let mut channel = Channel::new(0, pwm, ServoConfig::DEFAULT)?;
    channel.set_angle(30)?;
    channel.enable()?;

    probe.state().fail_configure = true;
    assert_eq!(channel.set_angle(150), Err(Error::IoFailure));
    assert_eq!(channel.duty_cycle_ns(), 800_000);
    assert_eq!(channel.get_angle(), 30);
    Ok(())
}

#[test]
fn disable_reports_sentinel_and_enable_resumes() -> Result<(), Error> {
    let (pwm, probe) = mock();
    let mut channel = Channel::new(0, pwm, ServoConfig::DEFAULT)?;
    channel.set_angle(135)?;
    channel.enable()?;
    assert_eq!(channel.get_angle(), 135);

    channel.disable()?;
    assert_eq!(channel.get_angle(), DISABLED_ANGLE);
    assert!(!probe.state().enabled);
    assert_eq!(channel.duty_cycle_ns(), 1_850_000);

    channel.enable()?;
    assert_eq!(channel.get_angle(), 135);
    assert!(probe.state().enabled);
    assert_eq!(probe.state().duty_cycle_ns, 1_850_000);
    Ok(())
}

#[test]
fn enable_and_disable_are_idempotent() -> Result<(), Error> {
    let (pwm, _probe) = mock();
    let mut channel = Channel::new(0, pwm, ServoConfig::DEFAULT)?;
    channel.enable()?;
    channel.enable()?;
    assert!(channel.is_enabled());
    channel.disable()?;
    channel.disable()?;
    assert!(!channel.is_enabled());
    Ok(())
}

#[test]
fn failed_enable_leaves_channel_disabled() -> Result<(), Error> {
    let (pwm, probe) = mock();
    let mut channel = Channel::new(0, pwm, ServoConfig::DEFAULT)?;
    probe.state().fail_enable = true;
    assert_eq!(channel.enable(), Err(Error::IoFailure));
    assert!(!channel.is_enabled());
    assert_eq!(channel.get_angle(), DISABLED_ANGLE);
    Ok(())
}

#[test]
fn get_angle_prefers_backend_report() -> Result<(), Error> {
    let (pwm, probe) = mock();
    let mut channel = Channel::new(0, pwm, ServoConfig::DEFAULT)?;
    channel.set_angle(10)?;
    channel.enable()?;
    assert_eq!(channel.get_angle(), 10);

    // The hardware says it is applying 60°.
    probe.state().report_duty = Some(1_100_000);
    assert_eq!(channel.get_angle(), 60);
    Ok(())
}

#[test]
fn drop_disables_and_releases_backend() -> Result<(), Error> {
    let (pwm, probe) = mock();
    let mut channel = Channel::new(0, pwm, ServoConfig::DEFAULT)?;
    channel.enable()?;
    let disables_before = probe.state().disable_calls;

    drop(channel);
    let state = probe.state();
    assert!(!state.enabled);
    assert_eq!(state.disable_calls, disables_before + 1);
    assert!(state.released);
    Ok(())
}

#[test]
fn drop_still_releases_when_disable_fails() -> Result<(), Error> {
    let (pwm, probe) = mock();
    let channel = Channel::new(0, pwm, ServoConfig::DEFAULT)?;
    probe.state().fail_disable = true;
    drop(channel);
    assert!(probe.state().released);
    Ok(())
}

#[test]
fn not_ready_backend_is_unavailable() {
    struct Pending;

    impl PwmBackend for Pending {
        fn configure(&mut self, _period_ns: u32, _duty_ns: u32) -> Result<(), BackendError> {
            Err(BackendError::NotReady)
        }
        fn enable(&mut self) -> Result<(), BackendError> {
            Err(BackendError::NotReady)
        }
        fn disable(&mut self) -> Result<(), BackendError> {
            Err(BackendError::NotReady)
        }
    }

    assert!(matches!(
        Channel::new(0, Pending, ServoConfig::DEFAULT),
        Err(Error::BackendUnavailable)
    ));
}

// ============================================================================
// HalPwm over an embedded-hal output
// ============================================================================

struct FakeSlice {
    max: u16,
    duty: u16,
}

impl ErrorType for FakeSlice {
    type Error = Infallible;
}

impl SetDutyCycle for FakeSlice {
    fn max_duty_cycle(&self) -> u16 {
        self.max
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.duty = duty;
        Ok(())
    }
}

#[test]
fn hal_pwm_scales_duty_against_hardware_period() -> Result<(), Error> {
    let mut slice = FakeSlice {
        max: 20_000,
        duty: 1,
    };
    {
        let backend = HalPwm::new(&mut slice, 20_000_000).map_err(|_| Error::Fatal)?;
        let mut channel = Channel::new(0, backend, ServoConfig::DEFAULT)?;
        channel.set_angle(90)?;
        channel.enable()?;
        assert_eq!(channel.get_angle(), 90);
    }
    // Dropping the channel turns the output fully off.
    assert_eq!(slice.duty, 0);

    let backend = HalPwm::new(&mut slice, 20_000_000).map_err(|_| Error::Fatal)?;
    let mut channel = Channel::new(0, backend, ServoConfig::DEFAULT)?;
    channel.set_angle(0)?;
    channel.enable()?;
    drop(channel);
    Ok(())
}

#[test]
fn hal_pwm_applies_ticks_only_while_enabled() -> Result<(), BackendError> {
    let mut slice = FakeSlice {
        max: 20_000,
        duty: 7,
    };
    {
        let mut backend = HalPwm::new(&mut slice, 20_000_000)?;
        backend.configure(20_000_000, 1_500_000)?;
        backend.enable()?;
        backend.configure(20_000_000, 2_000_000)?;
    }
    assert_eq!(slice.duty, 2_000);
    Ok(())
}

#[test]
fn hal_pwm_rejects_foreign_period() -> Result<(), BackendError> {
    let mut slice = FakeSlice { max: 1_000, duty: 0 };
    let mut backend = HalPwm::new(&mut slice, 20_000_000)?;
    assert_eq!(
        backend.configure(10_000_000, 1_000_000),
        Err(BackendError::Fault)
    );
    assert!(matches!(
        Channel::new(0, backend, ServoConfig::DEFAULT.with_period_ns(10_000_000)),
        Err(Error::IoFailure)
    ));
    Ok(())
}

#[test]
fn hal_pwm_zero_period_is_not_retryable() {
    let mut slice = FakeSlice { max: 1_000, duty: 5 };
    assert!(matches!(
        HalPwm::new(&mut slice, 0),
        Err(BackendError::Fault)
    ));

    let registry = ChannelRegistry::<HalPwm<&mut FakeSlice>, 1>::new(ServoConfig::DEFAULT);
    assert_eq!(
        embassy_futures::block_on(registry.attach(0, |_| HalPwm::new(&mut slice, 0))),
        Err(AttachError::Fatal)
    );
}
