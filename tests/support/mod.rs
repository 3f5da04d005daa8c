//! Recording PWM backend shared by the host tests.
#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::sync::{Arc, Mutex, MutexGuard};

use servo_envoy::backend::{BackendError, PwmBackend};

/// Everything the mock has been asked to do, plus switches to make it fail.
#[derive(Debug, Default)]
pub struct MockState {
    pub period_ns: u32,
    pub duty_cycle_ns: u32,
    pub enabled: bool,
    pub configure_calls: usize,
    pub disable_calls: usize,
    pub released: bool,
    pub fail_configure: bool,
    pub fail_enable: bool,
    pub fail_disable: bool,
    /// Report the applied duty cycle back through `duty_cycle_ns()`.
    pub report_duty: Option<u32>,
}

pub struct MockPwm {
    state: Arc<Mutex<MockState>>,
}

/// The test's view of a [`MockPwm`] after it has been moved into a channel.
#[derive(Clone)]
pub struct Probe {
    state: Arc<Mutex<MockState>>,
}

impl Probe {
    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }
}

pub fn mock() -> (MockPwm, Probe) {
    let state = Arc::new(Mutex::new(MockState::default()));
    (
        MockPwm {
            state: Arc::clone(&state),
        },
        Probe { state },
    )
}

impl MockPwm {
    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }
}

impl PwmBackend for MockPwm {
    fn configure(&mut self, period_ns: u32, duty_cycle_ns: u32) -> Result<(), BackendError> {
        let mut state = self.state();
        state.configure_calls += 1;
        if state.fail_configure {
            return Err(BackendError::Fault);
        }
        state.period_ns = period_ns;
        state.duty_cycle_ns = duty_cycle_ns;
        Ok(())
    }

    fn enable(&mut self) -> Result<(), BackendError> {
        let mut state = self.state();
        if state.fail_enable {
            return Err(BackendError::Fault);
        }
        state.enabled = true;
        Ok(())
    }

    fn disable(&mut self) -> Result<(), BackendError> {
        let mut state = self.state();
        state.disable_calls += 1;
        if state.fail_disable {
            return Err(BackendError::Fault);
        }
        state.enabled = false;
        Ok(())
    }

    fn duty_cycle_ns(&self) -> Option<u32> {
        self.state().report_duty
    }
}

impl Drop for MockPwm {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.released = true;
        }
    }
}
