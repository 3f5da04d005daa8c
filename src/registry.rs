//! A fixed set of servo channels addressed by index.
//!
//! See [`ChannelRegistry`] for the attach/detach lifecycle.

use core::array;

use derive_more::{Display, Error};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use heapless::Vec;

use crate::backend::{BackendError, PwmBackend};
use crate::channel::Channel;
use crate::config::ServoConfig;
use crate::fmt::{info, warn};
use crate::{Error, Result};

/// Why an [`attach`](ChannelRegistry::attach) did not bind a channel.
///
/// In every case the registry is left as it was before the call.
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AttachError {
    /// The backend is not ready yet. Call `attach` again later.
    #[display("backend not ready, retry attach later")]
    RetryLater,
    /// The backend failed in a way retrying will not fix.
    #[display("attach failed")]
    Fatal,
    /// The index is outside the registry.
    #[display("channel index out of range")]
    InvalidIndex,
}

impl From<AttachError> for Error {
    fn from(err: AttachError) -> Self {
        match err {
            AttachError::RetryLater => Self::BackendUnavailable,
            AttachError::Fatal => Self::Fatal,
            AttachError::InvalidIndex => Self::InvalidArgument,
        }
    }
}

impl From<BackendError> for AttachError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::NotReady => Self::RetryLater,
            BackendError::Fault => Self::Fatal,
        }
    }
}

/// Outcome of [`ChannelRegistry::attach_missing`], one entry per index it tried.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AttachReport<const N: usize> {
    /// Indices that are now attached.
    pub attached: Vec<u8, N>,
    /// Indices whose backend was not ready.
    pub retry_later: Vec<u8, N>,
    /// Indices whose backend failed fatally.
    pub failed: Vec<u8, N>,
}

impl<const N: usize> AttachReport<N> {
    /// True when no index is waiting for a retry and none failed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.retry_later.is_empty() && self.failed.is_empty()
    }
}

type Slot<B> = Mutex<CriticalSectionRawMutex, Option<Channel<B>>>;

/// Owns up to `N` servo channels, one slot per index.
///
/// Each slot has its own lock, so work on one index never waits for another. Attach failures
/// are per index: a backend that is not ready on index 1 leaves index 0 untouched.
///
/// ```rust
/// use embassy_futures::block_on;
/// use servo_envoy::backend::{BackendError, PwmBackend};
/// use servo_envoy::config::ServoConfig;
/// use servo_envoy::registry::{AttachError, ChannelRegistry};
///
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
/// block_on(async {
///     let registry = ChannelRegistry::<NullPwm, 2>::new(ServoConfig::DEFAULT);
///     registry.attach(0, |_| Ok(NullPwm)).await?;
///     assert_eq!(
///         registry.attach(1, |_| Err(BackendError::NotReady)).await,
///         Err(AttachError::RetryLater)
///     );
///     assert!(registry.is_attached(0).await);
///     assert!(!registry.is_attached(1).await);
///     Ok::<(), AttachError>(())
/// })?;
/// # Ok::<(), AttachError>(())
/// ```
pub struct ChannelRegistry<B: PwmBackend, const N: usize> {
    slots: [Slot<B>; N],
    config: ServoConfig,
}

impl<B: PwmBackend, const N: usize> ChannelRegistry<B, N> {
    /// Create an empty registry whose channels default to `config`.
    #[must_use]
    pub fn new(config: ServoConfig) -> Self {
        Self {
            slots: array::from_fn(|_| Mutex::new(None)),
            config,
        }
    }

    /// Number of addressable indices.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Default timing for channels attached with [`attach`](Self::attach).
    #[must_use]
    pub const fn config(&self) -> &ServoConfig {
        &self.config
    }

    fn slot(&self, index: u8) -> Option<&Slot<B>> {
        self.slots.get(usize::from(index))
    }

    /// Acquire a backend for `index` with the registry's default timing.
    ///
    /// # Errors
    ///
    /// See [`attach_with_config`](Self::attach_with_config).
    pub async fn attach<F>(&self, index: u8, factory: F) -> core::result::Result<(), AttachError>
    where
        F: FnOnce(u8) -> core::result::Result<B, BackendError>,
    {
        self.attach_with_config(index, self.config, factory).await
    }

    /// Acquire a backend for `index` and bind it as a channel with `config`.
    ///
    /// The backend is acquired and configured before the slot is touched. If the slot already
    /// holds a channel, the new one replaces it and the old one is torn down.
    ///
    /// # Errors
    ///
    /// - [`AttachError::InvalidIndex`] if `index >= N`.
    /// - [`AttachError::RetryLater`] if the backend reports [`BackendError::NotReady`].
    /// - [`AttachError::Fatal`] for any other backend failure.
    pub async fn attach_with_config<F>(
        &self,
        index: u8,
        config: ServoConfig,
        factory: F,
    ) -> core::result::Result<(), AttachError>
    where
        F: FnOnce(u8) -> core::result::Result<B, BackendError>,
    {
        let slot = self.slot(index).ok_or(AttachError::InvalidIndex)?;
        let channel = factory(index)
            .and_then(|backend| Channel::bind(index, backend, config))
            .map_err(|err| {
                warn!("registry: attach {} failed: {}", index, err);
                AttachError::from(err)
            })?;

        let replaced = slot.lock().await.replace(channel);
        if replaced.is_some() {
            info!("registry: channel {} re-attached", index);
        } else {
            info!("registry: channel {} attached", index);
        }
        // `replaced` drops here, disabling the old output.
        Ok(())
    }

    /// Attach every empty slot, in index order, each independently of the others.
    ///
    /// Already attached indices are left alone, so calling this again after a
    /// [`AttachError::RetryLater`] only retries what is missing.
    pub async fn attach_missing<F>(&self, mut factory: F) -> AttachReport<N>
    where
        F: FnMut(u8) -> core::result::Result<B, BackendError>,
    {
        let mut report = AttachReport::default();
        for (position, slot) in self.slots.iter().enumerate() {
            let Ok(index) = u8::try_from(position) else {
                break;
            };
            if slot.lock().await.is_some() {
                continue;
            }
            // Each list holds at most N entries, so pushes cannot overflow.
            let _ = match self.attach(index, &mut factory).await {
                Ok(()) => report.attached.push(index),
                Err(AttachError::RetryLater) => report.retry_later.push(index),
                Err(AttachError::Fatal | AttachError::InvalidIndex) => report.failed.push(index),
            };
        }
        report
    }

    /// Tear down the channel at `index`: disable it (best effort) and release its backend.
    ///
    /// Detaching an empty or out-of-range index does nothing.
    pub async fn detach(&self, index: u8) {
        let Some(slot) = self.slot(index) else {
            return;
        };
        let removed = slot.lock().await.take();
        if removed.is_some() {
            info!("registry: channel {} detached", index);
        }
    }

    /// Detach every index.
    pub async fn detach_all(&self) {
        for (position, slot) in self.slots.iter().enumerate() {
            if slot.lock().await.take().is_some() {
                info!("registry: channel {} detached", position);
            }
        }
    }

    /// Whether `index` currently holds a channel.
    pub async fn is_attached(&self, index: u8) -> bool {
        match self.slot(index) {
            Some(slot) => slot.lock().await.is_some(),
            None => false,
        }
    }

    /// Run `f` on the channel at `index` while holding only that index's lock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `index >= N` and [`Error::BackendUnavailable`] if
    /// nothing is attached at `index`.
    pub async fn with_channel<R>(&self, index: u8, f: impl FnOnce(&mut Channel<B>) -> R) -> Result<R> {
        let slot = self.slot(index).ok_or(Error::InvalidArgument)?;
        let mut guard = slot.lock().await;
        let channel = guard.as_mut().ok_or(Error::BackendUnavailable)?;
        Ok(f(channel))
    }
}
