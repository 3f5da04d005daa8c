//! The caller-side handle for one servo channel resource.
//!
//! See [`ServoClient`] for usage.

pub mod keys;

use heapless::String;

use crate::dispatch::{ControlCode, ServoFile, Transport, format_angle};
use crate::error::Errno;
use crate::fmt::{debug, warn};
use crate::{Error, Result};

pub use keys::{Action, Key};

/// Longest resource name a client keeps, in bytes.
pub const MAX_NAME_LEN: usize = 64;

// Room for "-2147483648\n" and one spare byte.
const POSITION_BUFFER_LEN: usize = 13;

/// A named handle on one servo channel resource.
///
/// [`create`](Self::create) only records the name; [`init`](Self::init) opens the resource, and
/// every other operation needs it to have succeeded. Boundary error codes come back as
/// [`Error`].
///
/// ```rust
/// use embassy_futures::block_on;
/// use servo_envoy::backend::{BackendError, PwmBackend};
/// use servo_envoy::client::ServoClient;
/// use servo_envoy::config::ServoConfig;
/// use servo_envoy::dispatch::LocalTransport;
/// use servo_envoy::registry::ChannelRegistry;
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
///     let registry = ChannelRegistry::<NullPwm, 1>::new(ServoConfig::DEFAULT);
///     registry.attach(0, |_| Ok(NullPwm)).await?;
///
///     let transport = LocalTransport::new(&registry);
///     let mut servo = ServoClient::create("/dev/servo0")?;
///     servo.init(&transport).await?;
///     servo.set_position(120).await?;
///     servo.enable().await?;
///     assert_eq!(servo.get_position().await?, 120);
///     servo.close()?;
///     Ok::<(), servo_envoy::Error>(())
/// })?;
/// # Ok::<(), servo_envoy::Error>(())
/// ```
pub struct ServoClient<F: ServoFile> {
    name: String<MAX_NAME_LEN>,
    file: Option<F>,
}

impl<F: ServoFile> ServoClient<F> {
    /// Record `name` without touching the resource.
    ///
    /// A name longer than [`MAX_NAME_LEN`] bytes is cut at the last character boundary that fits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `name` is empty.
    pub fn create(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::InvalidArgument);
        }
        let kept_len = name
            .char_indices()
            .map(|(start, ch)| start + ch.len_utf8())
            .take_while(|&end| end <= MAX_NAME_LEN)
            .last()
            .unwrap_or(0);
        let kept = name.get(..kept_len).unwrap_or_default();
        if kept.len() < name.len() {
            warn!("client: name truncated to {=str}", kept);
        }
        let name = String::try_from(kept).map_err(|()| Error::InvalidArgument)?;
        Ok(Self { name, file: None })
    }

    /// The name given to [`create`](Self::create).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether [`init`](Self::init) has succeeded (and [`close`](Self::close) has not run).
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.file.is_some()
    }

    /// Open the resource through `transport`.
    ///
    /// A failure leaves the client uninitialized; nothing retries it.
    ///
    /// # Errors
    ///
    /// Returns the translated boundary error if the resource cannot be opened.
    pub async fn init<T>(&mut self, transport: &T) -> Result<()>
    where
        T: Transport<File = F>,
    {
        match transport.open(&self.name).await {
            Ok(file) => {
                debug!("client {=str}: opened", self.name.as_str());
                self.file = Some(file);
                Ok(())
            }
            Err(errno) => {
                warn!("client {=str}: open failed: {}", self.name.as_str(), errno);
                Err(Error::from(errno))
            }
        }
    }

    fn file(&mut self) -> Result<&mut F> {
        self.file.as_mut().ok_or(Error::NotInitialized)
    }

    fn report(&self, operation: &str, errno: Errno) -> Error {
        warn!(
            "client {=str}: {=str} failed: {}",
            self.name.as_str(),
            operation,
            errno
        );
        Error::from(errno)
    }

    /// Start driving the servo.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] before a successful `init`, otherwise the translated
    /// boundary error.
    pub async fn enable(&mut self) -> Result<()> {
        let outcome = self.file()?.control(ControlCode::Enable.code()).await;
        outcome.map_err(|errno| self.report("enable", errno))
    }

    /// Stop driving the servo.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] before a successful `init`, otherwise the translated
    /// boundary error.
    pub async fn disable(&mut self) -> Result<()> {
        let outcome = self.file()?.control(ControlCode::Disable.code()).await;
        outcome.map_err(|errno| self.report("disable", errno))
    }

    /// Move the servo to `degrees`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] before a successful `init`, otherwise the translated
    /// boundary error ([`Error::InvalidArgument`] for an angle the channel does not accept).
    pub async fn set_position(&mut self, degrees: i32) -> Result<()> {
        let mut payload = format_angle(degrees);
        // Send the bare number, as a shell `echo -n` would.
        payload.pop();
        let outcome = self.file()?.write(payload.as_bytes()).await;
        outcome
            .map(|_| ())
            .map_err(|errno| self.report("set_position", errno))
    }

    /// Read the servo's current angle, or [`DISABLED_ANGLE`](crate::channel::DISABLED_ANGLE)
    /// while it is disabled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] before a successful `init`, the translated boundary
    /// error, or [`Error::IoFailure`] if the reply is not a number.
    pub async fn get_position(&mut self) -> Result<i32> {
        let mut buffer = [0_u8; POSITION_BUFFER_LEN];
        let file = self.file()?;
        file.rewind();
        let outcome = file.read(&mut buffer).await;
        let len = outcome.map_err(|errno| self.report("get_position", errno))?;
        let reply = buffer.get(..len).ok_or(Error::IoFailure)?;
        core::str::from_utf8(reply)
            .ok()
            .and_then(|text| text.trim_ascii().parse().ok())
            .ok_or(Error::IoFailure)
    }

    /// Perform a key [`Action`]. [`Action::Quit`] and [`Action::Ignore`] do nothing.
    ///
    /// # Errors
    ///
    /// Returns whatever the underlying operation returns.
    pub async fn apply(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Enable => self.enable().await,
            Action::Disable => self.disable().await,
            Action::SetPosition(degrees) => self.set_position(degrees).await,
            Action::Quit | Action::Ignore => Ok(()),
        }
    }

    /// Release the resource. Closing a client that never initialized succeeds.
    ///
    /// # Errors
    ///
    /// Returns the translated boundary error if the resource reports a failure on release.
    pub fn close(mut self) -> Result<()> {
        match self.file.take() {
            Some(file) => file.close().map_err(|errno| self.report("close", errno)),
            None => Ok(()),
        }
    }
}
