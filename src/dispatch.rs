//! The file-like control surface for servo channels.
//!
//! A [`Session`] is one open handle on one channel index. It serves the textual protocol:
//!
//! - **read**: `"<angle>\n"`, or `"-1\n"` while the channel is disabled. A read at a nonzero
//!   offset returns no bytes; [`rewind`](ServoFile::rewind) resets the offset.
//! - **write**: a decimal angle of at most [`MAX_WRITE_LEN`] bytes, optionally followed by a
//!   newline, in `0..=max_degrees`.
//! - **control**: [`ControlCode::Enable`] or [`ControlCode::Disable`].
//!
//! The [`ServoFile`] and [`Transport`] traits are the seam between a client and whatever carries
//! these operations. [`LocalTransport`] carries them in-process, straight into a
//! [`ChannelRegistry`].

use core::fmt::Write as _;

use heapless::String;

use crate::backend::PwmBackend;
use crate::error::Errno;
use crate::fmt::{debug, trace, warn};
use crate::registry::ChannelRegistry;
use crate::{Error, Result};

/// Longest accepted write payload in bytes (a terminator is not counted).
pub const MAX_WRITE_LEN: usize = 15;

// Room for "-2147483648\n".
const READ_BUFFER_LEN: usize = 12;

const IOCTL_MAGIC: u32 = 0x16;

/// Control operations, numbered like `_IO(0x16, nr)` ioctl requests.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u32)]
pub enum ControlCode {
    /// Start driving the output.
    Enable = IOCTL_MAGIC << 8,
    /// Stop driving the output.
    Disable = (IOCTL_MAGIC << 8) | 1,
}

impl ControlCode {
    /// The raw request number.
    #[must_use]
    pub const fn code(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for ControlCode {
    type Error = Error;

    fn try_from(code: u32) -> Result<Self> {
        match code {
            code if code == Self::Enable.code() => Ok(Self::Enable),
            code if code == Self::Disable.code() => Ok(Self::Disable),
            _ => Err(Error::InvalidArgument),
        }
    }
}

/// Operations on one open channel resource.
///
/// Errors are host error codes, as a real character device would report them.
pub trait ServoFile {
    /// Read the current angle as text into `buffer`, returning the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns the boundary code for the failure (see [`Error::errno`]).
    async fn read(&mut self, buffer: &mut [u8]) -> core::result::Result<usize, Errno>;

    /// Write a textual angle, returning the number of bytes consumed.
    ///
    /// # Errors
    ///
    /// Returns the boundary code for the failure (see [`Error::errno`]).
    async fn write(&mut self, bytes: &[u8]) -> core::result::Result<usize, Errno>;

    /// Issue a raw control request (see [`ControlCode`]).
    ///
    /// # Errors
    ///
    /// Returns the boundary code for the failure (see [`Error::errno`]).
    async fn control(&mut self, code: u32) -> core::result::Result<(), Errno>;

    /// Reset the read offset so the next read reports the current value again.
    fn rewind(&mut self);

    /// Release the resource.
    ///
    /// # Errors
    ///
    /// Returns the boundary code if the resource could not be released cleanly.
    fn close(self) -> core::result::Result<(), Errno>
    where
        Self: Sized;
}

/// Something that can open channel resources by name.
pub trait Transport {
    /// The open-resource type.
    type File: ServoFile;

    /// Open the resource called `name`.
    ///
    /// # Errors
    ///
    /// Returns the boundary code if the resource does not exist or cannot be opened.
    async fn open(&self, name: &str) -> core::result::Result<Self::File, Errno>;
}

/// Open a session on channel `minor` of `registry`.
///
/// Opening touches no hardware; an index that is in range but not yet attached reports
/// [`Error::BackendUnavailable`] on its first operation.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if `minor` is outside the registry.
pub fn open<B: PwmBackend, const N: usize>(
    registry: &ChannelRegistry<B, N>,
    minor: u8,
) -> Result<Session<'_, B, N>> {
    if usize::from(minor) >= registry.capacity() {
        warn!("dispatch: open of unknown channel {}", minor);
        return Err(Error::InvalidArgument);
    }
    debug!("dispatch: open channel {}", minor);
    Ok(Session {
        registry,
        minor,
        offset: 0,
    })
}

/// Parse a write payload into an angle.
///
/// Accepts an optional trailing newline and surrounding ASCII whitespace.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if the payload is longer than [`MAX_WRITE_LEN`], is not
/// UTF-8, or is not a decimal integer.
pub fn parse_angle(bytes: &[u8]) -> Result<i32> {
    if bytes.len() > MAX_WRITE_LEN {
        return Err(Error::InvalidArgument);
    }
    let text = core::str::from_utf8(bytes).map_err(|_| Error::InvalidArgument)?;
    let text = text.split('\n').next().unwrap_or_default();
    text.trim_ascii()
        .parse::<i32>()
        .map_err(|_| Error::InvalidArgument)
}

/// Format an angle the way a read reports it.
#[must_use]
pub fn format_angle(degrees: i32) -> String<READ_BUFFER_LEN> {
    let mut text = String::new();
    // An i32 and a newline always fit.
    let _ = writeln!(text, "{degrees}");
    text
}

/// One open handle on one channel.
pub struct Session<'r, B: PwmBackend, const N: usize> {
    registry: &'r ChannelRegistry<B, N>,
    minor: u8,
    offset: usize,
}

impl<B: PwmBackend, const N: usize> Session<'_, B, N> {
    /// Channel index this session is bound to.
    #[must_use]
    pub const fn minor(&self) -> u8 {
        self.minor
    }

    /// Bytes already returned by reads since the last rewind.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Serve a read (see the [module documentation](self)).
    ///
    /// # Errors
    ///
    /// Returns [`Error::BackendUnavailable`] if the channel is not attached.
    pub async fn read_angle(&mut self, buffer: &mut [u8]) -> Result<usize> {
        if self.offset > 0 {
            trace!("dispatch: channel {} read at offset {}", self.minor, self.offset);
            return Ok(0);
        }
        let degrees = self
            .registry
            .with_channel(self.minor, |channel| channel.get_angle())
            .await?;
        let text = format_angle(degrees);
        let len = text.len().min(buffer.len());
        let (Some(source), Some(target)) = (text.as_bytes().get(..len), buffer.get_mut(..len))
        else {
            return Err(Error::InvalidArgument);
        };
        target.copy_from_slice(source);
        self.offset = self.offset.saturating_add(len);
        debug!("dispatch: channel {} read {}", self.minor, degrees);
        Ok(len)
    }

    /// Serve a write (see the [module documentation](self)).
    ///
    /// An attached channel checks the angle against its own `max_degrees`; an unattached one
    /// against the registry's default timing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a malformed or out-of-range payload (the channel is
    /// not touched), [`Error::BackendUnavailable`] if the channel is not attached, and
    /// [`Error::IoFailure`] if the backend rejects the new position.
    pub async fn write_angle(&mut self, bytes: &[u8]) -> Result<usize> {
        let degrees = parse_angle(bytes).inspect_err(|_| {
            warn!("dispatch: channel {} rejected malformed write", self.minor);
        })?;
        let minor = self.minor;
        let outcome = self
            .registry
            .with_channel(minor, |channel| {
                if !channel.config().accepts_angle(degrees) {
                    warn!("dispatch: channel {} rejected angle {}", minor, degrees);
                    return Err(Error::InvalidArgument);
                }
                channel.set_angle(degrees)
            })
            .await;
        match outcome {
            Ok(committed) => committed?,
            Err(Error::BackendUnavailable) if !self.registry.config().accepts_angle(degrees) => {
                warn!("dispatch: channel {} rejected angle {}", minor, degrees);
                return Err(Error::InvalidArgument);
            }
            Err(err) => return Err(err),
        }
        Ok(bytes.len())
    }

    /// Serve a control request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an unknown code, [`Error::BackendUnavailable`] if
    /// the channel is not attached, and [`Error::IoFailure`] if the backend fails.
    pub async fn apply_control(&mut self, code: u32) -> Result<()> {
        let command = ControlCode::try_from(code).inspect_err(|_| {
            warn!("dispatch: channel {} unknown control {=u32:#x}", self.minor, code);
        })?;
        self.registry
            .with_channel(self.minor, |channel| match command {
                ControlCode::Enable => channel.enable(),
                ControlCode::Disable => channel.disable(),
            })
            .await?
    }
}

impl<B: PwmBackend, const N: usize> ServoFile for Session<'_, B, N> {
    async fn read(&mut self, buffer: &mut [u8]) -> core::result::Result<usize, Errno> {
        Ok(self.read_angle(buffer).await?)
    }

    async fn write(&mut self, bytes: &[u8]) -> core::result::Result<usize, Errno> {
        Ok(self.write_angle(bytes).await?)
    }

    async fn control(&mut self, code: u32) -> core::result::Result<(), Errno> {
        Ok(self.apply_control(code).await?)
    }

    fn rewind(&mut self) {
        self.offset = 0;
    }

    fn close(self) -> core::result::Result<(), Errno> {
        debug!("dispatch: close channel {}", self.minor);
        Ok(())
    }
}

/// The channel index named by the trailing decimal digits of `name`.
///
/// `"/dev/servo1"` names channel 1; `"servo"` names nothing.
#[must_use]
pub fn minor_from_name(name: &str) -> Option<u8> {
    let prefix_len = name.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    name.get(prefix_len..)?.parse().ok()
}

/// An in-process [`Transport`] that opens sessions straight on a registry.
pub struct LocalTransport<'r, B: PwmBackend, const N: usize> {
    registry: &'r ChannelRegistry<B, N>,
}

impl<'r, B: PwmBackend, const N: usize> LocalTransport<'r, B, N> {
    /// Serve names from `registry`.
    #[must_use]
    pub const fn new(registry: &'r ChannelRegistry<B, N>) -> Self {
        Self { registry }
    }
}

impl<'r, B: PwmBackend, const N: usize> Transport for LocalTransport<'r, B, N> {
    type File = Session<'r, B, N>;

    async fn open(&self, name: &str) -> core::result::Result<Self::File, Errno> {
        let minor = minor_from_name(name).ok_or(Errno::EINVAL)?;
        Ok(open(self.registry, minor)?)
    }
}
