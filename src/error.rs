//! Error and result types shared by every servo module.
//!
//! The boundary between a client and a channel speaks host error codes ([`Errno`]); everything
//! inside the crate speaks [`Error`]. [`Error::errno`] and [`Error::from_errno`] translate.

use derive_more::{Display, Error};

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors reported by channels, the registry, sessions, and clients.
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Unknown channel, malformed or out-of-range payload, unknown control code, or bad name.
    #[display("invalid argument")]
    InvalidArgument,
    /// No backend is bound to the channel yet, or the backend is not ready. Retryable.
    #[display("servo backend unavailable")]
    BackendUnavailable,
    /// The backend was bound but a call to it failed.
    #[display("servo backend I/O failure")]
    IoFailure,
    /// Unrecoverable failure while attaching a channel.
    #[display("fatal attach failure")]
    Fatal,
    /// A client operation was issued before a successful `init`.
    #[display("servo client not initialized")]
    NotInitialized,
}

/// A host error code, as returned across the file-like boundary.
///
/// Values follow the Linux numbering so a transport backed by a real character device can pass
/// its codes through unchanged.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[display("errno {_0}")]
pub struct Errno(pub i32);

impl Errno {
    /// I/O error.
    pub const EIO: Self = Self(5);
    /// Bad file descriptor (resource not open).
    pub const EBADF: Self = Self(9);
    /// Try again.
    pub const EAGAIN: Self = Self(11);
    /// No such device.
    pub const ENODEV: Self = Self(19);
    /// Invalid argument.
    pub const EINVAL: Self = Self(22);
}

impl Error {
    /// The host error code reported for this error at the boundary.
    #[must_use]
    pub const fn errno(self) -> Errno {
        match self {
            Self::InvalidArgument => Errno::EINVAL,
            Self::BackendUnavailable => Errno::EAGAIN,
            Self::IoFailure => Errno::EIO,
            Self::Fatal => Errno::ENODEV,
            Self::NotInitialized => Errno::EBADF,
        }
    }

    /// Translate a host error code back into an [`Error`].
    ///
    /// Codes without a dedicated variant are reported as [`Error::IoFailure`].
    #[must_use]
    pub const fn from_errno(errno: Errno) -> Self {
        match errno {
            Errno::EINVAL => Self::InvalidArgument,
            Errno::EAGAIN => Self::BackendUnavailable,
            Errno::ENODEV => Self::Fatal,
            Errno::EBADF => Self::NotInitialized,
            _ => Self::IoFailure,
        }
    }
}

impl From<Error> for Errno {
    fn from(error: Error) -> Self {
        error.errno()
    }
}

impl From<Errno> for Error {
    fn from(errno: Errno) -> Self {
        Self::from_errno(errno)
    }
}
