//! Servo channels over PWM, exposed through a small file-like control surface.
//!
//! # Glossary
//!
//! - **Channel:** one addressable PWM-driven servo output, identified by a small index
//!   (the *minor* of its resource).
//! - **Duty cycle:** how long each PWM period holds the signal active; the servo's real input.
//! - **Backend:** the [`PwmBackend`](backend::PwmBackend) that applies a period and duty cycle
//!   to hardware.
//! - **Attach/detach:** bind/unbind a channel's backend in a [`ChannelRegistry`](registry::ChannelRegistry).
//!
//! # Layers
//!
//! A [`ServoClient`](client::ServoClient) opens a resource through a
//! [`Transport`](dispatch::Transport), gets a [`ServoFile`](dispatch::ServoFile) back, and issues
//! read/write/control requests on it. A [`Session`](dispatch::Session) serves those requests
//! against a [`ChannelRegistry`](registry::ChannelRegistry), whose [`Channel`](channel::Channel)s
//! convert angles to duty cycles with [`mapping::map`].
#![cfg_attr(not(feature = "host"), no_std)]
#![allow(async_fn_in_trait, reason = "single-threaded embedded")]

// Compile-time checks: at most one board may be selected
#[cfg(all(feature = "pico1", feature = "pico2"))]
compile_error!("Cannot enable both 'pico1' and 'pico2' features simultaneously");

mod fmt;

pub mod backend;
pub mod channel;
pub mod client;
pub mod config;
pub mod dispatch;
mod error;
pub mod mapping;
pub mod registry;

// Re-export error types and result (used throughout)
pub use crate::error::{Errno, Error, Result};
