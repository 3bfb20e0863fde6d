//! Upload of a finished catalog to the device.
//!
//! The [`Loader`] turns a [`Catalog`](crate::catalog::Catalog) into the sequence of
//! [`DeviceChannel`] calls that brings the device into the state of the build.
//!
//! # Architecture
//!
//! An upload is split into an optional kernel image and the program image. Each image passes
//! through the same phases:
//!
//! 1. Erase, as far as the target settings require
//! 2. Class declarations
//! 3. Methods
//! 4. Field constants, committed to flash when the image lives there
//! 5. Strings, announced with their total payload size first
//! 6. Special type groups
//! 7. Commit and flash header
//!
//! Only the tokens missing on the device are sent: the kernel image is diffed against an
//! erased target, the program image against the kernel snapshot. An image the device
//! already holds is just activated. Any failure aborts the upload; a retry has to start
//! over from an erased target.

mod channel;
mod orchestrator;

pub use channel::{DeviceChannel, StartupFlags};
pub use orchestrator::{LoadState, Loader};
