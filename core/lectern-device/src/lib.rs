//! Device identity for Lectern sessions.
//!
//! The backend binds an account to a small set of physical devices. Each
//! installation presents one stable fingerprint on every authenticated
//! request; this crate creates, persists and (on explicit request) resets it.
//!
//! # Design Principles
//!
//! - **Random, not derived**: fingerprints come from the OS CSPRNG, not from
//!   hostnames or hardware probes
//! - **Stable**: the same storage scope always yields the same fingerprint
//! - **Explicit reset only**: resetting requires a [`ResetAcknowledgement`]

mod device;
mod error;

pub use device::{DeviceIdentityManager, ResetAcknowledgement, DEVICE_ID_HEADER};
pub use error::{DeviceError, DeviceResult};
