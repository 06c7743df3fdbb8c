//! Polled I2C master transaction engine
//!
//! Board-agnostic bus logic on top of the `pollbus-hal` register model:
//!
//! - Register-level primitives (start, stop, address, data, ACK/POS)
//! - Transaction engine for write-N and the 1, 2 and N≥3 byte read paths
//! - Pluggable wait policies (unbounded spin, bounded spin)
//! - Peripheral session bound to one slave address
//! - Critical-section shared bus for multiple sessions
//!
//! The engine never allocates and never touches global state; the register
//! block is an owned handle passed in at construction.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
#[macro_use]
extern crate std;

pub mod bus;
mod engine;
pub mod primitives;
pub mod session;
pub mod shared;
pub mod wait;

#[cfg(test)]
pub(crate) mod testing;

pub use bus::{Bus, BusStatus};
pub use session::{Session, SessionError};
pub use shared::{SharedBus, SharedDevice, SharedError};
pub use wait::{BoundedSpin, Condition, Spin, Timeout, WaitPolicy};
