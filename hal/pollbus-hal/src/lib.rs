//! pollbus Hardware Abstraction Layer
//!
//! This crate defines the hardware-facing vocabulary shared by the
//! transaction engine and the chip-specific register back-ends:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (pollbus-firmware, etc.)   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  pollbus-core (engine + session)        │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  pollbus-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ pollbus-hal-  │       │ software test │
//! │   stm32f1     │       │    double     │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`i2c::I2cBus`] - Address-per-call I2C master operations
//! - [`registers::ControllerRegisters`] - Raw register block of an
//!   STM32F1-class ("I2C v1") bus controller

#![no_std]
#![deny(unsafe_code)]

pub mod i2c;
pub mod registers;

// Re-export key types at crate root for convenience
pub use i2c::{
    ControllerConfig, Direction, Duty, I2cBus, I2cConfig, SlaveAddress, TimingError, Timings,
};
pub use registers::{Access, ControllerRegisters, Cr1, Cr2, Sr1, Sr2, StatusLatch};
