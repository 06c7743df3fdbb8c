//! STM32F1-specific HAL for the pollbus I2C driver
//!
//! This crate implements the `pollbus-hal` register model on the STM32F1
//! I2C peripheral ("I2C v1"). It supports:
//!
//! - STM32F103C8 (Blue Pill)
//!
//! # Features
//!
//! - `stm32f103c8` - Enable support for STM32F103C8T6
//! - `defmt` - Enable debug formatting support
//!
//! # Usage
//!
//! embassy-stm32 brings up clocks and hands out the peripheral singletons.
//! [`i2c::Stm32I2c`] takes ownership of I2C1 and its pins, then drives the
//! register block directly through the PAC; embassy's own I2C driver is not
//! used.

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod i2c;

pub use i2c::Stm32I2c;
