//! Peripheral drivers
//!
//! Device drivers built on [`pollbus_core::Session`], generic over any
//! [`pollbus_hal::I2cBus`]:
//!
//! - Sensors (MPU-9250 accelerometer)

#![no_std]
#![deny(unsafe_code)]

pub mod sensor;
