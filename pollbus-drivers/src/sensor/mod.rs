//! Sensor drivers

pub mod mpu9250;

pub use mpu9250::{Acceleration, AccelRange, AccelSample, GyroRange, Mpu9250, Mpu9250Config, Mpu9250Error};
