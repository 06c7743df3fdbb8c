//! pollbus firmware
//!
//! Blue Pill (STM32F103C8) reading an MPU-9250 accelerometer over I2C1
//! with the polled pollbus engine. No I2C interrupts or DMA are used; the
//! embassy executor only provides the timer for the poll period.

#![no_std]
#![no_main]

mod config;

use defmt::*;
use embassy_executor::Spawner;
use embassy_time::{Delay, Duration, Ticker, Timer};
use {defmt_rtt as _, panic_probe as _};

use pollbus_core::{BoundedSpin, Bus};
use pollbus_drivers::sensor::Mpu9250;
use pollbus_hal_stm32f1::Stm32I2c;

/// Main entry point
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("pollbus firmware starting...");

    let p = embassy_stm32::init(config::clock_config());
    info!("Clocks initialized");

    let mut i2c = Stm32I2c::new(p.I2C1, p.PB6, p.PB7);
    match i2c.configure(&config::controller_config()) {
        Ok(timings) => info!("I2C1 ready: {}", timings),
        Err(e) => defmt::panic!("I2C1 configuration rejected: {}", e),
    }

    let bus = Bus::with_policy(i2c, BoundedSpin::new(config::WAIT_POLLS));
    let mut imu = Mpu9250::new(bus, config::MPU_ADDRESS, config::sensor_config());

    let mut delay = Delay;
    while let Err(e) = imu.init(&mut delay) {
        warn!("MPU-9250 init failed: {}", e);
        Timer::after(Duration::from_millis(config::INIT_RETRY_MS)).await;
    }

    let mut ticker = Ticker::every(Duration::from_millis(config::POLL_PERIOD_MS));
    loop {
        match imu.read_acceleration() {
            Ok(accel) => info!(
                "accel x={} y={} z={} mg",
                accel.x_mg, accel.y_mg, accel.z_mg
            ),
            Err(e) => warn!("accelerometer read failed: {}", e),
        }
        ticker.next().await;
    }
}
