//! Board configuration
//!
//! Fixed settings for a Blue Pill with an MPU-9250 breakout on I2C1
//! (PB6 = SCL, PB7 = SDA, AD0 low).

use embassy_stm32::rcc::{
    AHBPrescaler, APBPrescaler, Hse, HseMode, Pll, PllMul, PllPreDiv, PllSource, Sysclk,
};
use embassy_stm32::time::Hertz;
use pollbus_drivers::sensor::{AccelRange, GyroRange, Mpu9250Config};
use pollbus_hal::{ControllerConfig, I2cConfig, SlaveAddress};

/// Sensor address (AD0 low)
pub const MPU_ADDRESS: SlaveAddress = pollbus_drivers::sensor::mpu9250::DEFAULT_ADDRESS;

/// Own address programmed into OAR1; must differ from any slave on the bus
pub const OWN_ADDRESS: SlaveAddress = match SlaveAddress::new(0x10) {
    Some(address) => address,
    None => panic!("invalid own address"),
};

/// APB1 clock: 72 MHz SYSCLK / 2
pub const PCLK1_HZ: u32 = 36_000_000;

/// Polls per hardware condition before a transaction is abandoned
///
/// One byte at 100 kHz is 90 us; at 72 MHz that is well under 10k polls.
pub const WAIT_POLLS: u32 = 100_000;

/// Accelerometer poll period
pub const POLL_PERIOD_MS: u64 = 500;

/// Delay before retrying a failed sensor init
pub const INIT_RETRY_MS: u64 = 1_000;

pub const fn controller_config() -> ControllerConfig {
    ControllerConfig {
        bus: I2cConfig::STANDARD,
        pclk1_hz: PCLK1_HZ,
        own_address: OWN_ADDRESS,
    }
}

pub const fn sensor_config() -> Mpu9250Config {
    Mpu9250Config {
        accel_range: AccelRange::G16,
        gyro_range: GyroRange::Dps2000,
    }
}

/// 8 MHz HSE x 9 = 72 MHz SYSCLK, APB1 at 36 MHz
pub fn clock_config() -> embassy_stm32::Config {
    let mut config = embassy_stm32::Config::default();
    config.rcc.hse = Some(Hse {
        freq: Hertz(8_000_000),
        mode: HseMode::Oscillator,
    });
    config.rcc.pll = Some(Pll {
        src: PllSource::HSE,
        prediv: PllPreDiv::DIV1,
        mul: PllMul::MUL9,
    });
    config.rcc.sys = Sysclk::PLL1_P;
    config.rcc.ahb_pre = AHBPrescaler::DIV1;
    config.rcc.apb1_pre = APBPrescaler::DIV2;
    config.rcc.apb2_pre = APBPrescaler::DIV1;
    config
}
