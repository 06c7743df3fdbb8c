//! MPU-9250 accelerometer driver (I2C)
//!
//! The MPU-9250 is a 9-axis motion sensor (accelerometer, gyroscope and
//! an AK8963 magnetometer behind an auxiliary bus). Only the accelerometer
//! path is driven here.
//!
//! # Register access
//!
//! The bus engine has no repeated start, so a register read is two
//! transactions: a one-byte write of the register index, then a read. The
//! device keeps its internal pointer across the stop and auto-increments
//! it on burst reads.

use core::fmt;

use embedded_hal::delay::DelayNs;
use pollbus_core::Session;
use pollbus_hal::{I2cBus, SlaveAddress};

/// MPU-9250 register addresses
pub mod reg {
    /// Gyroscope full-scale select (bits 4:3)
    pub const GYRO_CONFIG: u8 = 0x1B;
    /// Accelerometer full-scale select (bits 4:3)
    pub const ACCEL_CONFIG: u8 = 0x1C;
    /// First of six accelerometer output registers (X high byte)
    pub const ACCEL_XOUT_H: u8 = 0x3B;
    pub const ACCEL_XOUT_L: u8 = 0x3C;
    pub const ACCEL_YOUT_H: u8 = 0x3D;
    pub const ACCEL_YOUT_L: u8 = 0x3E;
    pub const ACCEL_ZOUT_H: u8 = 0x3F;
    pub const ACCEL_ZOUT_L: u8 = 0x40;
    /// Power management 1 (sleep, clock source)
    pub const PWR_MGMT_1: u8 = 0x6B;
    /// Device ID
    pub const WHO_AM_I: u8 = 0x75;
}

/// AD0 pulled low
pub const DEFAULT_ADDRESS: SlaveAddress = match SlaveAddress::new(0x68) {
    Some(address) => address,
    None => panic!("invalid address"),
};

/// WHO_AM_I values of the MPU-9250 and MPU-9255
const DEVICE_IDS: [u8; 2] = [0x71, 0x73];

/// Time the device needs to leave sleep mode
const WAKE_DELAY_MS: u32 = 100;

/// Accelerometer full-scale range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccelRange {
    G2,
    G4,
    G8,
    #[default]
    G16,
}

impl AccelRange {
    /// ACCEL_CONFIG value
    pub const fn bits(self) -> u8 {
        let fs_sel = match self {
            Self::G2 => 0,
            Self::G4 => 1,
            Self::G8 => 2,
            Self::G16 => 3,
        };
        fs_sel << 3
    }

    /// Sensitivity in LSB/g
    pub const fn lsb_per_g(self) -> i32 {
        match self {
            Self::G2 => 16_384,
            Self::G4 => 8_192,
            Self::G8 => 4_096,
            Self::G16 => 2_048,
        }
    }
}

/// Gyroscope full-scale range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GyroRange {
    Dps250,
    Dps500,
    Dps1000,
    #[default]
    Dps2000,
}

impl GyroRange {
    /// GYRO_CONFIG value
    pub const fn bits(self) -> u8 {
        let fs_sel = match self {
            Self::Dps250 => 0,
            Self::Dps500 => 1,
            Self::Dps1000 => 2,
            Self::Dps2000 => 3,
        };
        fs_sel << 3
    }
}

/// MPU-9250 driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Mpu9250Config {
    pub accel_range: AccelRange,
    pub gyro_range: GyroRange,
}

/// MPU-9250 errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mpu9250Error<E> {
    /// Bus error
    Bus(E),
    /// WHO_AM_I returned an unexpected value
    WrongDevice(u8),
}

impl<E> From<E> for Mpu9250Error<E> {
    fn from(e: E) -> Self {
        Mpu9250Error::Bus(e)
    }
}

impl<E: fmt::Display> fmt::Display for Mpu9250Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Mpu9250Error::Bus(e) => write!(f, "bus error: {}", e),
            Mpu9250Error::WrongDevice(id) => write!(f, "unexpected WHO_AM_I 0x{:02x}", id),
        }
    }
}

/// Raw accelerometer counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AccelSample {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl AccelSample {
    /// Decode ACCEL_XOUT_H..ACCEL_ZOUT_L (big-endian pairs)
    pub const fn from_be_bytes(bytes: [u8; 6]) -> Self {
        Self {
            x: i16::from_be_bytes([bytes[0], bytes[1]]),
            y: i16::from_be_bytes([bytes[2], bytes[3]]),
            z: i16::from_be_bytes([bytes[4], bytes[5]]),
        }
    }

    /// Convert to milli-g for the given range
    pub const fn to_milli_g(self, range: AccelRange) -> Acceleration {
        let lsb = range.lsb_per_g();
        Acceleration {
            x_mg: self.x as i32 * 1000 / lsb,
            y_mg: self.y as i32 * 1000 / lsb,
            z_mg: self.z as i32 * 1000 / lsb,
        }
    }
}

/// Acceleration in milli-g
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Acceleration {
    pub x_mg: i32,
    pub y_mg: i32,
    pub z_mg: i32,
}

/// MPU-9250 driver
pub struct Mpu9250<B> {
    session: Session<B>,
    config: Mpu9250Config,
}

impl<B: I2cBus> Mpu9250<B> {
    pub fn new(bus: B, address: SlaveAddress, config: Mpu9250Config) -> Self {
        Self {
            session: Session::new(bus, address),
            config,
        }
    }

    pub fn config(&self) -> &Mpu9250Config {
        &self.config
    }

    /// Wake the device, check its identity and program the full-scale ranges
    pub fn init(&mut self, delay: &mut impl DelayNs) -> Result<(), Mpu9250Error<B::Error>> {
        // Clear SLEEP, internal oscillator
        self.write_register(reg::PWR_MGMT_1, 0x00)?;
        delay.delay_ms(WAKE_DELAY_MS);

        let id = self.who_am_i()?;
        if !DEVICE_IDS.contains(&id) {
            return Err(Mpu9250Error::WrongDevice(id));
        }

        self.write_register(reg::GYRO_CONFIG, self.config.gyro_range.bits())?;
        self.write_register(reg::ACCEL_CONFIG, self.config.accel_range.bits())?;

        #[cfg(feature = "defmt")]
        defmt::info!("MPU-9250 ready (id {=u8:#x}, {})", id, self.config.accel_range);

        Ok(())
    }

    pub fn who_am_i(&mut self) -> Result<u8, B::Error> {
        self.read_register(reg::WHO_AM_I)
    }

    /// Read the accelerometer one register at a time
    ///
    /// Twelve transactions; the axes may come from different samples.
    pub fn read_accel_raw(&mut self) -> Result<AccelSample, B::Error> {
        let mut bytes = [0u8; 6];
        for (offset, byte) in bytes.iter_mut().enumerate() {
            *byte = self.read_register(reg::ACCEL_XOUT_H + offset as u8)?;
        }
        Ok(AccelSample::from_be_bytes(bytes))
    }

    /// Read all six accelerometer registers in one burst
    pub fn read_accel_burst(&mut self) -> Result<AccelSample, B::Error> {
        let mut bytes = [0u8; 6];
        self.session.write(&[reg::ACCEL_XOUT_H])?;
        self.session.read_into(&mut bytes)?;
        Ok(AccelSample::from_be_bytes(bytes))
    }

    /// Burst read converted to milli-g
    pub fn read_acceleration(&mut self) -> Result<Acceleration, B::Error> {
        let sample = self.read_accel_burst()?;
        Ok(sample.to_milli_g(self.config.accel_range))
    }

    pub fn release(self) -> B {
        self.session.release()
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), B::Error> {
        self.session.write(&[register, value])
    }

    fn read_register(&mut self, register: u8) -> Result<u8, B::Error> {
        let mut value = [0u8; 1];
        self.session.write(&[register])?;
        self.session.read_into(&mut value)?;
        Ok(value[0])
    }
}
