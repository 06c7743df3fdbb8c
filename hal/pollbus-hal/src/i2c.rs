//! I2C bus abstractions
//!
//! Provides the master-side bus trait, 7-bit addressing, and the bus
//! configuration used to derive controller timing fields.

use core::fmt;

/// Transfer direction, encoded in bit 0 of the address byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Master transmits (R/W bit = 0)
    Write,
    /// Master receives (R/W bit = 1)
    Read,
}

/// 7-bit slave address
///
/// The direction bit is never stored; it is applied per transfer by
/// [`SlaveAddress::byte`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SlaveAddress(u8);

impl SlaveAddress {
    /// Create an address, rejecting values that do not fit in 7 bits
    pub const fn new(address: u8) -> Option<Self> {
        if address > 0x7F {
            None
        } else {
            Some(Self(address))
        }
    }

    /// The raw 7-bit address
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Address byte as it goes on the wire for the given direction
    pub const fn byte(self, direction: Direction) -> u8 {
        match direction {
            Direction::Write => self.0 << 1,
            Direction::Read => (self.0 << 1) | 1,
        }
    }
}

impl TryFrom<u8> for SlaveAddress {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(value)
    }
}

impl From<SlaveAddress> for u8 {
    fn from(address: SlaveAddress) -> Self {
        address.0
    }
}

/// I2C bus master
///
/// Provides basic I2C read/write operations for communicating with
/// peripheral devices. Each call is one complete start…stop transaction.
pub trait I2cBus {
    /// Error type for I2C operations
    type Error;

    /// Write data to a device at the given address
    ///
    /// An empty `data` slice is a no-op.
    fn write(&mut self, address: SlaveAddress, data: &[u8]) -> Result<(), Self::Error>;

    /// Read data from a device at the given address
    ///
    /// Fills `buf` completely; an empty buffer is a no-op.
    fn read(&mut self, address: SlaveAddress, buf: &mut [u8]) -> Result<(), Self::Error>;
}

impl<T: I2cBus + ?Sized> I2cBus for &mut T {
    type Error = T::Error;

    fn write(&mut self, address: SlaveAddress, data: &[u8]) -> Result<(), Self::Error> {
        T::write(self, address, data)
    }

    fn read(&mut self, address: SlaveAddress, buf: &mut [u8]) -> Result<(), Self::Error> {
        T::read(self, address, buf)
    }
}

/// Fast-mode SCL duty cycle (low/high ratio)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Duty {
    /// t_low / t_high = 2
    #[default]
    Ratio2,
    /// t_low / t_high = 16/9
    Ratio16To9,
}

/// I2C configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct I2cConfig {
    /// Clock frequency in Hz
    pub frequency: u32,
    /// Duty cycle, only meaningful in fast mode
    pub duty: Duty,
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl I2cConfig {
    /// Standard mode (100 kHz)
    pub const STANDARD: Self = Self {
        frequency: 100_000,
        duty: Duty::Ratio2,
    };

    /// Fast mode (400 kHz)
    pub const FAST: Self = Self {
        frequency: 400_000,
        duty: Duty::Ratio2,
    };

    /// Whether this configuration selects fast mode
    pub const fn is_fast(&self) -> bool {
        self.frequency > STANDARD_MODE_MAX_HZ
    }
}

const STANDARD_MODE_MAX_HZ: u32 = 100_000;
const FAST_MODE_MAX_HZ: u32 = 400_000;

/// Peripheral clock limits of the controller's FREQ field, in MHz
const FREQ_MIN_STANDARD_MHZ: u32 = 2;
const FREQ_MIN_FAST_MHZ: u32 = 4;
const FREQ_MAX_MHZ: u32 = 36;

/// CCR is a 12-bit field
const CCR_MAX: u32 = 0xFFF;

/// Full controller configuration: bus timing plus the board-level inputs
/// needed to program it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControllerConfig {
    /// Bus speed settings
    pub bus: I2cConfig,
    /// APB1 clock feeding the controller, in Hz
    pub pclk1_hz: u32,
    /// Own 7-bit address (programmed into OAR1, unused in master mode)
    pub own_address: SlaveAddress,
}

/// Errors computing controller timing fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimingError {
    /// Bus frequency is zero or above fast mode
    UnsupportedFrequency(u32),
    /// Peripheral clock outside the range the FREQ field accepts
    PeripheralClockOutOfRange(u32),
    /// Computed CCR does not fit the 12-bit field
    ClockControlOverflow(u32),
}

impl fmt::Display for TimingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TimingError::UnsupportedFrequency(hz) => write!(f, "unsupported bus frequency {} Hz", hz),
            TimingError::PeripheralClockOutOfRange(hz) => {
                write!(f, "peripheral clock {} Hz out of range", hz)
            }
            TimingError::ClockControlOverflow(ccr) => write!(f, "CCR value {} exceeds 12 bits", ccr),
        }
    }
}

/// Register field values derived from a [`ControllerConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timings {
    /// CR2.FREQ: peripheral clock in MHz
    pub freq_mhz: u8,
    /// CCR.CCR clock divider
    pub ccr: u16,
    /// CCR.F/S
    pub fast: bool,
    /// CCR.DUTY
    pub duty: Duty,
    /// TRISE: maximum rise time in peripheral clock cycles, plus one
    pub trise: u8,
}

impl Timings {
    /// CCR register value: divider, DUTY (bit 14) and F/S (bit 15)
    pub const fn ccr_bits(&self) -> u16 {
        let mut bits = self.ccr;
        if self.fast {
            bits |= 1 << 15;
            if let Duty::Ratio16To9 = self.duty {
                bits |= 1 << 14;
            }
        }
        bits
    }
}

impl ControllerConfig {
    /// OAR1 value: 7-bit own address in bits 7:1, bit 14 kept set as the
    /// reference manual requires
    pub const fn oar1_bits(&self) -> u16 {
        ((self.own_address.get() as u16) << 1) | (1 << 14)
    }

    /// Compute FREQ, CCR and TRISE for this configuration
    ///
    /// Standard mode: `CCR = pclk1 / (2 * f)`, at least 4, and
    /// `TRISE = FREQ + 1` (1000 ns rise time).
    /// Fast mode: `CCR = pclk1 / (3 * f)` or `pclk1 / (25 * f)` depending on
    /// duty, at least 1, and `TRISE = FREQ * 300 / 1000 + 1` (300 ns).
    pub fn timings(&self) -> Result<Timings, TimingError> {
        let frequency = self.bus.frequency;
        if frequency == 0 || frequency > FAST_MODE_MAX_HZ {
            return Err(TimingError::UnsupportedFrequency(frequency));
        }

        let freq_mhz = self.pclk1_hz / 1_000_000;
        let freq_min = if self.bus.is_fast() {
            FREQ_MIN_FAST_MHZ
        } else {
            FREQ_MIN_STANDARD_MHZ
        };
        if freq_mhz < freq_min || freq_mhz > FREQ_MAX_MHZ {
            return Err(TimingError::PeripheralClockOutOfRange(self.pclk1_hz));
        }

        let (ccr, trise) = if self.bus.is_fast() {
            let divisor = match self.bus.duty {
                Duty::Ratio2 => 3,
                Duty::Ratio16To9 => 25,
            };
            let ccr = (self.pclk1_hz / (frequency * divisor)).max(1);
            (ccr, freq_mhz * 300 / 1000 + 1)
        } else {
            let ccr = (self.pclk1_hz / (frequency * 2)).max(4);
            (ccr, freq_mhz + 1)
        };

        if ccr > CCR_MAX {
            return Err(TimingError::ClockControlOverflow(ccr));
        }

        Ok(Timings {
            freq_mhz: freq_mhz as u8,
            ccr: ccr as u16,
            fast: self.bus.is_fast(),
            duty: self.bus.duty,
            trise: trise as u8,
        })
    }
}
