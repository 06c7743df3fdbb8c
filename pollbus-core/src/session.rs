//! Peripheral session
//!
//! Binds one slave address to a bus so device drivers can talk in payloads
//! instead of transactions.

use core::fmt;

use heapless::Vec;
use pollbus_hal::{I2cBus, SlaveAddress};

/// Session errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionError<E> {
    /// Underlying bus error
    Bus(E),
    /// Requested more bytes than the output buffer holds
    Capacity { requested: usize, capacity: usize },
}

impl<E> From<E> for SessionError<E> {
    fn from(e: E) -> Self {
        SessionError::Bus(e)
    }
}

impl<E: fmt::Display> fmt::Display for SessionError<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SessionError::Bus(e) => write!(f, "bus error: {}", e),
            SessionError::Capacity {
                requested,
                capacity,
            } => write!(f, "requested {} bytes, capacity {}", requested, capacity),
        }
    }
}

/// A bus bound to a fixed slave address
pub struct Session<B> {
    bus: B,
    address: SlaveAddress,
}

impl<B: I2cBus> Session<B> {
    pub fn new(bus: B, address: SlaveAddress) -> Self {
        Self { bus, address }
    }

    pub fn address(&self) -> SlaveAddress {
        self.address
    }

    /// Write `bytes` in one transaction
    pub fn write(&mut self, bytes: &[u8]) -> Result<(), B::Error> {
        self.bus.write(self.address, bytes)
    }

    /// Fill `buf` in one transaction
    pub fn read_into(&mut self, buf: &mut [u8]) -> Result<(), B::Error> {
        self.bus.read(self.address, buf)
    }

    /// Read `count` bytes into a fixed-capacity buffer
    ///
    /// `count == 0` returns an empty buffer without touching the bus.
    pub fn read<const N: usize>(&mut self, count: usize) -> Result<Vec<u8, N>, SessionError<B::Error>> {
        let mut buf = Vec::new();
        buf.resize(count, 0).map_err(|_| SessionError::Capacity {
            requested: count,
            capacity: N,
        })?;
        self.bus.read(self.address, &mut buf)?;
        Ok(buf)
    }

    /// Give back the bus
    pub fn release(self) -> B {
        self.bus
    }
}
