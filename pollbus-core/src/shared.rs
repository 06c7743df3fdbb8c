//! Shared bus
//!
//! Lets several sessions use one controller. Each transaction runs inside
//! a critical section from start to stop, so a preempting context can never
//! interleave its own transfer with one in flight.

use core::cell::RefCell;
use core::fmt;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use pollbus_hal::{I2cBus, SlaveAddress};

/// Shared bus errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SharedError<E> {
    /// The bus was re-entered from inside a transaction
    Busy,
    /// Underlying bus error
    Bus(E),
}

impl<E: fmt::Display> fmt::Display for SharedError<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SharedError::Busy => f.write_str("bus busy"),
            SharedError::Bus(e) => write!(f, "bus error: {}", e),
        }
    }
}

/// A bus that hands out [`SharedDevice`] handles
pub struct SharedBus<B> {
    bus: Mutex<CriticalSectionRawMutex, RefCell<B>>,
}

impl<B: I2cBus> SharedBus<B> {
    pub const fn new(bus: B) -> Self {
        Self {
            bus: Mutex::new(RefCell::new(bus)),
        }
    }

    /// A handle usable wherever an [`I2cBus`] is expected
    pub fn device(&self) -> SharedDevice<'_, B> {
        SharedDevice { shared: self }
    }

    pub fn into_inner(self) -> B {
        self.bus.into_inner().into_inner()
    }

    fn transact<T>(
        &self,
        f: impl FnOnce(&mut B) -> Result<T, B::Error>,
    ) -> Result<T, SharedError<B::Error>> {
        self.bus.lock(|cell| {
            let mut bus = cell.try_borrow_mut().map_err(|_| SharedError::Busy)?;
            f(&mut *bus).map_err(SharedError::Bus)
        })
    }
}

/// One user of a [`SharedBus`]
pub struct SharedDevice<'a, B> {
    shared: &'a SharedBus<B>,
}

impl<B: I2cBus> I2cBus for SharedDevice<'_, B> {
    type Error = SharedError<B::Error>;

    fn write(&mut self, address: SlaveAddress, data: &[u8]) -> Result<(), Self::Error> {
        self.shared.transact(|bus| bus.write(address, data))
    }

    fn read(&mut self, address: SlaveAddress, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.shared.transact(|bus| bus.read(address, buf))
    }
}
