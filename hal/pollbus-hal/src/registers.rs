//! Bus controller register model
//!
//! Bit-level views of the STM32F1 "I2C v1" control and status registers,
//! the [`ControllerRegisters`] access trait the transaction engine drives,
//! and [`StatusLatch`], which captures the read-clears-flag side effects of
//! the status registers.

use core::ops::{BitAnd, BitOr, Not};

macro_rules! register_bits {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$flag_meta:meta])* $flag:ident = $bit:expr; )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        pub struct $name(u16);

        impl $name {
            $( $(#[$flag_meta])* pub const $flag: Self = Self(1 << $bit); )*

            /// No bits set
            pub const fn empty() -> Self {
                Self(0)
            }

            /// Wrap a raw register value
            pub const fn from_bits(bits: u16) -> Self {
                Self(bits)
            }

            /// Raw register value
            pub const fn bits(self) -> u16 {
                self.0
            }

            /// All bits of `other` are set
            pub const fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            /// Any bit of `other` is set
            pub const fn intersects(self, other: Self) -> bool {
                self.0 & other.0 != 0
            }

            pub const fn union(self, other: Self) -> Self {
                Self(self.0 | other.0)
            }

            pub const fn difference(self, other: Self) -> Self {
                Self(self.0 & !other.0)
            }

            /// Set or clear `flag`
            pub const fn with(self, flag: Self, set: bool) -> Self {
                if set {
                    self.union(flag)
                } else {
                    self.difference(flag)
                }
            }
        }

        impl BitOr for $name {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self {
                self.union(rhs)
            }
        }

        impl BitAnd for $name {
            type Output = Self;

            fn bitand(self, rhs: Self) -> Self {
                Self(self.0 & rhs.0)
            }
        }

        impl Not for $name {
            type Output = Self;

            fn not(self) -> Self {
                Self(!self.0)
            }
        }
    };
}

register_bits! {
    /// Control register 1
    Cr1 {
        /// Peripheral enable
        PE = 0;
        /// SMBus mode (cleared for I2C)
        SMBUS = 1;
        /// SMBus type
        SMBTYPE = 3;
        /// Start generation
        START = 8;
        /// Stop generation
        STOP = 9;
        /// Acknowledge enable
        ACK = 10;
        /// ACK/PEC position: ACK applies to the next byte in the shift register
        POS = 11;
        /// Software reset
        SWRST = 15;
    }
}

register_bits! {
    /// Control register 2
    Cr2 {
        /// Error interrupt enable
        ITERREN = 8;
        /// Event interrupt enable
        ITEVTEN = 9;
        /// Buffer interrupt enable
        ITBUFEN = 10;
    }
}

impl Cr2 {
    const FREQ_MASK: u16 = 0x3F;

    /// Peripheral clock frequency field, in MHz
    pub const fn freq(self) -> u8 {
        (self.0 & Self::FREQ_MASK) as u8
    }

    pub const fn with_freq(self, mhz: u8) -> Self {
        Self((self.0 & !Self::FREQ_MASK) | (mhz as u16 & Self::FREQ_MASK))
    }
}

register_bits! {
    /// Status register 1
    Sr1 {
        /// Start condition generated
        SB = 0;
        /// Address sent and acknowledged
        ADDR = 1;
        /// Byte transfer finished
        BTF = 2;
        /// 10-bit header sent
        ADD10 = 3;
        /// Stop detected (slave mode)
        STOPF = 4;
        /// Data register not empty
        RXNE = 6;
        /// Data register empty
        TXE = 7;
        /// Bus error
        BERR = 8;
        /// Arbitration lost
        ARLO = 9;
        /// Acknowledge failure
        AF = 10;
        /// Overrun/underrun
        OVR = 11;
    }
}

register_bits! {
    /// Status register 2
    Sr2 {
        /// Master mode
        MSL = 0;
        /// Bus busy
        BUSY = 1;
        /// Transmitter (R/W bit of the address byte was 0)
        TRA = 2;
    }
}

/// Register block of one bus controller
///
/// Every method is one hardware access. Status reads have side effects on
/// real hardware (see [`StatusLatch`]); callers must not read a status
/// register more often than the protocol requires.
pub trait ControllerRegisters {
    fn cr1(&mut self) -> Cr1;

    fn write_cr1(&mut self, value: Cr1);

    /// Read-modify-write of CR1
    fn modify_cr1(&mut self, f: impl FnOnce(Cr1) -> Cr1) {
        let value = self.cr1();
        self.write_cr1(f(value));
    }

    fn sr1(&mut self) -> Sr1;

    /// Read SR2. Clears ADDR when preceded by an SR1 read that saw it set.
    fn sr2(&mut self) -> Sr2;

    fn read_dr(&mut self) -> u8;

    fn write_dr(&mut self, byte: u8);

    /// Run `f` with interrupts masked
    ///
    /// The section is released on every exit path of `f`.
    fn atomically<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T
    where
        Self: Sized,
    {
        critical_section::with(|_| f(self))
    }
}

/// A status-affecting register access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Access {
    ReadSr1,
    ReadSr2,
    ReadDr,
    WriteDr,
}

/// Flags that are cleared by an SR1 read followed by a second access
const LATCHED: Sr1 = Sr1::SB.union(Sr1::ADDR).union(Sr1::BTF);

/// Two-step flag clearing state of SR1
///
/// SB, ADDR and BTF clear only after SR1 was read while they were set and a
/// specific second access follows:
///
/// | flag | second access          |
/// |------|------------------------|
/// | SB   | write DR               |
/// | ADDR | read SR2               |
/// | BTF  | read or write DR       |
///
/// RXNE clears on any DR read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusLatch {
    armed: Sr1,
}

impl StatusLatch {
    pub const fn new() -> Self {
        Self {
            armed: Sr1::empty(),
        }
    }

    /// Flags whose first clearing step has happened
    pub const fn armed(self) -> Sr1 {
        self.armed
    }

    /// Apply one access given the current SR1 contents
    ///
    /// Returns the next latch state and the flags the access clears.
    pub fn observe(self, status: Sr1, access: Access) -> (Self, Sr1) {
        let armed = self.armed & status;
        match access {
            Access::ReadSr1 => (
                Self {
                    armed: armed | (status & LATCHED),
                },
                Sr1::empty(),
            ),
            Access::ReadSr2 => {
                let cleared = armed & Sr1::ADDR;
                (
                    Self {
                        armed: armed.difference(cleared),
                    },
                    cleared,
                )
            }
            Access::WriteDr => {
                let cleared = armed & (Sr1::SB | Sr1::BTF);
                (
                    Self {
                        armed: armed.difference(cleared),
                    },
                    cleared,
                )
            }
            Access::ReadDr => {
                let cleared = (armed & Sr1::BTF) | (status & Sr1::RXNE);
                (
                    Self {
                        armed: armed.difference(Sr1::BTF),
                    },
                    cleared,
                )
            }
        }
    }
}
