//! Wait policies
//!
//! Every blocking step of a transaction is a poll on one hardware
//! condition. How long to poll is decided by a [`WaitPolicy`]:
//!
//! - [`Spin`] polls forever. A slave that never answers hangs the caller;
//!   its error type is uninhabited, so a `Bus<_, Spin>` cannot fail.
//! - [`BoundedSpin`] gives up after a fixed number of polls and reports
//!   which condition was never met.

use core::convert::Infallible;
use core::fmt;

use pollbus_hal::{ControllerRegisters, Cr1, Sr1};

/// A hardware condition the engine waits for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Condition {
    /// SR1.SB: start condition generated
    StartBit,
    /// SR1.ADDR: address sent and acknowledged
    AddressMatched,
    /// SR1.BTF: byte transfer finished
    ByteTransferFinished,
    /// SR1.RXNE: a received byte is waiting in DR
    ReceiveNotEmpty,
    /// CR1.STOP cleared by hardware once the stop condition is on the bus
    StopCleared,
}

impl Condition {
    /// Poll the hardware once
    ///
    /// Each call is a fresh register read; nothing is cached.
    pub fn is_met<R: ControllerRegisters>(self, regs: &mut R) -> bool {
        match self {
            Condition::StartBit => regs.sr1().contains(Sr1::SB),
            Condition::AddressMatched => regs.sr1().contains(Sr1::ADDR),
            Condition::ByteTransferFinished => regs.sr1().contains(Sr1::BTF),
            Condition::ReceiveNotEmpty => regs.sr1().contains(Sr1::RXNE),
            Condition::StopCleared => !regs.cr1().contains(Cr1::STOP),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Condition::StartBit => "start bit",
            Condition::AddressMatched => "address matched",
            Condition::ByteTransferFinished => "byte transfer finished",
            Condition::ReceiveNotEmpty => "receive not empty",
            Condition::StopCleared => "stop cleared",
        };
        f.write_str(name)
    }
}

/// Strategy for polling a hardware condition
pub trait WaitPolicy {
    /// Error returned when the policy gives up
    type Error;

    /// Poll `ready` until it returns true or the policy gives up
    fn wait(&mut self, condition: Condition, ready: impl FnMut() -> bool) -> Result<(), Self::Error>;
}

/// Poll forever
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Spin;

impl WaitPolicy for Spin {
    type Error = Infallible;

    fn wait(&mut self, _condition: Condition, mut ready: impl FnMut() -> bool) -> Result<(), Infallible> {
        while !ready() {
            core::hint::spin_loop();
        }
        Ok(())
    }
}

/// Poll at most `polls` times per wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BoundedSpin {
    pub polls: u32,
}

impl BoundedSpin {
    pub const fn new(polls: u32) -> Self {
        Self { polls }
    }
}

impl WaitPolicy for BoundedSpin {
    type Error = Timeout;

    fn wait(&mut self, condition: Condition, mut ready: impl FnMut() -> bool) -> Result<(), Timeout> {
        for _ in 0..self.polls {
            if ready() {
                return Ok(());
            }
            core::hint::spin_loop();
        }
        Err(Timeout { condition })
    }
}

/// A bounded wait ran out of polls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timeout {
    /// The condition that was never met
    pub condition: Condition,
}

impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "timed out waiting for {}", self.condition)
    }
}
