//! Bus handle
//!
//! [`Bus`] owns the controller register block and the wait policy. It is
//! the only way to reach the transaction engine, so at most one
//! transaction is in flight per controller.

use pollbus_hal::{ControllerRegisters, Cr1, I2cBus, SlaveAddress, Sr1, Sr2};

use crate::primitives::Primitives;
use crate::wait::{Condition, Spin, WaitPolicy};

/// Exclusive handle to one bus controller
pub struct Bus<R, P = Spin> {
    pub(crate) regs: R,
    policy: P,
}

impl<R: ControllerRegisters> Bus<R, Spin> {
    /// Bus that waits forever on every hardware condition
    ///
    /// The controller must already be clocked, configured and enabled.
    pub fn new(regs: R) -> Self {
        Self { regs, policy: Spin }
    }
}

impl<R: ControllerRegisters, P: WaitPolicy> Bus<R, P> {
    pub fn with_policy(regs: R, policy: P) -> Self {
        Self { regs, policy }
    }

    /// Give back the register block
    pub fn release(self) -> R {
        self.regs
    }

    /// One fresh read of the bus state
    ///
    /// SR2 is only read while ADDR is clear, since reading it after SR1
    /// reported ADDR would complete the address phase. In that case
    /// `transmit_mode` is `None`.
    pub fn status(&mut self) -> BusStatus {
        let sr1 = self.regs.sr1();
        let transmit_mode = if sr1.contains(Sr1::ADDR) {
            None
        } else {
            Some(self.regs.sr2().contains(Sr2::TRA))
        };
        BusStatus {
            start_bit: sr1.contains(Sr1::SB),
            address_matched: sr1.contains(Sr1::ADDR),
            byte_transfer_finished: sr1.contains(Sr1::BTF),
            receive_not_empty: sr1.contains(Sr1::RXNE),
            transmit_mode,
        }
    }

    /// Request a stop and block until hardware clears CR1.STOP
    pub fn assert_stop(&mut self) -> Result<(), P::Error> {
        self.regs.request_stop();
        self.wait_for(Condition::StopCleared)
    }

    pub(crate) fn wait_for(&mut self, condition: Condition) -> Result<(), P::Error> {
        let regs = &mut self.regs;
        self.policy.wait(condition, || condition.is_met(regs))
    }

    /// Leave the controller in its idle configuration after a failed wait
    fn abort(&mut self) {
        #[cfg(feature = "defmt")]
        defmt::warn!("i2c transaction aborted");

        self.regs
            .modify_cr1(|cr1| (cr1 | Cr1::STOP | Cr1::ACK).difference(Cr1::POS));
    }

    fn transact<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, P::Error>,
    ) -> Result<T, P::Error> {
        let result = f(self);
        if result.is_err() {
            self.abort();
        }
        result
    }
}

impl<R: ControllerRegisters, P: WaitPolicy> I2cBus for Bus<R, P> {
    type Error = P::Error;

    fn write(&mut self, address: SlaveAddress, data: &[u8]) -> Result<(), Self::Error> {
        self.transact(|bus| bus.write_bytes(address, data))
    }

    fn read(&mut self, address: SlaveAddress, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.transact(|bus| bus.read_bytes(address, buf))
    }
}

/// Snapshot of the controller status flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusStatus {
    pub start_bit: bool,
    pub address_matched: bool,
    pub byte_transfer_finished: bool,
    pub receive_not_empty: bool,
    /// SR2.TRA, if it could be read without side effects
    pub transmit_mode: Option<bool>,
}
