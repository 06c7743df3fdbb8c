//! Register-level primitives
//!
//! Single-field operations on the bus controller. None of these wait or
//! sequence anything; ordering is the transaction engine's job.

use pollbus_hal::{ControllerRegisters, Cr1, Direction, SlaveAddress, Sr2};

/// One-access controller operations, available on every register block
pub trait Primitives: ControllerRegisters {
    /// Set CR1.START
    fn assert_start(&mut self) {
        self.modify_cr1(|cr1| cr1 | Cr1::START);
    }

    /// Set CR1.STOP without waiting for it to take effect
    fn request_stop(&mut self) {
        self.modify_cr1(|cr1| cr1 | Cr1::STOP);
    }

    /// Load the address byte for `direction` into DR
    fn send_address_byte(&mut self, address: SlaveAddress, direction: Direction) {
        self.write_dr(address.byte(direction));
    }

    fn send_data_byte(&mut self, byte: u8) {
        self.write_dr(byte);
    }

    fn receive_data_byte(&mut self) -> u8 {
        self.read_dr()
    }

    /// Set or clear CR1.ACK
    fn set_acknowledge(&mut self, enabled: bool) {
        self.modify_cr1(|cr1| cr1.with(Cr1::ACK, enabled));
    }

    /// Set or clear CR1.POS
    fn set_paired_byte(&mut self, enabled: bool) {
        self.modify_cr1(|cr1| cr1.with(Cr1::POS, enabled));
    }

    /// Clear SR1.ADDR with exactly one SR2 read
    fn clear_address_matched(&mut self) -> Sr2 {
        self.sr2()
    }
}

impl<R: ControllerRegisters> Primitives for R {}
