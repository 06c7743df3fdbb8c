//! Transaction engine
//!
//! Sequences the register primitives into complete start…stop transfers.
//! The controller reports received bytes through a data register backed by
//! a shift register, and the ACK bit is sampled as each byte is clocked in.
//! The last one to three bytes of a read therefore need ACK, POS and STOP
//! programmed before they arrive, which is why reads take one of three
//! paths depending on length:
//!
//! - 1 byte: NACK and STOP are programmed while ADDR is cleared
//! - 2 bytes: POS makes the NACK apply to the second byte; STOP is set once
//!   both bytes sit in DR and the shift register
//! - N≥3 bytes: with three bytes left, the engine waits for DR and the
//!   shift register to fill, clears ACK, then reads N-2, sets STOP and
//!   reads N-1 without interruption. Byte N is clocked in with NACK.
//!
//! Every path leaves CR1.ACK set.

use pollbus_hal::{ControllerRegisters, Direction, SlaveAddress};

use crate::bus::Bus;
use crate::primitives::Primitives;
use crate::wait::{Condition, WaitPolicy};

impl<R: ControllerRegisters, P: WaitPolicy> Bus<R, P> {
    pub(crate) fn write_bytes(&mut self, address: SlaveAddress, data: &[u8]) -> Result<(), P::Error> {
        let Some((first, rest)) = data.split_first() else {
            return Ok(());
        };

        self.regs.assert_start();
        self.wait_for(Condition::StartBit)?;
        self.regs.send_address_byte(address, Direction::Write);
        self.wait_for(Condition::AddressMatched)?;
        self.regs.clear_address_matched();

        self.regs.send_data_byte(*first);
        for &byte in rest {
            self.wait_for(Condition::ByteTransferFinished)?;
            self.regs.send_data_byte(byte);
        }

        self.wait_for(Condition::ByteTransferFinished)?;
        self.assert_stop()
    }

    pub(crate) fn read_bytes(&mut self, address: SlaveAddress, buf: &mut [u8]) -> Result<(), P::Error> {
        if buf.is_empty() {
            return Ok(());
        }

        self.regs.set_acknowledge(true);
        match buf {
            [byte] => self.read_one(address, byte),
            [first, second] => self.read_two(address, first, second),
            _ => self.read_many(address, buf),
        }
    }

    /// Start and address phase of a read, up to ADDR being set
    fn address_for_read(&mut self, address: SlaveAddress) -> Result<(), P::Error> {
        self.regs.assert_start();
        self.wait_for(Condition::StartBit)?;
        self.regs.send_address_byte(address, Direction::Read);
        self.wait_for(Condition::AddressMatched)
    }

    fn read_one(&mut self, address: SlaveAddress, byte: &mut u8) -> Result<(), P::Error> {
        self.address_for_read(address)?;

        self.regs.atomically(|regs| {
            regs.set_acknowledge(false);
            regs.clear_address_matched();
            regs.request_stop();
        });

        self.wait_for(Condition::ReceiveNotEmpty)?;
        *byte = self.regs.receive_data_byte();

        self.wait_for(Condition::StopCleared)?;
        self.regs.set_acknowledge(true);
        Ok(())
    }

    fn read_two(&mut self, address: SlaveAddress, first: &mut u8, second: &mut u8) -> Result<(), P::Error> {
        self.regs.set_paired_byte(true);
        self.address_for_read(address)?;

        self.regs.atomically(|regs| {
            regs.clear_address_matched();
            regs.set_acknowledge(false);
        });

        // Byte 1 in DR, byte 2 in the shift register
        self.wait_for(Condition::ByteTransferFinished)?;
        *first = self.regs.atomically(|regs| {
            regs.request_stop();
            regs.receive_data_byte()
        });
        *second = self.regs.receive_data_byte();

        self.wait_for(Condition::StopCleared)?;
        self.regs.set_paired_byte(false);
        self.regs.set_acknowledge(true);
        Ok(())
    }

    fn read_many(&mut self, address: SlaveAddress, buf: &mut [u8]) -> Result<(), P::Error> {
        self.address_for_read(address)?;
        self.regs.clear_address_matched();

        let (head, tail) = buf.split_at_mut(buf.len() - 3);
        for byte in head {
            self.wait_for(Condition::ByteTransferFinished)?;
            *byte = self.regs.receive_data_byte();
        }

        // N-2 in DR, N-1 in the shift register
        self.wait_for(Condition::ByteTransferFinished)?;
        self.regs.set_acknowledge(false);
        let (n2, n1) = self.regs.atomically(|regs| {
            let n2 = regs.receive_data_byte();
            regs.request_stop();
            (n2, regs.receive_data_byte())
        });
        tail[0] = n2;
        tail[1] = n1;

        self.wait_for(Condition::ReceiveNotEmpty)?;
        tail[2] = self.regs.receive_data_byte();

        self.wait_for(Condition::StopCleared)?;
        self.regs.set_acknowledge(true);
        Ok(())
    }
}
