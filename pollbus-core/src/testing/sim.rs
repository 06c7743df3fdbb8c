//! Software model of an I2C v1 controller with one attached slave
//!
//! Every register access first advances the model by one bus step, so the
//! engine sees flags change between polls the way it does on silicon.
//! Steps are suspended while a critical section is open: nothing happens
//! on the bus between the accesses grouped by `atomically`.
//!
//! The receive side models the DR + shift register pair, ACK/NACK decided
//! at the moment a byte is clocked in (with POS deferring the ACK bit to
//! the following byte) and a requested stop being generated after the
//! byte currently being received.

use std::collections::VecDeque;
use std::vec::Vec;

use pollbus_hal::{Access, ControllerRegisters, Cr1, Sr1, Sr2, StatusLatch};

/// Observable bus-level event, in program order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// CR1.START set
    Start,
    /// Address byte loaded into DR
    Address(u8),
    /// SR2 read
    Sr2Read,
    /// Data byte loaded into DR while transmitting
    Written(u8),
    /// Data byte taken from DR
    Read(u8),
    /// CR1.ACK changed
    Ack(bool),
    /// CR1.POS changed
    Pos(bool),
    /// CR1.STOP set, with CR1.ACK at that moment
    StopRequested { ack: bool },
    /// Stop condition put on the bus, CR1.STOP cleared
    StopGenerated,
    EnterCritical,
    ExitCritical,
}

/// Protocol errors the model detected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// A stop followed a byte the master acknowledged
    AckedBeforeStop,
    /// DR read with nothing received
    DataRegisterEmpty,
    /// DR written outside of an address or transmit phase
    UnexpectedWrite(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    /// SB set, waiting for the address byte
    Started,
    /// Address byte written, not yet acknowledged
    Addressing(u8),
    /// ADDR set, waiting for the SR2 read
    Addressed { read: bool },
    /// Address not acknowledged
    NoAck,
    Transmitting,
    Receiving,
}

pub struct SimController {
    cr1: Cr1,
    flags: Sr1,
    latch: StatusLatch,
    phase: Phase,
    dr: Option<u8>,
    shift: Option<u8>,
    tx_shifting: bool,
    nacked: bool,
    pos_nack_armed: bool,
    in_critical: bool,
    accesses: usize,

    address: u8,
    responsive: bool,
    echo: bool,
    payload: Vec<u8>,
    response: VecDeque<u8>,
    fixed_response: Vec<u8>,

    events: Vec<Event>,
    violations: Vec<Violation>,
}

impl SimController {
    /// Enabled controller with an echoing slave at `address`
    ///
    /// A read returns the payload of the most recent write, then 0xFF.
    pub fn new(address: u8) -> Self {
        Self {
            cr1: Cr1::PE | Cr1::ACK,
            flags: Sr1::empty(),
            latch: StatusLatch::new(),
            phase: Phase::Idle,
            dr: None,
            shift: None,
            tx_shifting: false,
            nacked: false,
            pos_nack_armed: false,
            in_critical: false,
            accesses: 0,
            address,
            responsive: true,
            echo: true,
            payload: Vec::new(),
            response: VecDeque::new(),
            fixed_response: Vec::new(),
            events: Vec::new(),
            violations: Vec::new(),
        }
    }

    /// Slave that never acknowledges its address
    pub fn unresponsive(address: u8) -> Self {
        Self {
            responsive: false,
            ..Self::new(address)
        }
    }

    /// Answer every read with `bytes` (then 0xFF) instead of echoing
    pub fn responding_with(mut self, bytes: &[u8]) -> Self {
        self.echo = false;
        self.fixed_response = bytes.to_vec();
        self
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Register accesses made so far
    pub fn accesses(&self) -> usize {
        self.accesses
    }

    /// Payload of the most recent write transaction
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// CR1 without advancing the model
    pub fn peek_cr1(&self) -> Cr1 {
        self.cr1
    }

    pub fn count(&self, event: Event) -> usize {
        self.events.iter().filter(|e| **e == event).count()
    }

    fn status(&self) -> Sr1 {
        let mut status = self.flags;
        if self.dr.is_some() {
            status = status | Sr1::RXNE;
        }
        if self.dr.is_some() && self.shift.is_some() {
            status = status | Sr1::BTF;
        }
        if self.phase == Phase::Transmitting && !self.tx_shifting {
            status = status | Sr1::TXE;
        }
        status
    }

    fn access(&mut self) {
        self.accesses += 1;
        if !self.in_critical {
            self.step();
        }
    }

    fn step(&mut self) {
        let stop = self.cr1.contains(Cr1::STOP);
        match self.phase {
            Phase::Idle if self.cr1.contains(Cr1::START) => {
                self.cr1 = self.cr1.difference(Cr1::START);
                self.flags = self.flags | Sr1::SB;
                self.phase = Phase::Started;
            }
            Phase::Addressing(byte) => {
                if self.responsive && byte >> 1 == self.address {
                    self.flags = self.flags | Sr1::ADDR;
                    let read = byte & 1 == 1;
                    if read {
                        self.response = if self.echo {
                            self.payload.iter().copied().collect()
                        } else {
                            self.fixed_response.iter().copied().collect()
                        };
                    } else {
                        self.payload.clear();
                    }
                    self.phase = Phase::Addressed { read };
                } else {
                    self.flags = self.flags | Sr1::AF;
                    self.phase = Phase::NoAck;
                }
            }
            Phase::Transmitting if self.tx_shifting => {
                self.tx_shifting = false;
                self.flags = self.flags | Sr1::BTF;
            }
            Phase::Receiving if self.shift.is_none() && !self.nacked => self.clock_in(),
            Phase::Receiving if self.nacked && stop => self.generate_stop(),
            Phase::Receiving => {}
            _ if stop => self.generate_stop(),
            _ => {}
        }
    }

    fn clock_in(&mut self) {
        let byte = self.response.pop_front().unwrap_or(0xFF);
        let ack = if self.cr1.contains(Cr1::POS) {
            let ack = !self.pos_nack_armed;
            if !self.cr1.contains(Cr1::ACK) {
                self.pos_nack_armed = true;
            }
            ack
        } else {
            self.cr1.contains(Cr1::ACK)
        };

        if self.dr.is_none() {
            self.dr = Some(byte);
        } else {
            self.shift = Some(byte);
        }

        if !ack {
            self.nacked = true;
        }
        if self.cr1.contains(Cr1::STOP) {
            if ack {
                self.violations.push(Violation::AckedBeforeStop);
            }
            self.generate_stop();
        }
    }

    fn generate_stop(&mut self) {
        self.cr1 = self.cr1.difference(Cr1::STOP);
        self.flags = Sr1::empty();
        self.phase = Phase::Idle;
        self.tx_shifting = false;
        self.nacked = false;
        self.pos_nack_armed = false;
        self.events.push(Event::StopGenerated);
    }
}

impl ControllerRegisters for SimController {
    fn cr1(&mut self) -> Cr1 {
        self.access();
        self.cr1
    }

    fn write_cr1(&mut self, value: Cr1) {
        self.access();
        let old = self.cr1;
        if value.contains(Cr1::START) && !old.contains(Cr1::START) {
            self.events.push(Event::Start);
        }
        if value.contains(Cr1::ACK) != old.contains(Cr1::ACK) {
            self.events.push(Event::Ack(value.contains(Cr1::ACK)));
        }
        if value.contains(Cr1::POS) != old.contains(Cr1::POS) {
            self.events.push(Event::Pos(value.contains(Cr1::POS)));
        }
        if value.contains(Cr1::STOP) && !old.contains(Cr1::STOP) {
            self.events.push(Event::StopRequested {
                ack: value.contains(Cr1::ACK),
            });
        }
        self.cr1 = value;
    }

    fn sr1(&mut self) -> Sr1 {
        self.access();
        let status = self.status();
        let (latch, _) = self.latch.observe(status, Access::ReadSr1);
        self.latch = latch;
        status
    }

    fn sr2(&mut self) -> Sr2 {
        self.access();
        self.events.push(Event::Sr2Read);
        let (latch, cleared) = self.latch.observe(self.status(), Access::ReadSr2);
        self.latch = latch;
        if cleared.contains(Sr1::ADDR) {
            self.flags = self.flags.difference(Sr1::ADDR);
            if let Phase::Addressed { read } = self.phase {
                self.phase = if read {
                    Phase::Receiving
                } else {
                    Phase::Transmitting
                };
            }
        }

        let mut sr2 = Sr2::empty();
        if self.phase != Phase::Idle {
            sr2 = sr2 | Sr2::MSL | Sr2::BUSY;
        }
        if self.phase == Phase::Transmitting {
            sr2 = sr2 | Sr2::TRA;
        }
        sr2
    }

    fn read_dr(&mut self) -> u8 {
        self.access();
        let (latch, cleared) = self.latch.observe(self.status(), Access::ReadDr);
        self.latch = latch;
        self.flags = self.flags.difference(cleared);
        match self.dr.take() {
            Some(byte) => {
                self.dr = self.shift.take();
                self.events.push(Event::Read(byte));
                byte
            }
            None => {
                self.violations.push(Violation::DataRegisterEmpty);
                0
            }
        }
    }

    fn write_dr(&mut self, byte: u8) {
        self.access();
        let (latch, cleared) = self.latch.observe(self.status(), Access::WriteDr);
        self.latch = latch;
        self.flags = self.flags.difference(cleared);
        match self.phase {
            Phase::Started if cleared.contains(Sr1::SB) => {
                self.events.push(Event::Address(byte));
                self.phase = Phase::Addressing(byte);
            }
            Phase::Transmitting => {
                self.events.push(Event::Written(byte));
                self.payload.push(byte);
                self.tx_shifting = true;
            }
            _ => self.violations.push(Violation::UnexpectedWrite(byte)),
        }
    }

    fn atomically<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T
    where
        Self: Sized,
    {
        self.events.push(Event::EnterCritical);
        self.in_critical = true;
        let result = critical_section::with(|_| f(self));
        self.in_critical = false;
        self.events.push(Event::ExitCritical);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_sets_sb_on_next_access() {
        let mut sim = SimController::new(0x68);
        sim.write_cr1(Cr1::PE | Cr1::ACK | Cr1::START);
        assert!(sim.peek_cr1().contains(Cr1::START));

        let sr1 = sim.sr1();
        assert!(sr1.contains(Sr1::SB));
        assert!(!sim.peek_cr1().contains(Cr1::START));
    }

    #[test]
    fn test_address_byte_needs_sb_cleared_by_sr1_read() {
        let mut sim = SimController::new(0x68);
        sim.write_cr1(Cr1::PE | Cr1::ACK | Cr1::START);
        sim.cr1(); // start generated, SB not yet observed
        sim.write_dr(0xD0);
        assert_eq!(sim.violations(), &[Violation::UnexpectedWrite(0xD0)]);
    }

    #[test]
    fn test_wrong_address_sets_af() {
        let mut sim = SimController::new(0x68);
        sim.write_cr1(Cr1::PE | Cr1::ACK | Cr1::START);
        assert!(sim.sr1().contains(Sr1::SB));
        sim.write_dr(0x50 << 1);
        let sr1 = sim.sr1();
        assert!(sr1.contains(Sr1::AF));
        assert!(!sr1.contains(Sr1::ADDR));
    }
}
