//! I2C1 register back-end for STM32F1
//!
//! Implements [`ControllerRegisters`] on the raw I2C1 register block and
//! performs the controller bring-up the engine expects before its first
//! transaction: clock enabled, peripheral reset, timing fields and own
//! address programmed, PE and ACK set.

use embassy_stm32::pac;
use embassy_stm32::pac::i2c::regs;
use embassy_stm32::peripherals::{I2C1, PB6, PB7};
use embassy_stm32::Peri;
use pollbus_hal::{ControllerConfig, ControllerRegisters, Cr1, Cr2, Sr1, Sr2, TimingError, Timings};

use crate::gpio;

/// I2C1 bit in RCC_APB1ENR and RCC_APB1RSTR
const APB1_I2C1: u32 = 1 << 21;

/// I2C1 with its default pins, driven register by register
pub struct Stm32I2c<'d> {
    _i2c: Peri<'d, I2C1>,
    _scl: Peri<'d, PB6>,
    _sda: Peri<'d, PB7>,
}

impl<'d> Stm32I2c<'d> {
    /// Claim I2C1 on PB6/PB7, configure the pins, then clock and reset the
    /// controller
    ///
    /// The controller is left disabled until [`Stm32I2c::configure`].
    pub fn new(i2c: Peri<'d, I2C1>, scl: Peri<'d, PB6>, sda: Peri<'d, PB7>) -> Self {
        gpio::configure_i2c1_pins();
        enable_and_reset();
        Self {
            _i2c: i2c,
            _scl: scl,
            _sda: sda,
        }
    }

    /// Program FREQ, CCR, TRISE and OAR1, select I2C mode and enable
    pub fn configure(&mut self, config: &ControllerConfig) -> Result<Timings, TimingError> {
        let timings = config.timings()?;
        let i2c = pac::I2C1;

        // Timing registers may only change while PE = 0
        self.modify_cr1(|cr1| cr1.difference(Cr1::PE));

        let cr2 = Cr2::from_bits(i2c.cr2().read().0 as u16).with_freq(timings.freq_mhz) | Cr2::ITERREN;
        i2c.cr2().write_value(regs::Cr2(cr2.bits() as u32));
        i2c.ccr().write_value(regs::Ccr(timings.ccr_bits() as u32));
        i2c.trise().write_value(regs::Trise(timings.trise as u32));

        self.modify_cr1(|cr1| cr1.difference(Cr1::SMBUS | Cr1::SMBTYPE));
        i2c.oar1().write_value(regs::Oar1(config.oar1_bits() as u32));

        // ACK is held clear by hardware while PE = 0
        self.modify_cr1(|cr1| cr1 | Cr1::PE);
        self.modify_cr1(|cr1| cr1 | Cr1::ACK);

        #[cfg(feature = "defmt")]
        defmt::debug!("I2C1 configured: {}", timings);

        Ok(timings)
    }
}

impl ControllerRegisters for Stm32I2c<'_> {
    fn cr1(&mut self) -> Cr1 {
        Cr1::from_bits(pac::I2C1.cr1().read().0 as u16)
    }

    fn write_cr1(&mut self, value: Cr1) {
        pac::I2C1.cr1().write_value(regs::Cr1(value.bits() as u32));
    }

    fn sr1(&mut self) -> Sr1 {
        Sr1::from_bits(pac::I2C1.sr1().read().0 as u16)
    }

    fn sr2(&mut self) -> Sr2 {
        Sr2::from_bits(pac::I2C1.sr2().read().0 as u16)
    }

    fn read_dr(&mut self) -> u8 {
        pac::I2C1.dr().read().0 as u8
    }

    fn write_dr(&mut self, byte: u8) {
        pac::I2C1.dr().write_value(regs::Dr(byte as u32));
    }
}

/// Clock I2C1 from APB1 and pulse its reset line
fn enable_and_reset() {
    let rcc = pac::RCC;
    rcc.apb1enr().modify(|w| w.0 |= APB1_I2C1);
    rcc.apb1rstr().modify(|w| w.0 |= APB1_I2C1);
    rcc.apb1rstr().modify(|w| w.0 &= !APB1_I2C1);
}
