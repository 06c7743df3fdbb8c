//! GPIO setup for I2C1
//!
//! I2C1 without remap uses PB6 (SCL) and PB7 (SDA). Both must be
//! alternate-function open-drain; the bus pull-ups are external.

use embassy_stm32::pac;

/// Port B clock enable in RCC_APB2ENR
const APB2ENR_IOPBEN: u32 = 1 << 3;

/// CRL nibble for a pin: MODE = 0b11 (output, 50 MHz), CNF = 0b11
/// (alternate-function open-drain)
const AF_OPEN_DRAIN_50MHZ: u32 = 0b1111;

pub const SCL_PIN: usize = 6;
pub const SDA_PIN: usize = 7;

/// CRL value with `pins` switched to alternate-function open-drain
pub const fn af_open_drain(crl: u32, pins: &[usize]) -> u32 {
    let mut value = crl;
    let mut i = 0;
    while i < pins.len() {
        let shift = pins[i] * 4;
        value = (value & !(0xF << shift)) | (AF_OPEN_DRAIN_50MHZ << shift);
        i += 1;
    }
    value
}

/// Clock port B and configure PB6/PB7 for I2C1
pub(crate) fn configure_i2c1_pins() {
    pac::RCC.apb2enr().modify(|w| w.0 |= APB2ENR_IOPBEN);
    // CR(0) is CRL, pins 0..=7
    pac::GPIOB
        .cr(0)
        .modify(|w| w.0 = af_open_drain(w.0, &[SCL_PIN, SDA_PIN]));
}
