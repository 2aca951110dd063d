//! # TMP101 digital temperature sensor
//!
//! Minimal blocking driver for the TI TMP101 which works on top of any
//! [embedded_hal::i2c::I2c] implementation.
//!
//! The temperature register is a 12-bit two's complement value in units of 1/16 degree
//! Celsius, transmitted big endian and left aligned:
//!
//! ```text
//!   byte 0: T11 T10 T9 T8 T7 T6 T5 T4   (signed integer degrees)
//!   byte 1: T3  T2  T1 T0 0  0  0  0    (sixteenths of a degree)
//! ```
//!
//! At lower resolutions, the least significant temperature bits read as zero.
use embedded_hal::i2c::I2c;

/// Register selected by the pointer register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Register {
    Temperature = 0b00,
    Configuration = 0b01,
    TLow = 0b10,
    THigh = 0b11,
}

/// 7-bit bus address of a TMP101.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorAddress(u8);

impl SensorAddress {
    /// ADD0 pin tied to ground.
    pub const ADD0_GND: Self = Self(0b100_1000);
    /// ADD0 pin left floating.
    pub const ADD0_FLOAT: Self = Self(0b100_1001);
    /// ADD0 pin tied to VDD.
    pub const ADD0_VDD: Self = Self(0b100_1010);

    /// Returns [None] if the address does not fit into 7 bits.
    pub const fn new(addr: u8) -> Option<Self> {
        if addr > 0x7F {
            return None;
        }
        Some(Self(addr))
    }

    #[inline]
    pub const fn raw(&self) -> u8 {
        self.0
    }
}

/// Converter resolution, encoded as `0b0RR0_0000` for the configuration register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Resolution {
    Bits9 = 0b0000_0000,
    Bits10 = 0b0010_0000,
    Bits11 = 0b0100_0000,
    Bits12 = 0b0110_0000,
}

impl Resolution {
    #[inline]
    pub const fn config_bits(&self) -> u8 {
        *self as u8
    }

    pub const fn bits(&self) -> u8 {
        match self {
            Resolution::Bits9 => 9,
            Resolution::Bits10 => 10,
            Resolution::Bits11 => 11,
            Resolution::Bits12 => 12,
        }
    }

    /// Typical conversion time in milliseconds according to the datasheet.
    pub const fn conversion_time_ms(&self) -> u32 {
        match self {
            Resolution::Bits9 => 40,
            Resolution::Bits10 => 80,
            Resolution::Bits11 => 160,
            Resolution::Bits12 => 320,
        }
    }

    /// Weight of the least significant bit in degrees Celsius.
    pub fn lsb_celsius(&self) -> f32 {
        1.0 / (1u32 << (self.bits() - 8)) as f32
    }
}

/// Step of the sensor protocol which failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStep {
    SetResolution,
    ResetPointer,
    Receive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("TMP101 at {address:#04x}: transaction failed at {step:?}")]
pub struct TransactionFault {
    pub address: u8,
    pub step: TransactionStep,
}

/// One decoded temperature reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemperatureSample {
    sensor: SensorAddress,
    integer: i8,
    sixteenths: u8,
}

impl TemperatureSample {
    /// Decode the two raw bytes of the temperature register.
    ///
    /// The first byte is sign extended, the upper nibble of the second byte is the positive
    /// fractional offset. A reading of -10.5 degrees is therefore represented as -11 + 0.5.
    pub const fn from_raw(sensor: SensorAddress, raw: [u8; 2]) -> Self {
        Self {
            sensor,
            integer: raw[0] as i8,
            sixteenths: raw[1] >> 4,
        }
    }

    #[inline]
    pub const fn sensor(&self) -> SensorAddress {
        self.sensor
    }

    /// Signed integer degrees, rounded towards negative infinity.
    #[inline]
    pub const fn integer(&self) -> i8 {
        self.integer
    }

    /// Fractional part in units of 1/16 degree, in the range [0, 15].
    #[inline]
    pub const fn sixteenths(&self) -> u8 {
        self.sixteenths
    }

    /// Fractional part in degrees, in the range [0, 0.9375].
    #[inline]
    pub fn fraction(&self) -> f32 {
        self.sixteenths as f32 / 16.0
    }

    pub fn celsius(&self) -> f32 {
        self.integer as f32 + self.fraction()
    }
}

impl core::fmt::Display for TemperatureSample {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:8.4}", self.celsius())
    }
}

/// A TMP101 at a given address with the resolution it should be configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tmp101 {
    address: SensorAddress,
    resolution: Resolution,
}

impl Tmp101 {
    pub const fn new(address: SensorAddress, resolution: Resolution) -> Self {
        Self {
            address,
            resolution,
        }
    }

    #[inline]
    pub const fn address(&self) -> SensorAddress {
        self.address
    }

    #[inline]
    pub const fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Write the resolution to the configuration register and move the pointer back to the
    /// temperature register.
    ///
    /// All other configuration fields are written as zero: continuous conversion, comparator
    /// mode, active low alert and a fault queue of one. Configuring twice with the same
    /// resolution produces the same register contents.
    pub fn configure<I: I2c>(&self, i2c: &mut I) -> Result<(), TransactionFault> {
        i2c.write(
            self.address.raw(),
            &[Register::Configuration as u8, self.resolution.config_bits()],
        )
        .map_err(|_| self.fault(TransactionStep::SetResolution))?;
        self.select_temperature_register(i2c)
    }

    /// Read and decode the temperature register.
    ///
    /// The pointer is reset to the temperature register first in case another bus master moved
    /// it.
    pub fn read<I: I2c>(&self, i2c: &mut I) -> Result<TemperatureSample, TransactionFault> {
        self.select_temperature_register(i2c)?;
        let mut raw = [0u8; 2];
        i2c.read(self.address.raw(), &mut raw)
            .map_err(|_| self.fault(TransactionStep::Receive))?;
        Ok(TemperatureSample::from_raw(self.address, raw))
    }

    fn select_temperature_register<I: I2c>(&self, i2c: &mut I) -> Result<(), TransactionFault> {
        i2c.write(self.address.raw(), &[Register::Temperature as u8])
            .map_err(|_| self.fault(TransactionStep::ResetPointer))
    }

    #[inline]
    fn fault(&self, step: TransactionStep) -> TransactionFault {
        TransactionFault {
            address: self.address.raw(),
            step,
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use super::*;
    use approx::assert_relative_eq;
    use std::format;

    const ADDR: SensorAddress = SensorAddress::ADD0_GND;

    #[test]
    fn decode_positive() {
        let sample = TemperatureSample::from_raw(ADDR, [0x17, 0x30]);
        assert_eq!(sample.integer(), 23);
        assert_eq!(sample.sixteenths(), 3);
        assert_relative_eq!(sample.celsius(), 23.1875);
    }

    #[test]
    fn decode_negative_is_sign_extended() {
        // -10.5 degrees: 0xF58 as 12-bit two's complement.
        let sample = TemperatureSample::from_raw(ADDR, [0xF5, 0x80]);
        assert_eq!(sample.integer(), -11);
        assert_relative_eq!(sample.fraction(), 0.5);
        assert_relative_eq!(sample.celsius(), -10.5);
    }

    #[test]
    fn decode_matches_twelve_bit_twos_complement() {
        for int_byte in 0..=u8::MAX {
            for frac_byte in (0..=u8::MAX).step_by(7) {
                let sample = TemperatureSample::from_raw(ADDR, [int_byte, frac_byte]);
                assert_eq!(sample.integer(), int_byte as i8);
                let fraction = sample.fraction();
                assert!((0.0..=0.9375).contains(&fraction));
                assert_relative_eq!(fraction * 16.0, (frac_byte >> 4) as f32);
                let raw = i16::from_be_bytes([int_byte, frac_byte]) >> 4;
                assert_relative_eq!(sample.celsius(), raw as f32 / 16.0);
            }
        }
    }

    #[test]
    fn lower_nibble_is_ignored() {
        let with_noise = TemperatureSample::from_raw(ADDR, [0x19, 0xAF]);
        let clean = TemperatureSample::from_raw(ADDR, [0x19, 0xA0]);
        assert_eq!(with_noise.celsius(), clean.celsius());
        assert_relative_eq!(clean.celsius(), 25.625);
    }

    #[test]
    fn display_has_four_fractional_digits() {
        let sample = TemperatureSample::from_raw(ADDR, [0x17, 0x30]);
        assert_eq!(format!("{sample}"), " 23.1875");
        let sample = TemperatureSample::from_raw(ADDR, [0xF5, 0x80]);
        assert_eq!(format!("{sample}"), "-10.5000");
    }

    #[test]
    fn resolution_codes() {
        assert_eq!(Resolution::Bits9.config_bits(), 0x00);
        assert_eq!(Resolution::Bits10.config_bits(), 0x20);
        assert_eq!(Resolution::Bits11.config_bits(), 0x40);
        assert_eq!(Resolution::Bits12.config_bits(), 0x60);
        assert_relative_eq!(Resolution::Bits9.lsb_celsius(), 0.5);
        assert_relative_eq!(Resolution::Bits12.lsb_celsius(), 0.0625);
        assert_eq!(Resolution::Bits12.conversion_time_ms(), 320);
    }

    #[test]
    fn address_must_be_seven_bit() {
        assert_eq!(SensorAddress::new(0x4A), Some(SensorAddress::ADD0_VDD));
        assert_eq!(SensorAddress::new(0x80), None);
        assert_eq!(SensorAddress::ADD0_FLOAT.raw(), 0x49);
    }
}
