//! # Configuration records
//!
//! All hardware identifiers and tuning values of the two lab applications are collected into
//! plain configuration records which are handed to the setup functions. The [zedboard] module
//! contains the values for the lab hardware.
use crate::{Hertz, counter::InterruptLine, tmp101::{Resolution, SensorAddress}};

/// Identifier of one peripheral instance, resolved through the lookup table of the
/// respective driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(pub u16);

impl core::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One (bus, sensor) pair of the temperature sampler.
#[derive(Debug, Clone, Copy)]
pub struct ChannelConfig {
    /// Prefix for the console report, for example `PS`.
    pub label: &'static str,
    pub bus: DeviceId,
    pub clock: Hertz,
    pub address: SensorAddress,
    pub resolution: Resolution,
}

#[derive(Debug, Clone, Copy)]
pub struct SamplerConfig {
    pub channels: [ChannelConfig; 2],
    /// Number of spin iterations between two sampling cycles.
    pub delay_iterations: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct CounterConfig {
    pub led_device: DeviceId,
    /// Number of LEDs connected to the output port.
    pub led_width: u8,
    pub timer_device: DeviceId,
    pub reload_value: u32,
    pub irq_device: DeviceId,
    pub timer_irq: InterruptLine,
}

impl CounterConfig {
    /// Bit mask covering all LEDs of the output port.
    #[inline]
    pub const fn led_mask(&self) -> u32 {
        if self.led_width >= 32 {
            u32::MAX
        } else {
            (1 << self.led_width) - 1
        }
    }
}

/// Lab constants for the Zedboard with two TMP101 breakout boards.
///
/// The PS sensor sits on the bottom row of connector JF, the PL sensor on the top row of
/// connector JB.
pub mod zedboard {
    use super::*;
    use crate::priv_tim;

    /// CPU_1x clock feeding the I2C controllers for a 666.667 MHz CPU clock in 6:2:1 mode.
    pub const CPU_1X_CLOCK: Hertz = Hertz::from_raw(111_111_111);
    /// CPU_3x2x clock feeding the CPU private timer.
    pub const CPU_3X2X_CLOCK: Hertz = Hertz::from_raw(333_333_333);
    pub const TICK_RATE: Hertz = Hertz::from_raw(1);

    pub const PS_I2C_DEVICE: DeviceId = DeviceId(0);
    pub const PL_I2C_DEVICE: DeviceId = DeviceId(1);
    pub const TIMER_DEVICE: DeviceId = DeviceId(0);
    pub const GIC_DEVICE: DeviceId = DeviceId(0);
    pub const LED_DEVICE: DeviceId = DeviceId(0);

    pub const DELAY_LOOP_COUNT: u32 = 80_000_000;

    pub const SAMPLER: SamplerConfig = SamplerConfig {
        channels: [
            ChannelConfig {
                label: "PS",
                bus: PS_I2C_DEVICE,
                clock: Hertz::from_raw(100_000),
                // ADD0 jumper to VDD.
                address: SensorAddress::ADD0_VDD,
                resolution: Resolution::Bits12,
            },
            ChannelConfig {
                label: "PL",
                bus: PL_I2C_DEVICE,
                clock: Hertz::from_raw(200_000),
                // ADD0 jumper to ground.
                address: SensorAddress::ADD0_GND,
                resolution: Resolution::Bits10,
            },
        ],
        delay_iterations: DELAY_LOOP_COUNT,
    };

    pub const COUNTER: CounterConfig = CounterConfig {
        led_device: LED_DEVICE,
        led_width: 8,
        timer_device: TIMER_DEVICE,
        reload_value: priv_tim::reload_value(CPU_3X2X_CLOCK, TICK_RATE),
        irq_device: GIC_DEVICE,
        timer_irq: InterruptLine::CPU_PRIVATE_TIMER,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn led_mask_covers_width() {
        assert_eq!(zedboard::COUNTER.led_mask(), 0xFF);
        let wide = CounterConfig {
            led_width: 32,
            ..zedboard::COUNTER
        };
        assert_eq!(wide.led_mask(), u32::MAX);
    }

    #[test]
    fn zedboard_tick_is_one_second() {
        assert_eq!(zedboard::COUNTER.reload_value, 333_333_332);
    }
}
