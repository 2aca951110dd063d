//! # Zynq7000 lab support
//!
//! Support library for two bare-metal lab applications on the Zedboard:
//!
//! - A temperature sampler which reads two TMP101 sensors, one on the PS I2C controller and one on
//!   an I2C controller in the programmable logic, and reports both temperatures on the console.
//!   See [sampler].
//! - A periodic counter which increments a tick count on every expiry of the CPU private timer
//!   and mirrors the count to the LEDs. See [counter].
//!
//! The application logic is written against small capability traits ([bus::BusMaster],
//! [counter::CountdownTimer], [counter::InterruptController], [counter::LedOutput] and
//! [counter::CpuInterrupts]). The hardware implementations are provided by the driver modules
//! [i2c], [priv_tim], [gic] and [axi_gpio].
#![no_std]

pub mod axi_gpio;
pub mod bus;
pub mod config;
pub mod counter;
pub mod gic;
pub mod i2c;
pub mod log;
pub mod priv_tim;
pub mod regs;
pub mod sampler;
pub mod tmp101;
pub mod uart;

pub use fugit::RateExtU32;

/// Frequency type used for all clocks and rates.
pub type Hertz = fugit::HertzU32;
