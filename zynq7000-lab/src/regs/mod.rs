//! # Register blocks
//!
//! Raw MMIO register definitions for the peripherals used by the lab applications. Only the
//! registers which are actually touched by the drivers are modelled, the rest of the address
//! space is covered by reserved padding so the offsets still match the TRM.
pub mod axi_gpio;
pub mod gic;
pub mod i2c;
pub mod priv_tim;
pub mod uart;

/// Base address of the Cortex-A9 MPCore private memory region.
pub const MPCORE_BASE_ADDR: usize = 0xF8F0_0000;
