//! # GIC (Generic Interrupt Controller) register module.
//!
//! Only the registers written by the driver are named. Everything in between is reserved
//! padding so the offsets match the ARM GICv1 architecture specification.
use arbitrary_int::{u3, u10};
use static_assertions::const_assert_eq;

pub const GICC_BASE_ADDR: usize = super::MPCORE_BASE_ADDR + 0x0000_0100;
pub const GICD_BASE_ADDR: usize = super::MPCORE_BASE_ADDR + 0x0000_1000;

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct DistributorControlRegister {
    #[bit(1, rw)]
    enable_non_secure: bool,
    #[bit(0, rw)]
    enable_secure: bool,
}

/// Distributor register block up to and including the SPI configuration registers.
///
/// The Zynq7000 supports 96 interrupt IDs, so the per-interrupt bit registers are three words
/// wide.
#[derive(derive_mmio::Mmio)]
#[repr(C, align(8))]
pub struct GicDistributor {
    dcr: DistributorControlRegister,
    _reserved_0: [u32; 0x3F],
    /// Set-enable, one bit per interrupt ID. Writing zero has no effect.
    iser: [u32; 3],
    _reserved_1: [u32; 0x1D],
    /// Clear-enable, one bit per interrupt ID.
    icer: [u32; 3],
    _reserved_2: [u32; 0x9D],
    /// Priorities, four 8-bit fields per word.
    ipr: [u32; 0x18],
    _reserved_3: [u32; 0xF0],
    /// CPU targets of the shared peripheral interrupts, four 8-bit fields per word.
    iptr_spi: [u32; 0x10],
    _reserved_4: [u32; 0xEA],
    icfr_2_spi: u32,
    icfr_3_spi: u32,
    icfr_4_spi: u32,
    icfr_5_spi: u32,
}

const_assert_eq!(core::mem::offset_of!(GicDistributor, iser), 0x100);
const_assert_eq!(core::mem::offset_of!(GicDistributor, icer), 0x180);
const_assert_eq!(core::mem::offset_of!(GicDistributor, ipr), 0x400);
const_assert_eq!(core::mem::offset_of!(GicDistributor, iptr_spi), 0x820);
const_assert_eq!(core::mem::offset_of!(GicDistributor, icfr_2_spi), 0xC08);
const_assert_eq!(core::mem::size_of::<GicDistributor>(), 0xC18);

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct InterfaceControl {
    #[bit(4, rw)]
    sbpr: bool,
    #[bit(3, rw)]
    fiq_en: bool,
    #[bit(2, rw)]
    ack_ctrl: bool,
    #[bit(1, rw)]
    enable_non_secure: bool,
    #[bit(0, rw)]
    enable_secure: bool,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct PriorityRegister {
    #[bits(0..=7, rw)]
    priority: u8,
}

/// Layout of the acknowledge and end of interrupt registers.
#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct InterruptSignalRegister {
    #[bits(10..=12, rw)]
    cpu_id: u3,
    #[bits(0..=9, rw)]
    ack_int_id: u10,
}

#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct GicCpuInterface {
    icr: InterfaceControl,
    pmr: PriorityRegister,
    _reserved_0: u32,
    /// Reading acknowledges the highest priority pending interrupt.
    #[mmio(Read)]
    iar: InterruptSignalRegister,
    #[mmio(Write)]
    eoir: InterruptSignalRegister,
}

const_assert_eq!(core::mem::offset_of!(GicCpuInterface, iar), 0x0C);
const_assert_eq!(core::mem::offset_of!(GicCpuInterface, eoir), 0x10);
const_assert_eq!(core::mem::size_of::<GicCpuInterface>(), 0x14);
