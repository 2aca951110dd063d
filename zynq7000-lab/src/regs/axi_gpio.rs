//! AXI GPIO IP core register module.
//!
//! The core is instantiated in the programmable logic, so the base address depends on the
//! hardware design. Only the dual channel data and tri-state registers are modelled.

/// Default address assigned by the block design for the first AXI GPIO instance.
pub const AXI_GPIO_0_BASE_ADDR: usize = 0x4120_0000;

#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct AxiGpio {
    data_1: u32,
    /// Tri-state control for channel 1. A set bit configures the line as an input.
    tri_1: u32,
    data_2: u32,
    tri_2: u32,
}

static_assertions::const_assert_eq!(core::mem::offset_of!(AxiGpio, tri_2), 0x0C);
