//! PS UART register module.
//!
//! Only the registers required for a polled transmitter are modelled, the UART is expected to be
//! configured by the first stage bootloader or the PS7 init script.

pub const UART_0_BASE_ADDR: usize = 0xE000_0000;
pub const UART_1_BASE_ADDR: usize = 0xE000_1000;

#[bitbybit::bitfield(u32, debug)]
pub struct Status {
    #[bit(4, r)]
    tx_full: bool,
    #[bit(3, r)]
    tx_empty: bool,
    #[bit(1, r)]
    rx_empty: bool,
}

#[bitbybit::bitfield(u32, default = 0x0)]
pub struct Fifo {
    #[bits(0..=7, rw)]
    fifo: u8,
}

#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct Uart {
    cr: u32,
    mr: u32,
    ier: u32,
    idr: u32,
    #[mmio(PureRead)]
    imr: u32,
    isr: u32,
    baudgen: u32,
    rx_tout: u32,
    rx_fifo_trigger: u32,
    modem_cr: u32,
    modem_sr: u32,
    #[mmio(PureRead)]
    sr: Status,
    #[mmio(Read, Write)]
    fifo: Fifo,
}

static_assertions::const_assert_eq!(core::mem::offset_of!(Uart, sr), 0x2C);
static_assertions::const_assert_eq!(core::mem::offset_of!(Uart, fifo), 0x30);
