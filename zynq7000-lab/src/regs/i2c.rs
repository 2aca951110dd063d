//! PS I2C (Cadence I2C controller) register module.
use arbitrary_int::{u2, u6, u10};
use static_assertions::const_assert_eq;

pub const I2C_0_BASE_ADDR: usize = 0xE000_4000;
pub const I2C_1_BASE_ADDR: usize = 0xE000_5000;

#[bitbybit::bitenum(u1, exhaustive = true)]
#[derive(Debug, PartialEq, Eq)]
pub enum Direction {
    Receiver = 0b1,
    Transmitter = 0b0,
}

#[bitbybit::bitenum(u1, exhaustive = true)]
#[derive(Debug, PartialEq, Eq)]
pub enum Mode {
    Slave = 0b0,
    Master = 0b1,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct Control {
    /// Divides the input CPU_1x frequency by this value + 1
    #[bits(14..=15, rw)]
    div_a: u2,
    /// Divides the output from divisor A by this value + 1
    #[bits(8..=13, rw)]
    div_b: u6,
    #[bit(6, rw)]
    clear_fifo: bool,
    #[bit(5, rw)]
    slv_mon: bool,
    /// Keep SCL low after the current transfer instead of generating a stop condition.
    #[bit(4, rw)]
    hold_bus: bool,
    #[bit(3, rw)]
    acken: bool,
    /// Only used in master mode. 1: Normal 7-bit address.
    #[bit(2, rw)]
    addressing: bool,
    #[bit(1, rw)]
    mode: Mode,
    #[bit(0, rw)]
    dir: Direction,
}

#[bitbybit::bitfield(u32, debug)]
pub struct Status {
    /// An ongoing transfer is active on the bus.
    #[bit(8, r)]
    bus_active: bool,
    #[bit(7, r)]
    rx_overflow: bool,
    /// There is still a byte of data to be transmitted by the interface.
    #[bit(6, r)]
    tx_busy: bool,
    /// Receiver data valid, can be read from the interface.
    #[bit(5, r)]
    rx_valid: bool,
    #[bit(3, r)]
    rx_rw: bool,
}

#[bitbybit::bitfield(u32, default = 0x0)]
pub struct Address {
    #[bits(0..=9, rw)]
    addr: u10,
}

#[bitbybit::bitfield(u32, default = 0x0)]
pub struct Fifo {
    #[bits(0..=7, rw)]
    data: u8,
}

/// Interrupt status bits. All bits are cleared by writing a one.
#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct InterruptStatus {
    #[bit(9, rw)]
    arbitration_lost: bool,
    #[bit(7, rw)]
    rx_underflow: bool,
    #[bit(6, rw)]
    tx_overflow: bool,
    #[bit(5, rw)]
    rx_overflow: bool,
    #[bit(4, rw)]
    slave_ready: bool,
    #[bit(3, rw)]
    timeout: bool,
    #[bit(2, rw)]
    nack: bool,
    #[bit(1, rw)]
    data: bool,
    #[bit(0, rw)]
    complete: bool,
}

impl InterruptStatus {
    /// Mask of all implemented interrupt bits.
    pub const ALL: u32 = 0x2FF;
}

#[bitbybit::bitfield(u32, default = 0x0)]
pub struct TransferSize {
    #[bits(0..=7, rw)]
    size: u8,
}

#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct I2c {
    cr: Control,
    #[mmio(PureRead)]
    sr: Status,
    addr: Address,
    #[mmio(Read, Write)]
    data: Fifo,
    #[mmio(PureRead, Write, Modify)]
    isr: InterruptStatus,
    transfer_size: TransferSize,
    slave_pause: u32,
    timeout: u32,
    /// Interrupt mask. A set bit means the interrupt source is masked.
    #[mmio(PureRead)]
    imr: u32,
    #[mmio(Write)]
    ier: u32,
    #[mmio(Write)]
    idr: u32,
}

const_assert_eq!(core::mem::offset_of!(I2c, slave_pause), 0x18);
const_assert_eq!(core::mem::offset_of!(I2c, idr), 0x28);
