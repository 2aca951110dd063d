//! # PS I2C driver
//!
//! Polled master driver for the two Cadence I2C controllers of the processing system. It
//! implements [BusMaster] for the bring-up sequence and [embedded_hal::i2c::I2c] for the data
//! transfers.
//!
//! The pins are expected to be routed by the boot loader, either through the MIO or through
//! EMIO into the programmable logic.
use arbitrary_int::{u2, u6, u10};
use embedded_hal::i2c::NoAcknowledgeSource;

use crate::{
    Hertz,
    bus::{BusConfig, BusMaster},
    config::DeviceId,
    regs::i2c::{
        Address, Control, Direction, Fifo, I2C_0_BASE_ADDR, I2C_1_BASE_ADDR, I2c as I2cRegs,
        InterruptStatus, MmioI2c, Mode, TransferSize,
    },
};

pub const FIFO_DEPTH: usize = 16;
/// Maximum read size in one read operation.
pub const MAX_READ_SIZE: usize = 255;
/// Pattern written to the slave monitor pause register by the self test.
const SELF_TEST_PATTERN: u32 = 0x05;

/// Lookup table of the PS I2C instances.
pub const LOOKUP_TABLE: [BusConfig; 2] = [
    BusConfig {
        device: DeviceId(0),
        base_addr: I2C_0_BASE_ADDR,
    },
    BusConfig {
        device: DeviceId(1),
        base_addr: I2C_1_BASE_ADDR,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum I2cError {
    #[error("driver not initialized")]
    NotInitialized,
    #[error("self test failed")]
    SelfTest,
    #[error("I2C speed not attainable")]
    SpeedNotAttainable,
    #[error("transfer in progress")]
    Busy,
    #[error("arbitration lost")]
    ArbitrationLoss,
    #[error("transfer not acknowledged: {0}")]
    Nack(NoAcknowledgeSource),
    #[error("TX overflow")]
    TxOverflow,
    #[error("RX underflow")]
    RxUnderflow,
    #[error("RX overflow")]
    RxOverflow,
    #[error("timeout of transfer")]
    Timeout,
    #[error("read data exceeds maximum allowed 255 bytes per transfer")]
    ReadDataLenTooLarge,
}

impl embedded_hal::i2c::Error for I2cError {
    fn kind(&self) -> embedded_hal::i2c::ErrorKind {
        match self {
            I2cError::ArbitrationLoss => embedded_hal::i2c::ErrorKind::ArbitrationLoss,
            I2cError::Nack(nack_kind) => embedded_hal::i2c::ErrorKind::NoAcknowledge(*nack_kind),
            I2cError::RxOverflow => embedded_hal::i2c::ErrorKind::Overrun,
            _ => embedded_hal::i2c::ErrorKind::Other,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct ClockConfig {
    div_a: u8,
    div_b: u8,
}

impl ClockConfig {
    pub fn new(div_a: u8, div_b: u8) -> Self {
        Self { div_a, div_b }
    }

    pub fn div_a(&self) -> u8 {
        self.div_a
    }

    pub fn div_b(&self) -> u8 {
        self.div_b
    }
}

/// Rate used for the divisor calculation.
///
/// From Xilinx embeddedsw: If frequency 400KHz is selected, 384.6KHz should be set.
/// If frequency 100KHz is selected, 90KHz should be set. This is due to a hardware limitation.
pub fn calculation_rate(rate: Hertz) -> Hertz {
    match rate.raw() {
        100_000 => Hertz::from_raw(90_000),
        400_000 => Hertz::from_raw(384_600),
        _ => rate,
    }
}

#[inline]
pub fn calculate_i2c_speed(cpu_1x_clk: Hertz, clk_config: ClockConfig) -> Hertz {
    cpu_1x_clk / (22 * (clk_config.div_a as u32 + 1) * (clk_config.div_b as u32 + 1))
}

/// Find the divisor pair which gets closest to the requested serial clock rate.
pub fn calculate_divisors(cpu_1x_clk: Hertz, rate: Hertz) -> Result<ClockConfig, I2cError> {
    let target = calculation_rate(rate).raw();
    if target == 0 || target > cpu_1x_clk.raw() / 22 || cpu_1x_clk.raw() / (22 * 64 * 4) > target
    {
        return Err(I2cError::SpeedNotAttainable);
    }
    let mut smallest_deviation = u32::MAX;
    let mut best_div_a = 1;
    let mut best_div_b = 1;
    for divisor_a in 1..=4 {
        for divisor_b in 1..=64 {
            let i2c_clock = cpu_1x_clk.raw() / (22 * divisor_a * divisor_b);
            let deviation = target.abs_diff(i2c_clock);
            if deviation < smallest_deviation {
                smallest_deviation = deviation;
                best_div_a = divisor_a;
                best_div_b = divisor_b;
            }
        }
    }
    Ok(ClockConfig::new(best_div_a as u8 - 1, best_div_b as u8 - 1))
}

/// Transfer phase used to attribute a NACK to the address or the data byte.
#[derive(Debug, Clone, Copy)]
enum NackPhase {
    Address,
    Data,
    /// First TX chunk with the given length. The source depends on how much of it was sent.
    FirstChunk(usize),
}

/// Source of a NACK which occurred while the first TX chunk was sent out.
///
/// The transfer size register holds the number of bytes still in the FIFO. Only one byte has
/// left it when the address byte was not acknowledged.
fn tx_nack_source(remaining: usize, first_chunk_len: usize) -> NoAcknowledgeSource {
    if remaining + 1 == first_chunk_len {
        NoAcknowledgeSource::Address
    } else {
        NoAcknowledgeSource::Data
    }
}

/// PS I2C master.
///
/// The driver is created uninitialized. [BusMaster::initialize] attaches it to the register
/// block returned by the lookup table.
pub struct PsI2c {
    regs: Option<MmioI2c<'static>>,
    cpu_1x_clk: Hertz,
}

// SAFETY: The driver has exclusive ownership of its register block.
unsafe impl Send for PsI2c {}

impl PsI2c {
    pub const fn new(cpu_1x_clk: Hertz) -> Self {
        Self {
            regs: None,
            cpu_1x_clk,
        }
    }

    #[inline]
    fn regs(&mut self) -> Result<&mut MmioI2c<'static>, I2cError> {
        self.regs.as_mut().ok_or(I2cError::NotInitialized)
    }

    #[inline]
    fn start_transfer(regs: &mut MmioI2c<'static>, address: u8) {
        regs.write_addr(Address::builder().with_addr(u10::new(address as u16)).build());
    }

    fn clean_up_after_transfer_or_on_error(regs: &mut MmioI2c<'static>) {
        regs.modify_cr(|mut cr| {
            cr.set_acken(false);
            cr.set_clear_fifo(true);
            cr.set_hold_bus(false);
            cr
        });
    }

    fn check_and_handle_errors(
        regs: &mut MmioI2c<'static>,
        isr: InterruptStatus,
        phase: NackPhase,
    ) -> Result<(), I2cError> {
        let err = if isr.tx_overflow() {
            I2cError::TxOverflow
        } else if isr.rx_overflow() {
            I2cError::RxOverflow
        } else if isr.rx_underflow() {
            I2cError::RxUnderflow
        } else if isr.arbitration_lost() {
            I2cError::ArbitrationLoss
        } else if isr.nack() {
            let source = match phase {
                NackPhase::Address => NoAcknowledgeSource::Address,
                NackPhase::Data => NoAcknowledgeSource::Data,
                NackPhase::FirstChunk(len) => {
                    tx_nack_source(regs.read_transfer_size().size() as usize, len)
                }
            };
            I2cError::Nack(source)
        } else if isr.timeout() {
            I2cError::Timeout
        } else {
            return Ok(());
        };
        Self::clean_up_after_transfer_or_on_error(regs);
        Err(err)
    }

    pub fn write_transfer_blocking(
        &mut self,
        addr: u8,
        data: &[u8],
        generate_stop: bool,
    ) -> Result<(), I2cError> {
        let regs = self.regs()?;
        regs.modify_cr(|mut cr| {
            cr.set_acken(true);
            cr.set_mode(Mode::Master);
            cr.set_clear_fifo(true);
            cr.set_dir(Direction::Transmitter);
            cr.set_hold_bus(!generate_stop || data.len() > FIFO_DEPTH);
            cr
        });
        // Clear the interrupt status register before using it to monitor the transfer.
        regs.modify_isr(|isr| isr);
        let mut written = 0;
        let mut first_write_cycle = true;
        loop {
            let fifo_space = FIFO_DEPTH - regs.read_transfer_size().size() as usize;
            let chunk = core::cmp::min(fifo_space, data.len() - written);
            for byte in &data[written..written + chunk] {
                regs.write_data(Fifo::builder().with_data(*byte).build());
            }
            written += chunk;
            let phase = if first_write_cycle {
                Self::start_transfer(regs, addr);
                NackPhase::FirstChunk(chunk)
            } else {
                NackPhase::Data
            };
            first_write_cycle = false;
            // While the hardware is busy sending out data, poll for errors.
            while regs.read_sr().tx_busy() {
                let isr = regs.read_isr();
                Self::check_and_handle_errors(regs, isr, phase)?;
            }
            if written == data.len() {
                break;
            }
        }
        if generate_stop {
            regs.modify_cr(|mut cr| {
                cr.set_hold_bus(false);
                cr
            });
        }
        loop {
            let isr = regs.read_isr();
            if isr.complete() {
                break;
            }
            Self::check_and_handle_errors(regs, isr, NackPhase::Data)?;
        }
        Ok(())
    }

    pub fn read_transfer_blocking(&mut self, addr: u8, data: &mut [u8]) -> Result<(), I2cError> {
        if data.len() > MAX_READ_SIZE {
            return Err(I2cError::ReadDataLenTooLarge);
        }
        let regs = self.regs()?;
        regs.modify_cr(|mut cr| {
            cr.set_acken(true);
            cr.set_mode(Mode::Master);
            cr.set_clear_fifo(true);
            cr.set_dir(Direction::Receiver);
            cr.set_hold_bus(data.len() > FIFO_DEPTH);
            cr
        });
        regs.modify_isr(|isr| isr);
        regs.write_transfer_size(
            TransferSize::builder()
                .with_size(data.len() as u8)
                .build(),
        );
        Self::start_transfer(regs, addr);
        let mut read = 0;
        while read < data.len() {
            let isr = regs.read_isr();
            let phase = if read == 0 {
                NackPhase::Address
            } else {
                NackPhase::Data
            };
            Self::check_and_handle_errors(regs, isr, phase)?;
            while regs.read_sr().rx_valid() && read < data.len() {
                data[read] = regs.read_data().data();
                read += 1;
            }
            // The outstanding read size fits into the FIFO. Clear the HOLD bit as specified in
            // TRM p.649 polled read step 6.
            if regs.read_transfer_size().size() as usize <= FIFO_DEPTH {
                regs.modify_cr(|mut cr| {
                    cr.set_hold_bus(false);
                    cr
                });
            }
        }
        loop {
            let isr = regs.read_isr();
            if isr.complete() {
                break;
            }
            Self::check_and_handle_errors(regs, isr, NackPhase::Data)?;
        }
        Self::clean_up_after_transfer_or_on_error(regs);
        Ok(())
    }
}

impl BusMaster for PsI2c {
    fn lookup_config(&self, device: DeviceId) -> Option<BusConfig> {
        LOOKUP_TABLE
            .iter()
            .find(|config| config.device == device)
            .copied()
    }

    fn initialize(&mut self, config: &BusConfig) -> Result<(), I2cError> {
        // SAFETY: The base address is taken from the lookup table.
        let mut regs = unsafe { I2cRegs::new_mmio_at(config.base_addr) };
        regs.write_cr(
            Control::builder()
                .with_div_a(u2::new(0))
                .with_div_b(u6::new(0))
                .with_clear_fifo(true)
                .with_slv_mon(false)
                .with_hold_bus(false)
                .with_acken(true)
                .with_addressing(true)
                .with_mode(Mode::Master)
                .with_dir(Direction::Transmitter)
                .build(),
        );
        regs.write_idr(InterruptStatus::ALL);
        regs.write_isr(InterruptStatus::new_with_raw_value(InterruptStatus::ALL));
        self.regs = Some(regs);
        Ok(())
    }

    /// All interrupts must be masked after initialization and the slave monitor pause register
    /// must hold a written test pattern.
    fn self_test(&mut self) -> Result<(), I2cError> {
        let regs = self.regs()?;
        if regs.read_imr() & InterruptStatus::ALL != InterruptStatus::ALL {
            return Err(I2cError::SelfTest);
        }
        regs.write_slave_pause(SELF_TEST_PATTERN);
        let readback = regs.read_slave_pause();
        regs.write_slave_pause(0);
        if readback != SELF_TEST_PATTERN {
            return Err(I2cError::SelfTest);
        }
        Ok(())
    }

    fn set_clock(&mut self, rate: Hertz) -> Result<(), I2cError> {
        let cpu_1x_clk = self.cpu_1x_clk;
        let regs = self.regs()?;
        if regs.read_transfer_size().size() != 0 {
            return Err(I2cError::Busy);
        }
        let clk_cfg = calculate_divisors(cpu_1x_clk, rate)?;
        regs.modify_cr(|mut cr| {
            cr.set_div_a(u2::new(clk_cfg.div_a()));
            cr.set_div_b(u6::new(clk_cfg.div_b()));
            cr
        });
        Ok(())
    }

    fn is_busy(&mut self) -> bool {
        match self.regs.as_mut() {
            Some(regs) => regs.read_sr().bus_active(),
            None => false,
        }
    }
}

impl embedded_hal::i2c::ErrorType for PsI2c {
    type Error = I2cError;
}

impl embedded_hal::i2c::I2c for PsI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [embedded_hal::i2c::Operation<'_>],
    ) -> Result<(), Self::Error> {
        for op in operations {
            match op {
                embedded_hal::i2c::Operation::Read(items) => {
                    self.read_transfer_blocking(address, items)?
                }
                embedded_hal::i2c::Operation::Write(items) => {
                    self.write_transfer_blocking(address, items, true)?
                }
            }
        }
        Ok(())
    }
}
