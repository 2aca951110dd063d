//! # Generic Interrupt Controller (GIC) driver
//!
//! The driver routes the interrupt lines to registered handler functions. Bindings are stored in
//! a [BindingTable] which lives in a static, so that the IRQ exception handler can call
//! [handle_irq] without access to the [Gic] instance which performed the setup.
use core::cell::RefCell;

use arbitrary_int::Number;
use critical_section::Mutex;
use log::warn;

use crate::{
    config::DeviceId,
    counter::{InterruptBinding, InterruptController, InterruptLine, IrqConfig},
    regs::gic::{
        DistributorControlRegister, GICC_BASE_ADDR, GICD_BASE_ADDR, GicCpuInterface,
        GicDistributor, InterfaceControl, InterruptSignalRegister, MmioGicCpuInterface,
        MmioGicDistributor, PriorityRegister,
    },
};

/// Spurious interrupt ID.
pub const SPURIOUS_INTERRUPT_ID: u32 = 1023;
/// Number of interrupt IDs supported by the Zynq7000 GIC.
pub const NUM_OF_INTERRUPTS: u16 = 96;
/// Default number of bindings of a [BindingTable].
pub const DEFAULT_MAX_BINDINGS: usize = 8;

/// These fixed values must be programmed according to the Zynq7000 TRM p.236.
/// Configures #32 to #47.
pub const ICFR_2_FIXED_VALUE: u32 = 0b01010101010111010101010001011111;
/// Configures #48 to #63, `PL[2:0]` to high-level sensitivity.
pub const ICFR_3_FIXED_VALUE: u32 = 0b01010101010101011101010101010101;
/// Configures #64 to #79, `PL[7:3]` to high-level sensitivity.
pub const ICFR_4_FIXED_VALUE: u32 = 0b01110101010101010101010101010101;
/// Configures #80 to #95, `PL[15:8]` to high-level sensitivity.
pub const ICFR_5_FIXED_VALUE: u32 = 0b00000011010101010101010101010101;

/// Default priority for all interrupts, four 8-bit fields per word.
const DEFAULT_PRIORITY_WORD: u32 = 0xA0A0_A0A0;
/// Routes all shared peripheral interrupts to CPU 0.
const TARGET_CPU_0_WORD: u32 = 0x0101_0101;
/// Priority mask which lets all priorities of [DEFAULT_PRIORITY_WORD] pass.
const PRIORITY_MASK: u8 = 0xF0;

pub const LOOKUP_TABLE: [IrqConfig; 1] = [IrqConfig {
    device: DeviceId(0),
    cpu_base_addr: GICC_BASE_ADDR,
    dist_base_addr: GICD_BASE_ADDR,
}];

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BindError {
    #[error("binding table is full")]
    TableFull,
    #[error("interrupt line {0} is already bound")]
    AlreadyBound(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GicError {
    #[error("driver not initialized")]
    NotInitialized,
    #[error("invalid interrupt line {0}")]
    InvalidLine(u16),
    #[error("binding error: {0}")]
    Bind(#[from] BindError),
}

/// Interrupt line to handler table.
pub struct BindingTable<const N: usize = DEFAULT_MAX_BINDINGS>(
    Mutex<RefCell<heapless::Vec<InterruptBinding, N>>>,
);

impl<const N: usize> BindingTable<N> {
    pub const fn new() -> Self {
        Self(Mutex::new(RefCell::new(heapless::Vec::new())))
    }

    pub fn bind(&self, binding: InterruptBinding) -> Result<(), BindError> {
        critical_section::with(|cs| {
            let mut bindings = self.0.borrow_ref_mut(cs);
            if bindings.iter().any(|b| b.line == binding.line) {
                return Err(BindError::AlreadyBound(binding.line.0));
            }
            bindings.push(binding).map_err(|_| BindError::TableFull)
        })
    }

    pub fn is_bound(&self, line: InterruptLine) -> bool {
        self.handler(line).is_some()
    }

    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.0.borrow_ref(cs).len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Call the handler bound to the given line. Returns [false] if no handler is bound.
    ///
    /// The handler is called outside of the table lock, so it may take its own critical
    /// sections.
    pub fn dispatch(&self, line: InterruptLine) -> bool {
        match self.handler(line) {
            Some(handler) => {
                handler();
                true
            }
            None => false,
        }
    }

    fn handler(&self, line: InterruptLine) -> Option<fn()> {
        critical_section::with(|cs| {
            self.0
                .borrow_ref(cs)
                .iter()
                .find(|b| b.line == line)
                .map(|b| b.handler)
        })
    }
}

impl<const N: usize> Default for BindingTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// GIC driver used during setup.
pub struct Gic<const N: usize = DEFAULT_MAX_BINDINGS> {
    regs: Option<(MmioGicCpuInterface<'static>, MmioGicDistributor<'static>)>,
    bindings: &'static BindingTable<N>,
}

impl<const N: usize> Gic<N> {
    pub const fn new(bindings: &'static BindingTable<N>) -> Self {
        Self {
            regs: None,
            bindings,
        }
    }

    #[inline]
    pub fn bindings(&self) -> &'static BindingTable<N> {
        self.bindings
    }

    /// Sets up the sensitivities, priorities and targets of all interrupts, disables all of
    /// them and finally enables the distributor and the CPU interface.
    fn setup(gicc: &mut MmioGicCpuInterface<'static>, gicd: &mut MmioGicDistributor<'static>) {
        gicd.write_dcr(DistributorControlRegister::DEFAULT);
        gicd.write_icfr_2_spi(ICFR_2_FIXED_VALUE);
        gicd.write_icfr_3_spi(ICFR_3_FIXED_VALUE);
        gicd.write_icfr_4_spi(ICFR_4_FIXED_VALUE);
        gicd.write_icfr_5_spi(ICFR_5_FIXED_VALUE);
        for i in 0..0x18 {
            // SAFETY: Index is within the array bounds.
            unsafe { gicd.write_ipr_unchecked(i, DEFAULT_PRIORITY_WORD) };
        }
        for i in 0..0x10 {
            // SAFETY: Index is within the array bounds.
            unsafe { gicd.write_iptr_spi_unchecked(i, TARGET_CPU_0_WORD) };
        }
        for i in 0..3 {
            // SAFETY: Index is within the array bounds.
            unsafe { gicd.write_icer_unchecked(i, 0xFFFF_FFFF) };
        }
        gicd.write_dcr(
            DistributorControlRegister::builder()
                .with_enable_non_secure(true)
                .with_enable_secure(true)
                .build(),
        );
        gicc.write_pmr(PriorityRegister::new_with_raw_value(PRIORITY_MASK as u32));
        gicc.write_icr(
            InterfaceControl::builder()
                .with_sbpr(false)
                .with_fiq_en(false)
                .with_ack_ctrl(false)
                .with_enable_non_secure(true)
                .with_enable_secure(true)
                .build(),
        );
    }
}

impl<const N: usize> InterruptController for Gic<N> {
    type Error = GicError;

    fn lookup_config(&self, device: DeviceId) -> Option<IrqConfig> {
        LOOKUP_TABLE
            .iter()
            .find(|config| config.device == device)
            .copied()
    }

    fn initialize(&mut self, config: &IrqConfig) -> Result<(), GicError> {
        // SAFETY: The base addresses are taken from the lookup table.
        let (mut gicc, mut gicd) = unsafe {
            (
                GicCpuInterface::new_mmio_at(config.cpu_base_addr),
                GicDistributor::new_mmio_at(config.dist_base_addr),
            )
        };
        Self::setup(&mut gicc, &mut gicd);
        self.regs = Some((gicc, gicd));
        Ok(())
    }

    fn connect(&mut self, binding: InterruptBinding) -> Result<(), GicError> {
        if binding.line.0 >= NUM_OF_INTERRUPTS {
            return Err(GicError::InvalidLine(binding.line.0));
        }
        self.bindings.bind(binding)?;
        Ok(())
    }

    fn enable(&mut self, line: InterruptLine) {
        let Some((_, gicd)) = self.regs.as_mut() else {
            return;
        };
        if line.0 >= NUM_OF_INTERRUPTS {
            warn!("GIC: ignoring enable request for invalid line {}", line.0);
            return;
        }
        let word = (line.0 / 32) as usize;
        let bit = line.0 % 32;
        // The set-enable registers ignore written zeros.
        // SAFETY: The word index is smaller than 3 for all valid lines.
        unsafe { gicd.write_iser_unchecked(word, 1 << bit) };
    }
}

/// Interrupt line of an acknowledge register value, or [None] for the spurious interrupt ID.
pub fn acknowledged_line(iar: InterruptSignalRegister) -> Option<InterruptLine> {
    let int_id = iar.ack_int_id().as_u32();
    if int_id == SPURIOUS_INTERRUPT_ID {
        return None;
    }
    Some(InterruptLine(int_id as u16))
}

/// Acknowledge the pending interrupt, run its handler and signal the end of the interrupt.
///
/// This is intended to be called from the IRQ exception handler of the GIC at the given
/// CPU interface address. Spurious interrupts are not acknowledged.
///
/// # Safety
///
/// `cpu_base_addr` must be the base address of a GIC CPU interface.
pub unsafe fn handle_irq<const N: usize>(cpu_base_addr: usize, bindings: &BindingTable<N>) {
    // SAFETY: Guaranteed by the caller.
    let mut gicc = unsafe { GicCpuInterface::new_mmio_at(cpu_base_addr) };
    let iar = gicc.read_iar();
    let Some(line) = acknowledged_line(iar) else {
        return;
    };
    if !bindings.dispatch(line) {
        warn!("unhandled interrupt {}", line.0);
    }
    gicc.write_eoir(iar);
}
