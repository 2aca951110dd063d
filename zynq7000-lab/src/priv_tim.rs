//! # CPU private timer driver
//!
//! Each Cortex-A9 core has its own private timer which is clocked with the CPU_3x2x clock and
//! raises the private peripheral interrupt 29 on expiry.
use crate::{
    Hertz,
    config::DeviceId,
    counter::{CountdownTimer, TimerConfig},
    regs::priv_tim::{
        CPU_PRIV_TIM_BASE_ADDR, Control, InterruptStatus, MmioPrivateTimer,
        PrivateTimer as Registers,
    },
};

/// Value written to the load register by the self test.
const SELF_TEST_PATTERN: u32 = 0xA55A_F00F;

pub const LOOKUP_TABLE: [TimerConfig; 1] = [TimerConfig {
    device: DeviceId(0),
    base_addr: CPU_PRIV_TIM_BASE_ADDR,
}];

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TimerError {
    #[error("driver not initialized")]
    NotInitialized,
    #[error("self test failed, load register read back {0:#010x}")]
    SelfTest(u32),
}

/// Reload value for an auto-reloading timer which should expire with the given rate.
///
/// The timer expires one cycle after it counted down to zero. A zero rate yields 0.
pub const fn reload_value(timer_clock: Hertz, rate: Hertz) -> u32 {
    match timer_clock.raw().checked_div(rate.raw()) {
        Some(ticks) => ticks.saturating_sub(1),
        None => 0,
    }
}

/// CPU private timer of the current core.
pub struct PrivateTimer {
    regs: Option<MmioPrivateTimer<'static>>,
}

// SAFETY: The timer is private to the core which uses it. It is only moved into a static which
// is accessed from that same core.
unsafe impl Send for PrivateTimer {}

impl PrivateTimer {
    pub const fn new() -> Self {
        Self { regs: None }
    }

    pub fn counter(&mut self) -> Option<u32> {
        self.regs.as_mut().map(|regs| regs.read_counter())
    }

    #[inline]
    fn with_regs(&mut self, f: impl FnOnce(&mut MmioPrivateTimer<'static>)) {
        if let Some(regs) = self.regs.as_mut() {
            f(regs);
        }
    }
}

impl Default for PrivateTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl CountdownTimer for PrivateTimer {
    type Error = TimerError;

    fn lookup_config(&self, device: DeviceId) -> Option<TimerConfig> {
        LOOKUP_TABLE
            .iter()
            .find(|config| config.device == device)
            .copied()
    }

    fn initialize(&mut self, config: &TimerConfig) -> Result<(), TimerError> {
        // SAFETY: The base address is taken from the lookup table.
        let mut regs = unsafe { Registers::new_mmio_at(config.base_addr) };
        regs.write_control(Control::DEFAULT);
        regs.write_isr(InterruptStatus::builder().with_event_flag(true).build());
        self.regs = Some(regs);
        Ok(())
    }

    /// The load register must hold a written test pattern. The control register is restored
    /// afterwards.
    fn self_test(&mut self) -> Result<(), TimerError> {
        let regs = self.regs.as_mut().ok_or(TimerError::NotInitialized)?;
        let control = regs.read_control();
        regs.write_control(Control::DEFAULT);
        regs.write_load(SELF_TEST_PATTERN);
        let readback = regs.read_load();
        regs.write_load(0);
        regs.write_control(control);
        if readback != SELF_TEST_PATTERN {
            return Err(TimerError::SelfTest(readback));
        }
        Ok(())
    }

    fn enable_auto_reload(&mut self) {
        self.with_regs(|regs| {
            regs.modify_control(|mut val| {
                val.set_auto_reload(true);
                val
            })
        });
    }

    /// Writing the load register also reloads the counter.
    fn load(&mut self, value: u32) {
        self.with_regs(|regs| regs.write_load(value));
    }

    fn enable_interrupt(&mut self) {
        self.with_regs(|regs| {
            regs.modify_control(|mut val| {
                val.set_irq_enable(true);
                val
            })
        });
    }

    fn start(&mut self) {
        self.with_regs(|regs| {
            regs.modify_control(|mut val| {
                val.set_timer_enable(true);
                val
            })
        });
    }

    fn is_expired(&mut self) -> bool {
        self.regs
            .as_mut()
            .is_some_and(|regs| regs.read_isr().event_flag())
    }

    fn clear_interrupt_status(&mut self) {
        // The event flag is cleared by writing a one.
        self.with_regs(|regs| {
            regs.write_isr(InterruptStatus::builder().with_event_flag(true).build())
        });
    }
}
