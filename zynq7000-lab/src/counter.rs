//! # Periodic tick counter with LED mirror
//!
//! A countdown timer in auto-reload mode raises an interrupt on every expiry. The interrupt
//! handler clears the expiry flag, increments the [TickCounter] and writes the new count to an
//! LED output port.
//!
//! Setup is fail-fast: the first failing stage aborts the setup and the interrupt controller is
//! never touched if the timer could not be configured. Once running, the handler has no failure
//! path.
use core::{
    cell::RefCell,
    sync::atomic::{AtomicU32, Ordering},
};

use critical_section::Mutex;
use log::info;

use crate::config::{CounterConfig, DeviceId};

/// Interrupt ID as seen by the interrupt controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterruptLine(pub u16);

impl InterruptLine {
    /// Private peripheral interrupt of the CPU private timer.
    pub const CPU_PRIVATE_TIMER: Self = Self(29);
}

/// Association of one interrupt line to a handler.
///
/// The handler context lives in a static, usually a [TickSlot].
#[derive(Debug, Clone, Copy)]
pub struct InterruptBinding {
    pub line: InterruptLine,
    pub handler: fn(),
}

/// Static description of a timer instance returned by the lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerConfig {
    pub device: DeviceId,
    pub base_addr: usize,
}

/// Static description of an interrupt controller instance returned by the lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrqConfig {
    pub device: DeviceId,
    pub cpu_base_addr: usize,
    pub dist_base_addr: usize,
}

/// Hardware countdown timer capabilities.
pub trait CountdownTimer {
    type Error: core::fmt::Debug;

    fn lookup_config(&self, device: DeviceId) -> Option<TimerConfig>;
    fn initialize(&mut self, config: &TimerConfig) -> Result<(), Self::Error>;
    fn self_test(&mut self) -> Result<(), Self::Error>;
    fn enable_auto_reload(&mut self);
    fn load(&mut self, value: u32);
    fn enable_interrupt(&mut self);
    fn start(&mut self);
    fn is_expired(&mut self) -> bool;
    fn clear_interrupt_status(&mut self);
}

/// Interrupt controller capabilities.
pub trait InterruptController {
    type Error: core::fmt::Debug;

    fn lookup_config(&self, device: DeviceId) -> Option<IrqConfig>;
    fn initialize(&mut self, config: &IrqConfig) -> Result<(), Self::Error>;
    fn connect(&mut self, binding: InterruptBinding) -> Result<(), Self::Error>;
    fn enable(&mut self, line: InterruptLine);
}

/// CPU level interrupt exception control.
pub trait CpuInterrupts {
    /// Unmask the IRQ exception of the CPU.
    ///
    /// # Safety
    ///
    /// Do not call this in a critical section.
    unsafe fn enable(&mut self);
}

/// Parallel output port driving the LEDs.
pub trait LedOutput {
    type Error: core::fmt::Debug;

    fn initialize(&mut self, device: DeviceId) -> Result<(), Self::Error>;
    /// Configure the direction of the port. Set bits in `input_mask` are inputs.
    fn set_direction(&mut self, input_mask: u32);
    fn write(&mut self, value: u32);
}

/// Count of timer expirations.
///
/// Only single word operations are performed on the counter, which is sufficient for sharing
/// it between the interrupt handler and the main thread. State spanning more than one word
/// must be protected by a critical section.
#[derive(Debug, Default)]
pub struct TickCounter(AtomicU32);

impl TickCounter {
    pub const fn new() -> Self {
        Self(AtomicU32::new(0))
    }

    /// Increment the counter, wrapping on overflow, and return the new value.
    #[inline]
    pub fn increment(&self) -> u32 {
        self.0.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    #[inline]
    pub fn get(&self) -> u32 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Setup stage of the periodic counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStage {
    LedInit,
    TimerLookup,
    TimerInit,
    TimerSelfTest,
    IrqLookup,
    IrqInit,
    IrqConnect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("periodic counter setup failed at stage {stage:?}")]
pub struct SetupFault {
    pub stage: SetupStage,
}

impl From<SetupStage> for SetupFault {
    fn from(stage: SetupStage) -> Self {
        Self { stage }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Uninitialized,
    Configured,
    Running,
}

/// Countdown timer with its life cycle state.
pub struct PeriodicTimer<T> {
    timer: T,
    state: TimerState,
}

impl<T: CountdownTimer> PeriodicTimer<T> {
    pub const fn new(timer: T) -> Self {
        Self {
            timer,
            state: TimerState::Uninitialized,
        }
    }

    /// Bring the timer into the [TimerState::Configured] state: auto-reload mode with the given
    /// reload value and the expiry interrupt enabled. The countdown is not started yet.
    pub fn configure(&mut self, device: DeviceId, reload_value: u32) -> Result<(), SetupFault> {
        let config = self
            .timer
            .lookup_config(device)
            .ok_or(SetupStage::TimerLookup)?;
        self.timer
            .initialize(&config)
            .map_err(|_| SetupStage::TimerInit)?;
        self.timer
            .self_test()
            .map_err(|_| SetupStage::TimerSelfTest)?;
        self.timer.enable_auto_reload();
        self.timer.load(reload_value);
        self.timer.enable_interrupt();
        self.state = TimerState::Configured;
        Ok(())
    }

    #[inline]
    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn into_inner(self) -> T {
        self.timer
    }
}

/// Interrupt handler context.
pub struct TickHandler<T, L> {
    timer: T,
    leds: L,
    led_mask: u32,
    counter: &'static TickCounter,
}

impl<T: CountdownTimer, L: LedOutput> TickHandler<T, L> {
    pub fn new(timer: T, leds: L, led_mask: u32, counter: &'static TickCounter) -> Self {
        Self {
            timer,
            leds,
            led_mask,
            counter,
        }
    }

    /// Handle one timer interrupt.
    ///
    /// Returns [false] without side effects if the timer did not actually expire. The expiry flag
    /// is cleared before the count is incremented.
    pub fn on_interrupt(&mut self) -> bool {
        if !self.timer.is_expired() {
            return false;
        }
        self.timer.clear_interrupt_status();
        let count = self.counter.increment();
        self.leds.write(count & self.led_mask);
        true
    }

    #[inline]
    pub fn counter(&self) -> &'static TickCounter {
        self.counter
    }

    #[inline]
    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }
}

/// Static storage for a [TickHandler] which is shared with the interrupt handler.
pub struct TickSlot<T, L>(Mutex<RefCell<Option<TickHandler<T, L>>>>);

impl<T: CountdownTimer, L: LedOutput> TickSlot<T, L> {
    pub const fn new() -> Self {
        Self(Mutex::new(RefCell::new(None)))
    }

    fn install(&self, handler: TickHandler<T, L>) {
        critical_section::with(|cs| {
            self.0.borrow(cs).replace(Some(handler));
        });
    }

    /// Forward an interrupt to the installed handler. Returns [false] if no handler is installed
    /// or if the timer did not expire.
    pub fn on_interrupt(&self) -> bool {
        critical_section::with(|cs| {
            self.0
                .borrow_ref_mut(cs)
                .as_mut()
                .is_some_and(|handler| handler.on_interrupt())
        })
    }

    /// Run a closure with the installed handler.
    pub fn with<R>(&self, f: impl FnOnce(&mut TickHandler<T, L>) -> R) -> Option<R> {
        critical_section::with(|cs| self.0.borrow_ref_mut(cs).as_mut().map(f))
    }
}

impl<T: CountdownTimer, L: LedOutput> Default for TickSlot<T, L> {
    fn default() -> Self {
        Self::new()
    }
}

/// Peripherals required by [start_periodic_counter].
pub struct CounterPeripherals<'a, T, L, I, C> {
    pub timer: T,
    pub leds: L,
    pub irq: &'a mut I,
    pub cpu: &'a mut C,
}

/// Set up the LED port, the timer and the interrupt routing, then start the countdown.
///
/// `handler` is bound to the timer interrupt line and must forward to
/// [TickSlot::on_interrupt] of `slot`. The slot is filled before the countdown starts.
///
/// Returns [TimerState::Running] on success.
///
/// # Safety
///
/// Enables the CPU IRQ exception, so this must not be called in a critical section.
pub unsafe fn start_periodic_counter<T, L, I, C>(
    config: &CounterConfig,
    peripherals: CounterPeripherals<'_, T, L, I, C>,
    slot: &'static TickSlot<T, L>,
    counter: &'static TickCounter,
    handler: fn(),
) -> Result<TimerState, SetupFault>
where
    T: CountdownTimer,
    L: LedOutput,
    I: InterruptController,
    C: CpuInterrupts,
{
    let CounterPeripherals {
        timer,
        mut leds,
        irq,
        cpu,
    } = peripherals;

    leds.initialize(config.led_device)
        .map_err(|_| SetupStage::LedInit)?;
    leds.set_direction(0x00);

    let mut timer = PeriodicTimer::new(timer);
    timer.configure(config.timer_device, config.reload_value)?;

    let irq_config = irq
        .lookup_config(config.irq_device)
        .ok_or(SetupStage::IrqLookup)?;
    irq.initialize(&irq_config)
        .map_err(|_| SetupStage::IrqInit)?;
    irq.connect(InterruptBinding {
        line: config.timer_irq,
        handler,
    })
    .map_err(|_| SetupStage::IrqConnect)?;
    irq.enable(config.timer_irq);

    slot.install(TickHandler::new(
        timer.into_inner(),
        leds,
        config.led_mask(),
        counter,
    ));
    slot.with(|handler| handler.timer_mut().start());
    unsafe { cpu.enable() };
    info!("timer interrupt initialized successfully");
    Ok(TimerState::Running)
}
