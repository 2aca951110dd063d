//! Mock peripherals shared by the integration tests.
#![allow(dead_code)]

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    vec::Vec,
};

use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};
use zynq7000_lab::{
    Hertz,
    bus::{BusConfig, BusMaster, ConfigStage},
    config::DeviceId,
    counter::{
        CountdownTimer, CpuInterrupts, InterruptBinding, InterruptController, InterruptLine,
        IrqConfig, LedOutput, SetupStage, TimerConfig,
    },
    gic::BindingTable,
    tmp101::SensorAddress,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transfer {
    Write(u8, Vec<u8>),
    Read(u8, usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockBusError(pub ErrorKind);

impl embedded_hal::i2c::Error for MockBusError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

/// I2C master with a single simulated TMP101 behind it.
///
/// Transfers are only acknowledged once the bring-up sequence completed.
pub struct MockBus {
    pub fail_at: Option<ConfigStage>,
    /// Number of polls for which the bus reports busy after the clock was set.
    pub busy_polls: u32,
    pub busy_checks: u32,
    pub clock: Option<Hertz>,
    /// Number of upcoming read operations which are not acknowledged.
    pub failing_reads: u32,
    pub transfers: Vec<Transfer>,
    pub sensor_address: SensorAddress,
    pub pointer: u8,
    pub config_register: u8,
    pub temperature: [u8; 2],
}

impl MockBus {
    pub fn new(sensor_address: SensorAddress, temperature: [u8; 2]) -> Self {
        Self {
            fail_at: None,
            busy_polls: 0,
            busy_checks: 0,
            clock: None,
            failing_reads: 0,
            transfers: Vec::new(),
            sensor_address,
            pointer: 0,
            config_register: 0,
            temperature,
        }
    }

    pub fn failing_at(mut self, stage: ConfigStage) -> Self {
        self.fail_at = Some(stage);
        self
    }

    fn check(&self, stage: ConfigStage) -> Result<(), MockBusError> {
        if self.fail_at == Some(stage) {
            return Err(MockBusError(ErrorKind::Other));
        }
        Ok(())
    }
}

impl ErrorType for MockBus {
    type Error = MockBusError;
}

impl I2c for MockBus {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let nack = MockBusError(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    self.transfers.push(Transfer::Write(address, bytes.to_vec()));
                    if self.clock.is_none() || address != self.sensor_address.raw() {
                        return Err(nack);
                    }
                    if let Some(pointer) = bytes.first() {
                        self.pointer = pointer & 0b11;
                    }
                    if bytes.len() == 2 && self.pointer == 0b01 {
                        self.config_register = bytes[1];
                    }
                }
                Operation::Read(buf) => {
                    self.transfers.push(Transfer::Read(address, buf.len()));
                    if self.clock.is_none() || address != self.sensor_address.raw() {
                        return Err(nack);
                    }
                    if self.failing_reads > 0 {
                        self.failing_reads -= 1;
                        return Err(nack);
                    }
                    let register = match self.pointer {
                        0b00 => self.temperature,
                        0b01 => [self.config_register, 0],
                        _ => [0, 0],
                    };
                    for (dest, src) in buf.iter_mut().zip(register.iter()) {
                        *dest = *src;
                    }
                }
            }
        }
        Ok(())
    }
}

impl BusMaster for MockBus {
    fn lookup_config(&self, device: DeviceId) -> Option<BusConfig> {
        if self.fail_at == Some(ConfigStage::Lookup) {
            return None;
        }
        Some(BusConfig {
            device,
            base_addr: 0x1000 * (device.0 as usize + 1),
        })
    }

    fn initialize(&mut self, _config: &BusConfig) -> Result<(), MockBusError> {
        self.check(ConfigStage::Initialize)
    }

    fn self_test(&mut self) -> Result<(), MockBusError> {
        self.check(ConfigStage::SelfTest)
    }

    fn set_clock(&mut self, rate: Hertz) -> Result<(), MockBusError> {
        self.check(ConfigStage::SetClock)?;
        self.clock = Some(rate);
        Ok(())
    }

    fn is_busy(&mut self) -> bool {
        self.busy_checks += 1;
        if self.busy_polls > 0 {
            self.busy_polls -= 1;
            return true;
        }
        false
    }
}

/// Calls performed on the peripherals of the periodic counter, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    LedInit,
    LedDirection(u32),
    LedWrite(u32),
    TimerLookup,
    TimerInit,
    TimerSelfTest,
    TimerAutoReload,
    TimerLoad(u32),
    TimerInterruptEnable,
    TimerStart,
    TimerClear,
    IrqLookup,
    IrqInit,
    IrqConnect(u16),
    IrqEnable(u16),
    CpuEnable,
}

pub type EventLog = Arc<Mutex<Vec<Event>>>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn events(log: &EventLog) -> Vec<Event> {
    log.lock().unwrap().clone()
}

fn record(log: &EventLog, event: Event) {
    log.lock().unwrap().push(event);
}

pub struct MockTimer {
    pub log: EventLog,
    pub fail_at: Option<SetupStage>,
    /// Expiry flag, set by the test to simulate a countdown reaching zero.
    pub expired: Arc<AtomicBool>,
}

impl MockTimer {
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            fail_at: None,
            expired: Arc::new(AtomicBool::new(false)),
        }
    }

    fn check(&self, stage: SetupStage) -> Result<(), SetupStage> {
        if self.fail_at == Some(stage) {
            return Err(stage);
        }
        Ok(())
    }
}

impl CountdownTimer for MockTimer {
    type Error = SetupStage;

    fn lookup_config(&self, device: DeviceId) -> Option<TimerConfig> {
        record(&self.log, Event::TimerLookup);
        self.check(SetupStage::TimerLookup).ok()?;
        Some(TimerConfig {
            device,
            base_addr: 0xF8F0_0600,
        })
    }

    fn initialize(&mut self, _config: &TimerConfig) -> Result<(), SetupStage> {
        record(&self.log, Event::TimerInit);
        self.check(SetupStage::TimerInit)
    }

    fn self_test(&mut self) -> Result<(), SetupStage> {
        record(&self.log, Event::TimerSelfTest);
        self.check(SetupStage::TimerSelfTest)
    }

    fn enable_auto_reload(&mut self) {
        record(&self.log, Event::TimerAutoReload);
    }

    fn load(&mut self, value: u32) {
        record(&self.log, Event::TimerLoad(value));
    }

    fn enable_interrupt(&mut self) {
        record(&self.log, Event::TimerInterruptEnable);
    }

    fn start(&mut self) {
        record(&self.log, Event::TimerStart);
    }

    fn is_expired(&mut self) -> bool {
        self.expired.load(Ordering::SeqCst)
    }

    fn clear_interrupt_status(&mut self) {
        record(&self.log, Event::TimerClear);
        self.expired.store(false, Ordering::SeqCst);
    }
}

pub struct MockLeds {
    pub log: EventLog,
    pub fail_init: bool,
    pub value: Arc<Mutex<u32>>,
}

impl MockLeds {
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            fail_init: false,
            value: Arc::new(Mutex::new(0)),
        }
    }
}

impl LedOutput for MockLeds {
    type Error = ();

    fn initialize(&mut self, _device: DeviceId) -> Result<(), ()> {
        record(&self.log, Event::LedInit);
        if self.fail_init { Err(()) } else { Ok(()) }
    }

    fn set_direction(&mut self, input_mask: u32) {
        record(&self.log, Event::LedDirection(input_mask));
    }

    fn write(&mut self, value: u32) {
        record(&self.log, Event::LedWrite(value));
        *self.value.lock().unwrap() = value;
    }
}

/// Interrupt controller which stores the bindings in a real [BindingTable], so that tests can
/// raise interrupts by dispatching a line.
pub struct MockGic {
    pub log: EventLog,
    pub fail_at: Option<SetupStage>,
    pub bindings: &'static BindingTable,
}

impl MockGic {
    pub fn new(log: &EventLog, bindings: &'static BindingTable) -> Self {
        Self {
            log: log.clone(),
            fail_at: None,
            bindings,
        }
    }
}

impl InterruptController for MockGic {
    type Error = SetupStage;

    fn lookup_config(&self, device: DeviceId) -> Option<IrqConfig> {
        record(&self.log, Event::IrqLookup);
        if self.fail_at == Some(SetupStage::IrqLookup) {
            return None;
        }
        Some(IrqConfig {
            device,
            cpu_base_addr: 0xF8F0_0100,
            dist_base_addr: 0xF8F0_1000,
        })
    }

    fn initialize(&mut self, _config: &IrqConfig) -> Result<(), SetupStage> {
        record(&self.log, Event::IrqInit);
        if self.fail_at == Some(SetupStage::IrqInit) {
            return Err(SetupStage::IrqInit);
        }
        Ok(())
    }

    fn connect(&mut self, binding: InterruptBinding) -> Result<(), SetupStage> {
        record(&self.log, Event::IrqConnect(binding.line.0));
        if self.fail_at == Some(SetupStage::IrqConnect) {
            return Err(SetupStage::IrqConnect);
        }
        self.bindings
            .bind(binding)
            .map_err(|_| SetupStage::IrqConnect)
    }

    fn enable(&mut self, line: InterruptLine) {
        record(&self.log, Event::IrqEnable(line.0));
    }
}

pub struct MockCpu {
    pub log: EventLog,
}

impl CpuInterrupts for MockCpu {
    unsafe fn enable(&mut self) {
        record(&self.log, Event::CpuEnable);
    }
}
