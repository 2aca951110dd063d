//! # Dual bus temperature sampler
//!
//! Configures two (bus, TMP101) pairs once and then reads and reports both sensors forever.
//!
//! Every failure is logged and the sampler carries on with the next step. A sensor behind a bus
//! which failed to come up will produce a logged read failure in every cycle, while the other
//! channel keeps reporting.
use core::fmt::Write;

use log::{error, warn};

use crate::{
    bus::{BusHandle, BusMaster, ConfigFault},
    config::{ChannelConfig, SamplerConfig},
    tmp101::{TemperatureSample, TransactionFault, Tmp101},
};

/// One (bus, sensor) pair.
pub struct Channel<B> {
    label: &'static str,
    bus: BusHandle<B>,
    sensor: Tmp101,
    bus_fault: Option<ConfigFault>,
    sensor_fault: Option<TransactionFault>,
    last_read_fault: Option<TransactionFault>,
}

impl<B: BusMaster> Channel<B> {
    fn new(config: &ChannelConfig, bus: B) -> Self {
        Self {
            label: config.label,
            bus: BusHandle::new(bus, config.bus),
            sensor: Tmp101::new(config.address, config.resolution),
            bus_fault: None,
            sensor_fault: None,
            last_read_fault: None,
        }
    }

    /// Bring up the bus and configure the sensor. The sensor is configured even if the bus
    /// configuration failed.
    fn configure(&mut self, config: &ChannelConfig) {
        if let Err(fault) = self.bus.configure(config.clock) {
            error!("{}: failed to configure I2C instance: {}", self.label, fault);
            self.bus_fault = Some(fault);
        }
        if let Err(fault) = self.sensor.configure(&mut self.bus) {
            error!("{}: failed to configure TMP101: {}", self.label, fault);
            self.sensor_fault = Some(fault);
        }
    }

    fn sample(&mut self) -> Option<TemperatureSample> {
        match self.sensor.read(&mut self.bus) {
            Ok(sample) => {
                self.last_read_fault = None;
                Some(sample)
            }
            Err(fault) => {
                error!("{}: failed to read TMP101: {}", self.label, fault);
                self.last_read_fault = Some(fault);
                None
            }
        }
    }

    #[inline]
    pub fn label(&self) -> &'static str {
        self.label
    }

    #[inline]
    pub fn bus(&self) -> &BusHandle<B> {
        &self.bus
    }

    /// Fault of the bus bring-up, if any.
    #[inline]
    pub fn bus_fault(&self) -> Option<ConfigFault> {
        self.bus_fault
    }

    /// Fault of the sensor configuration, if any.
    #[inline]
    pub fn sensor_fault(&self) -> Option<TransactionFault> {
        self.sensor_fault
    }

    /// Fault of the most recent read, cleared by the next successful read.
    #[inline]
    pub fn last_read_fault(&self) -> Option<TransactionFault> {
        self.last_read_fault
    }
}

/// Report of one sampling cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleReport {
    pub samples: [Option<TemperatureSample>; 2],
}

pub struct SamplingLoop<B, W> {
    channels: [Channel<B>; 2],
    console: W,
    delay_iterations: u32,
}

impl<B: BusMaster, W: Write> SamplingLoop<B, W> {
    /// Bring up both channels in order and return the ready sampler.
    ///
    /// This never fails: faults are logged and kept in the respective [Channel].
    pub fn start(config: &SamplerConfig, buses: [B; 2], console: W) -> Self {
        let [bus_0, bus_1] = buses;
        let mut channels = [
            Channel::new(&config.channels[0], bus_0),
            Channel::new(&config.channels[1], bus_1),
        ];
        for (channel, channel_config) in channels.iter_mut().zip(config.channels.iter()) {
            channel.configure(channel_config);
        }
        Self {
            channels,
            console,
            delay_iterations: config.delay_iterations,
        }
    }

    /// Read both sensors and write one report line for every successful reading.
    pub fn poll_once(&mut self) -> CycleReport {
        let samples = [self.channels[0].sample(), self.channels[1].sample()];
        for (channel, sample) in self.channels.iter().zip(samples.iter()) {
            let Some(sample) = sample else {
                continue;
            };
            if write!(self.console, "{} Temperature: {} degrees\r\n", channel.label, sample)
                .is_err()
            {
                warn!("{}: console write failed", channel.label);
            }
        }
        CycleReport { samples }
    }

    /// Sample forever, pausing with a busy loop between cycles.
    pub fn run(&mut self) -> ! {
        loop {
            self.poll_once();
            busy_wait(self.delay_iterations);
        }
    }

    #[inline]
    pub fn channels(&self) -> &[Channel<B>; 2] {
        &self.channels
    }

    #[inline]
    pub fn console(&self) -> &W {
        &self.console
    }
}

/// Approximate delay by spinning for a number of iterations.
#[inline(never)]
pub fn busy_wait(iterations: u32) {
    for _ in 0..iterations {
        core::hint::spin_loop();
    }
}
