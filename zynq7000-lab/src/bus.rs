//! # I2C bus controller
//!
//! Bring-up sequence for one I2C master: lookup, initialization, self test, clock setup and
//! waiting for an idle bus. The hardware implementation is [crate::i2c::PsI2c], tests use
//! mock implementations of [BusMaster].
use embedded_hal::i2c::{ErrorType, I2c, Operation, SevenBitAddress};
use log::info;

use crate::{Hertz, config::DeviceId};

/// Static description of one I2C master instance returned by the lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusConfig {
    pub device: DeviceId,
    pub base_addr: usize,
}

/// Peripheral capabilities required from an I2C master driver.
///
/// Data transfers use the regular [I2c] API.
pub trait BusMaster: I2c {
    fn lookup_config(&self, device: DeviceId) -> Option<BusConfig>;

    fn initialize(&mut self, config: &BusConfig) -> Result<(), Self::Error>;

    fn self_test(&mut self) -> Result<(), Self::Error>;

    /// Set the serial clock rate.
    fn set_clock(&mut self, rate: Hertz) -> Result<(), Self::Error>;

    fn is_busy(&mut self) -> bool;
}

/// Bring-up stage of the bus controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigStage {
    Lookup,
    Initialize,
    SelfTest,
    SetClock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("I2C device {device}: configuration failed at stage {stage:?}")]
pub struct ConfigFault {
    pub device: DeviceId,
    pub stage: ConfigStage,
}

/// One I2C master together with its bring-up state.
///
/// The handle can be used for data transfers even if the configuration failed. Transfers on a
/// bus which never came up will simply fail.
pub struct BusHandle<B> {
    bus: B,
    device: DeviceId,
    clock: Option<Hertz>,
}

impl<B: BusMaster> BusHandle<B> {
    pub fn new(bus: B, device: DeviceId) -> Self {
        Self {
            bus,
            device,
            clock: None,
        }
    }

    /// Run the complete bring-up sequence.
    ///
    /// After the clock was set, this function blocks until the bus reports idle.
    pub fn configure(&mut self, rate: Hertz) -> Result<(), ConfigFault> {
        let config = self
            .bus
            .lookup_config(self.device)
            .ok_or(self.fault(ConfigStage::Lookup))?;
        self.bus
            .initialize(&config)
            .map_err(|_| self.fault(ConfigStage::Initialize))?;
        self.bus
            .self_test()
            .map_err(|_| self.fault(ConfigStage::SelfTest))?;
        self.bus
            .set_clock(rate)
            .map_err(|_| self.fault(ConfigStage::SetClock))?;
        self.clock = Some(rate);

        info!("I2C {}: waiting until bus is idle", self.device);
        while self.bus.is_busy() {
            core::hint::spin_loop();
        }
        info!("I2C {}: bus is now idle", self.device);
        Ok(())
    }

    #[inline]
    pub fn device(&self) -> DeviceId {
        self.device
    }

    /// Configured clock rate, [None] if the bring-up did not get that far.
    #[inline]
    pub fn clock(&self) -> Option<Hertz> {
        self.clock
    }

    #[inline]
    pub fn is_idle(&mut self) -> bool {
        !self.bus.is_busy()
    }

    #[inline]
    pub fn bus(&self) -> &B {
        &self.bus
    }

    #[inline]
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    #[inline]
    fn fault(&self, stage: ConfigStage) -> ConfigFault {
        ConfigFault {
            device: self.device,
            stage,
        }
    }
}

impl<B: BusMaster> ErrorType for BusHandle<B> {
    type Error = B::Error;
}

impl<B: BusMaster> I2c for BusHandle<B> {
    #[inline]
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.bus.transaction(address, operations)
    }
}
