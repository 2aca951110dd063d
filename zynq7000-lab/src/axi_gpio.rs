//! # AXI GPIO driver
//!
//! Minimal output driver for the first channel of an AXI GPIO core in the programmable logic.
use crate::{
    config::DeviceId,
    counter::LedOutput,
    regs::axi_gpio::{AXI_GPIO_0_BASE_ADDR, AxiGpio as Registers, MmioAxiGpio},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioConfig {
    pub device: DeviceId,
    pub base_addr: usize,
}

pub const LOOKUP_TABLE: [GpioConfig; 1] = [GpioConfig {
    device: DeviceId(0),
    base_addr: AXI_GPIO_0_BASE_ADDR,
}];

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GpioError {
    #[error("no AXI GPIO instance with device ID {0}")]
    UnknownDevice(DeviceId),
}

pub struct AxiGpio {
    regs: Option<MmioAxiGpio<'static>>,
}

// SAFETY: The port is only accessed by the core which owns the driver.
unsafe impl Send for AxiGpio {}

impl AxiGpio {
    pub const fn new() -> Self {
        Self { regs: None }
    }

    pub fn lookup_config(device: DeviceId) -> Option<GpioConfig> {
        LOOKUP_TABLE
            .iter()
            .find(|config| config.device == device)
            .copied()
    }

    /// Last value written to the data register of channel 1.
    pub fn read(&mut self) -> Option<u32> {
        self.regs.as_mut().map(|regs| regs.read_data_1())
    }
}

impl Default for AxiGpio {
    fn default() -> Self {
        Self::new()
    }
}

impl LedOutput for AxiGpio {
    type Error = GpioError;

    fn initialize(&mut self, device: DeviceId) -> Result<(), GpioError> {
        let config = Self::lookup_config(device).ok_or(GpioError::UnknownDevice(device))?;
        // SAFETY: The base address is taken from the lookup table.
        self.regs = Some(unsafe { Registers::new_mmio_at(config.base_addr) });
        Ok(())
    }

    fn set_direction(&mut self, input_mask: u32) {
        if let Some(regs) = self.regs.as_mut() {
            regs.write_tri_1(input_mask);
        }
    }

    fn write(&mut self, value: u32) {
        if let Some(regs) = self.regs.as_mut() {
            regs.write_data_1(value);
        }
    }
}
