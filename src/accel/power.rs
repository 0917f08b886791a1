use thiserror::Error;
use tracing::{debug, info, warn};

/// Clock/voltage corner requested from the accelerator driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum PerformanceMode {
    Low,
    Nominal,
    Turbo,
}

#[derive(Debug, Error)]
pub enum PowerError {
    #[error("accelerator engine is already powered on")]
    AlreadyOn,

    #[error("accelerator engine is not powered on")]
    NotOn,

    #[error("accelerator driver call failed with status {0}")]
    Driver(i32),
}

/// Power/mode operations of the accelerator driver.
///
/// The engine state is a process-wide singleton; callers must serialize
/// `power_on`/`power_off` pairs and never nest them.
pub trait PowerController {
    fn set_performance_mode(&mut self, mode: PerformanceMode) -> Result<(), PowerError>;

    fn power_on(&mut self) -> Result<(), PowerError>;

    fn power_off(&mut self) -> Result<(), PowerError>;
}

impl<P: PowerController + ?Sized> PowerController for &mut P {
    fn set_performance_mode(&mut self, mode: PerformanceMode) -> Result<(), PowerError> {
        (**self).set_performance_mode(mode)
    }

    fn power_on(&mut self) -> Result<(), PowerError> {
        (**self).power_on()
    }

    fn power_off(&mut self) -> Result<(), PowerError> {
        (**self).power_off()
    }
}

/// Holds the accelerator in turbo with the engine on; powers off on drop.
pub struct PowerGuard<'a, P: PowerController + ?Sized> {
    controller: &'a mut P,
}

impl<'a, P: PowerController + ?Sized> PowerGuard<'a, P> {
    /// Request turbo and power the engine on.
    ///
    /// Driver failures are logged and otherwise ignored; the timed region
    /// still runs and the engine is still powered off on drop.
    pub fn acquire(controller: &'a mut P) -> Self {
        if let Err(e) = controller.set_performance_mode(PerformanceMode::Turbo) {
            warn!(error = %e, "failed to set accelerator performance mode");
        }
        if let Err(e) = controller.power_on() {
            warn!(error = %e, "failed to power on accelerator engine");
        }
        Self { controller }
    }
}

impl<P: PowerController + ?Sized> Drop for PowerGuard<'_, P> {
    fn drop(&mut self) {
        if let Err(e) = self.controller.power_off() {
            warn!(error = %e, "failed to power off accelerator engine");
        }
    }
}

/// Controller for hosts without an accelerator driver.
///
/// Tracks the engine state so unpaired transitions are reported, and logs
/// every call.
#[derive(Debug, Default)]
pub struct HostPower {
    engine_on: bool,
    performance: Option<PerformanceMode>,
    power_cycles: u64,
}

impl HostPower {
    pub fn new() -> Self {
        info!("No accelerator driver present, power transitions are logged only");
        Self::default()
    }

    pub fn is_on(&self) -> bool {
        self.engine_on
    }

    pub fn performance_mode(&self) -> Option<PerformanceMode> {
        self.performance
    }

    /// Completed on/off pairs.
    pub fn power_cycles(&self) -> u64 {
        self.power_cycles
    }
}

impl PowerController for HostPower {
    fn set_performance_mode(&mut self, mode: PerformanceMode) -> Result<(), PowerError> {
        debug!(?mode, "set performance mode");
        self.performance = Some(mode);
        Ok(())
    }

    fn power_on(&mut self) -> Result<(), PowerError> {
        if self.engine_on {
            return Err(PowerError::AlreadyOn);
        }
        debug!("engine on");
        self.engine_on = true;
        Ok(())
    }

    fn power_off(&mut self) -> Result<(), PowerError> {
        if !self.engine_on {
            return Err(PowerError::NotOn);
        }
        debug!("engine off");
        self.engine_on = false;
        self.power_cycles += 1;
        Ok(())
    }
}
