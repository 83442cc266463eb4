//! Periodic interrupt sources driving the two generators.
//!
//! The arbiter only needs to switch sources on and off and to remember
//! whether one was running, so the seam is three methods.

/// A fixed-rate callback source (hardware timer alarm).
pub trait PeriodicSource {
    /// Start delivering ticks.
    fn enable(&mut self);

    /// Stop delivering ticks. Returns once no further tick will start.
    fn disable(&mut self);

    fn is_enabled(&self) -> bool;
}

impl<T: PeriodicSource + ?Sized> PeriodicSource for &mut T {
    #[inline]
    fn enable(&mut self) {
        (**self).enable()
    }

    #[inline]
    fn disable(&mut self) {
        (**self).disable()
    }

    #[inline]
    fn is_enabled(&self) -> bool {
        (**self).is_enabled()
    }
}

#[cfg(target_os = "espidf")]
pub use esp::TimerSource;

#[cfg(target_os = "espidf")]
mod esp {
    use esp_idf_svc::hal::timer::TimerDriver;

    use super::PeriodicSource;
    use crate::fault::{FaultCode, FaultState};

    /// General-purpose timer with an auto-reload alarm at a fixed rate.
    ///
    /// The callback must already be subscribed. Driver errors cannot be
    /// returned through the arbiter, so they are latched as a fault.
    pub struct TimerSource {
        driver: TimerDriver<'static>,
        enabled: bool,
        fault: &'static FaultState,
    }

    impl TimerSource {
        /// Arm the alarm for `rate_hz` ticks per second, leaving it stopped.
        pub fn new(
            mut driver: TimerDriver<'static>,
            rate_hz: u32,
            fault: &'static FaultState,
        ) -> Result<Self, esp_idf_svc::sys::EspError> {
            driver.enable(false)?;
            driver.set_counter(0)?;
            driver.set_alarm(driver.tick_hz() / rate_hz as u64)?;
            driver.enable_interrupt()?;
            driver.enable_alarm(true)?;
            Ok(Self { driver, enabled: false, fault })
        }

        fn apply(&mut self, enable: bool) {
            match self.driver.enable(enable) {
                Ok(()) => self.enabled = enable,
                Err(e) => self.fault.set(FaultCode::Timer, e.code() as u32),
            }
        }
    }

    impl PeriodicSource for TimerSource {
        fn enable(&mut self) {
            self.apply(true);
        }

        fn disable(&mut self) {
            self.apply(false);
        }

        fn is_enabled(&self) -> bool {
            self.enabled
        }
    }
}
