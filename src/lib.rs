#![no_std]
//! Platform agnostic driver for the Bosch BMP085 / BMP180 barometric pressure sensor,
//! built on the `embedded-hal` 1.0 I²C and delay traits.
//!
//! Calibration constants are read once by [`Bmp085::new`]. Each call to
//! [`Bmp085::read`] then runs a temperature conversion followed by a pressure
//! conversion and returns the compensated temperature, pressure and altitude.

#[cfg(test)]
#[macro_use]
extern crate std;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

mod calibration;
mod command;
mod compensation;
mod error;

pub use calibration::{Calibration, OversamplingMode};
pub use command::Register;
pub use compensation::{
    altitude, compensate, compensate_pressure, compensate_temperature, CompensatedReading, RawSample,
    SEA_LEVEL_PRESSURE,
};
pub use error::{ArithmeticError, DeviceError, InvalidMode};

use command::Command;

/// Fixed I²C address of the BMP085 / BMP180
pub const DEFAULT_ADDRESS: u8 = 0x77;

/// A calibrated BMP085 session. All bus access goes through `&mut self`, so only one
/// conversion can ever be in flight.
pub struct Bmp085<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
    mode: OversamplingMode,
    calibration: Calibration,
}

impl<I2C, D> Bmp085<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    /// Create a new instance and read the factory calibration.
    ///
    /// Fails if any of the eleven calibration registers cannot be read; there is no
    /// partially calibrated device.
    pub fn new(
        mut i2c: I2C,
        delay: D,
        address: u8,
        mode: OversamplingMode,
    ) -> Result<Self, DeviceError<I2C::Error>> {
        let calibration = Calibration::load(&mut i2c, address)?;
        Ok(Self {
            i2c,
            delay,
            address,
            mode,
            calibration,
        })
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn mode(&self) -> OversamplingMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: OversamplingMode) {
        self.mode = mode;
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Destroy the driver and give back the bus and delay.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    fn start_conversion(&mut self, command: Command) -> Result<(), DeviceError<I2C::Error>> {
        self.i2c
            .write(self.address, &[Register::Control.value(), command.value()])
            .map_err(|source| DeviceError::Transport {
                register: Register::Control,
                source,
            })?;
        self.delay.delay_ms(command.delay_ms());
        Ok(())
    }

    fn read_data<const N: usize>(&mut self) -> Result<[u8; N], DeviceError<I2C::Error>> {
        let mut buf = [0u8; N];
        self.i2c
            .write_read(self.address, &[Register::Data.value()], &mut buf)
            .map_err(|source| DeviceError::Transport {
                register: Register::Data,
                source,
            })?;
        Ok(buf)
    }

    fn read_raw_temperature(&mut self) -> Result<u16, DeviceError<I2C::Error>> {
        self.start_conversion(Command::ReadTemperature)?;
        Ok(u16::from_be_bytes(self.read_data()?))
    }

    fn read_raw_pressure(&mut self) -> Result<u32, DeviceError<I2C::Error>> {
        self.start_conversion(Command::ReadPressure(self.mode))?;
        Ok(RawSample::pressure_from_bytes(self.read_data()?, self.mode))
    }

    /// Run a temperature conversion then a pressure conversion and return both
    /// uncompensated values.
    pub fn read_raw(&mut self) -> Result<RawSample, DeviceError<I2C::Error>> {
        let temperature = self.read_raw_temperature()?;
        let pressure = self.read_raw_pressure()?;
        log::trace!("bmp085 raw: UT={} UP={} mode={:?}", temperature, pressure, self.mode);
        Ok(RawSample {
            temperature,
            pressure,
        })
    }

    /// Temperature in °C, pressure in Pa and altitude in m from one pair of conversions.
    pub fn read(&mut self) -> Result<CompensatedReading, DeviceError<I2C::Error>> {
        let raw = self.read_raw()?;
        compensate(&self.calibration, raw, self.mode).map_err(|e| {
            log::warn!("bmp085 compensation failed: {}", e);
            DeviceError::Arithmetic(e)
        })
    }

    pub fn temperature(&mut self) -> Result<f32, DeviceError<I2C::Error>> {
        Ok(self.read()?.temperature)
    }

    pub fn pressure(&mut self) -> Result<u32, DeviceError<I2C::Error>> {
        Ok(self.read()?.pressure)
    }

    pub fn altitude(&mut self) -> Result<f32, DeviceError<I2C::Error>> {
        Ok(self.read()?.altitude)
    }
}
