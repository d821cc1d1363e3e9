use core::fmt;

use crate::command::Register;

/// Errors raised by the driver. `E` is the bus error type.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceError<E> {
    /// Bus failure while accessing `register`, passed through unchanged.
    Transport { register: Register, source: E },
    /// Compensation could not be computed from the stored calibration.
    Arithmetic(ArithmeticError),
    /// Oversampling mode outside 0..=3.
    Configuration(InvalidMode),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ArithmeticError {
    /// A divisor derived from the calibration constants was zero. Usually means the
    /// calibration block is all zeroes.
    DivisionByZero,
    /// Raw pressure was below the computed offset `B3`.
    NegativePressureTerm,
    /// An intermediate left the range the fixed-point routine is defined for: a
    /// negative `B4` scale, an `i64` overflow, or a pressure that does not fit `u32`.
    OutOfRange,
}

/// Raw oversampling value that does not name a mode.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidMode(pub u8);

impl<E> From<ArithmeticError> for DeviceError<E> {
    fn from(e: ArithmeticError) -> Self {
        DeviceError::Arithmetic(e)
    }
}

impl<E> From<InvalidMode> for DeviceError<E> {
    fn from(e: InvalidMode) -> Self {
        DeviceError::Configuration(e)
    }
}

impl fmt::Display for ArithmeticError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ArithmeticError::DivisionByZero => {
                f.write_str("division by zero, calibration data is degenerate")
            }
            ArithmeticError::NegativePressureTerm => {
                f.write_str("raw pressure below calibration offset")
            }
            ArithmeticError::OutOfRange => {
                f.write_str("compensation out of range, calibration data is degenerate")
            }
        }
    }
}

impl fmt::Display for InvalidMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid oversampling mode {}, expected 0..=3", self.0)
    }
}

impl<E: fmt::Debug> fmt::Display for DeviceError<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DeviceError::Transport { register, source } => write!(
                f,
                "bus error on register {:?} (0x{:02X}): {:?}",
                register,
                register.value(),
                source
            ),
            DeviceError::Arithmetic(e) => fmt::Display::fmt(e, f),
            DeviceError::Configuration(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl core::error::Error for ArithmeticError {}

impl core::error::Error for InvalidMode {}

impl<E: fmt::Debug> core::error::Error for DeviceError<E> {}
