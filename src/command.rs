use crate::calibration::OversamplingMode;

/// Register addresses
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    AC1,
    AC2,
    AC3,
    AC4,
    AC5,
    AC6,
    B1,
    B2,
    MB,
    MC,
    MD,
    /// Measurement control, conversion commands are written here
    Control,
    /// Conversion result, 2 bytes for temperature and 3 bytes for pressure
    Data,
}

impl Register {
    /// Calibration registers in the order they are read
    pub const CALIBRATION: [Register; 11] = [
        Register::AC1,
        Register::AC2,
        Register::AC3,
        Register::AC4,
        Register::AC5,
        Register::AC6,
        Register::B1,
        Register::B2,
        Register::MB,
        Register::MC,
        Register::MD,
    ];

    pub fn value(&self) -> u8 {
        match *self {
            Register::AC1 => 0xAA,
            Register::AC2 => 0xAC,
            Register::AC3 => 0xAE,
            Register::AC4 => 0xB0,
            Register::AC5 => 0xB2,
            Register::AC6 => 0xB4,
            Register::B1 => 0xB6,
            Register::B2 => 0xB8,
            Register::MB => 0xBA,
            Register::MC => 0xBC,
            Register::MD => 0xBE,
            Register::Control => 0xF4,
            Register::Data => 0xF6,
        }
    }
}

pub enum Command {
    ReadTemperature,
    ReadPressure(OversamplingMode),
}

impl Command {
    pub fn value(&self) -> u8 {
        match self {
            Command::ReadTemperature => 0x2E,
            Command::ReadPressure(mode) => 0x34 + (mode.value() << 6),
        }
    }

    /// Conversion time in MILLISECONDS before the result register is valid.
    pub fn delay_ms(&self) -> u32 {
        match self {
            Command::ReadTemperature => 5,
            Command::ReadPressure(mode) => mode.pressure_delay_ms(),
        }
    }
}
