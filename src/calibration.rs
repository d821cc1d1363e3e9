use embedded_hal::i2c::I2c;

use crate::command::Register;
use crate::error::{DeviceError, InvalidMode};

/// Oversampling mode. Trades pressure conversion time for resolution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OversamplingMode {
    UltraLowPower,
    #[default]
    Standard,
    HighRes,
    UltraHighRes,
}

impl OversamplingMode {
    /// The `oss` value, used as a shift amount by the compensation and the command byte.
    pub fn value(&self) -> u8 {
        match *self {
            OversamplingMode::UltraLowPower => 0,
            OversamplingMode::Standard => 1,
            OversamplingMode::HighRes => 2,
            OversamplingMode::UltraHighRes => 3,
        }
    }

    /// Gets the maximum pressure conversion time in MILLISECONDS.
    pub fn pressure_delay_ms(&self) -> u32 {
        // datasheet max: 4.5 / 7.5 / 13.5 / 25.5 ms
        match *self {
            OversamplingMode::UltraLowPower => 5,
            OversamplingMode::Standard => 8,
            OversamplingMode::HighRes => 14,
            OversamplingMode::UltraHighRes => 26,
        }
    }
}

impl TryFrom<u8> for OversamplingMode {
    type Error = InvalidMode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(OversamplingMode::UltraLowPower),
            1 => Ok(OversamplingMode::Standard),
            2 => Ok(OversamplingMode::HighRes),
            3 => Ok(OversamplingMode::UltraHighRes),
            other => Err(InvalidMode(other)),
        }
    }
}

/// Factory calibration data read from the EEPROM block at 0xAA..=0xBF
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    pub ac1: i16,
    pub ac2: i16,
    pub ac3: i16,
    pub ac4: u16,
    pub ac5: u16,
    pub ac6: u16,
    pub b1: i16,
    pub b2: i16,
    /// Not used by the compensation, kept for completeness
    pub mb: i16,
    pub mc: i16,
    pub md: i16,
}

impl Calibration {
    /// Decode the eleven register pairs, given in `Register::CALIBRATION` order.
    pub fn from_registers(words: &[[u8; 2]; 11]) -> Calibration {
        Calibration {
            ac1: decode_i16(words[0]),
            ac2: decode_i16(words[1]),
            ac3: decode_i16(words[2]),
            ac4: decode_u16(words[3]),
            ac5: decode_u16(words[4]),
            ac6: decode_u16(words[5]),
            b1: decode_i16(words[6]),
            b2: decode_i16(words[7]),
            mb: decode_i16(words[8]),
            mc: decode_i16(words[9]),
            md: decode_i16(words[10]),
        }
    }

    /// Reads every calibration register pair. Stops at the first bus error and reports
    /// the register that failed; no field is ever left defaulted.
    pub fn load<I2C: I2c>(i2c: &mut I2C, address: u8) -> Result<Calibration, DeviceError<I2C::Error>> {
        let mut words = [[0u8; 2]; 11];
        for (register, word) in Register::CALIBRATION.iter().zip(words.iter_mut()) {
            i2c.write_read(address, &[register.value()], word)
                .map_err(|source| DeviceError::Transport {
                    register: *register,
                    source,
                })?;
        }

        let calibration = Calibration::from_registers(&words);
        log::debug!("bmp085 @ 0x{:02X} calibration: {:?}", address, calibration);
        Ok(calibration)
    }
}

/// Big-endian, high byte sign extended.
pub(crate) fn decode_i16(word: [u8; 2]) -> i16 {
    i16::from_be_bytes(word)
}

pub(crate) fn decode_u16(word: [u8; 2]) -> u16 {
    u16::from_be_bytes(word)
}
