//! Fixed-point compensation, as published in the BMP085/BMP180 datasheets.
//!
//! Everything here is pure. Intermediates are held in `i64`, which covers every step
//! for a real sensor's calibration. Degenerate calibration blocks can still push the
//! final polynomial past `i64` or the result past `u32`; that is reported as
//! [`ArithmeticError::OutOfRange`].

use crate::calibration::{Calibration, OversamplingMode};
use crate::error::ArithmeticError;

/// Standard sea-level pressure in Pa
pub const SEA_LEVEL_PRESSURE: f32 = 101_325.0;

/// Uncompensated conversion results
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSample {
    /// UT
    pub temperature: u16,
    /// UP, already shifted right by `8 - oss`
    pub pressure: u32,
}

impl RawSample {
    /// Assemble UP from the MSB, LSB and XLSB data registers.
    pub fn pressure_from_bytes(bytes: [u8; 3], mode: OversamplingMode) -> u32 {
        let [msb, lsb, xlsb] = bytes;
        ((msb as u32) << 16 | (lsb as u32) << 8 | xlsb as u32) >> (8 - mode.value())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CompensatedReading {
    /// Degrees Celsius, 0.1 °C resolution
    pub temperature: f32,
    /// Pascal
    pub pressure: u32,
    /// Metres above the standard sea-level pressure
    pub altitude: f32,
}

/// Temperature compensation. Returns the temperature in 0.1 °C and `B5`, which the
/// pressure compensation needs.
pub fn compensate_temperature(calibration: &Calibration, ut: u16) -> Result<(i64, i64), ArithmeticError> {
    let x1 = ((ut as i64 - calibration.ac6 as i64) * calibration.ac5 as i64) >> 15;
    let x2 = ((calibration.mc as i64) << 11)
        .checked_div(x1 + calibration.md as i64)
        .ok_or(ArithmeticError::DivisionByZero)?;
    let b5 = x1 + x2;
    Ok(((b5 + 8) >> 4, b5))
}

/// Pressure compensation in Pa.
pub fn compensate_pressure(
    calibration: &Calibration,
    b5: i64,
    up: u32,
    mode: OversamplingMode,
) -> Result<u32, ArithmeticError> {
    let oss = mode.value() as u32;

    let b6 = b5 - 4000;
    let b6_sq = (b6 * b6) >> 12;
    let x1 = (calibration.b2 as i64 * b6_sq) >> 11;
    let x2 = (calibration.ac2 as i64 * b6) >> 11;
    let x3 = x1 + x2;
    let b3 = (((calibration.ac1 as i64 * 4 + x3) << oss) + 2) / 4;

    let x1 = (calibration.ac3 as i64 * b6) >> 13;
    let x2 = (calibration.b1 as i64 * b6_sq) >> 16;
    let x3 = (x1 + x2 + 2) >> 2;
    let b4 = (calibration.ac4 as i64 * (x3 + 32768)) >> 15;
    if b4 == 0 {
        return Err(ArithmeticError::DivisionByZero);
    }
    if b4 < 0 {
        return Err(ArithmeticError::OutOfRange);
    }

    let b7 = (up as i64 - b3)
        .checked_mul(50000 >> oss)
        .ok_or(ArithmeticError::OutOfRange)?;
    if b7 < 0 {
        return Err(ArithmeticError::NegativePressureTerm);
    }

    // Same rounding as the 32-bit reference, which halves before dividing once b7*2
    // no longer fits in an unsigned long.
    let p = if b7 < 0x8000_0000 {
        (b7 * 2) / b4
    } else {
        (b7 / b4).checked_mul(2).ok_or(ArithmeticError::OutOfRange)?
    };

    let x1 = (p >> 8)
        .checked_mul(p >> 8)
        .and_then(|x1| x1.checked_mul(3038))
        .ok_or(ArithmeticError::OutOfRange)?
        >> 16;
    let x2 = p.checked_mul(-7357).ok_or(ArithmeticError::OutOfRange)? >> 16;
    let p = x1
        .checked_add(x2)
        .and_then(|sum| sum.checked_add(3791))
        .and_then(|sum| p.checked_add(sum >> 4))
        .ok_or(ArithmeticError::OutOfRange)?;

    u32::try_from(p).map_err(|_| ArithmeticError::OutOfRange)
}

/// Barometric altitude in metres for `pressure` Pa, relative to 101325 Pa.
pub fn altitude(pressure: u32) -> f32 {
    44_330.0 * (1.0 - libm::powf(pressure as f32 / SEA_LEVEL_PRESSURE, 0.1903))
}

/// Full compensation of one raw sample.
pub fn compensate(
    calibration: &Calibration,
    raw: RawSample,
    mode: OversamplingMode,
) -> Result<CompensatedReading, ArithmeticError> {
    let (temperature, b5) = compensate_temperature(calibration, raw.temperature)?;
    let pressure = compensate_pressure(calibration, b5, raw.pressure, mode)?;
    Ok(CompensatedReading {
        temperature: temperature as f32 / 10.0,
        pressure,
        altitude: altitude(pressure),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datasheet() -> Calibration {
        Calibration {
            ac1: 408,
            ac2: -72,
            ac3: -14383,
            ac4: 32741,
            ac5: 32757,
            ac6: 23153,
            b1: 6190,
            b2: 4,
            mb: -32768,
            mc: -8711,
            md: 2868,
        }
    }

    /// Datasheet routine with its native 32-bit types (`long` / `unsigned long`).
    fn reference_pressure(c: &Calibration, ut: u16, up: u32, oss: u32) -> u32 {
        let x1 = ((ut as i32 - c.ac6 as i32) * c.ac5 as i32) >> 15;
        let x2 = ((c.mc as i32) << 11) / (x1 + c.md as i32);
        let b5 = x1 + x2;
        let b6 = b5 - 4000;
        let x1 = (c.b2 as i32 * ((b6 * b6) >> 12)) >> 11;
        let x2 = (c.ac2 as i32 * b6) >> 11;
        let x3 = x1 + x2;
        let b3 = (((c.ac1 as i32 * 4 + x3) << oss) + 2) / 4;
        let x1 = (c.ac3 as i32 * b6) >> 13;
        let x2 = (c.b1 as i32 * ((b6 * b6) >> 12)) >> 16;
        let x3 = (x1 + x2 + 2) >> 2;
        let b4 = (c.ac4 as u32).wrapping_mul((x3 + 32768) as u32) >> 15;
        let b7 = (up.wrapping_sub(b3 as u32)).wrapping_mul(50000 >> oss);
        let p = if b7 < 0x8000_0000 {
            ((b7 * 2) / b4) as i32
        } else {
            ((b7 / b4) * 2) as i32
        };
        let x1 = (p >> 8) * (p >> 8);
        let x1 = (x1 * 3038) >> 16;
        let x2 = (-7357 * p) >> 16;
        (p + ((x1 + x2 + 3791) >> 4)) as u32
    }

    #[test]
    fn datasheet_example() {
        let raw = RawSample {
            temperature: 27898,
            pressure: 23843,
        };
        let reading = compensate(&datasheet(), raw, OversamplingMode::UltraLowPower).unwrap();
        assert_eq!(reading.temperature, 15.0);
        assert_eq!(reading.pressure, 69964);
        assert!((reading.altitude - 3016.7).abs() < 1.0, "{}", reading.altitude);
    }

    #[test]
    fn intermediate_values_match_datasheet() {
        let (t, b5) = compensate_temperature(&datasheet(), 27898).unwrap();
        assert_eq!(t, 150);
        assert_eq!(b5, 2400);
    }

    #[test]
    fn compensation_is_deterministic() {
        let raw = RawSample {
            temperature: 31000,
            pressure: 40000,
        };
        for mode in [
            OversamplingMode::UltraLowPower,
            OversamplingMode::Standard,
            OversamplingMode::HighRes,
            OversamplingMode::UltraHighRes,
        ] {
            let first = compensate(&datasheet(), raw, mode).unwrap();
            let second = compensate(&datasheet(), raw, mode).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn matches_32_bit_reference_across_b7_boundary() {
        let c = datasheet();
        // b3 is 422 here, so b7 crosses 0x80000000 between UP 43371 and 43372.
        let (_, b5) = compensate_temperature(&c, 27898).unwrap();
        let below = (43371i64 - 422) * 50000;
        let above = (43372i64 - 422) * 50000;
        assert!(below < 0x8000_0000 && above >= 0x8000_0000);
        assert_eq!(b5, 2400);

        for up in 43000..44000u32 {
            let p = compensate_pressure(&c, b5, up, OversamplingMode::UltraLowPower).unwrap();
            assert_eq!(p, reference_pressure(&c, 27898, up, 0), "UP {}", up);
        }
    }

    #[test]
    fn matches_32_bit_reference_for_every_mode() {
        let c = datasheet();
        for oss in 0..4u32 {
            let mode = OversamplingMode::try_from(oss as u8).unwrap();
            for ut in [22000u16, 27898, 32000] {
                let (_, b5) = compensate_temperature(&c, ut).unwrap();
                for up in (20000u32..60000).step_by(997) {
                    let up = up << oss;
                    let p = compensate_pressure(&c, b5, up, mode).unwrap();
                    assert_eq!(p, reference_pressure(&c, ut, up, oss), "UT {} UP {} oss {}", ut, up, oss);
                }
            }
        }
    }

    #[test]
    fn negative_intermediates_use_arithmetic_shift() {
        // x1 = 0, x2 = -17840128 / 2868 truncates to -6220, (-6212 >> 4) floors to -389
        assert_eq!(compensate_temperature(&datasheet(), 23153), Ok((-389, -6220)));
        let reading = compensate(
            &datasheet(),
            RawSample {
                temperature: 23153,
                pressure: 23843,
            },
            OversamplingMode::UltraLowPower,
        )
        .unwrap();
        assert_eq!(reading.temperature, -38.9);
    }

    #[test]
    fn zero_calibration_is_an_error() {
        let raw = RawSample {
            temperature: 27898,
            pressure: 23843,
        };
        assert_eq!(
            compensate(&Calibration::default(), raw, OversamplingMode::Standard),
            Err(ArithmeticError::DivisionByZero)
        );
    }

    #[test]
    fn zero_ac4_is_an_error() {
        let c = Calibration { ac4: 0, ..datasheet() };
        assert_eq!(
            compensate_pressure(&c, 2400, 23843, OversamplingMode::UltraLowPower),
            Err(ArithmeticError::DivisionByZero)
        );
    }

    #[test]
    fn degenerate_calibration_overflow_is_an_error() {
        // x1 + MD == 1 blows B5 up, AC4 == 1 makes B4 == 1, so p is ~4e17
        let c = Calibration {
            ac4: 1,
            ac5: 32757,
            ac6: 23153,
            b2: -32768,
            mc: -32768,
            md: -4742,
            ..Calibration::default()
        };
        let raw = RawSample {
            temperature: 27898,
            pressure: 23843,
        };
        assert_eq!(
            compensate(&c, raw, OversamplingMode::UltraLowPower),
            Err(ArithmeticError::OutOfRange)
        );
    }

    #[test]
    fn negative_b4_is_out_of_range() {
        // b6 = -40000 with AC3 at its maximum drives x3 + 32768 below zero
        let c = Calibration {
            ac3: 32767,
            b1: 0,
            ..datasheet()
        };
        assert_eq!(
            compensate_pressure(&c, -36000, 23843, OversamplingMode::UltraLowPower),
            Err(ArithmeticError::OutOfRange)
        );
    }

    #[test]
    fn raw_pressure_below_offset_is_an_error() {
        assert_eq!(
            compensate_pressure(&datasheet(), 2400, 100, OversamplingMode::UltraLowPower),
            Err(ArithmeticError::NegativePressureTerm)
        );
    }

    #[test]
    fn altitude_decreases_with_pressure() {
        let mut previous = altitude(30_000);
        for pressure in (30_001..110_000).step_by(37) {
            let current = altitude(pressure);
            assert!(current < previous, "{} Pa", pressure);
            previous = current;
        }
        assert!(altitude(101_325).abs() < 0.01);
    }

    #[test]
    fn raw_pressure_assembly_per_mode() {
        let bytes = [0x5D, 0x23, 0x80];
        assert_eq!(RawSample::pressure_from_bytes(bytes, OversamplingMode::UltraLowPower), 0x5D23);
        assert_eq!(RawSample::pressure_from_bytes(bytes, OversamplingMode::Standard), 0x5D2380u32 >> 7);
        assert_eq!(RawSample::pressure_from_bytes(bytes, OversamplingMode::UltraHighRes), 0x5D2380u32 >> 5);
    }
}
