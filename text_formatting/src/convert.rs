// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conversions between device independent units and engine ideal units.

use line_services::{IDEAL_INFINITE_WIDTH, Ideal};

use crate::{Error, TextFormattingMode};

/// Ideal units per device independent unit.
pub const REAL_TO_IDEAL: f64 = 300.0;

/// The widest width that converts to an ideal value exactly.
///
/// Larger widths are rejected; `0.0` and infinity mean "unconstrained".
pub const REAL_INFINITE_WIDTH: f64 = IDEAL_INFINITE_WIDTH as f64 / REAL_TO_IDEAL;

/// Converts a real value to ideal units, saturating at the infinite width.
pub fn real_to_ideal(value: f64) -> Ideal {
    if value.is_nan() {
        return 0;
    }
    let scaled = (value * REAL_TO_IDEAL).round();
    let limit = f64::from(IDEAL_INFINITE_WIDTH);
    #[expect(
        clippy::cast_possible_truncation,
        reason = "The value is clamped to the ideal range first."
    )]
    let ideal = scaled.clamp(-limit, limit) as Ideal;
    ideal
}

/// Converts an ideal value back to real units.
pub fn ideal_to_real(value: Ideal) -> f64 {
    f64::from(value) / REAL_TO_IDEAL
}

/// Validates a width budget and converts it to ideal units.
///
/// `NaN` is an invalid argument; `0.0` and positive infinity map to
/// [`IDEAL_INFINITE_WIDTH`]; negative widths and finite widths above
/// [`REAL_INFINITE_WIDTH`] are out of range.
pub(crate) fn width_to_ideal(width: f64, parameter: &'static str) -> Result<Ideal, Error> {
    if width.is_nan() {
        return Err(Error::invalid_argument(parameter));
    }
    if width == 0.0 || width == f64::INFINITY {
        return Ok(IDEAL_INFINITE_WIDTH);
    }
    if width < 0.0 || width > REAL_INFINITE_WIDTH {
        return Err(Error::out_of_range(parameter));
    }
    Ok(real_to_ideal(width))
}

/// Scales an em relative value and applies the rounding of `mode`.
pub(crate) fn scaled(value: f64, em_size: f64, mode: TextFormattingMode, pixels_per_dip: f32) -> f64 {
    let value = value * em_size;
    match mode {
        TextFormattingMode::Ideal => value,
        TextFormattingMode::Display => {
            let pixels_per_dip = f64::from(pixels_per_dip);
            if pixels_per_dip > 0.0 {
                (value * pixels_per_dip).round() / pixels_per_dip
            } else {
                value
            }
        }
    }
}
