// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! US EPA air quality index from raw pollutant concentrations.
//!
//! OpenWeatherMap reports its own 1-5 scale alongside raw concentrations in
//! µg/m³. We convert the concentrations to the EPA 0-500 scale (the one
//! aqicn.org uses): each pollutant is mapped piecewise-linearly through its
//! breakpoint table and the worst pollutant sets the index.

/// Molar volume (litres) at 25°C and 1 atm, used for µg/m³ → ppm/ppb.
const MOLAR_VOLUME: f64 = 24.45;
const CO_MOLECULAR_WEIGHT: f64 = 28.01;
const NO2_MOLECULAR_WEIGHT: f64 = 46.0055;

/// Upper bound of the published scale.
const MAX_INDEX: u32 = 500;

/// `(c_low, c_high, i_low, i_high)`
type Breakpoint = (f64, f64, u32, u32);

/// PM2.5, µg/m³, truncated to 0.1
const PM25_BREAKPOINTS: [Breakpoint; 7] = [
    (0.0, 12.0, 0, 50),
    (12.1, 35.4, 51, 100),
    (35.5, 55.4, 101, 150),
    (55.5, 150.4, 151, 200),
    (150.5, 250.4, 201, 300),
    (250.5, 350.4, 301, 400),
    (350.5, 500.4, 401, 500),
];

/// CO, ppm, truncated to 0.1
const CO_BREAKPOINTS: [Breakpoint; 7] = [
    (0.0, 4.4, 0, 50),
    (4.5, 9.4, 51, 100),
    (9.5, 12.4, 101, 150),
    (12.5, 15.4, 151, 200),
    (15.5, 30.4, 201, 300),
    (30.5, 40.4, 301, 400),
    (40.5, 50.4, 401, 500),
];

/// NO2, ppb, truncated to integer
const NO2_BREAKPOINTS: [Breakpoint; 7] = [
    (0.0, 53.0, 0, 50),
    (54.0, 100.0, 51, 100),
    (101.0, 360.0, 101, 150),
    (361.0, 649.0, 151, 200),
    (650.0, 1249.0, 201, 300),
    (1250.0, 1649.0, 301, 400),
    (1650.0, 2049.0, 401, 500),
];

/// Health category of an index value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AqiCategory {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
    VeryHazardous,
}

impl AqiCategory {
    pub fn from_index(index: u32) -> Self {
        match index {
            0..=50 => AqiCategory::Good,
            51..=100 => AqiCategory::Moderate,
            101..=150 => AqiCategory::UnhealthyForSensitiveGroups,
            151..=200 => AqiCategory::Unhealthy,
            201..=300 => AqiCategory::VeryUnhealthy,
            301..=400 => AqiCategory::Hazardous,
            _ => AqiCategory::VeryHazardous,
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            AqiCategory::Good => "💚",
            AqiCategory::Moderate => "💛",
            AqiCategory::UnhealthyForSensitiveGroups => "🧡",
            AqiCategory::Unhealthy => "❤️",
            AqiCategory::VeryUnhealthy => "💜",
            AqiCategory::Hazardous => "🤎",
            AqiCategory::VeryHazardous => "🖤",
        }
    }
}

/// Pollutant concentrations as reported by OpenWeatherMap (all µg/m³).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Concentrations {
    pub pm2_5: f64,
    pub co: f64,
    pub no2: f64,
}

impl Concentrations {
    /// Overall EPA index: the maximum of the per-pollutant indices.
    pub fn us_aqi(&self) -> u32 {
        let pm25 = truncate(self.pm2_5, 10.0);
        let co_ppm = truncate(self.co * MOLAR_VOLUME / (CO_MOLECULAR_WEIGHT * 1000.0), 10.0);
        let no2_ppb = (self.no2 * MOLAR_VOLUME / NO2_MOLECULAR_WEIGHT).floor();

        [
            index_for(pm25, &PM25_BREAKPOINTS),
            index_for(co_ppm, &CO_BREAKPOINTS),
            index_for(no2_ppb, &NO2_BREAKPOINTS),
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    pub fn category(&self) -> AqiCategory {
        AqiCategory::from_index(self.us_aqi())
    }
}

fn truncate(value: f64, scale: f64) -> f64 {
    (value * scale).floor() / scale
}

fn index_for(concentration: f64, table: &[Breakpoint]) -> u32 {
    if concentration <= 0.0 {
        return 0;
    }

    for &(c_low, c_high, i_low, i_high) in table {
        if concentration <= c_high {
            // Concentrations falling between two rows (after truncation this
            // only happens with bad input) take the higher row.
            let c = concentration.max(c_low);
            let index = (i_high - i_low) as f64 / (c_high - c_low) * (c - c_low) + i_low as f64;
            return index.round() as u32;
        }
    }

    MAX_INDEX
}
