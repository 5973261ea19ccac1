// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The hyper-parameter grid and frequency list, and the HDF5 keys derived
//! from them.

use std::collections::HashSet;

use thiserror::Error;

use crate::constants::FREQ_PREFIX;

#[derive(Error, Debug)]
pub enum GridError {
    #[error("The {0} list is empty")]
    Empty(&'static str),

    #[error("The {what} list contains a non-finite value ({value})")]
    NotFinite { what: &'static str, value: f64 },

    #[error("Hyper-parameters must be strictly increasing, but {next} follows {prev}")]
    NotIncreasing { prev: f64, next: f64 },

    #[error("Frequencies {first} and {second} would both be stored as '{key}'")]
    DuplicateFrequencyKey { first: f64, second: f64, key: String },
}

fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => vec![],
        1 => vec![start],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            (0..num)
                .map(|i| if i == num - 1 { stop } else { start + step * i as f64 })
                .collect()
        }
    }
}

fn check_finite(what: &'static str, values: &[f64]) -> Result<(), GridError> {
    if values.is_empty() {
        return Err(GridError::Empty(what));
    }
    match values.iter().find(|v| !v.is_finite()) {
        Some(&value) => Err(GridError::NotFinite { what, value }),
        None => Ok(()),
    }
}

/// The ordered hyper-parameter values (e.g. antenna heights) at which beams
/// were simulated.
#[derive(Debug, Clone, PartialEq)]
pub struct HyperParameterGrid(Vec<f64>);

impl HyperParameterGrid {
    /// Create a grid from explicit values, which must be strictly increasing.
    pub fn new(values: Vec<f64>) -> Result<Self, GridError> {
        check_finite("hyper-parameter", &values)?;
        for pair in values.windows(2) {
            if pair[1] <= pair[0] {
                return Err(GridError::NotIncreasing {
                    prev: pair[0],
                    next: pair[1],
                });
            }
        }
        Ok(Self(values))
    }

    /// `num` evenly spaced values from `start` to `stop` inclusive, each
    /// rounded to `decimals` decimal places (ties to even).
    pub fn linspace(start: f64, stop: f64, num: usize, decimals: u32) -> Result<Self, GridError> {
        let scale = 10f64.powi(decimals as i32);
        let values = linspace(start, stop, num)
            .into_iter()
            .map(|v| (v * scale).round_ties_even() / scale)
            .collect();
        Self::new(values)
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The HDF5 group name for a hyper-parameter value. This is the shortest
    /// representation that reads back as the same value, written the way
    /// Python's `str` writes a float, so that Python readers can look the
    /// groups up: "1.0", "1.25", "0.0001", "1e-05", "1.5e+16".
    pub fn key(value: f64) -> String {
        let sci = format!("{value:e}");
        let (mantissa, exponent) = match sci.split_once('e') {
            Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
            None => return sci,
        };
        if value == 0.0 || (-4..16).contains(&exponent) {
            format!("{value:?}")
        } else {
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exponent.abs())
        }
    }
}

/// The ordered frequencies of each beam batch. The i-th frequency belongs to
/// the i-th beam map of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Frequencies(Vec<f64>);

impl Frequencies {
    /// Create a frequency list. No two frequencies may share an HDF5 key.
    pub fn new(values: Vec<f64>) -> Result<Self, GridError> {
        check_finite("frequency", &values)?;
        let mut seen = HashSet::with_capacity(values.len());
        for (i, &f) in values.iter().enumerate() {
            let key = Self::key(f);
            if !seen.insert(key.clone()) {
                let first = values[..i]
                    .iter()
                    .copied()
                    .find(|&g| Self::key(g) == key)
                    .unwrap_or(f);
                return Err(GridError::DuplicateFrequencyKey {
                    first,
                    second: f,
                    key,
                });
            }
        }
        Ok(Self(values))
    }

    /// `num` evenly spaced frequencies from `start` to `stop` inclusive.
    pub fn linspace(start: f64, stop: f64, num: usize) -> Result<Self, GridError> {
        Self::new(linspace(start, stop, num))
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The HDF5 dataset name for a frequency. The fractional part is
    /// truncated.
    pub fn key(freq: f64) -> String {
        format!("{FREQ_PREFIX}{}", freq.trunc() as i64)
    }
}
