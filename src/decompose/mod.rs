// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Decompose beam maps into Cryo-coefficients.
//!
//! For every hyper-parameter in a grid, a batch of beam maps (one per
//! frequency) is read, optionally normalised to unit total flux, restricted
//! to the unmasked pixels and multiplied by the forward transform. The
//! resulting coefficient vectors are written under
//! `<hyper-parameter>/coefficients/Freq_<frequency>`.

mod error;
mod io;
#[cfg(test)]
mod tests;

pub use error::DecomposeError;
pub use io::{Hdf5BeamSource, Hdf5CoefficientStore, MemoryBeamSource, MemoryCoefficientStore};

use log::{debug, info, warn};
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    basis::BasisTransform,
    grid::{Frequencies, HyperParameterGrid},
    mask::UnmaskedIndices,
};

/// Where beam maps come from.
pub trait BeamSource {
    /// Get the beam maps for `hyper_parameter` as a (pixels, frequencies)
    /// array. A missing batch is a [`DecomposeError::BatchNotFound`].
    fn load_batch(&self, hyper_parameter: f64) -> Result<Array2<f64>, DecomposeError>;
}

/// Where coefficient vectors go.
pub trait CoefficientSink {
    /// Is there already a coefficient vector for this pair?
    fn contains(&self, hyper_parameter: f64, freq: f64) -> Result<bool, DecomposeError>;

    /// Write a coefficient vector, replacing any existing one.
    fn write(
        &mut self,
        hyper_parameter: f64,
        freq: f64,
        coeffs: ArrayView1<f64>,
    ) -> Result<(), DecomposeError>;
}

/// What to do with hyper-parameters whose coefficients were written by an
/// earlier run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExistingPolicy {
    /// Recompute and replace them.
    #[default]
    Overwrite,

    /// Leave a hyper-parameter alone if all of its frequencies are present.
    Skip,
}

/// Counts of what happened during [`Decomposer::run`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DecomposeSummary {
    /// The number of coefficient vectors written.
    pub written: usize,
    /// The number of hyper-parameters left untouched.
    pub skipped: usize,
}

/// Rescale a beam so that its pixels sum to 1.
pub fn normalise(map: ArrayView1<f64>) -> Result<Array1<f64>, DecomposeError> {
    let sum = map.sum();
    if !sum.is_finite() || sum.abs() < f64::MIN_POSITIVE {
        return Err(DecomposeError::DegenerateNormalisation { sum });
    }
    let normalised = map.mapv(|v| v / sum);
    if normalised.iter().any(|v| !v.is_finite()) {
        return Err(DecomposeError::DegenerateNormalisation { sum });
    }
    Ok(normalised)
}

/// Select the unmasked pixels of a full-sphere beam map, in index order. The
/// result must have `expected` elements, the input dimension of the basis.
pub fn restrict(
    map: ArrayView1<f64>,
    indices: &UnmaskedIndices,
    expected: usize,
) -> Result<Array1<f64>, DecomposeError> {
    if map.len() != indices.npix() {
        return Err(DecomposeError::MapSize {
            expected: indices.npix(),
            got: map.len(),
        });
    }
    let reduced = indices.gather(map);
    if reduced.len() != expected {
        return Err(DecomposeError::DimensionMismatch {
            expected,
            got: reduced.len(),
        });
    }
    Ok(reduced)
}

fn check_finite(map: ArrayView1<f64>) -> Result<(), DecomposeError> {
    match map.iter().position(|v| !v.is_finite()) {
        Some(pixel) => Err(DecomposeError::NonFiniteBeam {
            pixel,
            value: map[pixel],
        }),
        None => Ok(()),
    }
}

/// Turns beam maps into coefficient vectors with a fixed basis.
#[derive(Debug, Clone)]
pub struct Decomposer<'a> {
    basis: &'a BasisTransform,
    prenormalise: bool,
    existing: ExistingPolicy,
}

impl<'a> Decomposer<'a> {
    pub fn new(basis: &'a BasisTransform, prenormalise: bool) -> Self {
        Self {
            basis,
            prenormalise,
            existing: ExistingPolicy::default(),
        }
    }

    pub fn with_existing(self, existing: ExistingPolicy) -> Self {
        Self { existing, ..self }
    }

    pub fn basis(&self) -> &BasisTransform {
        self.basis
    }

    /// Decompose a single full-sphere beam map.
    pub fn decompose_beam(&self, map: ArrayView1<f64>) -> Result<Array1<f64>, DecomposeError> {
        check_finite(map)?;
        let normalised;
        let map = if self.prenormalise {
            normalised = normalise(map)?;
            normalised.view()
        } else {
            map
        };
        let reduced = restrict(map, self.basis.unmasked_indices(), self.basis.num_unmasked())?;
        Ok(self.basis.to_coefficients(reduced.view())?)
    }

    /// Decompose a (pixels, frequencies) batch of beams belonging to
    /// `hyper_parameter`. One coefficient vector is returned per frequency.
    pub fn decompose_batch(
        &self,
        hyper_parameter: f64,
        batch: ArrayView2<f64>,
        freqs: &Frequencies,
    ) -> Result<Vec<Array1<f64>>, DecomposeError> {
        let npix = self.basis.unmasked_indices().npix();
        if batch.dim() != (npix, freqs.len()) {
            return Err(DecomposeError::BatchShape {
                npix,
                num_freqs: freqs.len(),
                got: batch.dim(),
            });
        }

        batch
            .columns()
            .into_iter()
            .zip(freqs.values())
            .map(|(map, &freq)| {
                debug!("Decomposing hyper-parameter {hyper_parameter}, frequency {freq}");
                self.decompose_beam(map)
                    .map_err(|e| DecomposeError::Beam {
                        hyper_parameter,
                        freq,
                        source: Box::new(e),
                    })
            })
            .collect()
    }

    /// Decompose the beams of every hyper-parameter in `grid` and write the
    /// coefficients to `sink`, one hyper-parameter at a time.
    ///
    /// All of a hyper-parameter's coefficients are computed before any are
    /// written, so a failure never leaves that hyper-parameter half-written.
    /// Hyper-parameters finished before a failure stay written.
    pub fn run<S, K>(
        &self,
        grid: &HyperParameterGrid,
        freqs: &Frequencies,
        source: &S,
        sink: &mut K,
    ) -> Result<DecomposeSummary, DecomposeError>
    where
        S: BeamSource + ?Sized,
        K: CoefficientSink + ?Sized,
    {
        let mut summary = DecomposeSummary::default();
        for &hyper_parameter in grid.values() {
            if self.existing == ExistingPolicy::Skip && all_present(sink, hyper_parameter, freqs)? {
                warn!(
                    "Coefficients for hyper-parameter {} already exist; skipping",
                    HyperParameterGrid::key(hyper_parameter)
                );
                summary.skipped += 1;
                continue;
            }

            let batch = source.load_batch(hyper_parameter)?;
            let coeffs = self.decompose_batch(hyper_parameter, batch.view(), freqs)?;
            for (&freq, c) in freqs.values().iter().zip(coeffs.iter()) {
                sink.write(hyper_parameter, freq, c.view())?;
            }
            summary.written += coeffs.len();
            info!(
                "Wrote {} coefficient vectors for hyper-parameter {}",
                coeffs.len(),
                HyperParameterGrid::key(hyper_parameter)
            );
        }
        Ok(summary)
    }
}

fn all_present<K: CoefficientSink + ?Sized>(
    sink: &K,
    hyper_parameter: f64,
    freqs: &Frequencies,
) -> Result<bool, DecomposeError> {
    for &freq in freqs.values() {
        if !sink.contains(hyper_parameter, freq)? {
            return Ok(false);
        }
    }
    Ok(true)
}
