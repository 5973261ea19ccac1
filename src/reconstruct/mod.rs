// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Read Cryo-coefficients back and turn them into beam maps again.
//!
//! This is what an emulator does after interpolating coefficients to a new
//! hyper-parameter; the interpolation itself lives elsewhere.

mod error;
#[cfg(test)]
mod tests;

pub use error::ReconstructError;

use ndarray::prelude::*;

use crate::{
    basis::BasisTransform,
    decompose::Hdf5CoefficientStore,
    grid::{Frequencies, HyperParameterGrid},
};

/// Read every coefficient vector for `grid` and `freqs` from `store` into a
/// (hyper-parameters, frequencies, modes) array. All vectors must have the
/// same length.
pub fn read_coefficient_grid(
    store: &Hdf5CoefficientStore,
    grid: &HyperParameterGrid,
    freqs: &Frequencies,
) -> Result<Array3<f64>, ReconstructError> {
    let mut out: Option<Array3<f64>> = None;
    for (i_hp, &hp) in grid.values().iter().enumerate() {
        for (i_freq, &freq) in freqs.values().iter().enumerate() {
            let coeffs = store.read(hp, freq)?;
            let arr = out.get_or_insert_with(|| {
                Array3::zeros((grid.len(), freqs.len(), coeffs.len()))
            });
            let num_modes = arr.len_of(Axis(2));
            if coeffs.len() != num_modes {
                return Err(ReconstructError::InconsistentLength {
                    key: format!(
                        "{}/{}",
                        HyperParameterGrid::key(hp),
                        Frequencies::key(freq)
                    ),
                    expected: num_modes,
                    got: coeffs.len(),
                });
            }
            arr.slice_mut(s![i_hp, i_freq, ..]).assign(&coeffs);
        }
    }
    // Grids and frequency lists are never empty, so something was read.
    Ok(out.unwrap_or_else(|| Array3::zeros((0, 0, 0))))
}

/// Rebuilds beam maps from coefficient vectors, optionally using only the
/// leading modes of a basis.
#[derive(Debug, Clone)]
pub struct BeamReconstructor {
    basis: BasisTransform,
}

impl BeamReconstructor {
    /// Create a [`BeamReconstructor`]. If `order` is given, only the first
    /// `order` modes are used.
    pub fn new(basis: &BasisTransform, order: Option<usize>) -> Result<Self, ReconstructError> {
        let basis = match order {
            Some(order) => basis.truncated(order)?,
            None => basis.clone(),
        };
        Ok(Self { basis })
    }

    /// The number of modes used.
    pub fn order(&self) -> usize {
        self.basis.num_modes()
    }

    /// The beam's values above the horizon, in unmasked-index order. Any
    /// coefficients beyond the order in use are ignored.
    pub fn above_horizon(&self, coeffs: ArrayView1<f64>) -> Result<Array1<f64>, ReconstructError> {
        let order = self.order();
        if coeffs.len() < order {
            return Err(ReconstructError::TooFewCoefficients {
                expected: order,
                got: coeffs.len(),
            });
        }
        Ok(self.basis.to_map(coeffs.slice(s![..order]))?)
    }

    /// The beam over the whole sphere; pixels below the horizon are zero.
    pub fn full_sky(&self, coeffs: ArrayView1<f64>) -> Result<Array1<f64>, ReconstructError> {
        let above = self.above_horizon(coeffs)?;
        Ok(self.basis.unmasked_indices().scatter(above.view()))
    }

    /// Rebuild one full-sky map per row of a (frequencies, modes) array,
    /// giving a (frequencies, pixels) array.
    pub fn full_sky_batch(&self, coeffs: ArrayView2<f64>) -> Result<Array2<f64>, ReconstructError> {
        let npix = self.basis.unmasked_indices().npix();
        let mut out = Array2::zeros((coeffs.nrows(), npix));
        for (row, mut out_row) in coeffs.rows().into_iter().zip(out.rows_mut()) {
            out_row.assign(&self.full_sky(row)?);
        }
        Ok(out)
    }
}
