// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Bases built elsewhere and handed over as an HDF5 artifact.
//!
//! The artifact holds a `Basis` group with the transform to map, stored one
//! row per mode (modes x unmasked pixels), and the unmasked indices, which are
//! usually one-based. The transform to coefficients is optional; without it,
//! the forward transform is the matrix inverse of the transform to map, which
//! requires a complete (square) basis. [`super::Hdf5BasisStore`] writes the
//! same layout, so a mirror file is also a valid artifact.

use std::path::{Path, PathBuf};

use log::{debug, info};
use nalgebra::DMatrix;
use ndarray::prelude::*;

use super::{BasisError, BasisProvider, BasisTransform};
use crate::{
    constants::{BASIS_GROUP, FORWARD_DATASET, INDICES_DATASET, INVERSE_DATASET},
    mask::{HorizonMask, UnmaskedIndices},
};

/// Reads a complete basis from an externally built artifact file.
#[derive(Debug, Clone)]
pub struct BasisArtifactProvider {
    path: PathBuf,
    /// Are the unmasked indices in the artifact one-based?
    one_based_indices: bool,
}

impl BasisArtifactProvider {
    pub fn new<T: AsRef<Path>>(path: T, one_based_indices: bool) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            one_based_indices,
        }
    }
}

impl BasisProvider for BasisArtifactProvider {
    fn build(&self, mask: &HorizonMask) -> Result<BasisTransform, BasisError> {
        let _e = hdf5::silence_errors();
        if !self.path.exists() {
            return Err(BasisError::FileDoesntExist(
                self.path.display().to_string(),
            ));
        }
        let h5 = hdf5::File::open(&self.path)?;
        let group = h5.group(BASIS_GROUP)?;
        let basis = read_basis_group(&group, mask.npix(), self.one_based_indices)?;
        info!(
            "Read a basis with {} modes from '{}'",
            basis.num_modes(),
            self.path.display()
        );
        Ok(basis)
    }
}

fn read_2d(group: &hdf5::Group, key: &str) -> Result<Array2<f64>, BasisError> {
    let ds = group.dataset(key)?;
    if ds.ndim() != 2 {
        return Err(BasisError::DatasetShape {
            key: key.to_string(),
            expected: "a 2D array",
        });
    }
    Ok(ds.read_2d::<f64>()?)
}

fn read_indices(
    group: &hdf5::Group,
    npix: usize,
    one_based: bool,
) -> Result<UnmaskedIndices, BasisError> {
    let ds = group.dataset(INDICES_DATASET)?;
    if ds.ndim() != 1 {
        return Err(BasisError::DatasetShape {
            key: INDICES_DATASET.to_string(),
            expected: "a 1D array",
        });
    }
    let stored: Vec<i64> = ds.read_raw()?;
    Ok(UnmaskedIndices::from_stored(&stored, npix, one_based)?)
}

/// Read a basis for maps of `npix` pixels out of a `Basis` group.
pub(super) fn read_basis_group(
    group: &hdf5::Group,
    npix: usize,
    one_based: bool,
) -> Result<BasisTransform, BasisError> {
    // One row per mode on disk; we want one column per mode.
    let inverse = read_2d(group, INVERSE_DATASET)?
        .t()
        .as_standard_layout()
        .into_owned();
    let indices = read_indices(group, npix, one_based)?;
    debug!(
        "Read a {}x{} transform to map",
        inverse.ncols(),
        inverse.nrows()
    );

    let forward = if group.link_exists(FORWARD_DATASET) {
        read_2d(group, FORWARD_DATASET)?
    } else {
        debug!("No '{FORWARD_DATASET}' dataset; inverting the transform to map");
        invert(inverse.view())?
    };
    BasisTransform::new(forward, inverse, indices)
}

/// Invert a square matrix.
pub(crate) fn invert(m: ArrayView2<f64>) -> Result<Array2<f64>, BasisError> {
    let (rows, cols) = m.dim();
    if rows != cols {
        return Err(BasisError::NotSquare { rows, cols });
    }
    let na = DMatrix::from_fn(rows, cols, |i, j| m[[i, j]]);
    let inv = na.try_inverse().ok_or(BasisError::Singular)?;
    if inv.iter().any(|v| !v.is_finite()) {
        return Err(BasisError::Singular);
    }
    Ok(Array2::from_shape_fn((rows, cols), |(i, j)| inv[(i, j)]))
}
