// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Places to keep a basis once it has been built.

use std::path::{Path, PathBuf};

use log::debug;
use ndarray::prelude::*;

use super::{artifact::read_basis_group, BasisError, BasisStore, BasisTransform};
use crate::constants::{BASIS_GROUP, FORWARD_DATASET, INDICES_DATASET, INVERSE_DATASET};

/// Keeps a basis in memory only. Useful when the basis shouldn't be mirrored
/// to disk.
#[derive(Debug, Default, Clone)]
pub struct MemoryBasisStore(Option<BasisTransform>);

impl MemoryBasisStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BasisStore for MemoryBasisStore {
    fn load(&self, _npix: usize) -> Result<Option<BasisTransform>, BasisError> {
        Ok(self.0.clone())
    }

    fn save(&mut self, basis: &BasisTransform) -> Result<(), BasisError> {
        self.0 = Some(basis.clone());
        Ok(())
    }
}

/// Mirrors a basis into the `Basis` group of an HDF5 file, in the same layout
/// as a basis artifact: the transform to map one row per mode, the transform
/// to coefficients, and the unmasked indices.
#[derive(Debug, Clone)]
pub struct Hdf5BasisStore {
    path: PathBuf,
    /// Are the unmasked indices written (and read) one-based?
    one_based_indices: bool,
}

impl Hdf5BasisStore {
    pub fn new<T: AsRef<Path>>(path: T, one_based_indices: bool) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            one_based_indices,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BasisStore for Hdf5BasisStore {
    fn load(&self, npix: usize) -> Result<Option<BasisTransform>, BasisError> {
        let _e = hdf5::silence_errors();
        if !self.path.exists() {
            debug!("Basis mirror '{}' doesn't exist", self.path.display());
            return Ok(None);
        }
        let h5 = hdf5::File::open(&self.path)?;
        if !h5.link_exists(BASIS_GROUP) {
            debug!(
                "Basis mirror '{}' has no '{BASIS_GROUP}' group",
                self.path.display()
            );
            return Ok(None);
        }
        let group = h5.group(BASIS_GROUP)?;
        read_basis_group(&group, npix, self.one_based_indices).map(Some)
    }

    fn save(&mut self, basis: &BasisTransform) -> Result<(), BasisError> {
        let _e = hdf5::silence_errors();
        let h5 = hdf5::File::append(&self.path)?;
        if h5.link_exists(BASIS_GROUP) {
            h5.unlink(BASIS_GROUP)?;
        }
        let group = h5.create_group(BASIS_GROUP)?;
        group
            .new_dataset_builder()
            .with_data(basis.forward().as_standard_layout().view())
            .create(FORWARD_DATASET)?;
        // One row per mode.
        group
            .new_dataset_builder()
            .with_data(basis.inverse().t().as_standard_layout().view())
            .create(INVERSE_DATASET)?;
        let indices = Array1::from(basis.unmasked_indices().to_stored(self.one_based_indices));
        group
            .new_dataset_builder()
            .with_data(indices.view())
            .create(INDICES_DATASET)?;
        debug!("Mirrored the basis into '{}'", self.path.display());
        Ok(())
    }
}
