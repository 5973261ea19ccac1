// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with horizon masks.

use thiserror::Error;

use crate::healpix::HealpixError;

#[derive(Error, Debug)]
pub enum HorizonMaskError {
    #[error("Specified horizon file '{0}' doesn't exist")]
    FileDoesntExist(String),

    #[error("Horizon mask pixel {pixel} is not finite ({value})")]
    NonFinite { pixel: usize, value: f64 },

    #[error("Horizon mask has no pixels above the horizon")]
    NoVisiblePixels,

    #[error("Unmasked index {index} is out of range for a map with {npix} pixels")]
    IndexOutOfRange { index: i64, npix: usize },

    #[error("Unmasked indices must be strictly increasing, but position {position} isn't")]
    IndicesNotIncreasing { position: usize },

    #[error("Got index 0 while reading one-based unmasked indices")]
    ZeroOneBasedIndex,

    #[error("Unexpected shape when reading HDF5 dataset '{key}': expected a 1D array")]
    DatasetShape { key: String },

    #[error(transparent)]
    Healpix(#[from] HealpixError),

    /// An error associated with the hdf5 crate.
    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),
}
