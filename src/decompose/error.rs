// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with decomposing beams.

use thiserror::Error;

use crate::{basis::BasisError, grid::GridError};

#[derive(Error, Debug)]
pub enum DecomposeError {
    #[error("Specified beam file '{0}' doesn't exist")]
    FileDoesntExist(String),

    #[error("No beams are available for hyper-parameter {hyper_parameter} (looked for '{key}')")]
    BatchNotFound { hyper_parameter: f64, key: String },

    #[error("Expected a beam batch of shape ({npix}, {num_freqs}) (pixels, frequencies), but got {got:?}")]
    BatchShape {
        npix: usize,
        num_freqs: usize,
        got: (usize, usize),
    },

    #[error("Beam map has {got} pixels, but the horizon mask has {expected}")]
    MapSize { expected: usize, got: usize },

    #[error("Restricted beam has {got} pixels, but the basis expects {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Can't normalise a beam whose pixels sum to {sum}")]
    DegenerateNormalisation { sum: f64 },

    #[error("Beam pixel {pixel} is not finite ({value})")]
    NonFiniteBeam { pixel: usize, value: f64 },

    #[error("Beam at hyper-parameter {hyper_parameter}, frequency {freq}: {source}")]
    Beam {
        hyper_parameter: f64,
        freq: f64,
        source: Box<DecomposeError>,
    },

    #[error("No coefficients are stored at '{0}'")]
    MissingCoefficients(String),

    #[error("Unexpected shape when reading HDF5 dataset '{key}': expected {expected}")]
    DatasetShape { key: String, expected: &'static str },

    #[error(transparent)]
    Basis(#[from] BasisError),

    #[error(transparent)]
    Grid(#[from] GridError),

    /// An error associated with the hdf5 crate.
    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),
}
