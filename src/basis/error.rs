// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with bases.

use thiserror::Error;

use crate::mask::HorizonMaskError;

#[derive(Error, Debug)]
pub enum BasisError {
    #[error("Specified basis file '{0}' doesn't exist")]
    FileDoesntExist(String),

    #[error("The {which} transform has shape {got:?}, but {expected:?} was expected")]
    TransformShape {
        which: &'static str,
        expected: (usize, usize),
        got: (usize, usize),
    },

    #[error("Expected a vector of length {expected}, but got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("The basis was built over {got} unmasked pixels, but the horizon mask leaves {expected} visible")]
    IndicesCountMismatch { expected: usize, got: usize },

    #[error("The basis and the horizon mask disagree on which pixels are unmasked (first difference at position {position})")]
    IndicesMismatch { position: usize },

    #[error("The basis and the horizon mask are for maps of different sizes ({got} vs. {expected} pixels)")]
    NpixMismatch { expected: usize, got: usize },

    #[error("Can't invert a {rows}x{cols} transform; it isn't square")]
    NotSquare { rows: usize, cols: usize },

    #[error("The transform to map is singular and can't be inverted")]
    Singular,

    #[error("Can't truncate a basis with {num_modes} modes to {order} modes")]
    TruncationOrder { order: usize, num_modes: usize },

    #[error("Unexpected shape when reading HDF5 dataset '{key}': expected {expected}")]
    DatasetShape { key: String, expected: &'static str },

    #[error(transparent)]
    Mask(#[from] HorizonMaskError),

    /// An error associated with the hdf5 crate.
    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),
}
