// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with reading back coefficients and rebuilding beams.

use thiserror::Error;

use crate::{basis::BasisError, decompose::DecomposeError};

#[derive(Error, Debug)]
pub enum ReconstructError {
    #[error("Got {got} coefficients, but the basis needs at least {expected}")]
    TooFewCoefficients { expected: usize, got: usize },

    #[error("Coefficients at '{key}' have length {got}, but earlier ones have length {expected}")]
    InconsistentLength {
        key: String,
        expected: usize,
        got: usize,
    },

    #[error(transparent)]
    Basis(#[from] BasisError),

    #[error(transparent)]
    Decompose(#[from] DecomposeError),
}
