// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Errors associated with all aspects of medea.
 */

use thiserror::Error;

use crate::{
    basis::BasisError, config::ConfigError, decompose::DecomposeError, grid::GridError,
    healpix::HealpixError, mask::HorizonMaskError, reconstruct::ReconstructError,
};

#[derive(Error, Debug)]
pub enum MedeaError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Healpix(#[from] HealpixError),

    #[error(transparent)]
    HorizonMask(#[from] HorizonMaskError),

    #[error(transparent)]
    Basis(#[from] BasisError),

    #[error(transparent)]
    Decompose(#[from] DecomposeError),

    #[error(transparent)]
    Reconstruct(#[from] ReconstructError),

    /// An error associated with the hdf5 crate.
    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),
}
