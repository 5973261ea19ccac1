// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Decompose antenna beam maps into Cryo-coefficients.

A horizon mask selects the visible-sky pixels of a HEALPix map. A basis
restricted to those pixels turns every beam map into a short coefficient
vector, one per (hyper-parameter, frequency) pair, which is written to an HDF5
file for a downstream emulator to interpolate.
 */

pub mod basis;
pub mod config;
mod constants;
pub mod decompose;
pub mod errors;
pub mod grid;
pub mod healpix;
pub mod mask;
pub mod pipeline;
pub mod reconstruct;

pub use basis::{resolve_basis, BasisError, BasisProvider, BasisStore, BasisTransform};
pub use config::{ConfigError, ExistingPolicy, MedeaConfig};
pub use constants::*;
pub use decompose::{BeamSource, CoefficientSink, DecomposeError, Decomposer};
pub use errors::*;
pub use grid::{Frequencies, HyperParameterGrid};
pub use mask::{HorizonMask, HorizonMaskError, UnmaskedIndices};
pub use reconstruct::{BeamReconstructor, ReconstructError};
