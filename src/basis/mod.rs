// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Bases restricted to the pixels above a horizon.
//!
//! A basis is a pair of dense matrices. The forward transform takes the
//! unmasked pixel values of a beam map to Cryo-coefficients, and the inverse
//! transform takes Cryo-coefficients back to unmasked pixel values. Building
//! a basis is somebody else's job; this module only defines what a basis
//! looks like, how to get one ([`BasisProvider`]) and how to keep one around
//! so that it isn't built twice ([`BasisStore`], [`resolve_basis`]).

mod artifact;
mod error;
mod store;

pub use artifact::BasisArtifactProvider;
pub use error::BasisError;
pub use store::{Hdf5BasisStore, MemoryBasisStore};

use log::{debug, info};
use ndarray::prelude::*;

use crate::mask::{HorizonMask, UnmaskedIndices};

/// A forward and inverse transform pair over a set of unmasked pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct BasisTransform {
    /// Shape: (number of modes, number of unmasked pixels).
    forward: Array2<f64>,
    /// Shape: (number of unmasked pixels, number of modes).
    inverse: Array2<f64>,
    indices: UnmaskedIndices,
}

impl BasisTransform {
    /// Create a new [`BasisTransform`]. The shapes of `forward` and `inverse`
    /// must agree with each other and with the number of `indices`.
    pub fn new(
        forward: Array2<f64>,
        inverse: Array2<f64>,
        indices: UnmaskedIndices,
    ) -> Result<Self, BasisError> {
        let num_modes = forward.nrows();
        let num_unmasked = indices.len();
        if forward.ncols() != num_unmasked {
            return Err(BasisError::TransformShape {
                which: "forward",
                expected: (num_modes, num_unmasked),
                got: forward.dim(),
            });
        }
        if inverse.dim() != (num_unmasked, num_modes) {
            return Err(BasisError::TransformShape {
                which: "inverse",
                expected: (num_unmasked, num_modes),
                got: inverse.dim(),
            });
        }
        Ok(Self {
            forward,
            inverse,
            indices,
        })
    }

    pub fn num_modes(&self) -> usize {
        self.forward.nrows()
    }

    pub fn num_unmasked(&self) -> usize {
        self.indices.len()
    }

    pub fn forward(&self) -> ArrayView2<f64> {
        self.forward.view()
    }

    pub fn inverse(&self) -> ArrayView2<f64> {
        self.inverse.view()
    }

    pub fn unmasked_indices(&self) -> &UnmaskedIndices {
        &self.indices
    }

    /// Apply the forward transform to the unmasked pixel values of a beam.
    pub fn to_coefficients(&self, reduced: ArrayView1<f64>) -> Result<Array1<f64>, BasisError> {
        if reduced.len() != self.num_unmasked() {
            return Err(BasisError::DimensionMismatch {
                expected: self.num_unmasked(),
                got: reduced.len(),
            });
        }
        Ok(self.forward.dot(&reduced))
    }

    /// Apply the inverse transform to coefficients, producing unmasked pixel
    /// values.
    pub fn to_map(&self, coeffs: ArrayView1<f64>) -> Result<Array1<f64>, BasisError> {
        if coeffs.len() != self.num_modes() {
            return Err(BasisError::DimensionMismatch {
                expected: self.num_modes(),
                got: coeffs.len(),
            });
        }
        Ok(self.inverse.dot(&coeffs))
    }

    /// Keep only the first `order` modes.
    pub fn truncated(&self, order: usize) -> Result<Self, BasisError> {
        if order == 0 || order > self.num_modes() {
            return Err(BasisError::TruncationOrder {
                order,
                num_modes: self.num_modes(),
            });
        }
        Ok(Self {
            forward: self.forward.slice(s![..order, ..]).to_owned(),
            inverse: self.inverse.slice(s![.., ..order]).to_owned(),
            indices: self.indices.clone(),
        })
    }

    /// Check that this basis was built over exactly `expected`.
    pub fn check_indices(&self, expected: &UnmaskedIndices) -> Result<(), BasisError> {
        if self.indices.npix() != expected.npix() {
            return Err(BasisError::NpixMismatch {
                expected: expected.npix(),
                got: self.indices.npix(),
            });
        }
        if self.indices.len() != expected.len() {
            return Err(BasisError::IndicesCountMismatch {
                expected: expected.len(),
                got: self.indices.len(),
            });
        }
        match self
            .indices
            .as_slice()
            .iter()
            .zip(expected.as_slice())
            .position(|(a, b)| a != b)
        {
            Some(position) => Err(BasisError::IndicesMismatch { position }),
            None => Ok(()),
        }
    }
}

/// Something that can build a basis for a horizon mask.
pub trait BasisProvider {
    fn build(&self, mask: &HorizonMask) -> Result<BasisTransform, BasisError>;
}

impl<F> BasisProvider for F
where
    F: Fn(&HorizonMask) -> Result<BasisTransform, BasisError>,
{
    fn build(&self, mask: &HorizonMask) -> Result<BasisTransform, BasisError> {
        self(mask)
    }
}

/// Somewhere a built basis can be kept.
pub trait BasisStore {
    /// Get the stored basis, if there is one. `npix` is the number of pixels
    /// in the full maps the basis applies to.
    fn load(&self, npix: usize) -> Result<Option<BasisTransform>, BasisError>;

    /// Store a basis, replacing whatever was there.
    fn save(&mut self, basis: &BasisTransform) -> Result<(), BasisError>;
}

/// Get the basis for `mask` from `store`, building it with `provider` (and
/// saving it to `store`) if the store is empty. Whichever way the basis is
/// obtained, it must be defined over exactly the mask's unmasked pixels.
pub fn resolve_basis<S, P>(
    store: &mut S,
    provider: &P,
    mask: &HorizonMask,
) -> Result<BasisTransform, BasisError>
where
    S: BasisStore + ?Sized,
    P: BasisProvider + ?Sized,
{
    let expected = mask.unmasked_indices()?;

    if let Some(basis) = store.load(mask.npix())? {
        basis.check_indices(&expected)?;
        info!(
            "Loaded a cached basis with {} modes over {} unmasked pixels",
            basis.num_modes(),
            basis.num_unmasked()
        );
        return Ok(basis);
    }

    debug!("No cached basis; building one");
    let basis = provider.build(mask)?;
    basis.check_indices(&expected)?;
    store.save(&basis)?;
    info!(
        "Built and cached a basis with {} modes over {} unmasked pixels",
        basis.num_modes(),
        basis.num_unmasked()
    );
    Ok(basis)
}
