// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A whole decomposition run, driven by a [`MedeaConfig`].


use log::info;

use crate::{
    basis::{
        resolve_basis, BasisArtifactProvider, BasisStore, BasisTransform, Hdf5BasisStore,
        MemoryBasisStore,
    },
    config::{MedeaConfig, PathsConfig},
    decompose::{DecomposeSummary, Decomposer, Hdf5BeamSource, Hdf5CoefficientStore},
    errors::MedeaError,
    mask::HorizonMask,
};

/// Read the horizon mask and get a basis for it, either from the basis
/// mirror or by reading the basis artifact.
pub fn load_basis(config: &MedeaConfig, paths: &PathsConfig) -> Result<BasisTransform, MedeaError> {
    let mask = HorizonMask::read(
        &paths.horizon_file,
        &paths.horizon_dataset,
        config.nside,
        &config.ordering,
    )?;
    info!(
        "Horizon mask at nside {} leaves {} of {} pixels visible",
        mask.nside(),
        mask.num_visible(),
        mask.npix()
    );

    let provider = BasisArtifactProvider::new(&paths.basis_artifact, config.one_based_indices);
    let mut store: Box<dyn BasisStore> = if config.save_basis_in_hdf5 {
        Box::new(Hdf5BasisStore::new(
            &paths.basis_hdf5,
            config.one_based_indices,
        ))
    } else {
        Box::new(MemoryBasisStore::new())
    };
    Ok(resolve_basis(store.as_mut(), &provider, &mask)?)
}

/// Decompose every beam named by `config`, writing the coefficients to the
/// configured coefficient file. Relative paths are resolved against
/// [`crate::config::base_path`].
pub fn run(config: &MedeaConfig) -> Result<DecomposeSummary, MedeaError> {
    let (grid, freqs) = config.validate()?;
    let paths = config.resolved_paths();

    let basis = load_basis(config, &paths)?;

    let source = Hdf5BeamSource::new(&paths.beam_file)?;
    let mut sink = Hdf5CoefficientStore::create(&paths.coefficient_file)?;
    info!(
        "Decomposing {} hyper-parameters at {} frequencies into '{}'",
        grid.len(),
        freqs.len(),
        sink.path().display()
    );
    let summary = Decomposer::new(&basis, config.prenormalize)
        .with_existing(config.existing)
        .run(&grid, &freqs, &source, &mut sink)?;
    info!(
        "Wrote {} coefficient vectors; skipped {} hyper-parameters",
        summary.written, summary.skipped
    );
    Ok(summary)
}
