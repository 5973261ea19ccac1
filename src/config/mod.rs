// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Run configuration.
//!
//! Everything a decomposition run needs to know is kept in a [`MedeaConfig`],
//! which can be saved to and loaded from TOML. Relative paths are resolved
//! against a base path taken from the `MEDEA` environment variable.

mod error;

pub use crate::decompose::ExistingPolicy;
pub use error::ConfigError;

use std::{
    fs::File,
    io::{Read, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    constants::{BASE_PATH_ENV_VAR, DEFAULT_BASE_PATH},
    grid::{Frequencies, HyperParameterGrid},
    healpix::{is_valid_nside, PixelOrdering},
};

/// Evenly spaced hyper-parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub start: f64,
    pub stop: f64,
    pub num: usize,
    /// Each value is rounded to this many decimal places.
    pub decimals: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        // Antenna heights between 1 and 3 metres.
        Self {
            start: 1.0,
            stop: 3.0,
            num: 21,
            decimals: 3,
        }
    }
}

/// Evenly spaced frequencies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrequencyConfig {
    pub start: f64,
    pub stop: f64,
    pub num: usize,
}

impl Default for FrequencyConfig {
    fn default() -> Self {
        Self {
            start: 50.0,
            stop: 99.0,
            num: 50,
        }
    }
}

/// Input and output locations. Relative paths are relative to the base path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// HDF5 file holding the horizon mask.
    pub horizon_file: PathBuf,
    /// Dataset within `horizon_file` holding the mask.
    pub horizon_dataset: String,
    /// Externally built basis artifact.
    pub basis_artifact: PathBuf,
    /// HDF5 mirror of the basis.
    pub basis_hdf5: PathBuf,
    /// HDF5 file holding the beam batches.
    pub beam_file: PathBuf,
    /// HDF5 file the coefficients are written to.
    pub coefficient_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            horizon_file: PathBuf::from("input/flat_horizon_mask.hdf5"),
            horizon_dataset: "horizon".to_string(),
            basis_artifact: PathBuf::from("input/cryo_basis_artifact_flat_horizon_nside32.hdf5"),
            basis_hdf5: PathBuf::from("input/cryo_basis_flat_horizon_nside32.hdf5"),
            beam_file: PathBuf::from("input/beams_horizontal_dipole_PEC.hdf5"),
            coefficient_file: PathBuf::from(
                "input/cryo_coeff_flat_horizon_horizontal_dipole_PEC.hdf5",
            ),
        }
    }
}

impl PathsConfig {
    /// Join every path onto `base`. Absolute paths are left alone.
    pub fn resolve(&self, base: &Path) -> Self {
        Self {
            horizon_file: base.join(&self.horizon_file),
            horizon_dataset: self.horizon_dataset.clone(),
            basis_artifact: base.join(&self.basis_artifact),
            basis_hdf5: base.join(&self.basis_hdf5),
            beam_file: base.join(&self.beam_file),
            coefficient_file: base.join(&self.coefficient_file),
        }
    }
}

/// Configuration for a decomposition run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MedeaConfig {
    /// HEALPix resolution of the mask, basis and beams.
    pub nside: u32,
    /// Pixel ordering of the horizon mask, used when resampling it.
    pub ordering: PixelOrdering,
    /// Normalise each beam to unit total flux before decomposing it.
    pub prenormalize: bool,
    /// Mirror the basis into `paths.basis_hdf5` so it needn't be rebuilt.
    pub save_basis_in_hdf5: bool,
    /// What to do with coefficients left by an earlier run.
    pub existing: ExistingPolicy,
    /// Are the unmasked indices in the basis artifact one-based?
    pub one_based_indices: bool,
    pub hyper_parameters: GridConfig,
    pub frequencies: FrequencyConfig,
    pub paths: PathsConfig,
}

impl Default for MedeaConfig {
    fn default() -> Self {
        Self {
            nside: 32,
            ordering: PixelOrdering::Ring,
            prenormalize: true,
            save_basis_in_hdf5: true,
            existing: ExistingPolicy::Overwrite,
            one_based_indices: true,
            hyper_parameters: GridConfig::default(),
            frequencies: FrequencyConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl MedeaConfig {
    /// Load a configuration from a TOML file. Missing fields take their
    /// default values.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut file =
            File::open(&path).map_err(|e| ConfigError::Open(e, path.as_ref().to_path_buf()))?;
        let mut toml = String::new();
        file.read_to_string(&mut toml)
            .map_err(|e| ConfigError::Read(e, path.as_ref().to_path_buf()))?;
        let config: MedeaConfig = toml::from_str(&toml)?;
        Ok(config)
    }

    /// Save this configuration to a TOML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)?;
        let mut file =
            File::create(&path).map_err(|e| ConfigError::Create(e, path.as_ref().to_path_buf()))?;
        write!(file, "# medea decomposition config\n\n{}", toml)
            .map_err(|e| ConfigError::Write(e, path.as_ref().to_path_buf()))?;
        Ok(())
    }

    /// Check the resolution and build the hyper-parameter grid and frequency
    /// list.
    pub fn validate(&self) -> Result<(HyperParameterGrid, Frequencies), ConfigError> {
        if !is_valid_nside(self.nside) {
            return Err(ConfigError::InvalidNside(self.nside));
        }
        let g = &self.hyper_parameters;
        let grid = HyperParameterGrid::linspace(g.start, g.stop, g.num, g.decimals)?;
        let f = &self.frequencies;
        let freqs = Frequencies::linspace(f.start, f.stop, f.num)?;
        Ok((grid, freqs))
    }

    /// The configured paths, resolved against [`base_path`].
    pub fn resolved_paths(&self) -> PathsConfig {
        self.paths.resolve(&base_path())
    }
}

/// The base path for all relative input and output paths: the value of the
/// `MEDEA` environment variable, or the current directory.
pub fn base_path() -> PathBuf {
    match std::env::var_os(BASE_PATH_ENV_VAR) {
        Some(p) if !p.is_empty() => PathBuf::from(p),
        _ => PathBuf::from(DEFAULT_BASE_PATH),
    }
}
