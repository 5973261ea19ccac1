// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Beam sources and coefficient sinks, backed by HDF5 files or memory.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use log::debug;
use ndarray::prelude::*;

use super::{BeamSource, CoefficientSink, DecomposeError};
use crate::{
    constants::{BASIS_GROUP, COEFFICIENTS_GROUP},
    grid::{Frequencies, HyperParameterGrid},
};

/// Beams stored in an HDF5 file, one (pixels, frequencies) dataset per
/// hyper-parameter, named after the hyper-parameter (e.g. "1.25").
pub struct Hdf5BeamSource {
    /// The [`hdf5::File`] struct associated with the opened HDF5 file.
    hdf5_file: hdf5::File,
}

impl Hdf5BeamSource {
    /// Open the beam file at `file`.
    pub fn new<T: AsRef<Path>>(file: T) -> Result<Self, DecomposeError> {
        // so that libhdf5 doesn't print errors to stdout
        let _e = hdf5::silence_errors();

        // If the file doesn't exist, hdf5::File::open will handle it, but the
        // error message is horrendous.
        if !file.as_ref().exists() {
            return Err(DecomposeError::FileDoesntExist(
                file.as_ref().display().to_string(),
            ));
        }
        Ok(Self {
            hdf5_file: hdf5::File::open(file)?,
        })
    }
}

impl BeamSource for Hdf5BeamSource {
    fn load_batch(&self, hyper_parameter: f64) -> Result<Array2<f64>, DecomposeError> {
        let key = HyperParameterGrid::key(hyper_parameter);
        if !self.hdf5_file.link_exists(&key) {
            return Err(DecomposeError::BatchNotFound {
                hyper_parameter,
                key,
            });
        }
        let ds = self.hdf5_file.dataset(&key)?;
        if ds.ndim() != 2 {
            return Err(DecomposeError::DatasetShape {
                key,
                expected: "a (pixels, frequencies) array",
            });
        }
        let batch = ds.read_2d::<f64>()?;
        debug!("Read beam batch '{key}' with shape {:?}", batch.dim());
        Ok(batch)
    }
}

/// Beams kept in memory, keyed by hyper-parameter.
#[derive(Debug, Default, Clone)]
pub struct MemoryBeamSource(HashMap<String, Array2<f64>>);

impl MemoryBeamSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a (pixels, frequencies) batch for `hyper_parameter`.
    pub fn insert(&mut self, hyper_parameter: f64, batch: Array2<f64>) {
        self.0.insert(HyperParameterGrid::key(hyper_parameter), batch);
    }
}

impl BeamSource for MemoryBeamSource {
    fn load_batch(&self, hyper_parameter: f64) -> Result<Array2<f64>, DecomposeError> {
        let key = HyperParameterGrid::key(hyper_parameter);
        self.0
            .get(&key)
            .cloned()
            .ok_or(DecomposeError::BatchNotFound {
                hyper_parameter,
                key,
            })
    }
}

/// Coefficient vectors in an HDF5 file, laid out as
/// `<hyper-parameter>/coefficients/Freq_<frequency>`.
///
/// The file is held open for as long as this struct lives.
pub struct Hdf5CoefficientStore {
    hdf5_file: hdf5::File,
    path: PathBuf,
}

impl Hdf5CoefficientStore {
    /// Open `file` for reading and writing, creating it if necessary.
    pub fn create<T: AsRef<Path>>(file: T) -> Result<Self, DecomposeError> {
        let _e = hdf5::silence_errors();
        Ok(Self {
            hdf5_file: hdf5::File::append(file.as_ref())?,
            path: file.as_ref().to_path_buf(),
        })
    }

    /// Open an existing `file` read-only.
    pub fn open<T: AsRef<Path>>(file: T) -> Result<Self, DecomposeError> {
        let _e = hdf5::silence_errors();
        if !file.as_ref().exists() {
            return Err(DecomposeError::FileDoesntExist(
                file.as_ref().display().to_string(),
            ));
        }
        Ok(Self {
            hdf5_file: hdf5::File::open(file.as_ref())?,
            path: file.as_ref().to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The names of all hyper-parameter groups in the file. A basis mirrored
    /// into the same file is not one of them.
    pub fn hyper_parameter_keys(&self) -> Result<Vec<String>, DecomposeError> {
        Ok(self
            .hdf5_file
            .groups()?
            .into_iter()
            .map(|g| g.name().trim_start_matches('/').to_string())
            .filter(|k| k != BASIS_GROUP)
            .collect())
    }

    /// The names of the frequency datasets stored for a hyper-parameter group.
    pub fn frequency_keys(&self, hyper_parameter_key: &str) -> Result<Vec<String>, DecomposeError> {
        let group = self.coefficients_group(hyper_parameter_key)?;
        Ok(group.member_names()?)
    }

    fn coefficients_group(&self, hyper_parameter_key: &str) -> Result<hdf5::Group, DecomposeError> {
        let path = format!("{hyper_parameter_key}/{COEFFICIENTS_GROUP}");
        if !self.hdf5_file.link_exists(hyper_parameter_key)
            || !self.hdf5_file.group(hyper_parameter_key)?.link_exists(COEFFICIENTS_GROUP)
        {
            return Err(DecomposeError::MissingCoefficients(path));
        }
        Ok(self.hdf5_file.group(&path)?)
    }

    /// Read the coefficient vector stored under the given keys.
    pub fn read_by_key(
        &self,
        hyper_parameter_key: &str,
        freq_key: &str,
    ) -> Result<Array1<f64>, DecomposeError> {
        let group = self.coefficients_group(hyper_parameter_key)?;
        if !group.link_exists(freq_key) {
            return Err(DecomposeError::MissingCoefficients(format!(
                "{hyper_parameter_key}/{COEFFICIENTS_GROUP}/{freq_key}"
            )));
        }
        let ds = group.dataset(freq_key)?;
        if ds.ndim() != 1 {
            return Err(DecomposeError::DatasetShape {
                key: freq_key.to_string(),
                expected: "a 1D array",
            });
        }
        Ok(ds.read_1d::<f64>()?)
    }

    /// Read the coefficient vector of one (hyper-parameter, frequency) pair.
    pub fn read(&self, hyper_parameter: f64, freq: f64) -> Result<Array1<f64>, DecomposeError> {
        self.read_by_key(
            &HyperParameterGrid::key(hyper_parameter),
            &Frequencies::key(freq),
        )
    }
}

fn require_group(parent: &hdf5::Group, name: &str) -> Result<hdf5::Group, hdf5::Error> {
    if parent.link_exists(name) {
        parent.group(name)
    } else {
        parent.create_group(name)
    }
}

impl CoefficientSink for Hdf5CoefficientStore {
    fn contains(&self, hyper_parameter: f64, freq: f64) -> Result<bool, DecomposeError> {
        match self.read(hyper_parameter, freq) {
            Ok(_) => Ok(true),
            Err(DecomposeError::MissingCoefficients(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn write(
        &mut self,
        hyper_parameter: f64,
        freq: f64,
        coeffs: ArrayView1<f64>,
    ) -> Result<(), DecomposeError> {
        let hp_group = require_group(&self.hdf5_file, &HyperParameterGrid::key(hyper_parameter))?;
        let group = require_group(&hp_group, COEFFICIENTS_GROUP)?;
        let freq_key = Frequencies::key(freq);
        if group.link_exists(&freq_key) {
            group.unlink(&freq_key)?;
        }
        group
            .new_dataset_builder()
            .with_data(coeffs.as_standard_layout().view())
            .create(freq_key.as_str())?;
        Ok(())
    }
}

/// Coefficient vectors kept in memory, keyed the same way as the HDF5 layout.
#[derive(Debug, Default, Clone)]
pub struct MemoryCoefficientStore(BTreeMap<(String, String), Array1<f64>>);

impl MemoryCoefficientStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, hyper_parameter: f64, freq: f64) -> Option<&Array1<f64>> {
        self.0.get(&(
            HyperParameterGrid::key(hyper_parameter),
            Frequencies::key(freq),
        ))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl CoefficientSink for MemoryCoefficientStore {
    fn contains(&self, hyper_parameter: f64, freq: f64) -> Result<bool, DecomposeError> {
        Ok(self.get(hyper_parameter, freq).is_some())
    }

    fn write(
        &mut self,
        hyper_parameter: f64,
        freq: f64,
        coeffs: ArrayView1<f64>,
    ) -> Result<(), DecomposeError> {
        self.0.insert(
            (
                HyperParameterGrid::key(hyper_parameter),
                Frequencies::key(freq),
            ),
            coeffs.to_owned(),
        );
        Ok(())
    }
}
