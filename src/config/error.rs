// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with configuration.

use std::path::PathBuf;

use thiserror::Error;

use crate::grid::GridError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot open config file: {1}")]
    Open(#[source] std::io::Error, PathBuf),

    #[error("cannot create config file: {1}")]
    Create(#[source] std::io::Error, PathBuf),

    #[error("cannot read config file: {1}")]
    Read(#[source] std::io::Error, PathBuf),

    #[error("cannot write config file: {1}")]
    Write(#[source] std::io::Error, PathBuf),

    #[error("cannot deserialize config from toml")]
    Load(#[from] toml::de::Error),

    #[error("cannot serialize config into toml")]
    Save(#[from] toml::ser::Error),

    #[error("nside {0} is not a power of two between 1 and 2^29")]
    InvalidNside(u32),

    #[error(transparent)]
    Grid(#[from] GridError),
}
