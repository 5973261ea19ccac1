// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Decompose a grid of beam maps into Cryo-coefficients.
//!
//! Usage: `medea-decompose [config.toml]`. Without a config file, the default
//! configuration is used. Relative paths are resolved against the directory
//! in the `MEDEA` environment variable (or the current directory). Set
//! `RUST_LOG` to change the verbosity.

use medea::{pipeline, MedeaConfig, MedeaError};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = try_main() {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<(), MedeaError> {
    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Using config '{path}'");
            MedeaConfig::load(path)?
        }
        None => MedeaConfig::default(),
    };
    pipeline::run(&config)?;
    Ok(())
}
