// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! This program reads every coefficient vector in the given HDF5 files and
//! checks that they all have the same length and hold only finite values.
//! Writing a coefficient file doesn't check this across runs, so it's worth
//! doing before handing a file to anything downstream.

use medea::decompose::{DecomposeError, Hdf5CoefficientStore};

fn main() {
    // Test each input file.
    for coeff_file in std::env::args().skip(1) {
        match test_file(&coeff_file) {
            Ok(true) => println!("File '{}' is all good!", &coeff_file),
            Ok(false) => println!("File '{}' has problems", &coeff_file),
            Err(e) => println!("File '{}' couldn't be read: {}", &coeff_file, e),
        }
    }
}

fn test_file(coeff_file: &str) -> Result<bool, DecomposeError> {
    println!("Testing file '{}'", coeff_file);
    let store = Hdf5CoefficientStore::open(coeff_file)?;
    let mut num_modes = None;
    let mut good = true;
    for hp_key in store.hyper_parameter_keys()? {
        let freq_keys = match store.frequency_keys(&hp_key) {
            Ok(k) => k,
            Err(DecomposeError::MissingCoefficients(path)) => {
                println!("Group '{}' is missing", path);
                good = false;
                continue;
            }
            Err(e) => return Err(e),
        };
        println!("Testing hyper-parameter {} ({} frequencies)", hp_key, freq_keys.len());
        for freq_key in freq_keys {
            let coeffs = store.read_by_key(&hp_key, &freq_key)?;
            let expected = *num_modes.get_or_insert(coeffs.len());
            if coeffs.len() != expected {
                println!(
                    "{}/{} has {} coefficients, but expected {}",
                    hp_key,
                    freq_key,
                    coeffs.len(),
                    expected
                );
                good = false;
            }
            if coeffs.iter().any(|c| !c.is_finite()) {
                println!("{}/{} has non-finite coefficients", hp_key, freq_key);
                good = false;
            }
        }
    }
    Ok(good)
}
