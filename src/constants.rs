// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Useful constants.
 */

/// The environment variable consulted for the base path of all input and
/// output files.
pub const BASE_PATH_ENV_VAR: &str = "MEDEA";

/// The base path used when [`BASE_PATH_ENV_VAR`] isn't set.
pub const DEFAULT_BASE_PATH: &str = ".";

/// The HDF5 group holding a basis (both in a mirror file and in an externally
/// built basis artifact).
pub const BASIS_GROUP: &str = "Basis";

/// Dataset holding the forward transform (modes x unmasked pixels).
pub const FORWARD_DATASET: &str = "Transform_to_coefficients";

/// Dataset holding the inverse transform, stored one row per mode
/// (modes x unmasked pixels).
pub const INVERSE_DATASET: &str = "Transform_to_map";

/// Dataset holding the unmasked pixel indices, usually one-based.
pub const INDICES_DATASET: &str = "nonmasked_indices";

/// The subgroup of each hyper-parameter group holding coefficient vectors.
pub const COEFFICIENTS_GROUP: &str = "coefficients";

/// The prefix of each per-frequency coefficient dataset.
pub const FREQ_PREFIX: &str = "Freq_";
