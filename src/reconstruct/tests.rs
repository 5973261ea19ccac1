// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tests for coefficient readback and beam reconstruction.

use approx::assert_abs_diff_eq;
use tempfile::TempDir;

use super::*;
use crate::{
    decompose::{CoefficientSink, DecomposeError, Decomposer, MemoryBeamSource},
    mask::UnmaskedIndices,
};

fn orthogonal_basis() -> BasisTransform {
    let (s, c) = 0.4_f64.sin_cos();
    let q = array![[c, 0.0, -s], [0.0, 1.0, 0.0], [s, 0.0, c]];
    let indices = UnmaskedIndices::new(vec![0, 2, 4], 5).unwrap();
    BasisTransform::new(q.t().to_owned(), q, indices).unwrap()
}

#[test]
fn test_full_sky_recovers_visible_beam() {
    let basis = orthogonal_basis();
    // Nothing below the horizon, so the beam is fully representable.
    let beam = array![3.0, 0.0, 1.5, 0.0, -0.5];
    let coeffs = Decomposer::new(&basis, false)
        .decompose_beam(beam.view())
        .unwrap();

    let reconstructor = BeamReconstructor::new(&basis, None).unwrap();
    assert_eq!(reconstructor.order(), 3);
    let full = reconstructor.full_sky(coeffs.view()).unwrap();
    assert_abs_diff_eq!(full, beam, epsilon = 1e-12);
    let above = reconstructor.above_horizon(coeffs.view()).unwrap();
    assert_abs_diff_eq!(above, array![3.0, 1.5, -0.5], epsilon = 1e-12);
}

#[test]
fn test_below_horizon_is_zeroed() {
    let basis = orthogonal_basis();
    let beam = array![3.0, 7.0, 1.5, 7.0, -0.5];
    let coeffs = Decomposer::new(&basis, false)
        .decompose_beam(beam.view())
        .unwrap();
    let full = BeamReconstructor::new(&basis, None)
        .unwrap()
        .full_sky(coeffs.view())
        .unwrap();
    assert_abs_diff_eq!(full, array![3.0, 0.0, 1.5, 0.0, -0.5], epsilon = 1e-12);
}

#[test]
fn test_truncated_reconstruction_ignores_extra_modes() {
    let basis = orthogonal_basis();
    let reconstructor = BeamReconstructor::new(&basis, Some(1)).unwrap();
    assert_eq!(reconstructor.order(), 1);

    let a = reconstructor.above_horizon(array![2.0, 0.0, 0.0].view()).unwrap();
    let b = reconstructor.above_horizon(array![2.0, 9.0, -9.0].view()).unwrap();
    assert_abs_diff_eq!(a, b);
    assert_abs_diff_eq!(a, basis.inverse().column(0).mapv(|v| 2.0 * v), epsilon = 1e-12);

    assert!(matches!(
        reconstructor.above_horizon(Array1::zeros(0).view()),
        Err(ReconstructError::TooFewCoefficients {
            expected: 1,
            got: 0
        })
    ));
    assert!(BeamReconstructor::new(&basis, Some(4)).is_err());
}

#[test]
fn test_full_sky_batch() {
    let basis = orthogonal_basis();
    let reconstructor = BeamReconstructor::new(&basis, None).unwrap();
    let coeffs = array![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
    let maps = reconstructor.full_sky_batch(coeffs.view()).unwrap();
    assert_eq!(maps.dim(), (2, 5));
    assert_abs_diff_eq!(maps.row(1), array![0.0, 0.0, 1.0, 0.0, 0.0], epsilon = 1e-12);
}

#[test]
fn test_read_coefficient_grid() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("coefficients.h5");
    let basis = orthogonal_basis();
    let grid = HyperParameterGrid::new(vec![1.0, 1.5]).unwrap();
    let freqs = Frequencies::new(vec![50.0, 51.0, 52.0]).unwrap();

    let mut source = MemoryBeamSource::new();
    source.insert(1.0, Array2::from_shape_fn((5, 3), |(p, f)| (p + f + 1) as f64));
    source.insert(1.5, Array2::from_shape_fn((5, 3), |(p, f)| (2 * p + f + 1) as f64));
    {
        let mut sink = Hdf5CoefficientStore::create(&path).unwrap();
        Decomposer::new(&basis, true)
            .run(&grid, &freqs, &source, &mut sink)
            .unwrap();
    }

    let store = Hdf5CoefficientStore::open(&path).unwrap();
    let all = read_coefficient_grid(&store, &grid, &freqs).unwrap();
    assert_eq!(all.dim(), (2, 3, 3));
    assert_eq!(all.slice(s![1, 2, ..]), store.read(1.5, 52.0).unwrap());

    // Asking for a frequency that was never written fails.
    let more_freqs = Frequencies::new(vec![50.0, 53.0]).unwrap();
    assert!(matches!(
        read_coefficient_grid(&store, &grid, &more_freqs),
        Err(ReconstructError::Decompose(DecomposeError::MissingCoefficients(_)))
    ));
}

#[test]
fn test_read_coefficient_grid_inconsistent_lengths() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("coefficients.h5");
    {
        let mut sink = Hdf5CoefficientStore::create(&path).unwrap();
        sink.write(1.0, 50.0, array![1.0, 2.0].view()).unwrap();
        sink.write(1.0, 51.0, array![1.0, 2.0, 3.0].view()).unwrap();
    }
    let store = Hdf5CoefficientStore::open(&path).unwrap();
    let grid = HyperParameterGrid::new(vec![1.0]).unwrap();
    let freqs = Frequencies::new(vec![50.0, 51.0]).unwrap();
    match read_coefficient_grid(&store, &grid, &freqs) {
        Err(ReconstructError::InconsistentLength { key, expected, got }) => {
            assert_eq!(key, "1.0/Freq_51");
            assert_eq!(expected, 2);
            assert_eq!(got, 3);
        }
        _ => panic!("expected inconsistent lengths"),
    }
}
