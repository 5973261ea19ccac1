// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tests for beam decomposition.

use approx::assert_abs_diff_eq;
use tempfile::TempDir;

use super::*;

/// Pixels 0, 2 and 4 of a 5-pixel map are visible.
fn indices_024() -> UnmaskedIndices {
    UnmaskedIndices::new(vec![0, 2, 4], 5).unwrap()
}

fn forward_2x3() -> Array2<f64> {
    array![[1.0, 2.0, 3.0], [0.5, -1.0, 4.0]]
}

fn basis_2x3() -> BasisTransform {
    // The inverse isn't used by decomposition; it only needs the right shape.
    BasisTransform::new(forward_2x3(), Array2::zeros((3, 2)), indices_024()).unwrap()
}

#[test]
fn test_normalise() {
    let map = array![4.0, 1.0, 0.0, 1.0, 1.0];
    let normalised = normalise(map.view()).unwrap();
    assert_abs_diff_eq!(
        normalised,
        array![4.0 / 7.0, 1.0 / 7.0, 0.0, 1.0 / 7.0, 1.0 / 7.0]
    );
    assert_abs_diff_eq!(normalised.sum(), 1.0, epsilon = 1e-15);

    // Normalising again changes nothing.
    let again = normalise(normalised.view()).unwrap();
    assert_abs_diff_eq!(again, normalised, epsilon = 1e-15);
}

#[test]
fn test_normalise_zero_sum() {
    let result = normalise(Array1::zeros(5).view());
    assert!(matches!(
        result,
        Err(DecomposeError::DegenerateNormalisation { .. })
    ));
    // Positive and negative pixels cancelling out is just as bad.
    let result = normalise(array![1.0, -1.0].view());
    assert!(matches!(
        result,
        Err(DecomposeError::DegenerateNormalisation { .. })
    ));
}

#[test]
fn test_restrict() {
    let map = array![4.0, 1.0, 0.0, 1.0, 1.0];
    let reduced = restrict(map.view(), &indices_024(), 3).unwrap();
    assert_abs_diff_eq!(reduced, array![4.0, 0.0, 1.0]);

    assert!(matches!(
        restrict(map.view(), &indices_024(), 4),
        Err(DecomposeError::DimensionMismatch {
            expected: 4,
            got: 3
        })
    ));
    assert!(matches!(
        restrict(array![1.0, 2.0].view(), &indices_024(), 3),
        Err(DecomposeError::MapSize {
            expected: 5,
            got: 2
        })
    ));
}

#[test]
fn test_decompose_beam_normalised() {
    let basis = basis_2x3();
    let decomposer = Decomposer::new(&basis, true);
    let coeffs = decomposer
        .decompose_beam(array![4.0, 1.0, 0.0, 1.0, 1.0].view())
        .unwrap();
    let expected = forward_2x3().dot(&array![4.0 / 7.0, 0.0, 1.0 / 7.0]);
    assert_abs_diff_eq!(coeffs, expected, epsilon = 1e-12);
}

#[test]
fn test_decompose_beam_raw() {
    let basis = basis_2x3();
    let decomposer = Decomposer::new(&basis, false);
    let coeffs = decomposer
        .decompose_beam(array![4.0, 1.0, 0.0, 1.0, 1.0].view())
        .unwrap();
    assert_abs_diff_eq!(coeffs, array![7.0, 6.0]);
}

#[test]
fn test_decompose_beam_rejects_nan() {
    let basis = basis_2x3();
    let decomposer = Decomposer::new(&basis, false);
    let result = decomposer.decompose_beam(array![4.0, f64::NAN, 0.0, 1.0, 1.0].view());
    assert!(matches!(
        result,
        Err(DecomposeError::NonFiniteBeam { pixel: 1, .. })
    ));
}

#[test]
fn test_decompose_batch_shape() {
    let basis = basis_2x3();
    let decomposer = Decomposer::new(&basis, true);
    let freqs = Frequencies::new(vec![50.0, 51.0]).unwrap();
    let result = decomposer.decompose_batch(1.0, Array2::ones((5, 3)).view(), &freqs);
    assert!(matches!(
        result,
        Err(DecomposeError::BatchShape {
            npix: 5,
            num_freqs: 2,
            got: (5, 3)
        })
    ));
}

#[test]
fn test_decompose_batch_names_the_bad_beam() {
    let basis = basis_2x3();
    let decomposer = Decomposer::new(&basis, true);
    let freqs = Frequencies::new(vec![50.0, 51.0]).unwrap();
    let mut batch = Array2::<f64>::ones((5, 2));
    batch.column_mut(1).fill(0.0);
    let result = decomposer.decompose_batch(1.5, batch.view(), &freqs);
    match result {
        Err(DecomposeError::Beam {
            hyper_parameter,
            freq,
            source,
        }) => {
            assert_abs_diff_eq!(hyper_parameter, 1.5);
            assert_abs_diff_eq!(freq, 51.0);
            assert!(matches!(
                *source,
                DecomposeError::DegenerateNormalisation { .. }
            ));
        }
        _ => panic!("expected a degenerate normalisation"),
    }
}

fn two_beam_source(grid: &HyperParameterGrid) -> MemoryBeamSource {
    let mut source = MemoryBeamSource::new();
    for (i, &hp) in grid.values().iter().enumerate() {
        let scale = (i + 1) as f64;
        let batch = array![
            [4.0 * scale, 1.0],
            [1.0, 1.0],
            [0.0, 2.0],
            [1.0, 1.0],
            [1.0 * scale, 3.0]
        ];
        source.insert(hp, batch);
    }
    source
}

#[test]
fn test_run_writes_every_pair() {
    let basis = basis_2x3();
    let grid = HyperParameterGrid::new(vec![1.0, 1.1]).unwrap();
    let freqs = Frequencies::new(vec![50.0, 51.0]).unwrap();
    let source = two_beam_source(&grid);
    let mut sink = MemoryCoefficientStore::new();

    let summary = Decomposer::new(&basis, true)
        .run(&grid, &freqs, &source, &mut sink)
        .unwrap();
    assert_eq!(summary.written, 4);
    assert_eq!(summary.skipped, 0);
    assert_eq!(sink.len(), 4);

    let expected = forward_2x3().dot(&array![4.0 / 7.0, 0.0, 1.0 / 7.0]);
    assert_abs_diff_eq!(*sink.get(1.0, 50.0).unwrap(), expected, epsilon = 1e-12);
    let expected = forward_2x3().dot(&array![1.0 / 8.0, 2.0 / 8.0, 3.0 / 8.0]);
    assert_abs_diff_eq!(*sink.get(1.1, 51.0).unwrap(), expected, epsilon = 1e-12);
}

#[test]
fn test_run_is_deterministic() {
    let basis = basis_2x3();
    let grid = HyperParameterGrid::new(vec![1.0, 1.1]).unwrap();
    let freqs = Frequencies::new(vec![50.0, 51.0]).unwrap();
    let source = two_beam_source(&grid);

    let mut first = MemoryCoefficientStore::new();
    let mut second = MemoryCoefficientStore::new();
    let decomposer = Decomposer::new(&basis, true);
    decomposer.run(&grid, &freqs, &source, &mut first).unwrap();
    decomposer.run(&grid, &freqs, &source, &mut second).unwrap();
    for &hp in grid.values() {
        for &f in freqs.values() {
            assert_eq!(first.get(hp, f), second.get(hp, f));
        }
    }
}

#[test]
fn test_run_missing_batch_writes_nothing_for_it() {
    let basis = basis_2x3();
    let grid = HyperParameterGrid::new(vec![1.0, 1.1]).unwrap();
    let freqs = Frequencies::new(vec![50.0, 51.0]).unwrap();
    // Only the first hyper-parameter has beams.
    let source = two_beam_source(&HyperParameterGrid::new(vec![1.0]).unwrap());
    let mut sink = MemoryCoefficientStore::new();

    let result = Decomposer::new(&basis, true).run(&grid, &freqs, &source, &mut sink);
    match result {
        Err(DecomposeError::BatchNotFound { key, .. }) => assert_eq!(key, "1.1"),
        _ => panic!("expected a missing batch"),
    }
    assert!(sink.get(1.0, 50.0).is_some());
    assert!(sink.get(1.1, 50.0).is_none());
    assert!(sink.get(1.1, 51.0).is_none());
}

#[test]
fn test_run_bad_beam_writes_nothing_for_its_hyper_parameter() {
    let basis = basis_2x3();
    let grid = HyperParameterGrid::new(vec![2.0]).unwrap();
    let freqs = Frequencies::new(vec![50.0, 51.0]).unwrap();
    let mut source = MemoryBeamSource::new();
    let mut batch = Array2::<f64>::ones((5, 2));
    batch.column_mut(1).fill(0.0);
    source.insert(2.0, batch);
    let mut sink = MemoryCoefficientStore::new();

    let result = Decomposer::new(&basis, true).run(&grid, &freqs, &source, &mut sink);
    assert!(matches!(result, Err(DecomposeError::Beam { .. })));
    assert!(sink.is_empty());
}

#[test]
fn test_run_skips_existing() {
    let basis = basis_2x3();
    let grid = HyperParameterGrid::new(vec![1.0, 1.1]).unwrap();
    let freqs = Frequencies::new(vec![50.0, 51.0]).unwrap();
    let source = two_beam_source(&grid);
    let mut sink = MemoryCoefficientStore::new();
    sink.write(1.0, 50.0, array![-1.0, -1.0].view()).unwrap();
    sink.write(1.0, 51.0, array![-1.0, -1.0].view()).unwrap();
    // Only one of 1.1's frequencies is present, so it gets redone.
    sink.write(1.1, 50.0, array![-1.0, -1.0].view()).unwrap();

    let summary = Decomposer::new(&basis, true)
        .with_existing(ExistingPolicy::Skip)
        .run(&grid, &freqs, &source, &mut sink)
        .unwrap();
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.written, 2);
    assert_abs_diff_eq!(*sink.get(1.0, 50.0).unwrap(), array![-1.0, -1.0]);
    assert!(sink.get(1.1, 50.0).unwrap()[0] != -1.0);
}

#[test]
fn test_hdf5_round_trip_layout() {
    let dir = TempDir::new().unwrap();
    let beam_path = dir.path().join("beams.h5");
    {
        let h5 = hdf5::File::create(&beam_path).unwrap();
        let batch = array![[4.0], [1.0], [0.0], [1.0], [1.0]];
        h5.new_dataset_builder()
            .with_data(batch.view())
            .create("2.5")
            .unwrap();
    }
    let coeff_path = dir.path().join("coefficients.h5");

    let basis = basis_2x3();
    let grid = HyperParameterGrid::new(vec![2.5]).unwrap();
    let freqs = Frequencies::new(vec![60.0]).unwrap();
    let source = Hdf5BeamSource::new(&beam_path).unwrap();
    {
        let mut sink = Hdf5CoefficientStore::create(&coeff_path).unwrap();
        Decomposer::new(&basis, true)
            .run(&grid, &freqs, &source, &mut sink)
            .unwrap();
        // Running again overwrites in place.
        Decomposer::new(&basis, true)
            .run(&grid, &freqs, &source, &mut sink)
            .unwrap();
    }

    let expected = forward_2x3().dot(&array![4.0 / 7.0, 0.0, 1.0 / 7.0]);
    let h5 = hdf5::File::open(&coeff_path).unwrap();
    let stored = h5
        .dataset("2.5/coefficients/Freq_60")
        .unwrap()
        .read_1d::<f64>()
        .unwrap();
    assert_eq!(stored, expected);

    let store = Hdf5CoefficientStore::open(&coeff_path).unwrap();
    assert_eq!(store.hyper_parameter_keys().unwrap(), vec!["2.5".to_string()]);
    assert_eq!(store.frequency_keys("2.5").unwrap(), vec!["Freq_60".to_string()]);
    assert!(store.contains(2.5, 60.0).unwrap());
    assert!(!store.contains(2.5, 61.0).unwrap());
    assert!(!store.contains(3.0, 60.0).unwrap());
}

#[test]
fn test_hdf5_beam_source_missing_batch() {
    let dir = TempDir::new().unwrap();
    let beam_path = dir.path().join("beams.h5");
    hdf5::File::create(&beam_path).unwrap();
    let source = Hdf5BeamSource::new(&beam_path).unwrap();
    assert!(matches!(
        source.load_batch(1.0),
        Err(DecomposeError::BatchNotFound { .. })
    ));
    assert!(matches!(
        Hdf5BeamSource::new(dir.path().join("nope.h5")),
        Err(DecomposeError::FileDoesntExist(_))
    ));
}
