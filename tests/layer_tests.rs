//! Integration tests for the classifier layer.
//!
//! These tests pin down the numeric semantics of the core:
//! - One-hot target encoding
//! - Forward computation (binarized masked sum, normalized by N)
//! - The incremental weight update rule
//! - Prediction and tie-breaking

use approx::assert_abs_diff_eq;
use mnist_1lnn::{encode_target, Layer, Mode, Sample};
use ndarray::array;

#[test]
fn test_encode_target_all_labels() {
    let classes = 10;
    for label in 0..classes {
        let target = encode_target(label, classes).expect("valid label");
        assert_eq!(target.len(), classes);
        assert_eq!(target[label], 1.0);
        assert_abs_diff_eq!(target.sum(), 1.0);
        for (i, &v) in target.iter().enumerate() {
            assert!(v == 0.0 || v == 1.0);
            if i != label {
                assert_eq!(v, 0.0);
            }
        }
    }
}

#[test]
fn test_output_stays_in_unit_interval() {
    // With weights in [0, 1) the output is an average of at most N weights
    // each below 1, so it must land in [0, 1].
    let mut layer = Layer::new(10, 784, Some(99)).unwrap();
    let all_on = vec![255u8; 784];
    let all_off = vec![0u8; 784];

    for cell in 0..10 {
        let out = layer.compute_cell(cell, &all_on).unwrap();
        assert!((0.0..=1.0).contains(&out), "output {} out of range", out);

        let out = layer.compute_cell(cell, &all_off).unwrap();
        assert_eq!(out, 0.0);
    }
}

#[test]
fn test_compute_cell_is_idempotent() {
    // Inference has no side effect on weights: recomputing with the same
    // image yields the identical output.
    let mut layer = Layer::new(3, 16, Some(5)).unwrap();
    let pixels: Vec<u8> = (0..16).map(|i| (i % 3) as u8).collect();

    let first = layer.compute_cell(1, &pixels).unwrap();
    let second = layer.compute_cell(1, &pixels).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_update_moves_weights_toward_target() {
    // For every active position the weight moves in the direction of
    // (target - output); inactive positions stay put exactly.
    let mut layer = Layer::new(1, 4, Some(3)).unwrap();
    let pixels = [1u8, 0, 1, 0];

    let output = layer.compute_cell(0, &pixels).unwrap();
    let before = layer.weights(0).unwrap().clone();

    let target = 1.0f32;
    layer.update_cell(0, target, 0.5).unwrap();
    let after = layer.weights(0).unwrap();

    let err = target - output;
    for j in [0usize, 2] {
        let delta = after[j] - before[j];
        assert_eq!(delta.signum(), err.signum());
        assert_abs_diff_eq!(delta, err * 0.5, epsilon = 1e-6);
    }
    for j in [1usize, 3] {
        assert_eq!(after[j], before[j]);
    }
}

#[test]
fn test_update_is_noop_when_target_matches_output() {
    let mut layer = Layer::new(1, 2, Some(0)).unwrap();
    layer.set_weights(0, array![0.5, 0.5]).unwrap();

    let output = layer.compute_cell(0, &[1, 1]).unwrap();
    let before = layer.weights(0).unwrap().clone();
    layer.update_cell(0, output, 1.0).unwrap();

    assert_eq!(layer.weights(0).unwrap(), &before);
}

/// End-to-end check of one training step with hand-picked weights.
///
/// N=4, C=2, image [1,0,1,0], label 1, learning rate 1.0:
/// - cell 0 ([0.5; 4]): output (0.5+0.5)/4 = 0.25, wins the pre-update
///   prediction over cell 1 ([0.2; 4]) at (0.2+0.2)/4 = 0.1
/// - after the update toward target [0, 1]: cell 0's active weights drop
///   to 0.25 (error -0.25), cell 1's rise to 1.1 (error 0.9)
#[test]
fn test_single_training_step_exact_values() {
    let mut layer = Layer::new(2, 4, Some(0)).unwrap();
    layer.set_weights(0, array![0.5, 0.5, 0.5, 0.5]).unwrap();
    layer.set_weights(1, array![0.2, 0.2, 0.2, 0.2]).unwrap();

    let pixels = [1u8, 0, 1, 0];

    let out0 = layer.compute_cell(0, &pixels).unwrap();
    let out1 = layer.compute_cell(1, &pixels).unwrap();
    assert_abs_diff_eq!(out0, 0.25);
    assert_abs_diff_eq!(out1, 0.1, epsilon = 1e-6);
    assert_eq!(layer.predict(), 0);

    let target = encode_target(1, 2).unwrap();
    layer.update_cell(0, target[0], 1.0).unwrap();
    layer.update_cell(1, target[1], 1.0).unwrap();

    let w0 = layer.weights(0).unwrap();
    let w1 = layer.weights(1).unwrap();
    assert_abs_diff_eq!(w0[0], 0.25, epsilon = 1e-6);
    assert_abs_diff_eq!(w0[2], 0.25, epsilon = 1e-6);
    assert_abs_diff_eq!(w0[1], 0.5);
    assert_abs_diff_eq!(w0[3], 0.5);
    assert_abs_diff_eq!(w1[0], 1.1, epsilon = 1e-6);
    assert_abs_diff_eq!(w1[2], 1.1, epsilon = 1e-6);
    assert_abs_diff_eq!(w1[1], 0.2);
    assert_abs_diff_eq!(w1[3], 0.2);
}

#[test]
fn test_run_sample_matches_per_cell_calls() {
    // The parallel per-sample path must produce the same weights and
    // prediction as the explicit compute/update sequence.
    let sample = Sample {
        pixels: vec![1, 0, 1, 0],
        label: 1,
    };

    let mut by_hand = Layer::new(2, 4, Some(0)).unwrap();
    by_hand.set_weights(0, array![0.5, 0.5, 0.5, 0.5]).unwrap();
    by_hand.set_weights(1, array![0.2, 0.2, 0.2, 0.2]).unwrap();
    let target = encode_target(sample.label as usize, 2).unwrap();
    for cell in 0..2 {
        by_hand.compute_cell(cell, &sample.pixels).unwrap();
        by_hand.update_cell(cell, target[cell], 1.0).unwrap();
    }

    let mut fused = Layer::new(2, 4, Some(0)).unwrap();
    fused.set_weights(0, array![0.5, 0.5, 0.5, 0.5]).unwrap();
    fused.set_weights(1, array![0.2, 0.2, 0.2, 0.2]).unwrap();
    let predicted = fused
        .run_sample(&sample, Mode::Train { learning_rate: 1.0 })
        .unwrap();

    assert_eq!(predicted, by_hand.predict());
    for cell in 0..2 {
        assert_eq!(fused.weights(cell).unwrap(), by_hand.weights(cell).unwrap());
    }
}

#[test]
fn test_predict_returns_valid_index() {
    let mut layer = Layer::new(10, 784, Some(11)).unwrap();
    let sample = Sample {
        pixels: (0..784).map(|i| (i % 7) as u8).collect(),
        label: 0,
    };
    let predicted = layer.run_sample(&sample, Mode::Infer).unwrap();
    assert!(predicted < 10);
}

#[test]
fn test_seeded_layers_are_reproducible() {
    let a = Layer::new(10, 784, Some(1234)).unwrap();
    let b = Layer::new(10, 784, Some(1234)).unwrap();
    let c = Layer::new(10, 784, Some(4321)).unwrap();

    for cell in 0..10 {
        assert_eq!(a.weights(cell).unwrap(), b.weights(cell).unwrap());
    }
    assert_ne!(a.weights(0).unwrap(), c.weights(0).unwrap());
}
