//! End-to-end scenario through the public `cpu_*` API.
//!
//! Mirrors how layer code drives the kernels: allocate outputs up front,
//! call the shape-checked primitives, read the results.

use nnkern_core::buffer::{Matrix, Shaped, Tensor, Vector};
use nnkern_core::ops::{
    cpu_adds_value, cpu_gemm_bias, cpu_mapping, cpu_reduce, cpu_reduce_row_sum,
    cpu_repeat_matrix, cpu_transpose,
};
use nnkern_core::{warmup_kernels, Error, ReduceMode};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn scenario_matrix() -> Matrix<i8> {
    Matrix::from_vec(3, 4, vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]).expect("3x4 data")
}

#[test]
fn test_adds_value_reduce_and_transpose_scenario() {
    init_tracing();
    warmup_kernels();

    let a = scenario_matrix();

    let mut c = Matrix::<i8>::zeros(3, 4);
    cpu_adds_value(&mut c, 5, &a).expect("adds_value");
    assert_eq!(
        c.to_vec(),
        vec![6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17]
    );

    let mut sums = Vector::<i32>::zeros(3);
    cpu_reduce_row_sum(&mut sums, &a).expect("row sum");
    assert_eq!(sums.as_slice(), &[10, 26, 42]);

    let mut b = Matrix::<i8>::zeros(4, 3);
    cpu_transpose(&mut b, &a).expect("transpose");
    for i in 0..3 {
        for j in 0..4 {
            assert_eq!(b.get(j, i), a.get(i, j), "cell ({i}, {j})");
        }
    }
}

#[test]
fn test_dense_layer_forward_pass() {
    init_tracing();

    // x: 2 samples x 3 features, w: 3 inputs x 2 outputs, bias per output.
    let x = Matrix::from_vec(2, 3, vec![1.0_f32, 0.0, 2.0, -1.0, 1.0, 0.5]).expect("x");
    let w = Matrix::from_vec(3, 2, vec![0.5_f32, -1.0, 1.0, 1.0, 0.25, 2.0]).expect("w");
    let bias = Vector::from_vec(vec![0.1_f32, -0.1]);

    let mut y = Matrix::<f32>::zeros(2, 2);
    cpu_gemm_bias(&mut y, &x, &w, &bias).expect("gemm_bias");
    let expected = [1.1_f32, 2.9, 0.725, 2.9];
    for (got, want) in y.to_vec().iter().zip(expected) {
        assert!((got - want).abs() < 1e-6, "got {got}, want {want}");
    }

    let mut mean = Vector::<f32>::zeros(2);
    cpu_reduce(&mut mean, &y, ReduceMode::ColAvg).expect("col avg");
    assert!((mean.as_slice()[0] - 0.9125).abs() < 1e-6);
    assert!((mean.as_slice()[1] - 2.9).abs() < 1e-6);
}

#[test]
fn test_embedding_lookup_then_tile() {
    init_tracing();

    let table = [10_u8, 20, 30, 40];
    let ids = Vector::from_vec(vec![3_u32, 1]);
    let mut gathered = Vector::<u8>::zeros(2);
    cpu_mapping(&mut gathered, &table, &ids).expect("mapping");
    assert_eq!(gathered.as_slice(), &[40, 20]);

    let row = Matrix::from_vec(1, 2, gathered.into_vec()).expect("row");
    let mut tiled = Matrix::<u8>::zeros(2, 4);
    cpu_repeat_matrix(&mut tiled, &row, 2, 2).expect("tile");
    assert_eq!(tiled.to_vec(), vec![40, 20, 40, 20, 40, 20, 40, 20]);
}

#[test]
fn test_errors_surface_through_public_api() {
    init_tracing();

    let t = Tensor::<u16>::zeros(2, 0, 3);
    let mut b = Vector::<u32>::zeros(1);
    let err = cpu_reduce_row_sum(&mut b, &t).unwrap_err();
    assert!(matches!(err, Error::NotInitialized { operand: "a", .. }));
    assert_eq!(err.to_string(), "tensor not initialized: operand `a` is empty");
    assert!(t.is_empty());
}
