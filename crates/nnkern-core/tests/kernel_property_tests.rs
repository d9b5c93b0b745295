//! Property-based equivalence tests for the dispatched kernels.
//!
//! Every property runs the kernel at each tier this machine supports and
//! compares it with the portable scalar kernel over randomized inputs and
//! block-boundary lengths.

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::float_cmp
)]

use nnkern_core::buffer::{Matrix, Vector};
use nnkern_core::cpu::{supported_levels, SimdLevel};
use nnkern_core::dispatch::{
    AddsDispatch, GemmDispatch, MulDispatch, RowSumDispatch, TransposeDispatch,
};
use nnkern_core::kernels::scalar;
use nnkern_core::ops::{cpu_reduce, ReduceMode};
use proptest::{
    collection::vec,
    prelude::{any, prop_assert, prop_assert_eq, prop_oneof, Just, Strategy},
    proptest,
    test_runner::{Config as ProptestConfig, FileFailurePersistence},
};

const KERNEL_PROP_CASES: u32 = 128;
const KERNEL_PROP_MAX_SHRINK_ITERS: u32 = 1024;

#[derive(Clone, Copy)]
struct Tolerance {
    abs: f64,
    rel: f64,
}

// Envelopes for kernels that reorder float summation.
const ROW_SUM_F32_TOLERANCE: Tolerance = Tolerance {
    abs: 2.0e-2,
    rel: 1.0e-4,
};
const GEMM_F32_TOLERANCE: Tolerance = Tolerance {
    abs: 2.0e-2,
    rel: 1.0e-4,
};
const GEMM_F64_TOLERANCE: Tolerance = Tolerance {
    abs: 1.0e-10,
    rel: 1.0e-12,
};

fn boundary_length_strategy() -> impl Strategy<Value = usize> {
    prop_oneof![
        Just(0_usize),
        Just(1_usize),
        Just(7_usize),
        Just(8_usize),
        Just(15_usize),
        Just(16_usize),
        Just(17_usize),
        Just(31_usize),
        Just(32_usize),
        Just(33_usize),
        Just(63_usize),
        Just(64_usize),
        Just(65_usize),
        0_usize..=300,
    ]
}

fn small_dim_strategy() -> impl Strategy<Value = usize> {
    prop_oneof![Just(1_usize), Just(4_usize), Just(8_usize), 1_usize..=40]
}

fn kernel_proptest_config() -> ProptestConfig {
    ProptestConfig {
        cases: KERNEL_PROP_CASES,
        max_shrink_iters: KERNEL_PROP_MAX_SHRINK_ITERS,
        // Integration tests have no nearby lib.rs, so persist counterexamples
        // next to this file.
        failure_persistence: Some(Box::new(FileFailurePersistence::WithSource(
            "kernel-property-regressions",
        ))),
        ..ProptestConfig::default()
    }
}

fn within(actual: f64, expected: f64, tolerance: Tolerance) -> bool {
    let allowed = tolerance.abs.max(tolerance.rel * expected.abs().max(1.0));
    (actual - expected).abs() <= allowed
}

fn int_pair<T>() -> impl Strategy<Value = (Vec<T>, Vec<T>)>
where
    T: std::fmt::Debug + proptest::arbitrary::Arbitrary,
{
    boundary_length_strategy().prop_flat_map(|len| (vec(any::<T>(), len), vec(any::<T>(), len)))
}

fn adds_matches_scalar<T: AddsDispatch>(a: &[T], b: &[T]) -> Option<SimdLevel> {
    let mut expected = vec![T::default(); a.len()];
    scalar::adds(a, b, &mut expected);
    supported_levels().into_iter().find(|&level| {
        let mut got = vec![T::default(); a.len()];
        T::adds_with(level, a, b, &mut got);
        got != expected
    })
}

/// `m × n` matrix data with row stride `n + pad`.
fn strided_matrix_strategy() -> impl Strategy<Value = (usize, usize, usize, Vec<f32>)> {
    (small_dim_strategy(), small_dim_strategy(), 0_usize..3).prop_flat_map(|(m, n, pad)| {
        let stride = n + pad;
        (
            Just(m),
            Just(n),
            Just(stride),
            vec(-100.0_f32..100.0_f32, (m - 1) * stride + n),
        )
    })
}

fn gemm_strategy() -> impl Strategy<Value = (usize, usize, usize, Vec<f64>, Vec<f64>)> {
    (small_dim_strategy(), small_dim_strategy(), small_dim_strategy()).prop_flat_map(
        |(m, n, k)| {
            (
                Just(m),
                Just(n),
                Just(k),
                vec(-10.0_f64..10.0_f64, m * k),
                vec(-10.0_f64..10.0_f64, k * n),
            )
        },
    )
}

proptest! {
    #![proptest_config(kernel_proptest_config())]

    #[test]
    fn test_adds_i8_matches_scalar_on_every_level((a, b) in int_pair::<i8>()) {
        prop_assert_eq!(adds_matches_scalar(&a, &b), None);
    }

    #[test]
    fn test_adds_u16_matches_scalar_on_every_level((a, b) in int_pair::<u16>()) {
        prop_assert_eq!(adds_matches_scalar(&a, &b), None);
    }

    #[test]
    fn test_adds_i32_matches_scalar_on_every_level((a, b) in int_pair::<i32>()) {
        prop_assert_eq!(adds_matches_scalar(&a, &b), None);
    }

    #[test]
    fn test_adds_u32_matches_scalar_on_every_level((a, b) in int_pair::<u32>()) {
        prop_assert_eq!(adds_matches_scalar(&a, &b), None);
    }

    #[test]
    fn test_adds_stays_within_type_bounds((a, b) in int_pair::<i16>()) {
        let mut c = vec![0_i16; a.len()];
        i16::adds_with(SimdLevel::Fma, &a, &b, &mut c);
        for ((&x, &y), &z) in a.iter().zip(&b).zip(&c) {
            let exact = i32::from(x) + i32::from(y);
            prop_assert_eq!(i32::from(z), exact.clamp(i32::from(i16::MIN), i32::from(i16::MAX)));
        }
    }

    #[test]
    fn test_mul_is_bit_exact((a, b) in boundary_length_strategy().prop_flat_map(|len| {
        (vec(-1.0e3_f32..1.0e3, len), vec(-1.0e3_f32..1.0e3, len))
    })) {
        let mut expected = vec![0.0_f32; a.len()];
        scalar::mul(&a, &b, &mut expected);
        for level in supported_levels() {
            let mut got = vec![0.0_f32; a.len()];
            f32::mul_with(level, &a, &b, &mut got);
            prop_assert_eq!(&got, &expected, "level={}", level);
        }
    }

    #[test]
    fn test_transpose_twice_is_identity((m, n, stride, a) in strided_matrix_strategy()) {
        for level in supported_levels() {
            let mut t = vec![0.0_f32; m * n];
            f32::transpose_with(level, m, n, &a, stride, &mut t, m);
            let mut back = vec![0.0_f32; m * n];
            f32::transpose_with(level, n, m, &t, m, &mut back, n);
            for i in 0..m {
                prop_assert_eq!(&back[i * n..(i + 1) * n], &a[i * stride..i * stride + n]);
            }
        }
    }

    #[test]
    fn test_transpose_u8_matches_scalar(
        (m, n, a) in (small_dim_strategy(), small_dim_strategy())
            .prop_flat_map(|(m, n)| (Just(m), Just(n), vec(any::<u8>(), m * n)))
    ) {
        let mut expected = vec![0_u8; m * n];
        scalar::transpose(m, n, &a, n, &mut expected, m);
        for level in supported_levels() {
            let mut got = vec![0_u8; m * n];
            u8::transpose_with(level, m, n, &a, n, &mut got, m);
            prop_assert_eq!(&got, &expected, "level={}", level);
        }
    }

    #[test]
    fn test_integer_row_sum_is_exact(
        a in boundary_length_strategy().prop_flat_map(|len| vec(any::<i8>(), len))
    ) {
        let exact: i64 = a.iter().map(|&x| i64::from(x)).sum();
        for level in supported_levels() {
            let mut b = [0_i32];
            i32::reduce_row_sum_with(level, 1, a.len(), &a, a.len(), &mut b);
            prop_assert_eq!(i64::from(b[0]), exact, "level={}", level);
        }
    }

    #[test]
    fn test_u16_row_sum_matches_scalar(
        a in boundary_length_strategy().prop_flat_map(|len| vec(any::<u16>(), len))
    ) {
        let mut expected = [0_u32];
        scalar::reduce_row_sum(1, a.len(), &a, a.len(), &mut expected);
        for level in supported_levels() {
            let mut b = [0_u32];
            u32::reduce_row_sum_with(level, 1, a.len(), &a, a.len(), &mut b);
            prop_assert_eq!(b, expected, "level={}", level);
        }
    }

    #[test]
    fn test_float_row_sum_within_tolerance((m, n, stride, a) in strided_matrix_strategy()) {
        let mut expected = vec![0.0_f32; m];
        scalar::reduce_row_sum(m, n, &a, stride, &mut expected);
        for level in supported_levels() {
            let mut got = vec![0.0_f32; m];
            f32::reduce_row_sum_with(level, m, n, &a, stride, &mut got);
            for (g, e) in got.iter().zip(&expected) {
                prop_assert!(
                    within(f64::from(*g), f64::from(*e), ROW_SUM_F32_TOLERANCE),
                    "level={} got={} expected={}", level, g, e
                );
            }
        }
    }

    #[test]
    fn test_average_is_sum_scaled_by_count((m, n, _stride, a) in strided_matrix_strategy()) {
        let a = Matrix::from_vec(m, n, a[..m * n].to_vec()).expect("dense");
        let mut sums = Vector::<f64>::zeros(m);
        let mut avgs = Vector::<f64>::zeros(m);
        cpu_reduce(&mut sums, &a, ReduceMode::RowSum).expect("sum");
        cpu_reduce(&mut avgs, &a, ReduceMode::RowAvg).expect("avg");
        for (s, v) in sums.as_slice().iter().zip(avgs.as_slice()) {
            prop_assert!((s / n as f64 - v).abs() <= 1.0e-9 * s.abs().max(1.0));
        }
    }

    #[test]
    fn test_addmm_f64_matches_scalar((m, n, k, a, b) in gemm_strategy()) {
        let mut expected = vec![0.5_f64; m * n];
        scalar::addmm(m, n, k, &a, k, &b, n, &mut expected, n);
        for level in supported_levels() {
            let mut got = vec![0.5_f64; m * n];
            f64::addmm_with(level, m, n, k, &a, k, &b, n, &mut got, n);
            for (g, e) in got.iter().zip(&expected) {
                prop_assert!(within(*g, *e, GEMM_F64_TOLERANCE), "level={} {} vs {}", level, g, e);
            }
        }
    }

    #[test]
    fn test_addmmt_f32_matches_addmm_of_transpose((m, n, k, a, b) in gemm_strategy()) {
        let a: Vec<f32> = a.iter().map(|&x| x as f32).collect();
        let b: Vec<f32> = b.iter().map(|&x| x as f32).collect();
        // `b` is k × n; its transpose is the n × k operand of ADDMMT.
        let mut bt = vec![0.0_f32; n * k];
        scalar::transpose(k, n, &b, n, &mut bt, k);

        let mut expected = vec![0.0_f32; m * n];
        scalar::addmm(m, n, k, &a, k, &b, n, &mut expected, n);
        for level in supported_levels() {
            let mut got = vec![0.0_f32; m * n];
            f32::addmmt_with(level, m, n, k, &a, k, &bt, k, &mut got, n);
            for (g, e) in got.iter().zip(&expected) {
                prop_assert!(
                    within(f64::from(*g), f64::from(*e), GEMM_F32_TOLERANCE),
                    "level={} {} vs {}", level, g, e
                );
            }
        }
    }
}
