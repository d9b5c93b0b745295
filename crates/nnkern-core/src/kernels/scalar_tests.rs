//! Tests for the portable reference kernels.

use super::scalar::*;

// ============================================================================
// Saturating add
// ============================================================================

#[test]
fn test_adds_saturates_signed_bounds() {
    let a = [100_i8, -100, 127, -128, 0, 5];
    let b = [100_i8, -100, 1, -1, 0, -10];
    let mut c = [0_i8; 6];
    adds(&a, &b, &mut c);
    assert_eq!(c, [127, -128, 127, -128, 0, -5]);
}

#[test]
fn test_adds_saturates_unsigned_bounds() {
    let a = [200_u8, 0, 255, 10];
    let b = [100_u8, 0, 255, 20];
    let mut c = [0_u8; 4];
    adds(&a, &b, &mut c);
    assert_eq!(c, [255, 0, 255, 30]);

    let a = [u32::MAX - 1, 7];
    let b = [5_u32, 8];
    let mut c = [0_u32; 2];
    adds(&a, &b, &mut c);
    assert_eq!(c, [u32::MAX, 15]);
}

#[test]
fn test_adds_value_broadcasts_scalar() {
    let b = [i16::MAX - 2, 0, i16::MIN];
    let mut c = [0_i16; 3];
    adds_value(5, &b, &mut c);
    assert_eq!(c, [i16::MAX, 5, i16::MIN + 5]);
}

#[test]
fn test_adds_writes_only_output_length() {
    let a = [1_i32; 8];
    let b = [2_i32; 8];
    let mut c = [0_i32; 3];
    adds(&a, &b, &mut c);
    assert_eq!(c, [3, 3, 3]);
}

// ============================================================================
// Multiply
// ============================================================================

#[test]
fn test_mul_elementwise() {
    let a = [1.5_f32, -2.0, 0.0, 4.0];
    let b = [2.0_f32, 3.0, 9.0, 0.25];
    let mut c = [0.0_f32; 4];
    mul(&a, &b, &mut c);
    assert_eq!(c, [3.0, -6.0, 0.0, 1.0]);
}

#[test]
fn test_mul_value_broadcasts_scalar() {
    let b = [1.0_f64, 2.0, -3.0];
    let mut c = [0.0_f64; 3];
    mul_value(0.5, &b, &mut c);
    assert_eq!(c, [0.5, 1.0, -1.5]);
}

// ============================================================================
// Transpose
// ============================================================================

#[test]
fn test_transpose_rectangular() {
    let a = [1_u16, 2, 3, 4, 5, 6];
    let mut b = [0_u16; 6];
    transpose(2, 3, &a, 3, &mut b, 2);
    assert_eq!(b, [1, 4, 2, 5, 3, 6]);
}

#[test]
fn test_transpose_respects_strides() {
    // 2 x 2 source padded to stride 3, destination padded to stride 4.
    let a = [1_i32, 2, -1, 3, 4, -1];
    let mut b = [0_i32; 6];
    transpose(2, 2, &a, 3, &mut b, 4);
    assert_eq!(b, [1, 3, 0, 0, 2, 4]);
}

#[test]
fn test_common_transpose_covers_only_requested_block() {
    let a: Vec<u8> = (0..16).collect();
    let mut b = vec![0_u8; 16];
    common_transpose(&a, 4, &mut b, 4, 2..4, 1..3);
    for j in 0..4 {
        for i in 0..4 {
            let expected = if (2..4).contains(&i) && (1..3).contains(&j) {
                a[i * 4 + j]
            } else {
                0
            };
            assert_eq!(b[j * 4 + i], expected, "b[{j}][{i}]");
        }
    }
}

// ============================================================================
// Mapping
// ============================================================================

#[test]
fn test_mapping_gathers_by_index() {
    let base = [10.0_f32, 20.0, 30.0, 40.0];
    let indices = [3_u32, 0, 0, 2];
    let mut c = [0.0_f32; 4];
    mapping(&base, &indices, &mut c);
    assert_eq!(c, [40.0, 10.0, 10.0, 30.0]);
}

#[test]
#[should_panic(expected = "index out of bounds")]
fn test_mapping_panics_on_negative_index() {
    let base = [1_i8, 2];
    let indices = [-1_i32];
    let mut c = [0_i8; 1];
    mapping(&base, &indices, &mut c);
}

// ============================================================================
// Row reductions
// ============================================================================

#[test]
fn test_row_sum_widens_before_summing() {
    let row = [127_i8; 100];
    assert_eq!(row_sum(0_i32, &row), 12_700);

    let row = [-128_i8; 100];
    assert_eq!(row_sum(0_i32, &row), -12_800);

    let row = [255_u8; 1000];
    assert_eq!(row_sum(0_u32, &row), 255_000);
}

#[test]
fn test_row_sum_starts_from_init() {
    let row = [1.0_f32, 2.0, 3.0];
    assert_eq!(row_sum(10.0_f64, &row), 16.0);
}

#[test]
fn test_reduce_row_sum_accumulates_into_output() {
    let a = [1_i16, 2, 3, 4, 5, 6];
    let mut b = [100_i32, -100];
    reduce_row_sum(2, 3, &a, 3, &mut b);
    assert_eq!(b, [106, -85]);
}

#[test]
fn test_reduce_row_sum_skips_padding() {
    let a = [1_u8, 1, 99, 2, 2, 99];
    let mut b = [0_u32; 2];
    reduce_row_sum(2, 2, &a, 3, &mut b);
    assert_eq!(b, [2, 4]);
}

#[test]
fn test_reduce_row_max_and_min() {
    let a = [3_i8, -7, 5, -2, -9, 0];
    let mut max = [0_i32; 2];
    let mut min = [0_i32; 2];
    reduce_row_max(2, 3, &a, 3, &mut max);
    reduce_row_min(2, 3, &a, 3, &mut min);
    assert_eq!(max, [5, 0]);
    assert_eq!(min, [-7, -9]);
}

#[test]
fn test_reduce_row_max_overwrites_output() {
    let a = [1.0_f32, 2.0];
    let mut b = [1e9_f64];
    reduce_row_max(1, 2, &a, 2, &mut b);
    assert_eq!(b, [2.0]);
}

// ============================================================================
// Repeat
// ============================================================================

#[test]
fn test_repeat_copies_back_to_back() {
    let src = [1_u16, 2, 3];
    let mut dst = [0_u16; 9];
    repeat(&src, &mut dst, 3);
    assert_eq!(dst, [1, 2, 3, 1, 2, 3, 1, 2, 3]);
}

#[test]
fn test_repeat_empty_source_is_noop() {
    let src: [u8; 0] = [];
    let mut dst = [7_u8; 2];
    repeat(&src, &mut dst, 4);
    assert_eq!(dst, [7, 7]);
}

#[test]
fn test_repeat_2d_tiles_both_axes() {
    // [[1, 2], [3, 4]] tiled 2 x 3.
    let src = [1_i32, 2, 3, 4];
    let mut dst = [0_i32; 24];
    repeat_2d(2, 2, &src, 2, &mut dst, 6, 2, 3);
    let expected = [
        1, 2, 1, 2, 1, 2, //
        3, 4, 3, 4, 3, 4, //
        1, 2, 1, 2, 1, 2, //
        3, 4, 3, 4, 3, 4,
    ];
    assert_eq!(dst, expected);
}

#[test]
fn test_repeat_2d_with_padded_rows() {
    let src = [5_u8, 9, 6, 9];
    let mut dst = [0_u8; 8];
    // 2 x 1 source (stride 2) tiled 2 x 2 into rows of stride 2.
    repeat_2d(2, 1, &src, 2, &mut dst, 2, 2, 2);
    assert_eq!(dst, [5, 5, 6, 6, 5, 5, 6, 6]);
}

// ============================================================================
// GEVV / GEMM family
// ============================================================================

#[test]
fn test_axpy_and_dot() {
    let x = [1.0_f32, 2.0, 3.0];
    let mut y = [1.0_f32, 1.0, 1.0];
    axpy(2.0, &x, &mut y);
    assert_eq!(y, [3.0, 5.0, 7.0]);
    assert_eq!(dot(&x, &y), 3.0 + 10.0 + 21.0);
}

#[test]
fn test_addvv_outer_product_accumulates() {
    let a = [1.0_f64, 2.0];
    let b = [3.0_f64, 4.0, 5.0];
    let mut c = [1.0_f64; 6];
    addvv(2, 3, &a, &b, &mut c, 3);
    assert_eq!(c, [4.0, 5.0, 6.0, 7.0, 9.0, 11.0]);
}

#[test]
fn test_addmm_small_product() {
    // [[1, 2], [3, 4]] . [[5, 6], [7, 8]] = [[19, 22], [43, 50]]
    let a = [1.0_f32, 2.0, 3.0, 4.0];
    let b = [5.0_f32, 6.0, 7.0, 8.0];
    let mut c = [0.0_f32; 4];
    addmm(2, 2, 2, &a, 2, &b, 2, &mut c, 2);
    assert_eq!(c, [19.0, 22.0, 43.0, 50.0]);
    addmm(2, 2, 2, &a, 2, &b, 2, &mut c, 2);
    assert_eq!(c, [38.0, 44.0, 86.0, 100.0]);
}

#[test]
fn test_addmmt_matches_addmm_of_transpose() {
    let a = [1.0_f64, 2.0, 3.0, 4.0, 5.0, 6.0]; // 2 x 3
    let bt = [1.0_f64, 0.0, -1.0, 2.0, 1.0, 0.5]; // 2 x 3, used as B^t
    let mut b = [0.0_f64; 6]; // 3 x 2
    transpose(2, 3, &bt, 3, &mut b, 2);

    let mut via_t = [0.0_f64; 4];
    let mut via_mm = [0.0_f64; 4];
    addmmt(2, 2, 3, &a, 3, &bt, 3, &mut via_t, 2);
    addmm(2, 2, 3, &a, 3, &b, 2, &mut via_mm, 2);
    assert_eq!(via_t, via_mm);
    assert_eq!(via_t, [-2.0, 5.5, -2.0, 16.0]);
}

#[test]
fn test_gemm_zero_inner_dimension_leaves_output() {
    let mut c = [3.0_f32; 4];
    addmm(2, 2, 0, &[], 0, &[], 2, &mut c, 2);
    addmmt(2, 2, 0, &[], 0, &[], 0, &mut c, 2);
    assert_eq!(c, [3.0; 4]);
}
