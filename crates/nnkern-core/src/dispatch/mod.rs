//! Runtime dispatch to ISA-specific kernels.
//!
//! Each primitive family is a trait implemented for the element types it
//! supports. `*_with(level, ..)` runs the best kernel not above `level`
//! (clamped to what the CPU supports, so it never executes an unsupported
//! instruction); the free functions use the cached [`simd_level`].
//!
//! The choice depends only on the tier and the element type, never on buffer
//! contents or sizes, and exactly one kernel variant runs per call.
//!
//! Kernels trust their callers. The checks here only keep raw-pointer
//! kernels inside their slices; shape validation belongs to [`crate::ops`].

use crate::cpu::{effective_level, simd_level, SimdLevel};
use crate::element::{Accumulator, Element, FloatElement, GatherIndex, SaturatingElement};
use crate::kernels::scalar;

#[cfg(target_arch = "x86_64")]
use crate::kernels::{block, x86_avx, x86_avx2, x86_gemm, x86_sse2, x86_sse3};

/// Elements needed to hold `rows` rows of `cols` elements with row stride `stride`.
#[inline]
#[must_use]
pub fn span(rows: usize, cols: usize, stride: usize) -> usize {
    if rows == 0 || cols == 0 {
        0
    } else {
        (rows - 1) * stride + cols
    }
}

// =============================================================================
// Saturating add
// =============================================================================

/// Saturating add, dispatched per integer type.
pub trait AddsDispatch: SaturatingElement {
    /// `c[i] = saturate(a[i] + b[i])` using kernels up to `level`.
    fn adds_with(level: SimdLevel, a: &[Self], b: &[Self], c: &mut [Self]);

    /// `c[i] = saturate(a + b[i])` using kernels up to `level`.
    fn adds_value_with(level: SimdLevel, a: Self, b: &[Self], c: &mut [Self]);
}

macro_rules! impl_adds_dispatch {
    ($($t:ty => $adds:ident, $adds_value:ident;)*) => {
        $(
            impl AddsDispatch for $t {
                fn adds_with(level: SimdLevel, a: &[Self], b: &[Self], c: &mut [Self]) {
                    match effective_level(level) {
                        // SAFETY: effective_level never exceeds the detected tier.
                        #[cfg(target_arch = "x86_64")]
                        l if l >= SimdLevel::Avx2 => unsafe { x86_avx2::$adds(a, b, c) },
                        #[cfg(target_arch = "x86_64")]
                        l if l >= SimdLevel::Sse2 => unsafe { x86_sse2::$adds(a, b, c) },
                        _ => scalar::adds(a, b, c),
                    }
                }

                fn adds_value_with(level: SimdLevel, a: Self, b: &[Self], c: &mut [Self]) {
                    match effective_level(level) {
                        #[cfg(target_arch = "x86_64")]
                        l if l >= SimdLevel::Avx2 => unsafe { x86_avx2::$adds_value(a, b, c) },
                        #[cfg(target_arch = "x86_64")]
                        l if l >= SimdLevel::Sse2 => unsafe { x86_sse2::$adds_value(a, b, c) },
                        _ => scalar::adds_value(a, b, c),
                    }
                }
            }
        )*
    };
}

impl_adds_dispatch! {
    i8 => adds_i8, adds_value_i8;
    u8 => adds_u8, adds_value_u8;
    i16 => adds_i16, adds_value_i16;
    u16 => adds_u16, adds_value_u16;
    i32 => adds_i32, adds_value_i32;
    u32 => adds_u32, adds_value_u32;
}

/// Saturating add with automatic dispatch.
#[inline]
pub fn adds<T: AddsDispatch>(a: &[T], b: &[T], c: &mut [T]) {
    T::adds_with(simd_level(), a, b, c);
}

/// Saturating add of a broadcast value with automatic dispatch.
#[inline]
pub fn adds_value<T: AddsDispatch>(a: T, b: &[T], c: &mut [T]) {
    T::adds_value_with(simd_level(), a, b, c);
}

// =============================================================================
// Multiply
// =============================================================================

/// Elementwise float multiply.
pub trait MulDispatch: FloatElement {
    /// `c[i] = a[i] * b[i]` using kernels up to `level`.
    fn mul_with(level: SimdLevel, a: &[Self], b: &[Self], c: &mut [Self]);

    /// `c[i] = a * b[i]` using kernels up to `level`.
    fn mul_value_with(level: SimdLevel, a: Self, b: &[Self], c: &mut [Self]);
}

macro_rules! impl_mul_dispatch {
    ($($t:ty, $sse:path => $mul:ident, $mul_value:ident;)*) => {
        $(
            impl MulDispatch for $t {
                fn mul_with(level: SimdLevel, a: &[Self], b: &[Self], c: &mut [Self]) {
                    match effective_level(level) {
                        #[cfg(target_arch = "x86_64")]
                        l if l >= SimdLevel::Avx => unsafe { x86_avx::$mul(a, b, c) },
                        #[cfg(target_arch = "x86_64")]
                        l if l >= $sse => unsafe { x86_sse2::$mul(a, b, c) },
                        _ => scalar::mul(a, b, c),
                    }
                }

                fn mul_value_with(level: SimdLevel, a: Self, b: &[Self], c: &mut [Self]) {
                    match effective_level(level) {
                        #[cfg(target_arch = "x86_64")]
                        l if l >= SimdLevel::Avx => unsafe { x86_avx::$mul_value(a, b, c) },
                        #[cfg(target_arch = "x86_64")]
                        l if l >= $sse => unsafe { x86_sse2::$mul_value(a, b, c) },
                        _ => scalar::mul_value(a, b, c),
                    }
                }
            }
        )*
    };
}

impl_mul_dispatch! {
    f32, SimdLevel::Sse => mul_f32, mul_value_f32;
    f64, SimdLevel::Sse2 => mul_f64, mul_value_f64;
}

/// Elementwise multiply with automatic dispatch.
#[inline]
pub fn mul<T: MulDispatch>(a: &[T], b: &[T], c: &mut [T]) {
    T::mul_with(simd_level(), a, b, c);
}

/// Multiply by a broadcast value with automatic dispatch.
#[inline]
pub fn mul_value<T: MulDispatch>(a: T, b: &[T], c: &mut [T]) {
    T::mul_value_with(simd_level(), a, b, c);
}

// =============================================================================
// Transpose
// =============================================================================

/// Transpose of any element type.
///
/// Transpose only moves bits, so elements are reinterpreted as unsigned
/// integers of the same width and share one set of tiles per width.
pub trait TransposeDispatch: Element {
    /// `b[j][i] = a[i][j]` for the `m × n` matrix `a`, using kernels up to `level`.
    ///
    /// # Panics
    ///
    /// Panics if `a` or `b` is shorter than its strided span.
    fn transpose_with(
        level: SimdLevel,
        m: usize,
        n: usize,
        a: &[Self],
        rsa: usize,
        b: &mut [Self],
        rsb: usize,
    );
}

impl<T: Element> TransposeDispatch for T {
    fn transpose_with(
        level: SimdLevel,
        m: usize,
        n: usize,
        a: &[Self],
        rsa: usize,
        b: &mut [Self],
        rsb: usize,
    ) {
        assert!(a.len() >= span(m, n, rsa), "transpose source out of bounds");
        assert!(b.len() >= span(n, m, rsb), "transpose destination out of bounds");
        match std::mem::size_of::<T>() {
            1 => transpose_u8(
                level,
                m,
                n,
                bytemuck::cast_slice(a),
                rsa,
                bytemuck::cast_slice_mut(b),
                rsb,
            ),
            2 => transpose_u16(
                level,
                m,
                n,
                bytemuck::cast_slice(a),
                rsa,
                bytemuck::cast_slice_mut(b),
                rsb,
            ),
            4 => transpose_u32(
                level,
                m,
                n,
                bytemuck::cast_slice(a),
                rsa,
                bytemuck::cast_slice_mut(b),
                rsb,
            ),
            8 => transpose_u64(
                level,
                m,
                n,
                bytemuck::cast_slice(a),
                rsa,
                bytemuck::cast_slice_mut(b),
                rsb,
            ),
            _ => scalar::transpose(m, n, a, rsa, b, rsb),
        }
    }
}

fn transpose_u8(
    level: SimdLevel,
    m: usize,
    n: usize,
    a: &[u8],
    rsa: usize,
    b: &mut [u8],
    rsb: usize,
) {
    match effective_level(level) {
        // SAFETY: spans checked by the caller; SSE2 confirmed by the probe.
        #[cfg(target_arch = "x86_64")]
        l if l >= SimdLevel::Sse2 => unsafe {
            block::transpose_blocked::<u8, x86_sse2::Transpose8x8U8>(m, n, a, rsa, b, rsb);
        },
        _ => scalar::transpose(m, n, a, rsa, b, rsb),
    }
}

fn transpose_u16(
    level: SimdLevel,
    m: usize,
    n: usize,
    a: &[u16],
    rsa: usize,
    b: &mut [u16],
    rsb: usize,
) {
    match effective_level(level) {
        #[cfg(target_arch = "x86_64")]
        l if l >= SimdLevel::Sse2 => unsafe {
            block::transpose_blocked::<u16, x86_sse2::Transpose8x8U16>(m, n, a, rsa, b, rsb);
        },
        _ => scalar::transpose(m, n, a, rsa, b, rsb),
    }
}

fn transpose_u32(
    level: SimdLevel,
    m: usize,
    n: usize,
    a: &[u32],
    rsa: usize,
    b: &mut [u32],
    rsb: usize,
) {
    match effective_level(level) {
        #[cfg(target_arch = "x86_64")]
        l if l >= SimdLevel::Avx => unsafe {
            block::transpose_blocked::<u32, x86_avx::Transpose8x8U32>(m, n, a, rsa, b, rsb);
        },
        #[cfg(target_arch = "x86_64")]
        l if l >= SimdLevel::Sse2 => unsafe {
            block::transpose_blocked::<u32, x86_sse2::Transpose4x4U32>(m, n, a, rsa, b, rsb);
        },
        _ => scalar::transpose(m, n, a, rsa, b, rsb),
    }
}

fn transpose_u64(
    level: SimdLevel,
    m: usize,
    n: usize,
    a: &[u64],
    rsa: usize,
    b: &mut [u64],
    rsb: usize,
) {
    match effective_level(level) {
        #[cfg(target_arch = "x86_64")]
        l if l >= SimdLevel::Avx => unsafe {
            block::transpose_blocked::<u64, x86_avx::Transpose4x4U64>(m, n, a, rsa, b, rsb);
        },
        #[cfg(target_arch = "x86_64")]
        l if l >= SimdLevel::Sse2 => unsafe {
            block::transpose_blocked::<u64, x86_sse2::Transpose2x2U64>(m, n, a, rsa, b, rsb);
        },
        _ => scalar::transpose(m, n, a, rsa, b, rsb),
    }
}

/// Transpose with automatic dispatch.
#[inline]
pub fn transpose<T: Element>(m: usize, n: usize, a: &[T], rsa: usize, b: &mut [T], rsb: usize) {
    T::transpose_with(simd_level(), m, n, a, rsa, b, rsb);
}

// =============================================================================
// Row sums
// =============================================================================

/// Widening row sum into `Self` from rows of `T1`.
pub trait RowSumDispatch<T1: Element>: Accumulator<T1> {
    /// `b[i] += Σ_j a[i][j]` for the `m × n` matrix `a`, using kernels up to `level`.
    fn reduce_row_sum_with(
        level: SimdLevel,
        m: usize,
        n: usize,
        a: &[T1],
        rsa: usize,
        b: &mut [Self],
    );
}

macro_rules! impl_int_row_sum {
    ($($src:ty => $acc:ty, $kernel:ident;)*) => {
        $(
            impl RowSumDispatch<$src> for $acc {
                fn reduce_row_sum_with(
                    level: SimdLevel,
                    m: usize,
                    n: usize,
                    a: &[$src],
                    rsa: usize,
                    b: &mut [Self],
                ) {
                    match effective_level(level) {
                        #[cfg(target_arch = "x86_64")]
                        l if l >= SimdLevel::Avx2 => unsafe {
                            block::reduce_row_sum_blocked::<$src, $acc, x86_avx2::$kernel>(
                                m, n, a, rsa, b,
                            );
                        },
                        #[cfg(target_arch = "x86_64")]
                        l if l >= SimdLevel::Sse2 => unsafe {
                            block::reduce_row_sum_blocked::<$src, $acc, x86_sse2::$kernel>(
                                m, n, a, rsa, b,
                            );
                        },
                        _ => scalar::reduce_row_sum(m, n, a, rsa, b),
                    }
                }
            }
        )*
    };
}

impl_int_row_sum! {
    i8 => i32, RowSumI8;
    i16 => i32, RowSumI16;
    i32 => i32, RowSumI32;
    u8 => u32, RowSumU8;
    u16 => u32, RowSumU16;
    u32 => u32, RowSumI32;
}

macro_rules! impl_float_row_sum {
    ($($t:ty, $kernel:ident;)*) => {
        $(
            impl RowSumDispatch<$t> for $t {
                fn reduce_row_sum_with(
                    level: SimdLevel,
                    m: usize,
                    n: usize,
                    a: &[$t],
                    rsa: usize,
                    b: &mut [Self],
                ) {
                    match effective_level(level) {
                        #[cfg(target_arch = "x86_64")]
                        l if l >= SimdLevel::Avx => unsafe {
                            block::reduce_row_sum_blocked::<$t, $t, x86_avx::$kernel>(
                                m, n, a, rsa, b,
                            );
                        },
                        #[cfg(target_arch = "x86_64")]
                        l if l >= SimdLevel::Sse3 => unsafe {
                            block::reduce_row_sum_blocked::<$t, $t, x86_sse3::$kernel>(
                                m, n, a, rsa, b,
                            );
                        },
                        _ => scalar::reduce_row_sum(m, n, a, rsa, b),
                    }
                }
            }
        )*
    };
}

impl_float_row_sum! {
    f32, RowSumF32;
    f64, RowSumF64;
}

impl RowSumDispatch<f32> for f64 {
    fn reduce_row_sum_with(
        _level: SimdLevel,
        m: usize,
        n: usize,
        a: &[f32],
        rsa: usize,
        b: &mut [Self],
    ) {
        scalar::reduce_row_sum(m, n, a, rsa, b);
    }
}

/// Row sum with automatic dispatch.
#[inline]
pub fn reduce_row_sum<T1: Element, T2: RowSumDispatch<T1>>(
    m: usize,
    n: usize,
    a: &[T1],
    rsa: usize,
    b: &mut [T2],
) {
    T2::reduce_row_sum_with(simd_level(), m, n, a, rsa, b);
}

/// Row maximum, widened. Portable kernel only.
#[inline]
pub fn reduce_row_max<T1: Element, T2: Accumulator<T1>>(
    m: usize,
    n: usize,
    a: &[T1],
    rsa: usize,
    b: &mut [T2],
) {
    scalar::reduce_row_max(m, n, a, rsa, b);
}

/// Row minimum, widened. Portable kernel only.
#[inline]
pub fn reduce_row_min<T1: Element, T2: Accumulator<T1>>(
    m: usize,
    n: usize,
    a: &[T1],
    rsa: usize,
    b: &mut [T2],
) {
    scalar::reduce_row_min(m, n, a, rsa, b);
}

// =============================================================================
// GEVV / GEMM family
// =============================================================================

/// Register-blocked GEMM family for `f32` and `f64`.
///
/// Every method panics if an operand is shorter than its strided span.
pub trait GemmDispatch: FloatElement {
    /// `C(m×n) += a(m) ⊗ b(n)`.
    fn addvv_with(
        level: SimdLevel,
        m: usize,
        n: usize,
        a: &[Self],
        b: &[Self],
        c: &mut [Self],
        rsc: usize,
    );

    /// `C(m×n) += A(m×k) · B(k×n)`.
    fn addmm_with(
        level: SimdLevel,
        m: usize,
        n: usize,
        k: usize,
        a: &[Self],
        rsa: usize,
        b: &[Self],
        rsb: usize,
        c: &mut [Self],
        rsc: usize,
    );

    /// `C(m×n) += A(m×k) · B(n×k)ᵗ`.
    fn addmmt_with(
        level: SimdLevel,
        m: usize,
        n: usize,
        k: usize,
        a: &[Self],
        rsa: usize,
        b: &[Self],
        rsb: usize,
        c: &mut [Self],
        rsc: usize,
    );
}

macro_rules! impl_gemm_dispatch {
    ($($t:ty, $sse:path => $fma:ident, $avx:ident, $sse_mod:ident;)*) => {
        $(
            impl GemmDispatch for $t {
                fn addvv_with(
                    level: SimdLevel,
                    m: usize,
                    n: usize,
                    a: &[Self],
                    b: &[Self],
                    c: &mut [Self],
                    rsc: usize,
                ) {
                    assert!(a.len() >= m && b.len() >= n, "gevv vector out of bounds");
                    assert!(c.len() >= span(m, n, rsc), "gevv output out of bounds");
                    match effective_level(level) {
                        #[cfg(target_arch = "x86_64")]
                        SimdLevel::Fma => unsafe { x86_gemm::$fma::addvv(m, n, a, b, c, rsc) },
                        #[cfg(target_arch = "x86_64")]
                        l if l >= SimdLevel::Avx => unsafe {
                            x86_gemm::$avx::addvv(m, n, a, b, c, rsc);
                        },
                        #[cfg(target_arch = "x86_64")]
                        l if l >= $sse => unsafe {
                            x86_gemm::$sse_mod::addvv(m, n, a, b, c, rsc);
                        },
                        _ => scalar::addvv(m, n, a, b, c, rsc),
                    }
                }

                fn addmm_with(
                    level: SimdLevel,
                    m: usize,
                    n: usize,
                    k: usize,
                    a: &[Self],
                    rsa: usize,
                    b: &[Self],
                    rsb: usize,
                    c: &mut [Self],
                    rsc: usize,
                ) {
                    assert!(a.len() >= span(m, k, rsa), "addmm lhs out of bounds");
                    assert!(b.len() >= span(k, n, rsb), "addmm rhs out of bounds");
                    assert!(c.len() >= span(m, n, rsc), "addmm output out of bounds");
                    match effective_level(level) {
                        #[cfg(target_arch = "x86_64")]
                        SimdLevel::Fma => unsafe {
                            x86_gemm::$fma::addmm(m, n, k, a, rsa, b, rsb, c, rsc);
                        },
                        #[cfg(target_arch = "x86_64")]
                        l if l >= SimdLevel::Avx => unsafe {
                            x86_gemm::$avx::addmm(m, n, k, a, rsa, b, rsb, c, rsc);
                        },
                        #[cfg(target_arch = "x86_64")]
                        l if l >= $sse => unsafe {
                            x86_gemm::$sse_mod::addmm(m, n, k, a, rsa, b, rsb, c, rsc);
                        },
                        _ => scalar::addmm(m, n, k, a, rsa, b, rsb, c, rsc),
                    }
                }

                fn addmmt_with(
                    level: SimdLevel,
                    m: usize,
                    n: usize,
                    k: usize,
                    a: &[Self],
                    rsa: usize,
                    b: &[Self],
                    rsb: usize,
                    c: &mut [Self],
                    rsc: usize,
                ) {
                    assert!(a.len() >= span(m, k, rsa), "addmmt lhs out of bounds");
                    assert!(b.len() >= span(n, k, rsb), "addmmt rhs out of bounds");
                    assert!(c.len() >= span(m, n, rsc), "addmmt output out of bounds");
                    match effective_level(level) {
                        #[cfg(target_arch = "x86_64")]
                        SimdLevel::Fma => unsafe {
                            x86_gemm::$fma::addmmt(m, n, k, a, rsa, b, rsb, c, rsc);
                        },
                        #[cfg(target_arch = "x86_64")]
                        l if l >= SimdLevel::Avx => unsafe {
                            x86_gemm::$avx::addmmt(m, n, k, a, rsa, b, rsb, c, rsc);
                        },
                        #[cfg(target_arch = "x86_64")]
                        l if l >= $sse => unsafe {
                            x86_gemm::$sse_mod::addmmt(m, n, k, a, rsa, b, rsb, c, rsc);
                        },
                        _ => scalar::addmmt(m, n, k, a, rsa, b, rsb, c, rsc),
                    }
                }
            }
        )*
    };
}

impl_gemm_dispatch! {
    f32, SimdLevel::Sse => fma_f32, avx_f32, sse_f32;
    f64, SimdLevel::Sse2 => fma_f64, avx_f64, sse_f64;
}

/// GEVV with automatic dispatch: `C(m×n) += a ⊗ b`.
#[inline]
pub fn addvv<T: GemmDispatch>(m: usize, n: usize, a: &[T], b: &[T], c: &mut [T], rsc: usize) {
    T::addvv_with(simd_level(), m, n, a, b, c, rsc);
}

/// GTVV with automatic dispatch: `C(n×m) += (a ⊗ b)ᵗ`, i.e. GEVV with the
/// operands swapped.
#[inline]
pub fn addtvv<T: GemmDispatch>(m: usize, n: usize, a: &[T], b: &[T], c: &mut [T], rsc: usize) {
    T::addvv_with(simd_level(), n, m, b, a, c, rsc);
}

/// ADDMM with automatic dispatch.
#[inline]
pub fn addmm<T: GemmDispatch>(
    m: usize,
    n: usize,
    k: usize,
    a: &[T],
    rsa: usize,
    b: &[T],
    rsb: usize,
    c: &mut [T],
    rsc: usize,
) {
    T::addmm_with(simd_level(), m, n, k, a, rsa, b, rsb, c, rsc);
}

/// ADDMMT with automatic dispatch.
#[inline]
pub fn addmmt<T: GemmDispatch>(
    m: usize,
    n: usize,
    k: usize,
    a: &[T],
    rsa: usize,
    b: &[T],
    rsb: usize,
    c: &mut [T],
    rsc: usize,
) {
    T::addmmt_with(simd_level(), m, n, k, a, rsa, b, rsb, c, rsc);
}

// =============================================================================
// Portable primitives
// =============================================================================

/// Gather: `c[i] = base[indices[i]]`.
///
/// # Panics
///
/// Panics on an index outside `base`; `cpu_mapping` rejects those first.
#[inline]
pub fn mapping<T1: Element, T2: GatherIndex>(base: &[T1], indices: &[T2], c: &mut [T1]) {
    scalar::mapping(base, indices, c);
}

/// Writes `n` consecutive copies of `src` into `dst`.
#[inline]
pub fn repeat<T: Element>(src: &[T], dst: &mut [T], n: usize) {
    scalar::repeat(src, dst, n);
}

/// Tiles the `rows × cols` matrix `src` `m × n` times into `dst`.
#[inline]
pub fn repeat_2d<T: Element>(
    rows: usize,
    cols: usize,
    src: &[T],
    rss: usize,
    dst: &mut [T],
    rsd: usize,
    m: usize,
    n: usize,
) {
    scalar::repeat_2d(rows, cols, src, rss, dst, rsd, m, n);
}
