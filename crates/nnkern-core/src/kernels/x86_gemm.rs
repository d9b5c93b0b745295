//! Register-blocked GEVV / ADDMM / ADDMMT kernels for x86_64.
//!
//! One module per (instruction set, element type):
//!
//! | module     | feature      | type  | lanes |
//! |------------|--------------|-------|-------|
//! | `sse_f32`  | `sse`        | `f32` | 4     |
//! | `sse_f64`  | `sse2`       | `f64` | 2     |
//! | `avx_f32`  | `avx`        | `f32` | 8     |
//! | `avx_f64`  | `avx`        | `f64` | 4     |
//! | `fma_f32`  | `avx`, `fma` | `f32` | 8     |
//! | `fma_f64`  | `avx`, `fma` | `f64` | 4     |
//!
//! The non-fused modules evaluate `c + a * b` per element in the same order
//! as the scalar loops, so ADDMM and GEVV are bit-identical to them. The FMA
//! modules round once per update and agree within tolerance. ADDMMT reduces
//! dot products across lanes and always agrees within tolerance only.
//!
//! All functions require runtime feature detection before calling, and the
//! caller guarantees every operand covers its strided span.

#![allow(clippy::wildcard_imports)]
#![allow(clippy::needless_range_loop)]

use std::arch::x86_64::*;

use super::scalar;
use super::x86_avx::{hsum_pd as hsum_pd256, hsum_ps as hsum_ps256};

// =============================================================================
// Lane helpers
// =============================================================================

#[target_feature(enable = "sse")]
#[inline]
unsafe fn madd_ps128(a: __m128, b: __m128, c: __m128) -> __m128 {
    _mm_add_ps(c, _mm_mul_ps(a, b))
}

#[target_feature(enable = "sse2")]
#[inline]
unsafe fn madd_pd128(a: __m128d, b: __m128d, c: __m128d) -> __m128d {
    _mm_add_pd(c, _mm_mul_pd(a, b))
}

#[target_feature(enable = "avx")]
#[inline]
unsafe fn madd_ps256(a: __m256, b: __m256, c: __m256) -> __m256 {
    _mm256_add_ps(c, _mm256_mul_ps(a, b))
}

#[target_feature(enable = "avx")]
#[inline]
unsafe fn madd_pd256(a: __m256d, b: __m256d, c: __m256d) -> __m256d {
    _mm256_add_pd(c, _mm256_mul_pd(a, b))
}

#[target_feature(enable = "avx", enable = "fma")]
#[inline]
unsafe fn fmadd_ps256(a: __m256, b: __m256, c: __m256) -> __m256 {
    _mm256_fmadd_ps(a, b, c)
}

#[target_feature(enable = "avx", enable = "fma")]
#[inline]
unsafe fn fmadd_pd256(a: __m256d, b: __m256d, c: __m256d) -> __m256d {
    _mm256_fmadd_pd(a, b, c)
}

#[target_feature(enable = "sse")]
#[inline]
unsafe fn hsum_ps128(v: __m128) -> f32 {
    let s = _mm_add_ps(v, _mm_movehl_ps(v, v));
    let s = _mm_add_ss(s, _mm_shuffle_ps(s, s, 0x55));
    _mm_cvtss_f32(s)
}

#[target_feature(enable = "sse2")]
#[inline]
unsafe fn hsum_pd128(v: __m128d) -> f64 {
    _mm_cvtsd_f64(_mm_add_sd(v, _mm_unpackhi_pd(v, v)))
}

// =============================================================================
// Kernel family
// =============================================================================

macro_rules! gemm_kernels {
    ($($module:ident: $t:ty, $lanes:expr, [$($feature:tt),+],
        $vec:ty, $zero:ident, $load:ident, $store:ident, $set1:ident,
        $madd:ident, $hsum:ident;)*) => {
        $(
            pub(crate) mod $module {
                use super::*;

                const LANES: usize = $lanes;

                /// `C[i][j] += a[i] * b[j]` for the `m × n` matrix `C`.
                ///
                /// # Safety
                ///
                /// CPU supports the module's features.
                #[target_feature($(enable = $feature),+)]
                pub(crate) unsafe fn addvv(
                    m: usize,
                    n: usize,
                    a: &[$t],
                    b: &[$t],
                    c: &mut [$t],
                    rsc: usize,
                ) {
                    let nb = n - n % LANES;
                    let pb = b.as_ptr();
                    for i in 0..m {
                        let alpha = a[i];
                        let va = $set1(alpha);
                        let row = &mut c[i * rsc..i * rsc + n];
                        let pc = row.as_mut_ptr();
                        let mut j = 0;
                        while j < nb {
                            $store(pc.add(j), $madd(va, $load(pb.add(j)), $load(pc.add(j))));
                            j += LANES;
                        }
                        scalar::axpy(alpha, &b[nb..n], &mut row[nb..]);
                    }
                }

                /// `C(m×n) += A(m×k) · B(k×n)`, four rows of `C` per register block.
                ///
                /// # Safety
                ///
                /// CPU supports the module's features.
                #[target_feature($(enable = $feature),+)]
                pub(crate) unsafe fn addmm(
                    m: usize,
                    n: usize,
                    k: usize,
                    a: &[$t],
                    rsa: usize,
                    b: &[$t],
                    rsb: usize,
                    c: &mut [$t],
                    rsc: usize,
                ) {
                    let mb = m - m % 4;
                    let nb = n - n % LANES;
                    let mut i = 0;
                    while i < mb {
                        addmm_rows::<4>(i, nb, k, a, rsa, b, rsb, c, rsc);
                        i += 4;
                    }
                    while i < m {
                        addmm_rows::<1>(i, nb, k, a, rsa, b, rsb, c, rsc);
                        i += 1;
                    }
                    // Right edge: same per-element order as the vector body.
                    for i in 0..m {
                        for j in nb..n {
                            let mut acc = c[i * rsc + j];
                            for p in 0..k {
                                acc = acc + a[i * rsa + p] * b[p * rsb + j];
                            }
                            c[i * rsc + j] = acc;
                        }
                    }
                }

                #[target_feature($(enable = $feature),+)]
                #[inline]
                unsafe fn addmm_rows<const R: usize>(
                    i0: usize,
                    nb: usize,
                    k: usize,
                    a: &[$t],
                    rsa: usize,
                    b: &[$t],
                    rsb: usize,
                    c: &mut [$t],
                    rsc: usize,
                ) {
                    let pb = b.as_ptr();
                    let pc = c.as_mut_ptr();
                    let mut j = 0;
                    while j < nb {
                        let mut acc: [$vec; R] = [$zero(); R];
                        for r in 0..R {
                            acc[r] = $load(pc.add((i0 + r) * rsc + j));
                        }
                        for p in 0..k {
                            let vb = $load(pb.add(p * rsb + j));
                            for r in 0..R {
                                acc[r] = $madd($set1(a[(i0 + r) * rsa + p]), vb, acc[r]);
                            }
                        }
                        for r in 0..R {
                            $store(pc.add((i0 + r) * rsc + j), acc[r]);
                        }
                        j += LANES;
                    }
                }

                /// `C(m×n) += A(m×k) · B(n×k)ᵗ`, four columns of `C` per register block.
                ///
                /// # Safety
                ///
                /// CPU supports the module's features.
                #[target_feature($(enable = $feature),+)]
                pub(crate) unsafe fn addmmt(
                    m: usize,
                    n: usize,
                    k: usize,
                    a: &[$t],
                    rsa: usize,
                    b: &[$t],
                    rsb: usize,
                    c: &mut [$t],
                    rsc: usize,
                ) {
                    let kb = k - k % LANES;
                    let nb = n - n % 4;
                    let pb = b.as_ptr();
                    for i in 0..m {
                        let a_row = &a[i * rsa..i * rsa + k];
                        let pa = a_row.as_ptr();
                        let mut j = 0;
                        while j < nb {
                            let mut acc: [$vec; 4] = [$zero(); 4];
                            let mut p = 0;
                            while p < kb {
                                let va = $load(pa.add(p));
                                for q in 0..4 {
                                    acc[q] = $madd(va, $load(pb.add((j + q) * rsb + p)), acc[q]);
                                }
                                p += LANES;
                            }
                            for q in 0..4 {
                                let b_row = &b[(j + q) * rsb..(j + q) * rsb + k];
                                let d = scalar::dot(&a_row[kb..], &b_row[kb..]) + $hsum(acc[q]);
                                c[i * rsc + j + q] = c[i * rsc + j + q] + d;
                            }
                            j += 4;
                        }
                        while j < n {
                            let mut acc = $zero();
                            let mut p = 0;
                            while p < kb {
                                acc = $madd($load(pa.add(p)), $load(pb.add(j * rsb + p)), acc);
                                p += LANES;
                            }
                            let b_row = &b[j * rsb..j * rsb + k];
                            let d = scalar::dot(&a_row[kb..], &b_row[kb..]) + $hsum(acc);
                            c[i * rsc + j] = c[i * rsc + j] + d;
                            j += 1;
                        }
                    }
                }
            }
        )*
    };
}

gemm_kernels! {
    sse_f32: f32, 4, ["sse"],
        __m128, _mm_setzero_ps, _mm_loadu_ps, _mm_storeu_ps, _mm_set1_ps,
        madd_ps128, hsum_ps128;
    sse_f64: f64, 2, ["sse2"],
        __m128d, _mm_setzero_pd, _mm_loadu_pd, _mm_storeu_pd, _mm_set1_pd,
        madd_pd128, hsum_pd128;
    avx_f32: f32, 8, ["avx"],
        __m256, _mm256_setzero_ps, _mm256_loadu_ps, _mm256_storeu_ps, _mm256_set1_ps,
        madd_ps256, hsum_ps256;
    avx_f64: f64, 4, ["avx"],
        __m256d, _mm256_setzero_pd, _mm256_loadu_pd, _mm256_storeu_pd, _mm256_set1_pd,
        madd_pd256, hsum_pd256;
    fma_f32: f32, 8, ["avx", "fma"],
        __m256, _mm256_setzero_ps, _mm256_loadu_ps, _mm256_storeu_ps, _mm256_set1_ps,
        fmadd_ps256, hsum_ps256;
    fma_f64: f64, 4, ["avx", "fma"],
        __m256d, _mm256_setzero_pd, _mm256_loadu_pd, _mm256_storeu_pd, _mm256_set1_pd,
        fmadd_pd256, hsum_pd256;
}
