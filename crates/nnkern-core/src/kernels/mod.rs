//! Element-kernel library.
//!
//! One kernel per (operation, element type, instruction set). The scalar
//! module is the reference; the `x86_*` modules hold hand-written variants
//! that must match it (bit-exact for integers and for non-fused float
//! arithmetic, within rounding tolerance where summation order changes).
//!
//! - [`scalar`] — portable kernels for every primitive
//! - `block` — tiling drivers: SIMD tiles over the aligned region, scalar
//!   kernels over the remainder
//! - `x86_sse2` / `x86_sse3` / `x86_avx` / `x86_avx2` — per-ISA kernels
//! - `x86_gemm` — register-blocked GEMM family for SSE, AVX and FMA
//!
//! SIMD kernels are `unsafe` because they require a CPU feature; callers go
//! through [`crate::dispatch`], which checks the cached probe first.

pub(crate) mod block;
pub mod scalar;

#[cfg(target_arch = "x86_64")]
pub(crate) mod x86_avx;
#[cfg(target_arch = "x86_64")]
pub(crate) mod x86_avx2;
#[cfg(target_arch = "x86_64")]
pub(crate) mod x86_gemm;
#[cfg(target_arch = "x86_64")]
pub(crate) mod x86_sse2;
#[cfg(target_arch = "x86_64")]
pub(crate) mod x86_sse3;

#[cfg(test)]
mod scalar_tests;
