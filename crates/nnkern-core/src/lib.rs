//! # nnkern Core
//!
//! CPU-feature-dispatching SIMD kernels for a small tensor-math runtime.
//!
//! Every numeric primitive exists as a portable scalar kernel plus one or more
//! hand-written x86_64 variants (SSE2, SSE3, AVX, AVX2, FMA). At each call the
//! dispatch layer picks the fastest variant the running CPU supports, and all
//! variants of a kernel produce the same result as the scalar one (bit-exact
//! for integers, within rounding tolerance for floats).
//!
//! ## Layers
//!
//! - [`cpu`] — cached runtime detection of instruction-set extensions
//! - [`kernels`] — per-ISA kernels and the tiling drivers that stitch aligned
//!   blocks and scalar remainders together
//! - [`dispatch`] — per-primitive selection of the kernel variant
//! - [`ops`] — the shape-checked `cpu_*` API intended for layer code
//!
//! ## Quick Start
//!
//! ```rust
//! use nnkern_core::buffer::{Matrix, Shaped, Vector};
//! use nnkern_core::ops::{cpu_adds_value, cpu_reduce_row_sum, cpu_transpose};
//!
//! fn main() -> nnkern_core::Result<()> {
//!     let a = Matrix::<i8>::from_vec(2, 3, vec![1, 2, 3, 4, 5, 6])?;
//!
//!     let mut c = Matrix::<i8>::zeros(2, 3);
//!     cpu_adds_value(&mut c, 120, &a)?;
//!     assert_eq!(c.to_vec(), vec![121, 122, 123, 124, 125, 126]);
//!
//!     let mut sums = Vector::<i32>::zeros(2);
//!     cpu_reduce_row_sum(&mut sums, &a)?;
//!     assert_eq!(sums.as_slice(), &[6, 15]);
//!
//!     let mut t = Matrix::<i8>::zeros(3, 2);
//!     cpu_transpose(&mut t, &a)?;
//!     assert_eq!(t.to_vec(), vec![1, 4, 2, 5, 3, 6]);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![cfg_attr(
    test,
    allow(
        clippy::doc_markdown,
        clippy::uninlined_format_args,
        clippy::cast_lossless,
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss,
        clippy::float_cmp
    )
)]

pub mod buffer;
pub mod config;
#[cfg(test)]
mod config_tests;
pub mod cpu;
pub mod dispatch;
pub mod element;
pub mod error;
pub mod kernels;
pub mod ops;

pub use buffer::{BufferKind, Matrix, Shaped, Tensor, Vector};
pub use config::{ConfigError, KernelConfig};
pub use cpu::{
    cpu_features, detected_features, is_support_avx, is_support_avx2, is_support_fma,
    is_support_sse, is_support_sse2, is_support_sse3, is_support_sse41, is_support_ssse3,
    simd_level, supported_levels, warmup_kernels, CpuFeatures, SimdLevel,
};
pub use element::{Accumulator, Element, FloatElement, GatherIndex, SaturatingElement};
pub use error::{Error, Result};
pub use ops::ReduceMode;
