//! Element types accepted by the kernels.
//!
//! The set is closed: signed/unsigned 8/16/32-bit integers and `f32`/`f64`.
//! Which operations a type supports is expressed through the traits below, so
//! an unsupported combination (e.g. saturating add on `f32`) is a compile error.

use std::fmt::Debug;
use std::ops::{Add, Mul};

mod sealed {
    pub trait Sealed {}
}

/// A numeric element stored in a shaped buffer.
pub trait Element:
    bytemuck::Pod + Default + PartialEq + PartialOrd + Debug + Send + Sync + sealed::Sealed
{
    /// Type name used in diagnostics.
    const NAME: &'static str;
    /// Whether the type is a floating-point type.
    const IS_FLOAT: bool;
}

/// Integer elements with a saturating add.
pub trait SaturatingElement: Element {
    /// `self + rhs`, clamped to `[MIN, MAX]`.
    #[must_use]
    fn adds(self, rhs: Self) -> Self;
}

/// Floating-point elements.
pub trait FloatElement: Element + Add<Output = Self> + Mul<Output = Self> {
    /// Additive identity.
    const ZERO: Self;
    /// `1 / count`, used by average reductions.
    #[must_use]
    fn recip_count(count: usize) -> Self;
}

/// Accumulator type for reductions over `T`.
///
/// Values are widened before they are summed. Integer accumulation wraps in
/// two's complement, which keeps it associative and makes every summation
/// order produce the same bits.
pub trait Accumulator<T: Element>: Element {
    /// Converts a source element into the accumulator type.
    #[must_use]
    fn widen(value: T) -> Self;
    /// `self + rhs` in accumulator arithmetic.
    #[must_use]
    fn accumulate(self, rhs: Self) -> Self;
}

/// Index types accepted by the mapping (gather) kernel.
pub trait GatherIndex: Element {
    /// The index as `usize`, or `None` if it is negative.
    fn to_index(self) -> Option<usize>;
    /// The index as a signed value, for diagnostics.
    fn to_i64(self) -> i64;
}

macro_rules! impl_element {
    ($($t:ty => $float:expr),* $(,)?) => {
        $(
            impl sealed::Sealed for $t {}
            impl Element for $t {
                const NAME: &'static str = stringify!($t);
                const IS_FLOAT: bool = $float;
            }
        )*
    };
}

impl_element!(
    i8 => false,
    u8 => false,
    i16 => false,
    u16 => false,
    i32 => false,
    u32 => false,
    f32 => true,
    f64 => true,
);

macro_rules! impl_saturating {
    ($($t:ty),*) => {
        $(
            impl SaturatingElement for $t {
                #[inline]
                fn adds(self, rhs: Self) -> Self {
                    self.saturating_add(rhs)
                }
            }
        )*
    };
}

impl_saturating!(i8, u8, i16, u16, i32, u32);

impl FloatElement for f32 {
    const ZERO: Self = 0.0;

    #[inline]
    #[allow(clippy::cast_precision_loss)] // Row counts far below 2^24 in practice.
    fn recip_count(count: usize) -> Self {
        1.0 / count as f32
    }
}

impl FloatElement for f64 {
    const ZERO: Self = 0.0;

    #[inline]
    #[allow(clippy::cast_precision_loss)]
    fn recip_count(count: usize) -> Self {
        1.0 / count as f64
    }
}

macro_rules! impl_int_accumulator {
    ($acc:ty: $($src:ty),*) => {
        $(
            impl Accumulator<$src> for $acc {
                #[inline]
                fn widen(value: $src) -> Self {
                    <$acc>::from(value)
                }

                #[inline]
                fn accumulate(self, rhs: Self) -> Self {
                    self.wrapping_add(rhs)
                }
            }
        )*
    };
}

impl_int_accumulator!(i32: i8, i16, i32);
impl_int_accumulator!(u32: u8, u16, u32);

macro_rules! impl_float_accumulator {
    ($acc:ty: $($src:ty),*) => {
        $(
            impl Accumulator<$src> for $acc {
                #[inline]
                fn widen(value: $src) -> Self {
                    <$acc>::from(value)
                }

                #[inline]
                fn accumulate(self, rhs: Self) -> Self {
                    self + rhs
                }
            }
        )*
    };
}

impl_float_accumulator!(f32: f32);
impl_float_accumulator!(f64: f32, f64);

macro_rules! impl_gather_index {
    ($($t:ty),*) => {
        $(
            impl GatherIndex for $t {
                #[inline]
                fn to_index(self) -> Option<usize> {
                    usize::try_from(self).ok()
                }

                #[inline]
                fn to_i64(self) -> i64 {
                    i64::from(self)
                }
            }
        )*
    };
}

impl_gather_index!(u8, u16, u32, i32);
