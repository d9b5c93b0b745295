//! CPU feature probe.
//!
//! Answers "does this process's CPU support extension X?" in O(1) after the
//! first query. Detection runs once, behind a `OnceLock`, and its result never
//! changes afterwards.
//!
//! Under-detection only costs speed because every kernel has a scalar
//! fallback. Over-detection would execute illegal instructions, so detection
//! is conservative: an extension is reported only together with all of the
//! extensions below it in the [`SimdLevel`] chain.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::config;

// =============================================================================
// Feature flags
// =============================================================================

/// Bitmask of instruction-set extensions.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CpuFeatures(u32);

impl CpuFeatures {
    /// No extension.
    pub const NONE: Self = Self(0);
    /// SSE.
    pub const SSE: Self = Self(1 << 0);
    /// SSE2.
    pub const SSE2: Self = Self(1 << 1);
    /// SSE3.
    pub const SSE3: Self = Self(1 << 2);
    /// Supplemental SSE3.
    pub const SSSE3: Self = Self(1 << 3);
    /// SSE4.1.
    pub const SSE41: Self = Self(1 << 4);
    /// AVX.
    pub const AVX: Self = Self(1 << 5);
    /// AVX2.
    pub const AVX2: Self = Self(1 << 6);
    /// Fused multiply-add (FMA3).
    pub const FMA: Self = Self(1 << 7);

    const NAMED: [(Self, &'static str); 8] = [
        (Self::SSE, "sse"),
        (Self::SSE2, "sse2"),
        (Self::SSE3, "sse3"),
        (Self::SSSE3, "ssse3"),
        (Self::SSE41, "sse4.1"),
        (Self::AVX, "avx"),
        (Self::AVX2, "avx2"),
        (Self::FMA, "fma"),
    ];

    /// Raw bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether every flag in `other` is set in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether no flag is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Flags set in `self` but not in `other`.
    #[must_use]
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Drops every flag whose prerequisites are missing.
    ///
    /// Each extension requires the one before it in the chain
    /// SSE → SSE2 → SSE3 → SSSE3 → SSE4.1 → AVX → AVX2; FMA requires AVX.
    #[must_use]
    pub const fn normalized(self) -> Self {
        const CHAIN: [CpuFeatures; 7] = [
            CpuFeatures::SSE,
            CpuFeatures::SSE2,
            CpuFeatures::SSE3,
            CpuFeatures::SSSE3,
            CpuFeatures::SSE41,
            CpuFeatures::AVX,
            CpuFeatures::AVX2,
        ];
        let mut out = 0;
        let mut i = 0;
        while i < CHAIN.len() {
            if self.0 & CHAIN[i].0 == 0 {
                break;
            }
            out |= CHAIN[i].0;
            i += 1;
        }
        if self.0 & Self::FMA.0 != 0 && out & Self::AVX.0 != 0 {
            out |= Self::FMA.0;
        }
        Self(out)
    }

    fn detect() -> Self {
        #[allow(unused_mut)]
        let mut features = Self::NONE;
        #[cfg(target_arch = "x86_64")]
        {
            let probes = [
                (is_x86_feature_detected!("sse"), Self::SSE),
                (is_x86_feature_detected!("sse2"), Self::SSE2),
                (is_x86_feature_detected!("sse3"), Self::SSE3),
                (is_x86_feature_detected!("ssse3"), Self::SSSE3),
                (is_x86_feature_detected!("sse4.1"), Self::SSE41),
                (is_x86_feature_detected!("avx"), Self::AVX),
                (is_x86_feature_detected!("avx2"), Self::AVX2),
                (is_x86_feature_detected!("fma"), Self::FMA),
            ];
            for (present, flag) in probes {
                if present {
                    features |= flag;
                }
            }
        }
        features.normalized()
    }
}

impl BitOr for CpuFeatures {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for CpuFeatures {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for CpuFeatures {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Display for CpuFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut first = true;
        for (flag, name) in Self::NAMED {
            if self.contains(flag) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for CpuFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CpuFeatures({self})")
    }
}

// =============================================================================
// Dispatch tiers
// =============================================================================

/// Dispatch tier, ordered from slowest to fastest.
///
/// A tier is usable when all of its [`required_features`](Self::required_features)
/// are enabled. `Fma` means AVX2 plus FMA.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SimdLevel {
    /// Portable scalar kernels.
    #[default]
    Scalar,
    /// SSE.
    Sse,
    /// SSE2.
    Sse2,
    /// SSE3.
    Sse3,
    /// SSSE3.
    Ssse3,
    /// SSE4.1.
    Sse41,
    /// AVX.
    Avx,
    /// AVX2.
    Avx2,
    /// AVX2 + FMA.
    Fma,
}

impl SimdLevel {
    /// Every tier, slowest first.
    pub const ALL: [Self; 9] = [
        Self::Scalar,
        Self::Sse,
        Self::Sse2,
        Self::Sse3,
        Self::Ssse3,
        Self::Sse41,
        Self::Avx,
        Self::Avx2,
        Self::Fma,
    ];

    /// Features a CPU must expose for this tier.
    #[must_use]
    pub const fn required_features(self) -> CpuFeatures {
        let bits = match self {
            Self::Scalar => 0,
            Self::Sse => 0b1,
            Self::Sse2 => 0b11,
            Self::Sse3 => 0b111,
            Self::Ssse3 => 0b1111,
            Self::Sse41 => 0b1_1111,
            Self::Avx => 0b11_1111,
            Self::Avx2 => 0b111_1111,
            Self::Fma => 0b1111_1111,
        };
        CpuFeatures(bits)
    }

    /// Highest tier whose requirements `features` satisfies.
    #[must_use]
    pub fn best_for(features: CpuFeatures) -> Self {
        Self::ALL
            .into_iter()
            .rev()
            .find(|level| features.contains(level.required_features()))
            .unwrap_or(Self::Scalar)
    }

    /// Features left enabled when dispatch is capped at this tier.
    #[must_use]
    pub const fn cap_mask(self) -> CpuFeatures {
        self.required_features()
    }
}

impl fmt::Display for SimdLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Scalar => "scalar",
            Self::Sse => "sse",
            Self::Sse2 => "sse2",
            Self::Sse3 => "sse3",
            Self::Ssse3 => "ssse3",
            Self::Sse41 => "sse4.1",
            Self::Avx => "avx",
            Self::Avx2 => "avx2",
            Self::Fma => "avx2+fma",
        })
    }
}

// =============================================================================
// Cached probe
// =============================================================================

struct Probe {
    detected: CpuFeatures,
    enabled: CpuFeatures,
    level: SimdLevel,
}

static PROBE: OnceLock<Probe> = OnceLock::new();

fn init_probe() -> Probe {
    let detected = CpuFeatures::detect();
    let config = config::active();
    let mut enabled = detected;
    if let Some(cap) = config.max_level {
        enabled = enabled & cap.cap_mask();
    }
    if config.disable_fma {
        enabled = enabled.without(CpuFeatures::FMA);
    }
    let level = SimdLevel::best_for(enabled);
    tracing::info!(
        detected = %detected,
        enabled = %enabled,
        level = %level,
        "cpu feature probe initialized"
    );
    Probe {
        detected,
        enabled,
        level,
    }
}

#[inline]
fn probe() -> &'static Probe {
    PROBE.get_or_init(init_probe)
}

/// Extensions the hardware reports, before any configured cap.
#[must_use]
pub fn detected_features() -> CpuFeatures {
    probe().detected
}

/// Extensions the dispatcher may use.
#[inline]
#[must_use]
pub fn cpu_features() -> CpuFeatures {
    probe().enabled
}

/// Returns the cached dispatch tier.
#[inline]
#[must_use]
pub fn simd_level() -> SimdLevel {
    probe().level
}

/// Every tier usable on this machine, slowest first. Always starts with `Scalar`.
#[must_use]
pub fn supported_levels() -> Vec<SimdLevel> {
    let best = simd_level();
    SimdLevel::ALL
        .into_iter()
        .filter(|level| *level <= best)
        .collect()
}

/// Clamps a requested tier to what this machine supports.
#[inline]
#[must_use]
pub fn effective_level(requested: SimdLevel) -> SimdLevel {
    requested.min(simd_level())
}

macro_rules! support_predicates {
    ($($name:ident => $flag:ident, $doc:literal;)*) => {
        $(
            #[doc = $doc]
            #[inline]
            #[must_use]
            pub fn $name() -> bool {
                cpu_features().contains(CpuFeatures::$flag)
            }
        )*
    };
}

support_predicates! {
    is_support_sse => SSE, "Whether SSE kernels may run.";
    is_support_sse2 => SSE2, "Whether SSE2 kernels may run.";
    is_support_sse3 => SSE3, "Whether SSE3 kernels may run.";
    is_support_ssse3 => SSSE3, "Whether SSSE3 kernels may run.";
    is_support_sse41 => SSE41, "Whether SSE4.1 kernels may run.";
    is_support_avx => AVX, "Whether AVX kernels may run.";
    is_support_avx2 => AVX2, "Whether AVX2 kernels may run.";
    is_support_fma => FMA, "Whether FMA kernels may run.";
}

/// Initializes the probe and runs each dispatcher once on small inputs.
///
/// Call this at application startup so the first real kernel call does not
/// pay for feature detection and cold instruction caches.
///
/// # Example
///
/// ```
/// use nnkern_core::cpu::warmup_kernels;
/// warmup_kernels();
/// ```
pub fn warmup_kernels() {
    use crate::dispatch;

    let level = simd_level();
    tracing::debug!(%level, "warming up kernels");

    let a = [1_i16; 64];
    let mut c = [0_i16; 64];
    dispatch::adds(&a, &a, &mut c);

    let x = [0.5_f32; 64];
    let mut y = [0.0_f32; 64];
    dispatch::mul(&x, &x, &mut y);

    let mut t = [0.0_f32; 64];
    dispatch::transpose(8, 8, &x, 8, &mut t, 8);

    let mut sums = [0.0_f32; 8];
    dispatch::reduce_row_sum(8, 8, &x, 8, &mut sums);

    let mut g = [0.0_f32; 64];
    dispatch::addmm(8, 8, 8, &x, 8, &x, 8, &mut g, 8);
}
