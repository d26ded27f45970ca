//! Runtime CPU feature detection.

use bitflags::bitflags;

bitflags! {
    /// CPU features relevant to the SIMD interpolation back-ends.
    ///
    /// The set is detected once at engine construction and drives which
    /// implementations populate the operator table; it is never re-queried
    /// on the interpolation path.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CpuFeatures: u32 {
        /// SSE2 (baseline on x86_64, still gated for clarity).
        const SSE2 = 1 << 0;
        /// SSSE3 (byte shuffles for filter tap construction).
        const SSSE3 = 1 << 1;
        /// AVX2 (256-bit integer SIMD).
        const AVX2 = 1 << 2;
        /// NEON (baseline on AArch64).
        const NEON = 1 << 3;
    }
}

impl CpuFeatures {
    /// Detect the features of the running CPU.
    #[cfg(target_arch = "x86_64")]
    pub fn detect() -> Self {
        let mut caps = Self::empty();
        if is_x86_feature_detected!("sse2") {
            caps |= Self::SSE2;
        }
        if is_x86_feature_detected!("ssse3") {
            caps |= Self::SSSE3;
        }
        if is_x86_feature_detected!("avx2") {
            caps |= Self::AVX2;
        }
        caps
    }

    /// Detect the features of the running CPU.
    #[cfg(target_arch = "aarch64")]
    pub fn detect() -> Self {
        // NEON is architecturally guaranteed on AArch64.
        Self::NEON
    }

    /// Detect the features of the running CPU.
    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    pub fn detect() -> Self {
        Self::empty()
    }

    /// Human-readable name of the widest detected feature.
    pub fn best_level(&self) -> &'static str {
        if self.contains(Self::AVX2) {
            "AVX2"
        } else if self.contains(Self::SSSE3) {
            "SSSE3"
        } else if self.contains(Self::SSE2) {
            "SSE2"
        } else if self.contains(Self::NEON) {
            "NEON"
        } else {
            "scalar"
        }
    }
}
