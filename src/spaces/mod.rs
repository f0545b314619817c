//! Pairwise distance kernels (C1): one dispatch function per metric
//! family, each choosing a SIMD-accelerated variant when the target and
//! the vector width support it, and falling back to a portable scalar
//! loop otherwise.

pub mod float;
pub mod hamming;

#[cfg(target_arch = "x86_64")]
mod float_avx;
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
mod float_sse;
#[cfg(all(target_arch = "aarch64", target_feature = "neon"))]
mod float_neon;
