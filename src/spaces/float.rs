//! Pairwise distance kernels over `f32` vectors: L2, L1 and Chebyshev.
//!
//! Each dispatch function picks a runtime-detected SIMD kernel when the
//! target supports it and the vector is long enough to amortize the
//! setup cost, falling back to a portable scalar loop otherwise. Only L2
//! has hand-written SIMD kernels (the teacher crate's `euclid_similarity_*`
//! family, ported to plain `&[f32]` slices); L1 and Chebyshev rely on the
//! scalar loop, written so the autovectorizer can still pack it.

#[cfg(target_arch = "x86_64")]
use super::float_avx::euclid_sum_sq_avx;
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
use super::float_sse::euclid_sum_sq_sse;
#[cfg(all(target_arch = "aarch64", target_feature = "neon"))]
use super::float_neon::euclid_sum_sq_neon;

#[cfg(target_arch = "x86_64")]
const MIN_DIM_SIZE_AVX: usize = 32;

#[cfg(any(
    target_arch = "x86",
    target_arch = "x86_64",
    all(target_arch = "aarch64", target_feature = "neon")
))]
const MIN_DIM_SIZE_SIMD: usize = 16;

/// Euclidean (L2) distance, returned in `f64` so the running sum of
/// squares has enough precision to pass a 1e-6 relative-tolerance
/// comparison against a naive double-precision reference.
pub fn l2_distance(a: &[f32], b: &[f32]) -> f64 {
    euclid_sum_sq(a, b).sqrt()
}

fn euclid_sum_sq(a: &[f32], b: &[f32]) -> f64 {
    debug_assert_eq!(a.len(), b.len());

    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx") && is_x86_feature_detected!("fma") && a.len() >= MIN_DIM_SIZE_AVX
        {
            return unsafe { euclid_sum_sq_avx(a, b) } as f64;
        }
    }

    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    {
        if is_x86_feature_detected!("sse") && a.len() >= MIN_DIM_SIZE_SIMD {
            return unsafe { euclid_sum_sq_sse(a, b) } as f64;
        }
    }

    #[cfg(all(target_arch = "aarch64", target_feature = "neon"))]
    {
        if std::arch::is_aarch64_feature_detected!("neon") && a.len() >= MIN_DIM_SIZE_SIMD {
            return unsafe { euclid_sum_sq_neon(a, b) } as f64;
        }
    }

    euclid_sum_sq_scalar(a, b)
}

pub fn euclid_sum_sq_scalar(a: &[f32], b: &[f32]) -> f64 {
    a.iter().zip(b).map(|(&x, &y)| {
        let d = x as f64 - y as f64;
        d * d
    }).sum()
}

/// Manhattan (L1) distance.
pub fn l1_distance(a: &[f32], b: &[f32]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(&x, &y)| (x as f64 - y as f64).abs()).sum()
}

/// Chebyshev (L-infinity) distance.
pub fn chebyshev_distance(a: &[f32], b: &[f32]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).fold(0.0_f64, |acc, (&x, &y)| acc.max((x as f64 - y as f64).abs()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn l2_matches_naive_reference() {
        let a = [1.0_f32, 2.0, 3.0, -4.0];
        let b = [0.5_f32, 2.5, 3.0, 1.0];
        let expected: f64 =
            a.iter().zip(&b).map(|(&x, &y)| (x as f64 - y as f64).powi(2)).sum::<f64>().sqrt();
        assert!((l2_distance(&a, &b) - expected).abs() < 1e-9);
    }

    #[test]
    fn l1_matches_naive_reference() {
        let a = [1.0_f32, -2.0, 3.5];
        let b = [0.0_f32, 2.0, -1.5];
        assert_eq!(l1_distance(&a, &b), 1.0 + 4.0 + 5.0);
    }

    #[test]
    fn chebyshev_matches_naive_reference() {
        let a = [1.0_f32, -2.0, 3.5];
        let b = [0.0_f32, 2.0, -1.5];
        assert_eq!(chebyshev_distance(&a, &b), 5.0);
    }

    #[test]
    fn identity_is_zero() {
        let a = [1.0_f32, 2.0, 3.0];
        assert_eq!(l2_distance(&a, &a), 0.0);
        assert_eq!(l1_distance(&a, &a), 0.0);
        assert_eq!(chebyshev_distance(&a, &a), 0.0);
    }

    #[test]
    fn symmetric() {
        let a = [1.0_f32, -7.0, 3.0];
        let b = [4.0_f32, 2.0, -3.5];
        assert_eq!(l2_distance(&a, &b), l2_distance(&b, &a));
        assert_eq!(l1_distance(&a, &b), l1_distance(&b, &a));
        assert_eq!(chebyshev_distance(&a, &b), chebyshev_distance(&b, &a));
    }
}
