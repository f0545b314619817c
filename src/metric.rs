//! Metric tags and the top-level [`distance`] free function.
//!
//! Each metric is a zero-sized marker type implementing [`Metric`]. The
//! trait fixes the element type the metric operates on (`f32` for the
//! three real-valued metrics, `u8` for Hamming) and the distance's result
//! type, and dispatches to the kernels in [`crate::spaces`].

use std::fmt;

use crate::spaces::{float, hamming};

/// A metric tag identifying which of the four supported distances an
/// index or a raw [`distance`] call uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    L2,
    L1,
    Chebyshev,
    Hamming,
}

impl MetricKind {
    pub(crate) fn as_tag(self) -> u8 {
        match self {
            MetricKind::L2 => 0,
            MetricKind::L1 => 1,
            MetricKind::Chebyshev => 2,
            MetricKind::Hamming => 3,
        }
    }

    pub(crate) fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(MetricKind::L2),
            1 => Some(MetricKind::L1),
            2 => Some(MetricKind::Chebyshev),
            3 => Some(MetricKind::Hamming),
            _ => None,
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricKind::L2 => "l2",
            MetricKind::L1 => "l1",
            MetricKind::Chebyshev => "chebyshev",
            MetricKind::Hamming => "hamming",
        };
        f.write_str(name)
    }
}

/// The element type a metric's domain is defined over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    F32,
    U8,
}

impl ElementType {
    pub(crate) fn as_tag(self) -> u8 {
        match self {
            ElementType::F32 => 0,
            ElementType::U8 => 1,
        }
    }

    pub(crate) fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(ElementType::F32),
            1 => Some(ElementType::U8),
            _ => None,
        }
    }
}

/// A compile-time metric family: fixes the element type and the
/// pairwise-distance kernel used throughout the VPT and BKT engines.
///
/// `Dist` is the distance's result type (`f64` for the real-valued
/// metrics, `u32` for Hamming); it must be `Ord` so it can be used
/// directly as the key of the bounded top-k heap (C2).
pub trait Metric: Send + Sync + Clone + fmt::Debug + 'static {
    type Elem: Copy + fmt::Debug;
    type Dist: Ord + Copy + fmt::Debug;

    const KIND: MetricKind;
    const ELEMENT_TYPE: ElementType;

    fn distance(a: &[Self::Elem], b: &[Self::Elem]) -> Self::Dist;

    /// Widens a distance value to `f64` for the external query API,
    /// which always reports distances as `f64` regardless of metric.
    fn dist_to_f64(d: Self::Dist) -> f64;

    /// The inverse of [`Metric::dist_to_f64`], used to decode a
    /// serialized tree body's `mu`/bounds fields (always stored as
    /// `f64` regardless of metric) back into `Self::Dist`.
    fn dist_from_f64(d: f64) -> Self::Dist;

    /// The zero distance, used as the base case when folding a
    /// never-excluded bound in the VPT engine's pruning check.
    const ZERO_DIST: Self::Dist;

    /// `|a - b|`, used by the VPT k-NN engine's triangle-inequality and
    /// cached-bounds pruning checks.
    fn dist_abs_diff(a: Self::Dist, b: Self::Dist) -> Self::Dist;
}

#[derive(Debug, Clone)]
pub enum L2 {}

impl Metric for L2 {
    type Elem = f32;
    type Dist = ordered_float::OrderedFloat<f64>;
    const KIND: MetricKind = MetricKind::L2;
    const ELEMENT_TYPE: ElementType = ElementType::F32;

    fn distance(a: &[f32], b: &[f32]) -> Self::Dist {
        ordered_float::OrderedFloat(float::l2_distance(a, b))
    }

    fn dist_to_f64(d: Self::Dist) -> f64 {
        d.into_inner()
    }

    fn dist_from_f64(d: f64) -> Self::Dist {
        ordered_float::OrderedFloat(d)
    }

    const ZERO_DIST: Self::Dist = ordered_float::OrderedFloat(0.0);

    fn dist_abs_diff(a: Self::Dist, b: Self::Dist) -> Self::Dist {
        ordered_float::OrderedFloat((a.into_inner() - b.into_inner()).abs())
    }
}

#[derive(Debug, Clone)]
pub enum L1 {}

impl Metric for L1 {
    type Elem = f32;
    type Dist = ordered_float::OrderedFloat<f64>;
    const KIND: MetricKind = MetricKind::L1;
    const ELEMENT_TYPE: ElementType = ElementType::F32;

    fn distance(a: &[f32], b: &[f32]) -> Self::Dist {
        ordered_float::OrderedFloat(float::l1_distance(a, b))
    }

    fn dist_to_f64(d: Self::Dist) -> f64 {
        d.into_inner()
    }

    fn dist_from_f64(d: f64) -> Self::Dist {
        ordered_float::OrderedFloat(d)
    }

    const ZERO_DIST: Self::Dist = ordered_float::OrderedFloat(0.0);

    fn dist_abs_diff(a: Self::Dist, b: Self::Dist) -> Self::Dist {
        ordered_float::OrderedFloat((a.into_inner() - b.into_inner()).abs())
    }
}

#[derive(Debug, Clone)]
pub enum Chebyshev {}

impl Metric for Chebyshev {
    type Elem = f32;
    type Dist = ordered_float::OrderedFloat<f64>;
    const KIND: MetricKind = MetricKind::Chebyshev;
    const ELEMENT_TYPE: ElementType = ElementType::F32;

    fn distance(a: &[f32], b: &[f32]) -> Self::Dist {
        ordered_float::OrderedFloat(float::chebyshev_distance(a, b))
    }

    fn dist_to_f64(d: Self::Dist) -> f64 {
        d.into_inner()
    }

    fn dist_from_f64(d: f64) -> Self::Dist {
        ordered_float::OrderedFloat(d)
    }

    const ZERO_DIST: Self::Dist = ordered_float::OrderedFloat(0.0);

    fn dist_abs_diff(a: Self::Dist, b: Self::Dist) -> Self::Dist {
        ordered_float::OrderedFloat((a.into_inner() - b.into_inner()).abs())
    }
}

#[derive(Debug, Clone)]
pub enum Hamming {}

impl Metric for Hamming {
    type Elem = u8;
    type Dist = u32;
    const KIND: MetricKind = MetricKind::Hamming;
    const ELEMENT_TYPE: ElementType = ElementType::U8;

    fn distance(a: &[u8], b: &[u8]) -> Self::Dist {
        hamming::hamming_distance(a, b)
    }

    fn dist_to_f64(d: Self::Dist) -> f64 {
        d as f64
    }

    fn dist_from_f64(d: f64) -> Self::Dist {
        d as u32
    }

    const ZERO_DIST: Self::Dist = 0;

    fn dist_abs_diff(a: Self::Dist, b: Self::Dist) -> Self::Dist {
        a.abs_diff(b)
    }
}

/// Either element type a query/point buffer can carry, for the
/// metric-agnostic [`distance`] free function.
#[derive(Debug, Clone, Copy)]
pub enum Element<'a> {
    F32(&'a [f32]),
    U8(&'a [u8]),
}

/// Computes the distance between two vectors under the given metric tag.
///
/// This is the module-level escape hatch described in the external
/// interface contract: callers that don't want to build a full index can
/// call it directly, with the same validation rules `set`/query batches
/// apply (matching domain element type, matching length).
///
/// # Errors
///
/// Returns [`crate::Error::TypeMismatch`] if `a`/`b` don't match the
/// element type `metric` operates on, or [`crate::Error::DimensionMismatch`]
/// if `a` and `b` have different lengths.
pub fn distance(metric: MetricKind, a: Element<'_>, b: Element<'_>) -> crate::Result<f64> {
    match (metric, a, b) {
        (MetricKind::L2, Element::F32(a), Element::F32(b)) => {
            check_len(a.len(), b.len())?;
            Ok(float::l2_distance(a, b))
        }
        (MetricKind::L1, Element::F32(a), Element::F32(b)) => {
            check_len(a.len(), b.len())?;
            Ok(float::l1_distance(a, b))
        }
        (MetricKind::Chebyshev, Element::F32(a), Element::F32(b)) => {
            check_len(a.len(), b.len())?;
            Ok(float::chebyshev_distance(a, b))
        }
        (MetricKind::Hamming, Element::U8(a), Element::U8(b)) => {
            check_len(a.len(), b.len())?;
            Ok(hamming::hamming_distance(a, b) as f64)
        }
        _ => Err(crate::Error::TypeMismatch),
    }
}

fn check_len(a: usize, b: usize) -> crate::Result<()> {
    if a != b {
        return Err(crate::Error::DimensionMismatch { expected: a, received: b });
    }
    Ok(())
}
