// src/core/geometry.rs

//! Axis-aligned boundary algebra used by every asset map operation.
//!
//! Boundaries are plain `Copy` values; every operation derives a new
//! boundary rather than adjusting an existing one.

use crate::core::common::AssetMapError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the three split axes, cycled x -> y -> z -> x by tree depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// All axes in cycling order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// The axis used one level further down the tree.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::Z,
            Axis::Z => Axis::X,
        }
    }

    /// Numeric index of the axis (0 = x, 1 = y, 2 = z).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Axis for a numeric index, wrapping modulo three.
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        match index % 3 {
            0 => Axis::X,
            1 => Axis::Y,
            _ => Axis::Z,
        }
    }
}

/// Which half of a split boundary to take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalfSide {
    /// The half below the midpoint (the left child's region).
    Lower,
    /// The half above the midpoint (the right child's region).
    Upper,
}

impl HalfSide {
    /// Maps a sign to a side: negative is `Lower`, zero or positive is `Upper`.
    #[must_use]
    pub fn from_sign(sign: f64) -> Self {
        if sign < 0.0 {
            HalfSide::Lower
        } else {
            HalfSide::Upper
        }
    }
}

/// How boundary A relates to boundary B.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intersection {
    /// A and B do not overlap on at least one axis.
    Outside,
    /// A lies entirely within B (bounds inclusive).
    Inside,
    /// A overlaps B but is not contained by it.
    Partial,
}

/// An axis-aligned 3D bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    pub xmin: f64,
    pub ymin: f64,
    pub zmin: f64,
    pub xmax: f64,
    pub ymax: f64,
    pub zmax: f64,
}

impl Boundary {
    #[must_use]
    pub const fn new(xmin: f64, ymin: f64, zmin: f64, xmax: f64, ymax: f64, zmax: f64) -> Self {
        Boundary { xmin, ymin, zmin, xmax, ymax, zmax }
    }

    /// Builds a boundary and rejects non-finite scalars or inverted extents.
    pub fn try_new(
        xmin: f64,
        ymin: f64,
        zmin: f64,
        xmax: f64,
        ymax: f64,
        zmax: f64,
    ) -> Result<Self, AssetMapError> {
        let boundary = Boundary::new(xmin, ymin, zmin, xmax, ymax, zmax);
        boundary.validate()?;
        Ok(boundary)
    }

    /// A cube centred on the origin with the given half-extent on every axis.
    #[must_use]
    pub fn cube(extent: f64) -> Self {
        Boundary::new(-extent, -extent, -extent, extent, extent, extent)
    }

    #[must_use]
    pub const fn min(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.xmin,
            Axis::Y => self.ymin,
            Axis::Z => self.zmin,
        }
    }

    #[must_use]
    pub const fn max(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.xmax,
            Axis::Y => self.ymax,
            Axis::Z => self.zmax,
        }
    }

    /// Midpoint of the extent along `axis`.
    #[must_use]
    pub fn midpoint(&self, axis: Axis) -> f64 {
        (self.max(axis) + self.min(axis)) / 2.0
    }

    /// Check if every scalar is finite and min <= max on all three axes
    #[must_use]
    pub fn is_valid(&self) -> bool {
        Axis::ALL.iter().all(|&axis| {
            let (lo, hi) = (self.min(axis), self.max(axis));
            lo.is_finite() && hi.is_finite() && lo <= hi
        })
    }

    pub fn validate(&self) -> Result<(), AssetMapError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(AssetMapError::InvalidBoundary(format!("{self}")))
        }
    }

    /// Classifies this boundary against `other`.
    #[must_use]
    pub fn classify(&self, other: &Boundary) -> Intersection {
        classify(self, other)
    }

    /// Returns the lower or upper half of this boundary split at the midpoint of `axis`.
    #[must_use]
    pub fn half(&self, axis: Axis, side: HalfSide) -> Boundary {
        split_half(self, axis, side)
    }

    /// Both halves of this boundary along `axis`, lower first.
    #[must_use]
    pub fn halves(&self, axis: Axis) -> (Boundary, Boundary) {
        (self.half(axis, HalfSide::Lower), self.half(axis, HalfSide::Upper))
    }

    /// Check if this boundary contains another boundary (inclusive)
    #[must_use]
    pub fn contains(&self, other: &Boundary) -> bool {
        classify(other, self) == Intersection::Inside
    }

    /// Check if this boundary overlaps another boundary at all
    #[must_use]
    pub fn intersects(&self, other: &Boundary) -> bool {
        classify(self, other) != Intersection::Outside
    }

    /// The same boundary with `axis` narrowed to `[lo, hi]`.
    fn with_axis(&self, axis: Axis, lo: f64, hi: f64) -> Boundary {
        let mut b = *self;
        match axis {
            Axis::X => {
                b.xmin = lo;
                b.xmax = hi;
            }
            Axis::Y => {
                b.ymin = lo;
                b.ymax = hi;
            }
            Axis::Z => {
                b.zmin = lo;
                b.zmax = hi;
            }
        }
        b
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[({}, {}, {}) .. ({}, {}, {})]",
            self.xmin, self.ymin, self.zmin, self.xmax, self.ymax, self.zmax
        )
    }
}

/// Intersection status of boundary `a` with boundary `b`.
///
/// `Outside` when the boxes fail to overlap on any axis, `Inside` when `a`
/// is contained in `b` on all six bounds, `Partial` otherwise.
#[must_use]
pub fn classify(a: &Boundary, b: &Boundary) -> Intersection {
    let disjoint = Axis::ALL
        .iter()
        .any(|&axis| a.max(axis) < b.min(axis) || a.min(axis) > b.max(axis));
    if disjoint {
        return Intersection::Outside;
    }
    let contained = Axis::ALL
        .iter()
        .all(|&axis| a.min(axis) >= b.min(axis) && a.max(axis) <= b.max(axis));
    if contained {
        Intersection::Inside
    } else {
        Intersection::Partial
    }
}

/// Lower or upper half of `b`, split at the midpoint of `axis`.
#[must_use]
pub fn split_half(b: &Boundary, axis: Axis, side: HalfSide) -> Boundary {
    let mid = b.midpoint(axis);
    match side {
        HalfSide::Lower => b.with_axis(axis, b.min(axis), mid),
        HalfSide::Upper => b.with_axis(axis, mid, b.max(axis)),
    }
}
