//! World-space position.
//!
//! [`Position`] is a plain `Copy` value: every operation returns a new
//! position instead of mutating a shared one, so call sites never have to
//! clone defensively before chaining.
//!
//! `y` is the height axis. Horizontal-plane helpers (`equal2d`, `nearby2d`,
//! the XZ projection) work on `x` and `z`.

use std::fmt;
use std::str::FromStr;

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A point (or Euler rotation) in world space.
///
/// Equality is exact floating-point equality, matching what goes over the
/// wire; no epsilon is applied anywhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(alias = "_x", alias = "X")]
    pub x: f32,
    /// Height.
    #[serde(alias = "_y", alias = "Y")]
    pub y: f32,
    #[serde(alias = "_z", alias = "Z")]
    pub z: f32,
}

impl Position {
    /// The origin.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// A position with `z` left at zero.
    #[must_use]
    pub const fn new_2d(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Build from up to three leading components (`[x, y, z]`). Missing
    /// components are zero and extra components are ignored.
    #[must_use]
    pub fn from_slice(xyz: &[f32]) -> Self {
        let at = |i: usize| xyz.get(i).copied().unwrap_or(0.0);
        Self::new(at(0), at(1), at(2))
    }

    /// Component-wise sum.
    #[allow(clippy::should_implement_trait)]
    #[must_use]
    pub fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    /// Component-wise difference.
    #[must_use]
    pub fn subtract(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    /// Scale every component by `value`.
    #[must_use]
    pub fn multiply(self, value: f32) -> Self {
        Self::new(self.x * value, self.y * value, self.z * value)
    }

    #[must_use]
    pub fn add_x(self, d: f32) -> Self {
        Self { x: self.x + d, ..self }
    }

    #[must_use]
    pub fn add_y(self, d: f32) -> Self {
        Self { y: self.y + d, ..self }
    }

    #[must_use]
    pub fn add_z(self, d: f32) -> Self {
        Self { z: self.z + d, ..self }
    }

    /// Move `distance` along a heading given in radians.
    ///
    /// `x += d·sin(a)`, `y += d·cos(a)`. The arithmetic is done in `f64` and
    /// narrowed once, so results match the reference server bit for bit.
    #[must_use]
    pub fn translate(self, distance: f32, angle: f32) -> Self {
        let angle = f64::from(angle);
        let d = f64::from(distance);
        Self {
            x: (f64::from(self.x) + d * angle.sin()) as f32,
            y: (f64::from(self.y) + d * angle.cos()) as f32,
            z: self.z,
        }
    }

    /// Move `distance` along a heading given in degrees.
    ///
    /// Unlike [`Position::translate`], the forward axis is inverted:
    /// `y += -d·cos(a)`. Scripted movement depends on this sign; do not unify
    /// the two methods.
    #[must_use]
    pub fn translate_with_degrees(self, distance: f32, angle: f32) -> Self {
        let angle = f64::from(f64::from(angle).to_radians() as f32);
        let d = f64::from(distance);
        Self {
            x: (f64::from(self.x) + d * angle.sin()) as f32,
            y: (f64::from(self.y) + -d * angle.cos()) as f32,
            z: self.z,
        }
    }

    /// Exact equality on the horizontal plane (`x` and `z`).
    #[must_use]
    pub fn equal2d(&self, other: &Self) -> bool {
        self.x == other.x && self.z == other.z
    }

    /// Exact equality on all three axes.
    #[must_use]
    pub fn equal3d(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y && self.z == other.z
    }

    /// Squared Euclidean distance, in `f32`. Use this for comparisons.
    #[must_use]
    pub fn sq_dist(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    /// True Euclidean distance. Each axis difference is taken in `f32` and
    /// widened; squaring, summing and the root are done in `f64`, matching
    /// the reference server bit for bit.
    #[must_use]
    pub fn compute_distance(&self, other: &Self) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        let dz = f64::from(self.z - other.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Grid partition key for cells of size `2^rank`.
    ///
    /// Each coordinate is truncated toward zero, arithmetic-shifted right by
    /// `rank` and the three results are XOR-ed together. XOR (rather than an
    /// interleaved Morton code) means distinct cells can share a key; every
    /// consumer must re-check exact geometry after a bucket lookup.
    #[must_use]
    pub fn bucket(&self, rank: u32) -> i32 {
        Self::cell_key(
            Self::cell_coord(self.x, rank),
            Self::cell_coord(self.y, rank),
            Self::cell_coord(self.z, rank),
        )
    }

    /// Cell index of a single coordinate at the given rank. Monotonic
    /// non-decreasing in `v`.
    #[must_use]
    pub fn cell_coord(v: f32, rank: u32) -> i32 {
        (v as i32).wrapping_shr(rank)
    }

    /// The [`Position::bucket`] key of the cell at `(cx, cy, cz)`.
    #[must_use]
    pub const fn cell_key(cx: i32, cy: i32, cz: i32) -> i32 {
        cx ^ cy ^ cz
    }

    /// A copy jittered by a uniform offset in `[-range, range)` on `x` and `z`.
    /// Used for scatter placement, never for authoritative movement.
    #[must_use]
    pub fn nearby2d(&self, range: f32) -> Self {
        self.nearby2d_with(&mut rand::thread_rng(), range)
    }

    /// [`Position::nearby2d`] with a caller-supplied RNG.
    #[must_use]
    pub fn nearby2d_with<R: Rng>(&self, rng: &mut R, range: f32) -> Self {
        let mut jitter = || rng.r#gen::<f32>() * (range + range) - range;
        let dz = jitter();
        let dx = jitter();
        Self {
            x: self.x + dx,
            y: self.y,
            z: self.z + dz,
        }
    }

    /// `[x, y, z]` as used by 3D spatial queries.
    #[must_use]
    pub fn to_array(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// `[x, z]`, the horizontal projection used by 2D spatial queries.
    #[must_use]
    pub fn to_xz_array(&self) -> [f32; 2] {
        [self.x, self.z]
    }
}

impl std::ops::Add for Position {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Position::add(self, rhs)
    }
}

impl std::ops::Sub for Position {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self.subtract(rhs)
    }
}

impl std::ops::Mul<f32> for Position {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        self.multiply(rhs)
    }
}

impl From<Vec3> for Position {
    fn from(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<Position> for Vec3 {
    fn from(p: Position) -> Self {
        Vec3::new(p.x, p.y, p.z)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Failure to parse a `"x,y[,z]"` string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PositionParseError {
    #[error("expected at least two comma-separated components, got {0}")]
    TooFewComponents(usize),
    #[error("invalid coordinate {0:?}")]
    InvalidCoordinate(String),
}

impl FromStr for Position {
    type Err = PositionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() < 2 {
            return Err(PositionParseError::TooFewComponents(parts.len()));
        }
        let parse = |p: &str| {
            p.parse::<f32>()
                .map_err(|_| PositionParseError::InvalidCoordinate(p.to_string()))
        };
        let x = parse(parts[0])?;
        let y = parse(parts[1])?;
        let z = match parts.get(2) {
            Some(p) => parse(p)?,
            None => 0.0,
        };
        Ok(Self::new(x, y, z))
    }
}
