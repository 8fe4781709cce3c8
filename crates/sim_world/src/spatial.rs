//! Spatial index over entity positions.
//!
//! A hashed uniform grid: every entry lives in the bucket keyed by
//! [`Position::bucket`] at the index's rank. A query enumerates the cells its
//! shape overlaps, collects the entries of the matching buckets under the
//! read lock, then releases the lock and filters by exact geometry. Bucket
//! keys collide across distant cells, so the exact filter is what makes
//! results correct; collisions only cost time.
//!
//! Moves are incremental (leave old bucket, join new one) under one write
//! lock, so a query sees either the old or the new position, never neither.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;
use sim_entity::EntityId;
use sim_math::Position;
use tracing::trace;

use crate::error::SpatialError;

/// Region of a query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Everything within `radius` of `center` in 3D.
    Sphere { center: Position, radius: f32 },
    /// Everything within `radius` of `center` on the horizontal (x, z)
    /// plane, at any height.
    Circle { center: Position, radius: f32 },
    /// Everything inside the inclusive box.
    Aabb { min: Position, max: Position },
}

impl Shape {
    #[must_use]
    pub fn sphere(center: Position, radius: f32) -> Self {
        Self::Sphere { center, radius }
    }

    #[must_use]
    pub fn circle(center: Position, radius: f32) -> Self {
        Self::Circle { center, radius }
    }

    #[must_use]
    pub fn aabb(min: Position, max: Position) -> Self {
        Self::Aabb { min, max }
    }

    /// Exact containment test.
    #[must_use]
    pub fn contains(&self, p: &Position) -> bool {
        match *self {
            Self::Sphere { center, radius } => p.compute_distance(&center) <= f64::from(radius),
            Self::Circle { center, radius } => {
                let dx = f64::from(p.x) - f64::from(center.x);
                let dz = f64::from(p.z) - f64::from(center.z);
                (dx * dx + dz * dz).sqrt() <= f64::from(radius)
            }
            Self::Aabb { min, max } => {
                (min.x..=max.x).contains(&p.x)
                    && (min.y..=max.y).contains(&p.y)
                    && (min.z..=max.z).contains(&p.z)
            }
        }
    }

    /// Per-axis coordinate bounds, `None` on an axis the shape does not
    /// constrain. `None` overall for a shape that can contain nothing.
    fn bounds(&self) -> Option<[Option<(f32, f32)>; 3]> {
        match *self {
            Self::Sphere { center, radius } => {
                if radius.is_nan() || radius < 0.0 {
                    return None;
                }
                Some([
                    Some((center.x - radius, center.x + radius)),
                    Some((center.y - radius, center.y + radius)),
                    Some((center.z - radius, center.z + radius)),
                ])
            }
            Self::Circle { center, radius } => {
                if radius.is_nan() || radius < 0.0 {
                    return None;
                }
                Some([
                    Some((center.x - radius, center.x + radius)),
                    None,
                    Some((center.z - radius, center.z + radius)),
                ])
            }
            Self::Aabb { min, max } => {
                let ordered = min.x <= max.x && min.y <= max.y && min.z <= max.z;
                if !ordered {
                    return None;
                }
                Some([
                    Some((min.x, max.x)),
                    Some((min.y, max.y)),
                    Some((min.z, max.z)),
                ])
            }
        }
    }
}

/// Inclusive range of cell coordinates on each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellBox {
    lo: [i32; 3],
    hi: [i32; 3],
}

impl CellBox {
    fn of(cell: [i32; 3]) -> Self {
        Self { lo: cell, hi: cell }
    }

    fn grow(&mut self, cell: [i32; 3]) {
        for axis in 0..3 {
            self.lo[axis] = self.lo[axis].min(cell[axis]);
            self.hi[axis] = self.hi[axis].max(cell[axis]);
        }
    }

    fn cell_count(&self) -> u64 {
        (0..3)
            .map(|axis| (i64::from(self.hi[axis]) - i64::from(self.lo[axis]) + 1) as u64)
            .fold(1u64, u64::saturating_mul)
    }
}

#[derive(Debug, Default)]
struct GridInner {
    positions: HashMap<EntityId, Position>,
    buckets: HashMap<i32, Vec<EntityId>>,
    /// Every cell ever occupied lies inside this box. It only grows.
    extent: Option<CellBox>,
}

impl GridInner {
    fn cell_of(p: &Position, rank: u32) -> [i32; 3] {
        [
            Position::cell_coord(p.x, rank),
            Position::cell_coord(p.y, rank),
            Position::cell_coord(p.z, rank),
        ]
    }

    fn link(&mut self, id: EntityId, p: Position, rank: u32) {
        let cell = Self::cell_of(&p, rank);
        match self.extent.as_mut() {
            Some(extent) => extent.grow(cell),
            None => self.extent = Some(CellBox::of(cell)),
        }
        self.buckets.entry(p.bucket(rank)).or_default().push(id);
        self.positions.insert(id, p);
    }

    fn unlink(&mut self, id: EntityId, rank: u32) -> Option<Position> {
        let old = self.positions.remove(&id)?;
        let key = old.bucket(rank);
        if let Some(bucket) = self.buckets.get_mut(&key) {
            if let Some(i) = bucket.iter().position(|e| *e == id) {
                bucket.swap_remove(i);
            }
            if bucket.is_empty() {
                self.buckets.remove(&key);
            }
        }
        Some(old)
    }

    /// Entries that may lie in `shape`. Superset of the true answer.
    fn candidates(&self, shape: &Shape, rank: u32) -> Vec<(EntityId, Position)> {
        let (Some(bounds), Some(extent)) = (shape.bounds(), self.extent) else {
            return Vec::new();
        };

        let mut cells = extent;
        for axis in 0..3 {
            if let Some((lo, hi)) = bounds[axis] {
                cells.lo[axis] = cells.lo[axis].max(Position::cell_coord(lo, rank));
                cells.hi[axis] = cells.hi[axis].min(Position::cell_coord(hi, rank));
                if cells.lo[axis] > cells.hi[axis] {
                    return Vec::new();
                }
            }
        }

        if cells.cell_count() > self.positions.len() as u64 {
            return self.positions.iter().map(|(&id, &p)| (id, p)).collect();
        }

        let mut keys = HashSet::new();
        for cx in cells.lo[0]..=cells.hi[0] {
            for cy in cells.lo[1]..=cells.hi[1] {
                for cz in cells.lo[2]..=cells.hi[2] {
                    keys.insert(Position::cell_key(cx, cy, cz));
                }
            }
        }
        keys.iter()
            .filter_map(|key| self.buckets.get(key))
            .flatten()
            .filter_map(|id| self.positions.get(id).map(|p| (*id, *p)))
            .collect()
    }
}

/// Concurrent proximity index keyed by entity id.
#[derive(Debug)]
pub struct SpatialIndex {
    rank: u32,
    inner: RwLock<GridInner>,
}

impl SpatialIndex {
    /// An empty index with cells `2^rank` units on a side.
    #[must_use]
    pub fn new(rank: u32) -> Self {
        Self {
            rank,
            inner: RwLock::new(GridInner::default()),
        }
    }

    #[must_use]
    pub fn rank(&self) -> u32 {
        self.rank
    }

    /// Index `id` at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::DuplicateEntity`] if `id` is already indexed.
    pub fn insert(&self, id: EntityId, position: Position) -> Result<(), SpatialError> {
        let mut inner = self.inner.write();
        if inner.positions.contains_key(&id) {
            return Err(SpatialError::DuplicateEntity(id));
        }
        inner.link(id, position, self.rank);
        trace!(entity = %id, %position, "indexed");
        Ok(())
    }

    /// Move `id` to `position` atomically.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::NotIndexed`] if `id` is not indexed.
    pub fn update(&self, id: EntityId, position: Position) -> Result<(), SpatialError> {
        let mut inner = self.inner.write();
        if inner.unlink(id, self.rank).is_none() {
            return Err(SpatialError::NotIndexed(id));
        }
        inner.link(id, position, self.rank);
        Ok(())
    }

    /// Drop `id`. Absent ids are ignored; returns the last indexed position.
    pub fn remove(&self, id: EntityId) -> Option<Position> {
        self.inner.write().unlink(id, self.rank)
    }

    /// Entities inside `shape`, over a snapshot taken now.
    #[must_use]
    pub fn query(&self, shape: Shape) -> Query {
        let candidates = self.inner.read().candidates(&shape, self.rank);
        Query {
            candidates: candidates.into_iter(),
            shape,
        }
    }

    /// Entities within `radius` of `center` (3D).
    #[must_use]
    pub fn query_radius(&self, center: Position, radius: f32) -> Query {
        self.query(Shape::sphere(center, radius))
    }

    /// The `n` entities closest to `point`, closest first.
    #[must_use]
    pub fn nearest(&self, point: Position, n: usize) -> Vec<(EntityId, Position)> {
        const MAX_EXPANSIONS: u32 = 24;

        if n == 0 {
            return Vec::new();
        }
        let inner = self.inner.read();
        let total = inner.positions.len();
        if total == 0 {
            return Vec::new();
        }

        let mut radius = (1u64 << self.rank.min(62)) as f32;
        let mut hits = Vec::new();
        for _ in 0..MAX_EXPANSIONS {
            let shape = Shape::sphere(point, radius);
            hits = inner
                .candidates(&shape, self.rank)
                .into_iter()
                .filter(|(_, p)| shape.contains(p))
                .collect();
            if hits.len() >= n.min(total) {
                break;
            }
            radius *= 2.0;
        }
        if hits.len() < n.min(total) {
            hits = inner.positions.iter().map(|(&id, &p)| (id, p)).collect();
        }
        drop(inner);

        hits.sort_by(|(_, a), (_, b)| a.sq_dist(&point).total_cmp(&b.sq_dist(&point)));
        hits.truncate(n);
        hits
    }

    #[must_use]
    pub fn position_of(&self, id: EntityId) -> Option<Position> {
        self.inner.read().positions.get(&id).copied()
    }

    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.inner.read().positions.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lazy, single-pass result of [`SpatialIndex::query`].
///
/// Holds no lock. Entities moved or removed after the query was issued are
/// reported as they were at that moment.
#[derive(Debug)]
pub struct Query {
    candidates: std::vec::IntoIter<(EntityId, Position)>,
    shape: Shape,
}

impl Iterator for Query {
    type Item = EntityId;

    fn next(&mut self) -> Option<EntityId> {
        let shape = &self.shape;
        self.candidates
            .by_ref()
            .find(|(_, p)| shape.contains(p))
            .map(|(id, _)| id)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.candidates.size_hint().1)
    }
}
