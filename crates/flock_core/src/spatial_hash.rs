//! Spatial hash grid for neighbor candidate lookup.
//!
//! Space is cut into uniform cubes of side `cell_size`; each occupied cube
//! hashes to a bucket of agent indices. A query visits the 3×3×3 block of
//! cells around a point and returns every occupant, which is a superset of
//! the agents within `cell_size` of that point. Callers re-filter by true
//! distance.

use crate::error::FlockError;
use std::collections::HashMap;

/// Large distinct primes mixed into the bucket key, one per axis.
const PRIME_X: i64 = 73_856_093;
const PRIME_Y: i64 = 19_349_663;
const PRIME_Z: i64 = 83_492_791;

/// Grid cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl CellCoord {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// XOR-mixed bucket key. Distinct cells may share a key; that only
    /// widens the candidate superset.
    #[inline]
    pub fn key(&self) -> u64 {
        let hx = (self.x as i64).wrapping_mul(PRIME_X);
        let hy = (self.y as i64).wrapping_mul(PRIME_Y);
        let hz = (self.z as i64).wrapping_mul(PRIME_Z);
        (hx ^ hy ^ hz) as u64
    }

    /// The 26 surrounding cells and self, 27 total.
    fn neighbors(&self) -> [CellCoord; 27] {
        let mut out = [*self; 27];
        let mut n = 0;
        for dz in -1..=1 {
            for dy in -1..=1 {
                for dx in -1..=1 {
                    out[n] = CellCoord::new(
                        self.x.wrapping_add(dx),
                        self.y.wrapping_add(dy),
                        self.z.wrapping_add(dz),
                    );
                    n += 1;
                }
            }
        }
        out
    }
}

/// Uniform-cell hash grid over agent indices.
///
/// Bucket vectors are kept across [`clear`](Self::clear) calls so a steady
/// flock stops allocating after the first few steps.
#[derive(Debug)]
pub struct SpatialHashGrid {
    cell_size: f32,
    /// Map from bucket key to agent indices in that bucket.
    buckets: HashMap<u64, Vec<usize>>,
}

impl SpatialHashGrid {
    /// Create an empty grid.
    pub fn new(cell_size: f32) -> Result<Self, FlockError> {
        let mut grid = Self::default();
        grid.set_cell_size(cell_size)?;
        Ok(grid)
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Change the cell size for subsequent inserts and queries.
    ///
    /// Existing buckets are not rehashed; call [`clear`](Self::clear) first.
    pub fn set_cell_size(&mut self, size: f32) -> Result<(), FlockError> {
        if !(size.is_finite() && size > 0.0) {
            return Err(FlockError::InvalidCellSize { size });
        }
        self.cell_size = size;
        Ok(())
    }

    /// Empty every bucket.
    ///
    /// Buckets that were already empty before this call are dropped, the
    /// rest keep their capacity.
    pub fn clear(&mut self) {
        self.buckets.retain(|_, bucket| !bucket.is_empty());
        for bucket in self.buckets.values_mut() {
            bucket.clear();
        }
    }

    /// Convert a position to a cell coordinate.
    #[inline]
    pub fn cell_of(&self, x: f32, y: f32, z: f32) -> CellCoord {
        CellCoord::new(
            (x / self.cell_size).floor() as i32,
            (y / self.cell_size).floor() as i32,
            (z / self.cell_size).floor() as i32,
        )
    }

    /// Insert an agent index at a position.
    pub fn insert(&mut self, index: usize, x: f32, y: f32, z: f32) {
        let key = self.cell_of(x, y, z).key();
        self.buckets.entry(key).or_default().push(index);
    }

    /// Collect the occupants of the 27 cells around a point into `out`.
    ///
    /// `out` is cleared first and reused by the caller between queries.
    pub fn query(&self, x: f32, y: f32, z: f32, out: &mut Vec<usize>) {
        out.clear();
        self.query_append(x, y, z, out);
    }

    /// Like [`query`](Self::query) but appends to `out` without clearing.
    ///
    /// Each bucket is visited at most once per call, so a single call never
    /// yields the same index twice.
    pub fn query_append(&self, x: f32, y: f32, z: f32, out: &mut Vec<usize>) {
        let mut visited = [0u64; 27];
        let mut visited_len = 0;

        for cell in &self.cell_of(x, y, z).neighbors() {
            let key = cell.key();
            if visited[..visited_len].contains(&key) {
                continue;
            }
            visited[visited_len] = key;
            visited_len += 1;

            if let Some(bucket) = self.buckets.get(&key) {
                out.extend_from_slice(bucket);
            }
        }
    }

    /// Number of buckets currently holding at least one agent.
    pub fn bucket_count(&self) -> usize {
        self.buckets.values().filter(|b| !b.is_empty()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.values().all(Vec::is_empty)
    }
}

impl Default for SpatialHashGrid {
    fn default() -> Self {
        Self {
            cell_size: 1.0,
            buckets: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn sorted(mut v: Vec<usize>) -> Vec<usize> {
        v.sort_unstable();
        v
    }

    #[test]
    fn test_cell_of_floors_negative_coordinates() {
        let grid = SpatialHashGrid::new(10.0).unwrap();
        assert_eq!(grid.cell_of(0.0, 9.99, -0.01), CellCoord::new(0, 0, -1));
        assert_eq!(grid.cell_of(-10.0, -10.01, 25.0), CellCoord::new(-1, -2, 2));
    }

    #[test]
    fn test_query_returns_superset_of_radius() {
        let mut grid = SpatialHashGrid::new(5.0).unwrap();
        let points = [
            (0, [0.0, 0.0, 0.0]),
            (1, [4.9, 0.0, 0.0]),
            (2, [-3.0, 3.0, 3.0]),
            (3, [0.0, -4.0, 2.0]),
            (4, [30.0, 0.0, 0.0]),
            (5, [0.0, 0.0, -16.0]),
        ];
        for (i, [x, y, z]) in points {
            grid.insert(i, x, y, z);
        }

        let mut out = Vec::new();
        grid.query(0.1, 0.1, 0.1, &mut out);
        let found: HashSet<usize> = out.iter().copied().collect();

        for (i, [x, y, z]) in points {
            let d2 = (x - 0.1f32).powi(2) + (y - 0.1f32).powi(2) + (z - 0.1f32).powi(2);
            if d2 <= 25.0 {
                assert!(found.contains(&i), "agent {i} within radius but not returned");
            }
        }
        assert!(!found.contains(&4));
        assert!(!found.contains(&5));
        assert_eq!(found.len(), out.len(), "query yielded duplicates");
    }

    #[test]
    fn test_query_is_stable_and_clears_buffer() {
        let mut grid = SpatialHashGrid::new(2.0).unwrap();
        for i in 0..50 {
            let f = i as f32;
            grid.insert(i, (f * 0.37).sin() * 3.0, (f * 0.11).cos() * 3.0, f * 0.05 - 1.0);
        }

        let mut first = vec![999, 998];
        let mut second = Vec::new();
        grid.query(0.5, -0.5, 0.0, &mut first);
        grid.query(0.5, -0.5, 0.0, &mut second);

        assert!(!first.contains(&999));
        assert_eq!(sorted(first), sorted(second));
    }

    #[test]
    fn test_query_append_keeps_existing_entries() {
        let mut grid = SpatialHashGrid::new(1.0).unwrap();
        grid.insert(7, 0.5, 0.5, 0.5);

        let mut out = vec![42];
        grid.query_append(0.5, 0.5, 0.5, &mut out);
        assert_eq!(out, vec![42, 7]);
    }

    #[test]
    fn test_clear_empties_and_reuses() {
        let mut grid = SpatialHashGrid::new(1.0).unwrap();
        grid.insert(0, 0.0, 0.0, 0.0);
        grid.insert(1, 5.0, 5.0, 5.0);
        assert_eq!(grid.bucket_count(), 2);

        grid.clear();
        assert!(grid.is_empty());
        assert_eq!(grid.bucket_count(), 0);

        let mut out = Vec::new();
        grid.query(0.0, 0.0, 0.0, &mut out);
        assert!(out.is_empty());

        grid.insert(3, 5.0, 5.0, 5.0);
        grid.query(5.0, 5.0, 5.0, &mut out);
        assert_eq!(out, vec![3]);
    }

    #[test]
    fn test_cell_size_must_be_positive() {
        let mut grid = SpatialHashGrid::default();
        assert_eq!(
            grid.set_cell_size(0.0),
            Err(FlockError::InvalidCellSize { size: 0.0 })
        );
        assert!(grid.set_cell_size(-1.0).is_err());
        assert!(grid.set_cell_size(f32::INFINITY).is_err());
        assert!(SpatialHashGrid::new(f32::NAN).is_err());
        assert_eq!(grid.cell_size(), 1.0);
    }
}
