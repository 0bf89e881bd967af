//! Uniform spatial hash for neighbour queries (§4.3, component C).
//!
//! The teacher's `spatial_hash` keeps staggered multi-resolution grids tuned
//! for a strategy game's wildly varying entity sizes. Pedestrians are all
//! roughly the same size here, so this is the simpler single-grid version
//! the teacher's own doc comment calls the "old" design: one cell size,
//! cleared and rebuilt every tick (§4.3, §5).

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Most buckets at crowd density hold only a handful of agents; inline
/// storage for up to 8 ids avoids a heap allocation per bucket per tick,
/// mirroring the teacher's `SmallVec<[..; 8]>` neighbour lists in
/// `simulation::components`.
type Bucket = SmallVec<[u32; 8]>;

pub struct SpatialHash {
    cell_size: f64,
    buckets: FxHashMap<(i64, i64), Bucket>,
}

impl SpatialHash {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size: cell_size.max(1e-6),
            buckets: FxHashMap::default(),
        }
    }

    fn cell_of(&self, x: f64, y: f64) -> (i64, i64) {
        (
            (x / self.cell_size).floor() as i64,
            (y / self.cell_size).floor() as i64,
        )
    }

    /// Reset before every tick; positions are only observed after a rebuild.
    pub fn clear(&mut self) {
        for bucket in self.buckets.values_mut() {
            bucket.clear();
        }
    }

    pub fn insert(&mut self, id: u32, x: f64, y: f64) {
        self.buckets.entry(self.cell_of(x, y)).or_default().push(id);
    }

    /// All ids in buckets within a `ceil(r / cell_size)` halo of `(x, y)`.
    /// Callers filter by exact distance.
    pub fn query(&self, x: f64, y: f64, radius: f64) -> Vec<u32> {
        let halo = (radius / self.cell_size).ceil() as i64;
        let (cx, cy) = self.cell_of(x, y);
        let mut result = Vec::new();
        for dx in -halo..=halo {
            for dy in -halo..=halo {
                if let Some(bucket) = self.buckets.get(&(cx + dx, cy + dy)) {
                    result.extend_from_slice(bucket);
                }
            }
        }
        result
    }
}
