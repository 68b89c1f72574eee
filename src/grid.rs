//! Voxel addressing, Moore-neighbourhood traversal and the organ-at-risk box.

use crate::error::LatticeError;
use rand::Rng;
use std::fmt;

/// Maximum number of Moore neighbours of a voxel.
pub const MOORE_SIZE: usize = 26;

/// Integer voxel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Voxel {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl Voxel {
    #[inline(always)]
    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }
}

/// Lattice extent along each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dims {
    pub xsize: usize,
    pub ysize: usize,
    pub zsize: usize,
}

impl fmt::Display for Dims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.xsize, self.ysize, self.zsize)
    }
}

impl Dims {
    pub fn new(xsize: usize, ysize: usize, zsize: usize) -> Result<Self, LatticeError> {
        let total = xsize.checked_mul(ysize).and_then(|n| n.checked_mul(zsize));
        if xsize == 0 || ysize == 0 || zsize == 0 || total.is_none() {
            return Err(LatticeError::InvalidDimensions { xsize, ysize, zsize });
        }
        Ok(Self { xsize, ysize, zsize })
    }

    #[inline(always)]
    pub fn num_voxels(&self) -> usize {
        self.xsize * self.ysize * self.zsize
    }

    #[inline(always)]
    pub fn contains(&self, x: usize, y: usize, z: usize) -> bool {
        x < self.xsize && y < self.ysize && z < self.zsize
    }

    /// Validates a caller-supplied coordinate.
    pub fn checked(&self, x: usize, y: usize, z: usize) -> Result<Voxel, LatticeError> {
        if self.contains(x, y, z) {
            Ok(Voxel::new(x, y, z))
        } else {
            Err(LatticeError::InvalidCoordinate { x, y, z, dims: *self })
        }
    }

    /// Linear storage index, laid out z-major then x then y.
    #[inline(always)]
    pub fn index_of(&self, v: Voxel) -> usize {
        v.z * self.xsize * self.ysize + v.x * self.ysize + v.y
    }

    #[inline(always)]
    pub fn voxel_of(&self, idx: usize) -> Voxel {
        let plane = self.xsize * self.ysize;
        let rem = idx % plane;
        Voxel::new(rem / self.ysize, rem % self.ysize, idx / plane)
    }

    /// Iterates every voxel in storage order.
    pub fn voxels(&self) -> impl Iterator<Item = Voxel> + '_ {
        (0..self.num_voxels()).map(move |idx| self.voxel_of(idx))
    }

    /// Baseline crowding of a voxel: the Moore neighbours that fall outside the lattice.
    /// Each axis contributes a factor of 2 on a boundary plane and 3 in the interior.
    pub fn missing_neighbors(&self, v: Voxel) -> i32 {
        let span = |c: usize, size: usize| if c == 0 || c + 1 == size { 2 } else { 3 };
        27 - span(v.z, self.zsize) * span(v.x, self.xsize) * span(v.y, self.ysize)
    }
}

/// Calls `f` on every in-bounds Moore neighbour of `v`, excluding `v` itself.
/// Traversal order is dz, dx, dy from -1 to +1.
#[inline(always)]
pub fn for_each_neighbor<F>(dims: Dims, v: Voxel, mut f: F)
where
    F: FnMut(Voxel),
{
    for dz in -1i64..=1 {
        let nz = v.z as i64 + dz;
        if nz < 0 || nz >= dims.zsize as i64 {
            continue;
        }
        for dx in -1i64..=1 {
            let nx = v.x as i64 + dx;
            if nx < 0 || nx >= dims.xsize as i64 {
                continue;
            }
            for dy in -1i64..=1 {
                let ny = v.y as i64 + dy;
                if ny < 0 || ny >= dims.ysize as i64 {
                    continue;
                }
                if dz == 0 && dx == 0 && dy == 0 {
                    continue;
                }
                f(Voxel::new(nx as usize, ny as usize, nz as usize));
            }
        }
    }
}

/// Fixed-capacity candidate list for neighbour selection; never allocates.
#[derive(Debug, Clone, Copy)]
pub struct NeighborSet {
    items: [Voxel; MOORE_SIZE],
    len: usize,
}

impl Default for NeighborSet {
    fn default() -> Self {
        Self { items: [Voxel::default(); MOORE_SIZE], len: 0 }
    }
}

impl NeighborSet {
    pub fn push(&mut self, v: Voxel) {
        debug_assert!(self.len < MOORE_SIZE, "more than 26 Moore neighbours");
        self.items[self.len] = v;
        self.len += 1;
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Uniform pick among the collected candidates.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Voxel> {
        if self.len == 0 {
            None
        } else {
            Some(self.items[rng.random_range(0..self.len)])
        }
    }
}

/// Axis-aligned organ-at-risk box, half-open on every axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExclusionZone {
    pub x1: usize,
    pub x2: usize,
    pub y1: usize,
    pub y2: usize,
    pub z1: usize,
    pub z2: usize,
}

impl ExclusionZone {
    /// Builds a zone from two opposite corners given in any order.
    pub fn new(x1: usize, x2: usize, y1: usize, y2: usize, z1: usize, z2: usize) -> Self {
        Self {
            x1: x1.min(x2),
            x2: x1.max(x2),
            y1: y1.min(y2),
            y2: y1.max(y2),
            z1: z1.min(z2),
            z2: z1.max(z2),
        }
    }

    pub fn from_bounds(b: [usize; 6]) -> Self {
        Self::new(b[0], b[1], b[2], b[3], b[4], b[5])
    }

    pub fn bounds(&self) -> [usize; 6] {
        [self.x1, self.x2, self.y1, self.y2, self.z1, self.z2]
    }

    #[inline(always)]
    pub fn contains(&self, v: Voxel) -> bool {
        v.x >= self.x1 && v.x < self.x2 && v.y >= self.y1 && v.y < self.y2 && v.z >= self.z1 && v.z < self.z2
    }

    pub fn is_empty(&self) -> bool {
        self.x1 >= self.x2 || self.y1 >= self.y2 || self.z1 >= self.z2
    }

    /// Restricts the zone to the lattice extent.
    pub fn clipped(&self, dims: Dims) -> Self {
        Self {
            x1: self.x1.min(dims.xsize),
            x2: self.x2.min(dims.xsize),
            y1: self.y1.min(dims.ysize),
            y2: self.y2.min(dims.ysize),
            z1: self.z1.min(dims.zsize),
            z2: self.z2.min(dims.zsize),
        }
    }

    /// Voxels inside the zone, in storage order.
    pub fn voxels(&self) -> impl Iterator<Item = Voxel> + '_ {
        (self.z1..self.z2).flat_map(move |z| {
            (self.x1..self.x2).flat_map(move |x| (self.y1..self.y2).map(move |y| Voxel::new(x, y, z)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn neighbors_of(dims: Dims, v: Voxel) -> Vec<Voxel> {
        let mut out = Vec::new();
        for_each_neighbor(dims, v, |n| out.push(n));
        out
    }

    #[test]
    fn index_round_trips_through_voxel_of() {
        let dims = Dims::new(3, 5, 4).unwrap();
        for idx in 0..dims.num_voxels() {
            assert_eq!(dims.index_of(dims.voxel_of(idx)), idx);
        }
        assert_eq!(dims.index_of(Voxel::new(0, 1, 0)), 1);
        assert_eq!(dims.index_of(Voxel::new(1, 0, 0)), 5);
        assert_eq!(dims.index_of(Voxel::new(0, 0, 1)), 15);
    }

    #[test]
    fn zero_dimension_is_rejected() {
        assert!(matches!(Dims::new(4, 0, 4), Err(LatticeError::InvalidDimensions { .. })));
    }

    #[test]
    fn oversized_lattice_is_rejected() {
        let huge = usize::MAX / 2;
        assert!(matches!(Dims::new(huge, 3, 1), Err(LatticeError::InvalidDimensions { .. })));
        assert!(matches!(Dims::new(1 << 22, 1 << 22, 1 << 22), Err(LatticeError::InvalidDimensions { .. })));
        assert_eq!(Dims::new(usize::MAX, 1, 1).unwrap().num_voxels(), usize::MAX);
    }

    #[test]
    fn checked_rejects_out_of_bounds() {
        let dims = Dims::new(4, 4, 4).unwrap();
        assert!(dims.checked(3, 3, 3).is_ok());
        assert!(matches!(dims.checked(4, 0, 0), Err(LatticeError::InvalidCoordinate { x: 4, .. })));
        assert!(dims.checked(0, 0, 9).is_err());
    }

    #[test]
    fn moore_neighborhood_is_clipped() {
        let dims = Dims::new(4, 4, 4).unwrap();
        assert_eq!(neighbors_of(dims, Voxel::new(0, 0, 0)).len(), 7);
        assert_eq!(neighbors_of(dims, Voxel::new(1, 0, 0)).len(), 11);
        assert_eq!(neighbors_of(dims, Voxel::new(1, 1, 0)).len(), 17);
        let interior = neighbors_of(dims, Voxel::new(1, 1, 1));
        assert_eq!(interior.len(), MOORE_SIZE);
        assert!(!interior.contains(&Voxel::new(1, 1, 1)));
    }

    #[test]
    fn single_voxel_lattice_has_no_neighbors() {
        let dims = Dims::new(1, 1, 1).unwrap();
        assert!(neighbors_of(dims, Voxel::new(0, 0, 0)).is_empty());
    }

    #[test]
    fn missing_neighbors_matches_boundary_formula() {
        let dims = Dims::new(4, 4, 4).unwrap();
        assert_eq!(dims.missing_neighbors(Voxel::new(0, 0, 0)), 19);
        assert_eq!(dims.missing_neighbors(Voxel::new(1, 1, 1)), 0);
        assert_eq!(dims.missing_neighbors(Voxel::new(1, 0, 1)), 9);
        assert_eq!(dims.missing_neighbors(Voxel::new(1, 0, 0)), 15);
        for v in dims.voxels() {
            assert_eq!(dims.missing_neighbors(v) + neighbors_of(dims, v).len() as i32, 26);
        }
    }

    #[test]
    fn neighbor_set_choose() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut set = NeighborSet::default();
        assert_eq!(set.choose(&mut rng), None);
        set.push(Voxel::new(1, 2, 3));
        assert_eq!(set.choose(&mut rng), Some(Voxel::new(1, 2, 3)));
        set.clear();
        assert!(set.is_empty());
    }

    #[test]
    fn zone_normalises_and_clips() {
        let dims = Dims::new(4, 4, 4).unwrap();
        let zone = ExclusionZone::new(3, 1, 0, 2, 9, 2).clipped(dims);
        assert_eq!(zone.bounds(), [1, 3, 0, 2, 2, 4]);
        assert!(zone.contains(Voxel::new(1, 0, 2)));
        assert!(!zone.contains(Voxel::new(3, 0, 2)));
        assert_eq!(zone.voxels().count(), 2 * 2 * 2);
        assert!(ExclusionZone::new(5, 6, 0, 1, 0, 1).clipped(dims).is_empty());
    }
}
