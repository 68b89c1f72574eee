use crate::grid::Dims;

/// Failures surfaced by the lattice API. Boundary conditions inside a tick (no spawn
/// candidate, no cancer left, a source with nowhere to go) are not errors and never
/// show up here.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LatticeError {
    /// A voxel address outside `[0, size)` on some axis.
    #[error("voxel ({x}, {y}, {z}) lies outside the {dims} lattice")]
    InvalidCoordinate { x: usize, y: usize, z: usize, dims: Dims },

    #[error("lattice dimensions {xsize}x{ysize}x{zsize} are zero or overflow the voxel count")]
    InvalidDimensions { xsize: usize, ysize: usize, zsize: usize },

    /// The organ-at-risk box does not overlap the lattice once clipped.
    #[error("exclusion zone {zone:?} does not intersect the {dims} lattice")]
    InvalidExclusionZone { zone: [usize; 6], dims: Dims },

    #[error("diffusion factor {0} is outside [0, 1]")]
    InvalidDiffusionFactor(f64),
}
