//! Double-buffered nutrient scalar fields and the explicit Moore-stencil diffusion step.

use crate::error::LatticeError;
use crate::grid::{for_each_neighbor, Dims};

/// Neighbour weight denominator. Boundary voxels have fewer than 26 neighbours and
/// therefore lose mass through the missing faces.
const STENCIL_NEIGHBORS: f64 = 26.0;

/// A scalar field over the lattice with a scratch buffer for ping-pong updates.
#[derive(Debug, Clone)]
pub struct NutrientField {
    dims: Dims,
    // Current values (read by cells, written by sources and consumption)
    current: Vec<f64>,
    // Next values, only meaningful during a diffusion pass
    scratch: Vec<f64>,
}

impl NutrientField {
    /// Creates a field holding `baseline` everywhere.
    pub fn new(dims: Dims, baseline: f64) -> Self {
        let n = dims.num_voxels();
        Self { dims, current: vec![baseline; n], scratch: vec![0.0; n] }
    }

    #[inline(always)]
    pub fn get(&self, idx: usize) -> f64 {
        self.current[idx]
    }

    #[inline(always)]
    pub fn add(&mut self, idx: usize, amount: f64) {
        self.current[idx] += amount;
    }

    /// Removes `amount` from a voxel. Values are allowed to go negative.
    #[inline(always)]
    pub fn consume(&mut self, idx: usize, amount: f64) {
        self.current[idx] -= amount;
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.current
    }

    pub fn total(&self) -> f64 {
        self.current.iter().sum()
    }

    /// Swaps the current and scratch buffers.
    pub fn swap_buffers(&mut self) {
        std::mem::swap(&mut self.current, &mut self.scratch);
    }

    /// One diffusion pass: every voxel keeps `1 - factor` of its content and receives
    /// `factor / 26` of each in-bounds neighbour's content.
    pub fn diffuse(&mut self, factor: f64) -> Result<(), LatticeError> {
        if !(0.0..=1.0).contains(&factor) {
            return Err(LatticeError::InvalidDiffusionFactor(factor));
        }
        diffuse_into(&self.current, &mut self.scratch, self.dims, factor);
        self.swap_buffers();
        Ok(())
    }
}

/// Computes one diffusion pass of `src` into `dest`. `src` is never written.
pub fn diffuse_into(src: &[f64], dest: &mut [f64], dims: Dims, factor: f64) {
    debug_assert_eq!(src.len(), dims.num_voxels());
    debug_assert_eq!(dest.len(), dims.num_voxels());

    let share = factor / STENCIL_NEIGHBORS;
    for (idx, out) in dest.iter_mut().enumerate() {
        let v = dims.voxel_of(idx);
        let mut inflow = 0.0;
        for_each_neighbor(dims, v, |n| inflow += src[dims.index_of(n)]);
        *out = (1.0 - factor) * src[idx] + share * inflow;
    }
}
