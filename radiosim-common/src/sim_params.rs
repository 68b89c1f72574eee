use serde::{Deserialize, Serialize};

/// Simulation parameters derived from the configuration, used frequently during simulation steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimParams {
    // Lattice
    pub xsize: usize,
    pub ysize: usize,
    pub zsize: usize,
    pub num_sources: usize,
    /// Normalised organ-at-risk box `[x1, x2, y1, y2, z1, z2]`, half-open.
    pub oar_zone: Option<[usize; 6]>,

    // Nutrients
    pub glucose_refill: f64,
    pub oxygen_refill: f64,
    pub diffusion_factor: f64,

    // Time
    pub record_interval_ticks: u32,
    pub centroid_interval_ticks: u32,

    pub seed: u64,
}
