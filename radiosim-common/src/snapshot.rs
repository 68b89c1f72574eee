use serde::{Serialize, Deserialize};

/// Population counts and tumour geometry at a specific tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Simulated hour at which the snapshot was taken.
    pub tick: u32,
    pub healthy: usize,
    pub cancer: usize,
    pub oar: usize,
    /// Cancer-weighted centroid as last recomputed, in voxel units.
    pub centroid: (f64, f64, f64),
    /// Distance of the farthest cancer voxel from the centroid, `None` when no cancer remains.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tumor_radius: Option<f64>,
    /// Cumulative dose delivered so far (Gy).
    pub dose_delivered: f64,
}

/// One row of the per-voxel table written at the end of each phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoxelRecord {
    pub x: usize,
    pub y: usize,
    pub z: usize,
    pub density: i32,
    pub healthy: usize,
    pub cancer: usize,
    pub oar: usize,
    pub glucose: f64,
    pub oxygen: f64,
    pub voxel_type: i32,
}
