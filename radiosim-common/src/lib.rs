pub mod config;
pub mod sim_params;
pub mod snapshot;
pub mod vecmath;

// Re-export key types for easier use by dependent crates
pub use config::{SimulationConfig, LatticeConfig, NutrientConfig, TumorConfig, OarConfig, TimingConfig, TreatmentConfig, OutputConfig};
pub use sim_params::SimParams;
pub use snapshot::{Snapshot, VoxelRecord};
pub use vecmath::Vec3;
