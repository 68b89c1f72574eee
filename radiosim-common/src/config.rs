use serde::{Deserialize, Serialize};
use anyhow::Result;
use crate::sim_params::SimParams;
use std::path::Path;

// Lattice geometry and nutrient sources
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LatticeConfig {
    pub xsize: usize,
    pub ysize: usize,
    pub zsize: usize,
    pub sources: usize,
}

// Per-tick nutrient supply and transport
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct NutrientConfig {
    #[serde(default = "default_glucose_refill")]
    pub glucose_refill: f64,
    #[serde(default = "default_oxygen_refill")]
    pub oxygen_refill: f64,
    #[serde(default = "default_diffusion_factor")]
    pub diffusion_factor: f64,
}

// Spherical tumour seeding around the lattice centre
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TumorConfig {
    pub cancer_radius: f64,
    pub healthy_radius: f64,
    #[serde(default = "default_cells_per_voxel")]
    pub healthy_per_voxel: u32,
    #[serde(default = "default_cells_per_voxel")]
    pub cancer_per_voxel: u32,
}

/// Organ-at-risk box, half-open on every axis. Corners may be given in any order.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct OarConfig {
    pub x1: usize,
    pub x2: usize,
    pub y1: usize,
    pub y2: usize,
    pub z1: usize,
    pub z2: usize,
}

// Simulated hours
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TimingConfig {
    pub growth_hours: u32,
    pub record_interval_hours: u32,
    #[serde(default = "default_centroid_interval")]
    pub centroid_interval_hours: u32,
}

// Fractionated radiotherapy schedule
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TreatmentConfig {
    pub weeks: u32,
    pub rad_days: u32,
    pub rest_days: u32,
    pub dose: f64, // Gy per fraction
}

// Configuration for output settings, loaded from config.toml
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    pub base_filename: String,
    pub save_counts: bool,
    pub save_voxels: bool,
    pub format: Option<String>, // Output format: "json", "bincode", "messagepack"
}

// Main simulation configuration structure, loaded from config.toml.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SimulationConfig {
    #[serde(default = "default_seed")]
    pub seed: u64,
    pub lattice: LatticeConfig,
    #[serde(default)]
    pub nutrients: NutrientConfig,
    pub tumor: TumorConfig,
    #[serde(default)]
    pub oar: Option<OarConfig>,
    pub timing: TimingConfig,
    pub treatment: TreatmentConfig,
    pub output: OutputConfig,
}

impl Default for NutrientConfig {
    fn default() -> Self {
        NutrientConfig {
            glucose_refill: default_glucose_refill(),
            oxygen_refill: default_oxygen_refill(),
            diffusion_factor: default_diffusion_factor(),
        }
    }
}

impl SimulationConfig {
    /// Loads the simulation configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        Self::from_toml_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Invalid config '{}': {}", path_ref.display(), e))
    }

    /// Parses and validates a configuration held in memory.
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let l = &self.lattice;
        if l.xsize == 0 || l.ysize == 0 || l.zsize == 0 {
            anyhow::bail!("lattice dimensions must be positive (got {}x{}x{}).", l.xsize, l.ysize, l.zsize);
        }
        if !(0.0..=1.0).contains(&self.nutrients.diffusion_factor) {
            anyhow::bail!("diffusion_factor must lie in [0, 1] (got {}).", self.nutrients.diffusion_factor);
        }
        if self.tumor.cancer_radius < 0.0 || self.tumor.healthy_radius < 0.0 {
            anyhow::bail!("tumor radii must be non-negative.");
        }
        if self.treatment.dose < 0.0 {
            anyhow::bail!("treatment dose must be non-negative.");
        }
        if let Some(oar) = &self.oar {
            if oar.x1 == oar.x2 || oar.y1 == oar.y2 || oar.z1 == oar.z2 {
                anyhow::bail!("oar zone is empty along at least one axis.");
            }
        }
        Ok(())
    }

    /// Converts the configuration into simulation parameters used at runtime.
    pub fn get_sim_params(&self) -> SimParams {
        let oar_zone = self.oar.map(|o| {
            [
                o.x1.min(o.x2), o.x1.max(o.x2),
                o.y1.min(o.y2), o.y1.max(o.y2),
                o.z1.min(o.z2), o.z1.max(o.z2),
            ]
        });

        SimParams {
            xsize: self.lattice.xsize,
            ysize: self.lattice.ysize,
            zsize: self.lattice.zsize,
            num_sources: self.lattice.sources,
            oar_zone,
            glucose_refill: self.nutrients.glucose_refill,
            oxygen_refill: self.nutrients.oxygen_refill,
            diffusion_factor: self.nutrients.diffusion_factor,
            record_interval_ticks: self.timing.record_interval_hours.max(1),
            centroid_interval_ticks: self.timing.centroid_interval_hours.max(1),
            seed: self.seed,
        }
    }
}

fn default_seed() -> u64 {
    42
}

fn default_glucose_refill() -> f64 {
    130.0 // 1e-6 mg per source per hour
}

fn default_oxygen_refill() -> f64 {
    4500.0 // 1e-6 ml per source per hour
}

fn default_diffusion_factor() -> f64 {
    0.2
}

fn default_cells_per_voxel() -> u32 {
    1
}

fn default_centroid_interval() -> u32 {
    24
}
