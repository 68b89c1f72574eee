use anyhow::Result;
use log::{debug, error, info};
use radiosim_common::SimulationConfig;
use radiosim_engine::controller::Controller;
use radiosim_engine::output::{write_snapshots, write_voxel_table, SnapshotFormat};
use std::time::Instant;

fn save_voxels(sim: &Controller, phase: &str) -> Result<()> {
    if !sim.config().output.save_voxels {
        return Ok(());
    }
    let filename = format!("{}_{}_voxels.csv", sim.config().output.base_filename, phase);
    if let Err(e) = write_voxel_table(&sim.voxel_records(), &filename) {
        error!("Error saving voxel table '{}': {:#}", filename, e);
        anyhow::bail!("Failed to save voxel table.");
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    info!("Starting radiotherapy simulation...");

    // --- Load Configuration ---
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let config = SimulationConfig::load(&config_path)?;

    // --- Initialize Lattice ---
    let mut sim = Controller::new(config)?;
    debug!("Simulation Parameters: {:#?}", sim.params());
    sim.record_snapshot();

    // --- Growth ---
    let growth_hours = sim.config().timing.growth_hours;
    info!("Growing tumour for {} hours...", growth_hours);
    let start_time = Instant::now();
    sim.grow(growth_hours)?;
    let counts = sim.lattice().total_counts();
    info!(
        "Growth finished in {:.3} s: {} healthy, {} cancer, {} organ-at-risk cells.",
        start_time.elapsed().as_secs_f64(),
        counts.healthy,
        counts.cancer,
        counts.oar
    );
    save_voxels(&sim, "growth")?;

    // --- Treatment ---
    let t = sim.config().treatment.clone();
    info!(
        "Starting treatment: {} weeks, {} radiation days and {} rest days per week, {:.2} Gy per fraction.",
        t.weeks, t.rad_days, t.rest_days, t.dose
    );
    let start_time = Instant::now();
    sim.treatment(t.weeks, t.rad_days, t.rest_days, t.dose)?;
    sim.record_snapshot();
    let counts = sim.lattice().total_counts();
    info!(
        "Treatment finished in {:.3} s after {:.2} Gy: {} healthy, {} cancer, {} organ-at-risk cells.",
        start_time.elapsed().as_secs_f64(),
        sim.dose_delivered(),
        counts.healthy,
        counts.cancer,
        counts.oar
    );
    save_voxels(&sim, "treatment")?;

    // --- Save Recorded Data ---
    if sim.config().output.save_counts {
        let format = SnapshotFormat::from_config(sim.config().output.format.as_deref());
        if let Err(e) = write_snapshots(sim.get_recorded_snapshots(), &sim.config().output.base_filename, format) {
            error!("Error saving snapshots: {:#}", e);
            anyhow::bail!("Failed to save snapshots.");
        }
    } else {
        info!("Skipping saving snapshots as per config (save_counts is false).");
    }

    info!("Simulation Complete.");
    Ok(())
}
