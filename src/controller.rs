use crate::cell::{Phase, TissueCell};
use crate::dosimetry::IrradiationReport;
use crate::grid::ExclusionZone;
use crate::lattice::Lattice;
use anyhow::{Context, Result};
use log::{debug, info, trace, warn};
use radiosim_common::{SimParams, SimulationConfig, Snapshot, Vec3, VoxelRecord};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;

/// Hours in a treatment day.
pub const HOURS_PER_DAY: u32 = 24;

/// Drives a `Lattice<TissueCell>` hour by hour and records what happens.
pub struct Controller {
    config: SimulationConfig,
    params: SimParams,
    lattice: Lattice<TissueCell>,
    /// Seeding RNG, independent of the lattice's own stream.
    rng: StdRng,
    /// Hours simulated so far.
    tick: u32,
    /// Cumulative dose of the fractions that reached at least one voxel (Gy).
    dose_delivered: f64,
    recorded_snapshots: Vec<Snapshot>,
}

impl Controller {
    /// Builds the lattice, fills the organ-at-risk box and seeds the spherical tumour.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        let params = config.get_sim_params();
        if config.timing.record_interval_hours == 0 {
            warn!("Record interval of 0 hours, recording every tick instead.");
        }
        let lattice = match params.oar_zone {
            Some(bounds) => {
                let zone = ExclusionZone::from_bounds(bounds);
                let [x1, x2, y1, y2, z1, z2] = bounds;
                if x2 > params.xsize || y2 > params.ysize || z2 > params.zsize {
                    warn!(
                        "Organ-at-risk box [{}..{}, {}..{}, {}..{}] extends past the {}x{}x{} lattice, clipping.",
                        x1, x2, y1, y2, z1, z2, params.xsize, params.ysize, params.zsize
                    );
                }
                Lattice::with_exclusion_zone(
                    params.xsize,
                    params.ysize,
                    params.zsize,
                    params.num_sources,
                    zone,
                    params.seed,
                )
            }
            None => Lattice::new(params.xsize, params.ysize, params.zsize, params.num_sources, params.seed),
        }
        .context("Failed to build lattice")?;

        let mut sim = Self {
            rng: StdRng::seed_from_u64(params.seed.wrapping_add(1)),
            config,
            params,
            lattice,
            tick: 0,
            dose_delivered: 0.0,
            recorded_snapshots: Vec::new(),
        };
        sim.seed_cells()?;
        sim.lattice.recompute_centroid();

        let counts = sim.lattice.total_counts();
        info!(
            "Seeded lattice {}: {} healthy, {} cancer, {} organ-at-risk cells.",
            sim.lattice.dims(),
            counts.healthy,
            counts.cancer,
            counts.oar
        );
        Ok(sim)
    }

    fn seed_cells(&mut self) -> Result<()> {
        let zone = self.lattice.exclusion_zone();
        if let Some(zone) = zone {
            for v in zone.voxels() {
                self.lattice.add_agent(v.x, v.y, v.z, TissueCell::organ_at_risk(Phase::Quiescent))?;
            }
        }

        let tumor = self.config.tumor.clone();
        let dims = self.lattice.dims();
        let center = Vec3::new(
            (dims.xsize / 2) as f64,
            (dims.ysize / 2) as f64,
            (dims.zsize / 2) as f64,
        );
        for v in dims.voxels() {
            let dist = Vec3::from_voxel(v.x, v.y, v.z).distance(center);
            let in_zone = zone.is_some_and(|z| z.contains(v));
            let (healthy, cancer) = if dist <= tumor.cancer_radius {
                (tumor.healthy_per_voxel, tumor.cancer_per_voxel)
            } else if dist <= tumor.healthy_radius {
                (tumor.healthy_per_voxel, 0)
            } else {
                continue;
            };
            if !in_zone {
                for _ in 0..healthy {
                    let phase = Phase::HEALTHY_START[self.rng.random_range(0..Phase::HEALTHY_START.len())];
                    self.lattice.add_agent(v.x, v.y, v.z, TissueCell::healthy(phase))?;
                }
            }
            for _ in 0..cancer {
                let phase = Phase::CANCER_START[self.rng.random_range(0..Phase::CANCER_START.len())];
                self.lattice.add_agent(v.x, v.y, v.z, TissueCell::cancer(phase))?;
            }
        }
        Ok(())
    }

    /// One simulated hour.
    pub fn go(&mut self) -> Result<()> {
        self.lattice
            .refill_and_migrate_sources(self.params.glucose_refill, self.params.oxygen_refill);
        self.lattice.cycle_all_agents();
        self.lattice.diffuse(self.params.diffusion_factor)?;
        self.tick += 1;

        if self.tick % self.params.centroid_interval_ticks == 0 {
            match self.lattice.recompute_centroid() {
                Some(c) => debug!("Tick {}: tumour centroid at ({:.2}, {:.2}, {:.2}).", self.tick, c.x, c.y, c.z),
                None => debug!("Tick {}: no cancer left, centroid kept.", self.tick),
            }
        }
        Ok(())
    }

    /// Runs `hours` ticks, recording a snapshot every record interval.
    pub fn grow(&mut self, hours: u32) -> Result<()> {
        let start = Instant::now();
        for _ in 0..hours {
            let step_start = Instant::now();
            self.go()?;
            trace!("Tick {} completed in {:.2} ms", self.tick, step_start.elapsed().as_secs_f64() * 1000.0);

            if self.tick % self.params.record_interval_ticks == 0 {
                self.record_snapshot();
            }
        }
        debug!("Advanced {} hours in {:.3} s.", hours, start.elapsed().as_secs_f64());
        Ok(())
    }

    /// Irradiates the tumour once, centred on the current centroid.
    pub fn irradiate(&mut self, dose: f64) -> IrradiationReport {
        if self.lattice.total_counts().cancer == 0 {
            warn!("Irradiation of {:.2} Gy requested at tick {} with no cancer left.", dose, self.tick);
        }
        let report = self.lattice.irradiate(dose);
        if report.voxels_hit > 0 {
            self.dose_delivered += dose;
        }
        info!(
            "Tick {}: {:.2} Gy, radius {:.2}, {} cells hit in {} voxels, killed {} cancer / {} healthy / {} OAR.",
            self.tick,
            dose,
            report.radius,
            report.agents_hit,
            report.voxels_hit,
            report.killed.cancer,
            report.killed.healthy,
            report.killed.oar
        );
        report
    }

    /// Fractionated schedule: each week has `rad_days` days starting with one fraction
    /// followed by `rest_days` days without radiation.
    pub fn treatment(&mut self, weeks: u32, rad_days: u32, rest_days: u32, dose: f64) -> Result<()> {
        for week in 0..weeks {
            debug!("Treatment week {} of {}.", week + 1, weeks);
            for _ in 0..rad_days {
                self.irradiate(dose);
                self.grow(HOURS_PER_DAY)?;
            }
            self.grow(rest_days * HOURS_PER_DAY)?;
        }
        Ok(())
    }

    /// Appends the current counts and tumour geometry to the recorded series.
    pub fn record_snapshot(&mut self) {
        let counts = self.lattice.total_counts();
        let centroid = self.lattice.centroid();
        let snapshot = Snapshot {
            tick: self.tick,
            healthy: counts.healthy,
            cancer: counts.cancer,
            oar: counts.oar,
            centroid: centroid.as_tuple(),
            tumor_radius: self.lattice.tumor_radius(centroid),
            dose_delivered: self.dose_delivered,
        };
        debug!(
            "Tick {}: {} healthy, {} cancer, {} OAR, radius {:?}.",
            snapshot.tick, snapshot.healthy, snapshot.cancer, snapshot.oar, snapshot.tumor_radius
        );
        self.recorded_snapshots.push(snapshot);
    }

    /// Per-voxel state, in lattice index order.
    pub fn voxel_records(&self) -> Vec<VoxelRecord> {
        let dims = self.lattice.dims();
        let glucose = self.lattice.glucose();
        let oxygen = self.lattice.oxygen();
        dims.voxels()
            .enumerate()
            .filter_map(|(idx, v)| {
                let counts = self.lattice.voxel_counts(v.x, v.y, v.z).ok()?;
                Some(VoxelRecord {
                    x: v.x,
                    y: v.y,
                    z: v.z,
                    density: self.lattice.voxel_density(v.x, v.y, v.z).ok()?,
                    healthy: counts.healthy,
                    cancer: counts.cancer,
                    oar: counts.oar,
                    glucose: glucose[idx],
                    oxygen: oxygen[idx],
                    voxel_type: self.lattice.voxel_class(v.x, v.y, v.z).ok()?.code(),
                })
            })
            .collect()
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn lattice(&self) -> &Lattice<TissueCell> {
        &self.lattice
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn dose_delivered(&self) -> f64 {
        self.dose_delivered
    }

    pub fn get_recorded_snapshots(&self) -> &[Snapshot] {
        &self.recorded_snapshots
    }
}
