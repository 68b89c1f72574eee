//! The voxel lattice: agent containers, nutrient fields, neighbour-density bookkeeping,
//! nutrient sources, placement heuristics and irradiation.

use crate::agent::{AgentKind, AgentRecord, CellBehavior, SpawnRequest};
use crate::container::{AgentContainer, PopulationCounts, SourceContainer};
use crate::diffusion::NutrientField;
use crate::dosimetry::{DosePlan, IrradiationReport};
use crate::error::LatticeError;
use crate::grid::{for_each_neighbor, Dims, ExclusionZone, NeighborSet, Voxel};
use log::trace;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use radiosim_common::Vec3;

/// Glucose in every voxel at construction (1e-6 mg).
pub const INITIAL_GLUCOSE: f64 = 100.0;
/// Oxygen in every voxel at construction (1e-6 ml).
pub const INITIAL_OXYGEN: f64 = 1000.0;
/// A source moves on average once every this many calls (one simulated day).
pub const SOURCE_MOVE_PERIOD: u32 = 24;
/// Cancer population at which sources always migrate toward the tumour.
pub const SOURCE_PULL_SATURATION: usize = 50_000;
/// Healthy division is blocked when every candidate neighbour holds at least this many agents.
pub const HEALTHY_CROWDING_LIMIT: usize = 5;
/// Smallest tumour radius reported, in voxels.
pub const MIN_TUMOR_RADIUS: f64 = 3.0;

/// Dominant occupant of a voxel, judged from its first agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoxelClass {
    Empty,
    Cancer,
    Healthy,
    OrganAtRisk,
}

impl VoxelClass {
    /// Integer code used in tabular output: -1 cancer, 0 empty, 1 healthy, 2 organ-at-risk.
    pub fn code(self) -> i32 {
        match self {
            VoxelClass::Cancer => -1,
            VoxelClass::Empty => 0,
            VoxelClass::Healthy => 1,
            VoxelClass::OrganAtRisk => 2,
        }
    }
}

/// The simulation lattice. Cloning produces a fully independent deep copy, including
/// the random stream.
#[derive(Debug, Clone)]
pub struct Lattice<C> {
    dims: Dims,
    voxels: Vec<AgentContainer<C>>,
    glucose: NutrientField,
    oxygen: NutrientField,
    /// Live agents in each voxel's Moore neighbourhood, plus the missing-neighbour baseline.
    neighbor_density: Vec<i32>,
    sources: SourceContainer,
    exclusion_zone: Option<ExclusionZone>,
    centroid: Vec3,
    counts: PopulationCounts,
    rng: StdRng,
}

impl<C: CellBehavior> Lattice<C> {
    /// Creates an empty lattice with `source_count` randomly placed nutrient sources.
    pub fn new(xsize: usize, ysize: usize, zsize: usize, source_count: usize, seed: u64) -> Result<Self, LatticeError> {
        let dims = Dims::new(xsize, ysize, zsize)?;
        let mut rng = StdRng::seed_from_u64(seed);

        let neighbor_density = dims.voxels().map(|v| dims.missing_neighbors(v)).collect();

        let mut sources = SourceContainer::new();
        for _ in 0..source_count {
            sources.add(
                rng.random_range(0..xsize),
                rng.random_range(0..ysize),
                rng.random_range(0..zsize),
            );
        }

        Ok(Self {
            dims,
            voxels: (0..dims.num_voxels()).map(|_| AgentContainer::new()).collect(),
            glucose: NutrientField::new(dims, INITIAL_GLUCOSE),
            oxygen: NutrientField::new(dims, INITIAL_OXYGEN),
            neighbor_density,
            sources,
            exclusion_zone: None,
            centroid: Vec3::zero(),
            counts: PopulationCounts::default(),
            rng,
        })
    }

    /// Creates a lattice with an organ-at-risk box. The box is clipped to the lattice;
    /// it is not populated here.
    pub fn with_exclusion_zone(
        xsize: usize,
        ysize: usize,
        zsize: usize,
        source_count: usize,
        zone: ExclusionZone,
        seed: u64,
    ) -> Result<Self, LatticeError> {
        let mut lattice = Self::new(xsize, ysize, zsize, source_count, seed)?;
        let clipped = zone.clipped(lattice.dims);
        if clipped.is_empty() {
            return Err(LatticeError::InvalidExclusionZone { zone: zone.bounds(), dims: lattice.dims });
        }
        lattice.exclusion_zone = Some(clipped);
        Ok(lattice)
    }

    /// Places a cell at `(x, y, z)`.
    pub fn add_agent(&mut self, x: usize, y: usize, z: usize, cell: C) -> Result<(), LatticeError> {
        let v = self.dims.checked(x, y, z)?;
        self.insert(AgentRecord::new(v, cell));
        Ok(())
    }

    fn insert(&mut self, record: AgentRecord<C>) {
        let v = record.voxel;
        self.counts.record(record.kind);
        self.voxels[self.dims.index_of(v)].add(record);
        self.change_neighbor_density(v, 1);
    }

    /// Applies `delta` to the neighbour density of every in-bounds Moore neighbour of `v`.
    fn change_neighbor_density(&mut self, v: Voxel, delta: i32) {
        if delta == 0 {
            return;
        }
        let dims = self.dims;
        let density = &mut self.neighbor_density;
        for_each_neighbor(dims, v, |n| density[dims.index_of(n)] += delta);
    }

    /// Compacts one voxel and propagates the change in its population.
    fn compact_voxel(&mut self, idx: usize) -> PopulationCounts {
        let before = self.voxels[idx].len();
        let removed = self.voxels[idx].remove_dead_and_compact();
        let after = self.voxels[idx].len();
        self.counts -= removed;
        self.change_neighbor_density(self.dims.voxel_of(idx), after as i32 - before as i32);
        removed
    }

    // ---------------------------------------------------------------------
    // Nutrient sources
    // ---------------------------------------------------------------------

    /// Adds nutrients at every source, then lets each source move with probability 1/24.
    pub fn refill_and_migrate_sources(&mut self, glucose: f64, oxygen: f64) {
        for i in 0..self.sources.len() {
            let Some(v) = self.sources.get(i) else { continue };
            let idx = self.dims.index_of(v);
            self.glucose.add(idx, glucose);
            self.oxygen.add(idx, oxygen);

            if self.rng.random_range(0..SOURCE_MOVE_PERIOD) == 0 {
                if let Some(next) = self.source_step(v) {
                    self.sources.set(i, next);
                }
            }
        }
    }

    /// Larger tumours pull sources toward their centroid more often; otherwise a
    /// source drifts to a random neighbour.
    fn source_step(&mut self, v: Voxel) -> Option<Voxel> {
        if self.rng.random_range(0..SOURCE_PULL_SATURATION) < self.counts.cancer {
            let step = |c: usize, target: f64| {
                let cf = c as f64;
                if cf < target {
                    c + 1
                } else if cf > target {
                    c - 1
                } else {
                    c
                }
            };
            let next = Voxel::new(step(v.x, self.centroid.x), step(v.y, self.centroid.y), step(v.z, self.centroid.z));
            // The centroid lies inside the lattice, so a step toward it stays in bounds.
            debug_assert!(self.dims.contains(next.x, next.y, next.z));
            Some(next)
        } else {
            self.random_neighbor(v)
        }
    }

    // ---------------------------------------------------------------------
    // Placement heuristics
    // ---------------------------------------------------------------------

    /// Uniform pick among the in-bounds neighbours of `v`.
    fn random_neighbor(&mut self, v: Voxel) -> Option<Voxel> {
        let mut candidates = NeighborSet::default();
        for_each_neighbor(self.dims, v, |n| candidates.push(n));
        candidates.choose(&mut self.rng)
    }

    /// Least crowded neighbour outside the exclusion zone, or `None` when even the
    /// least crowded one holds `limit` agents or more.
    fn least_crowded_neighbor(&mut self, v: Voxel, limit: usize) -> Option<Voxel> {
        let mut candidates = NeighborSet::default();
        let mut current_min = usize::MAX;
        let zone = self.exclusion_zone;
        let voxels = &self.voxels;
        let dims = self.dims;
        for_each_neighbor(dims, v, |n| {
            if zone.is_some_and(|z| z.contains(n)) {
                return;
            }
            let size = voxels[dims.index_of(n)].len();
            if size < current_min {
                candidates.clear();
                current_min = size;
            }
            if size == current_min {
                candidates.push(n);
            }
        });
        if current_min < limit {
            candidates.choose(&mut self.rng)
        } else {
            None
        }
    }

    /// Least crowded neighbour inside the exclusion zone that holds no organ cell.
    fn missing_organ_neighbor(&mut self, v: Voxel) -> Option<Voxel> {
        let zone = self.exclusion_zone?;
        let mut candidates = NeighborSet::default();
        let mut current_min = usize::MAX;
        let voxels = &self.voxels;
        let dims = self.dims;
        for_each_neighbor(dims, v, |n| {
            let container = &voxels[dims.index_of(n)];
            if !zone.contains(n) || container.oar_count() > 0 {
                return;
            }
            let size = container.len();
            if size < current_min {
                candidates.clear();
                current_min = size;
            }
            if size == current_min {
                candidates.push(n);
            }
        });
        candidates.choose(&mut self.rng)
    }

    /// Takes organ cells around `v` out of quiescence.
    fn wake_surrounding_organs(&mut self, v: Voxel) {
        let dims = self.dims;
        let voxels = &mut self.voxels;
        for_each_neighbor(dims, v, |n| voxels[dims.index_of(n)].wake_organ_at_risk());
    }

    // ---------------------------------------------------------------------
    // Hourly cycle
    // ---------------------------------------------------------------------

    /// Advances every living agent by one hour. Daughters are buffered and only placed
    /// once the whole lattice has been swept, so none of them cycles this tick.
    pub fn cycle_all_agents(&mut self) {
        let mut newborn: Vec<AgentRecord<C>> = Vec::new();

        for idx in 0..self.voxels.len() {
            if self.voxels[idx].is_empty() {
                continue;
            }
            let v = self.dims.voxel_of(idx);
            let density = self.neighbor_density[idx] + self.voxels[idx].len() as i32;

            for position in 0..self.voxels[idx].len() {
                let glucose = self.glucose.get(idx);
                let oxygen = self.oxygen.get(idx);
                let Some(record) = self.voxels[idx].get_mut(position) else { break };
                if !record.cell.is_alive() {
                    continue;
                }
                let outcome = record.cell.cycle(glucose, oxygen, density);
                self.glucose.consume(idx, outcome.glucose);
                self.oxygen.consume(idx, outcome.oxygen);

                let Some(request) = outcome.request else { continue };
                let target = match request {
                    SpawnRequest::Starved => {
                        self.wake_surrounding_organs(v);
                        continue;
                    }
                    SpawnRequest::Healthy => self.least_crowded_neighbor(v, HEALTHY_CROWDING_LIMIT),
                    SpawnRequest::Cancer => self.random_neighbor(v),
                    SpawnRequest::OrganAtRisk => self.missing_organ_neighbor(v),
                };
                match (target, request.daughter_kind()) {
                    (Some(t), Some(kind)) => newborn.push(AgentRecord::new(t, C::offspring(kind))),
                    // Cancer division with nowhere to go is simply dropped
                    (None, Some(AgentKind::Cancer)) => {}
                    (None, Some(_)) => {
                        if let Some(record) = self.voxels[idx].get_mut(position) {
                            record.cell.sleep();
                        }
                    }
                    (_, None) => {}
                }
            }

            self.compact_voxel(idx);
        }

        trace!("cycle_all_agents: {} daughters buffered", newborn.len());
        self.merge_buffered(newborn);
    }

    /// Files buffered daughters into their target voxels.
    fn merge_buffered(&mut self, newborn: Vec<AgentRecord<C>>) {
        for record in newborn {
            self.insert(record);
        }
    }

    /// Runs one diffusion pass on both nutrient fields.
    pub fn diffuse(&mut self, factor: f64) -> Result<(), LatticeError> {
        self.glucose.diffuse(factor)?;
        self.oxygen.diffuse(factor)
    }

    // ---------------------------------------------------------------------
    // Tumour geometry
    // ---------------------------------------------------------------------

    /// Recomputes the cancer-weighted centroid. With no cancer anywhere the previous
    /// centroid is kept and `None` is returned.
    pub fn recompute_centroid(&mut self) -> Option<Vec3> {
        let mut weight = 0usize;
        let mut sum = Vec3::zero();
        for (idx, container) in self.voxels.iter().enumerate() {
            let n = container.cancer_count();
            if n == 0 {
                continue;
            }
            let v = self.dims.voxel_of(idx);
            weight += n;
            sum = sum.add(Vec3::from_voxel(v.x, v.y, v.z).scale(n as f64));
        }
        if weight == 0 {
            return None;
        }
        let w = weight as f64;
        self.centroid = Vec3::new(sum.x / w, sum.y / w, sum.z / w);
        Some(self.centroid)
    }

    /// Distance from `center` to the farthest voxel holding cancer, never less than
    /// three voxels. `None` when there is no cancer.
    pub fn tumor_radius(&self, center: Vec3) -> Option<f64> {
        if self.counts.cancer == 0 {
            return None;
        }
        let farthest = self
            .voxels
            .iter()
            .enumerate()
            .filter(|(_, c)| c.first_kind() == Some(AgentKind::Cancer))
            .map(|(idx, _)| {
                let v = self.dims.voxel_of(idx);
                Vec3::from_voxel(v.x, v.y, v.z).distance(center)
            })
            .fold(f64::NEG_INFINITY, f64::max);
        Some(farthest.max(MIN_TUMOR_RADIUS))
    }

    // ---------------------------------------------------------------------
    // Irradiation
    // ---------------------------------------------------------------------

    /// Irradiates the tumour around its freshly computed centroid. A lattice without
    /// cancer is left untouched.
    pub fn irradiate(&mut self, dose: f64) -> IrradiationReport {
        let Some(center) = self.recompute_centroid() else {
            return IrradiationReport { center: self.centroid, ..Default::default() };
        };
        match self.tumor_radius(center) {
            Some(radius) => self.irradiate_at(dose, radius, center),
            None => IrradiationReport { center, ..Default::default() },
        }
    }

    /// Delivers `dose` to every populated voxel within three radii of `center`.
    pub fn irradiate_at(&mut self, dose: f64, radius: f64, center: Vec3) -> IrradiationReport {
        let mut report = IrradiationReport { radius, center, ..Default::default() };
        if dose == 0.0 || radius <= 0.0 {
            return report;
        }
        let plan = DosePlan::new(dose, radius, center);

        for idx in 0..self.voxels.len() {
            if self.voxels[idx].is_empty() {
                continue;
            }
            let v = self.dims.voxel_of(idx);
            let distance = Vec3::from_voxel(v.x, v.y, v.z).distance(center);
            if !plan.reaches(distance) {
                continue;
            }

            let delivered = plan.effective_dose(distance, self.oxygen.get(idx));
            let rng = &mut self.rng;
            for record in self.voxels[idx].iter_mut() {
                record.cell.radiate(delivered, rng);
                report.agents_hit += 1;
            }
            report.voxels_hit += 1;
            report.killed += self.compact_voxel(idx);
        }
        report
    }

    // ---------------------------------------------------------------------
    // Read accessors
    // ---------------------------------------------------------------------

    pub fn dims(&self) -> Dims {
        self.dims
    }

    pub fn exclusion_zone(&self) -> Option<ExclusionZone> {
        self.exclusion_zone
    }

    /// Current centroid; the origin until first computed.
    pub fn centroid(&self) -> Vec3 {
        self.centroid
    }

    /// Lattice-wide agent counts.
    pub fn total_counts(&self) -> PopulationCounts {
        self.counts
    }

    pub fn container(&self, x: usize, y: usize, z: usize) -> Result<&AgentContainer<C>, LatticeError> {
        let v = self.dims.checked(x, y, z)?;
        Ok(&self.voxels[self.dims.index_of(v)])
    }

    /// Signed density: minus the cancer count, else the agent count, 0 when empty.
    pub fn voxel_density(&self, x: usize, y: usize, z: usize) -> Result<i32, LatticeError> {
        Ok(self.container(x, y, z)?.weighted_density())
    }

    pub fn voxel_class(&self, x: usize, y: usize, z: usize) -> Result<VoxelClass, LatticeError> {
        Ok(match self.container(x, y, z)?.first_kind() {
            None => VoxelClass::Empty,
            Some(AgentKind::Cancer) => VoxelClass::Cancer,
            Some(AgentKind::Healthy) => VoxelClass::Healthy,
            Some(AgentKind::OrganAtRisk) => VoxelClass::OrganAtRisk,
        })
    }

    pub fn voxel_counts(&self, x: usize, y: usize, z: usize) -> Result<PopulationCounts, LatticeError> {
        Ok(self.container(x, y, z)?.counts())
    }

    pub fn neighbor_density(&self, x: usize, y: usize, z: usize) -> Result<i32, LatticeError> {
        let v = self.dims.checked(x, y, z)?;
        Ok(self.neighbor_density[self.dims.index_of(v)])
    }

    pub fn glucose_at(&self, x: usize, y: usize, z: usize) -> Result<f64, LatticeError> {
        let v = self.dims.checked(x, y, z)?;
        Ok(self.glucose.get(self.dims.index_of(v)))
    }

    pub fn oxygen_at(&self, x: usize, y: usize, z: usize) -> Result<f64, LatticeError> {
        let v = self.dims.checked(x, y, z)?;
        Ok(self.oxygen.get(self.dims.index_of(v)))
    }

    /// Glucose field in storage order (see [`Dims::index_of`]).
    pub fn glucose(&self) -> &[f64] {
        self.glucose.as_slice()
    }

    /// Oxygen field in storage order (see [`Dims::index_of`]).
    pub fn oxygen(&self) -> &[f64] {
        self.oxygen.as_slice()
    }

    pub fn sources(&self) -> impl Iterator<Item = Voxel> + '_ {
        self.sources.iter()
    }
}
