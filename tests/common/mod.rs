#![allow(dead_code)]

use radiosim_engine::{AgentKind, CellBehavior, CycleOutcome, Lattice, SpawnRequest};
use rand::rngs::StdRng;

/// Test cell whose behaviour is fixed up front.
#[derive(Debug, Clone, PartialEq)]
pub struct Scripted {
    pub kind: AgentKind,
    pub alive: bool,
    pub asleep: bool,
    /// Request returned every `period` cycles.
    pub request: Option<SpawnRequest>,
    pub period: u32,
    /// Dies at the end of this many cycles.
    pub lifespan: Option<u32>,
    /// Glucose per cycle; oxygen is ten times that.
    pub uptake: f64,
    /// Effective dose at or above which the cell dies.
    pub lethal_dose: f64,
    pub cycles: u32,
    pub received: Vec<f64>,
}

impl Scripted {
    pub fn inert(kind: AgentKind) -> Self {
        Self {
            kind,
            alive: true,
            asleep: false,
            request: None,
            period: 1,
            lifespan: None,
            uptake: 0.0,
            lethal_dose: f64::INFINITY,
            cycles: 0,
            received: Vec::new(),
        }
    }

    pub fn requesting(kind: AgentKind, request: SpawnRequest) -> Self {
        Self { request: Some(request), ..Self::inert(kind) }
    }

    /// Divides into its own kind every `period` cycles and dies after `lifespan`.
    pub fn dividing(kind: AgentKind, period: u32, lifespan: u32) -> Self {
        let request = match kind {
            AgentKind::Healthy => SpawnRequest::Healthy,
            AgentKind::Cancer => SpawnRequest::Cancer,
            AgentKind::OrganAtRisk => SpawnRequest::OrganAtRisk,
        };
        Self { request: Some(request), period, lifespan: Some(lifespan), uptake: 0.5, lethal_dose: 1.0, ..Self::inert(kind) }
    }
}

impl CellBehavior for Scripted {
    fn kind(&self) -> AgentKind {
        self.kind
    }

    fn is_alive(&self) -> bool {
        self.alive
    }

    fn cycle(&mut self, _glucose: f64, _oxygen: f64, _density: i32) -> CycleOutcome {
        self.cycles += 1;
        if self.request == Some(SpawnRequest::Starved) {
            self.alive = false;
            return CycleOutcome::starved();
        }
        let mut outcome = CycleOutcome::consumed(self.uptake, self.uptake * 10.0);
        if let Some(request) = self.request {
            if self.cycles % self.period == 0 {
                outcome = outcome.with_request(request);
            }
        }
        if self.lifespan.is_some_and(|l| self.cycles >= l) {
            self.alive = false;
        }
        outcome
    }

    fn radiate(&mut self, dose: f64, _rng: &mut StdRng) {
        self.received.push(dose);
        if dose >= self.lethal_dose {
            self.alive = false;
        }
    }

    fn sleep(&mut self) {
        self.asleep = true;
    }

    fn wake(&mut self) {
        self.asleep = false;
    }

    fn offspring(kind: AgentKind) -> Self {
        Self::dividing(kind, 3, 5)
    }
}

/// Checks every bookkeeping invariant the lattice maintains incrementally.
pub fn assert_consistent(lattice: &Lattice<Scripted>) {
    let dims = lattice.dims();
    let mut total = 0;
    for v in dims.voxels() {
        let container = lattice.container(v.x, v.y, v.z).unwrap();
        assert!(container.is_consistent(), "container at {:?} out of sync", v);
        total += container.len();

        let mut expected = dims.missing_neighbors(v);
        radiosim_engine::grid::for_each_neighbor(dims, v, |n| {
            expected += lattice.container(n.x, n.y, n.z).unwrap().len() as i32;
        });
        assert_eq!(lattice.neighbor_density(v.x, v.y, v.z).unwrap(), expected, "neighbour density at {:?}", v);
    }
    assert_eq!(total, lattice.total_counts().total());
}
